use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::components::alert::{AlertPresenter, Severity};
use crate::components::deep_link::DeepLinkOpener;
use crate::config::SiteConfig;
use crate::page::{Listen, Page};
use crate::timing::Timers;

pub const FORM_ID: &str = "contactForm";
pub const INVALID_CLASS: &str = "is-invalid";
pub const LOADING_CLASS: &str = "form-loading";

pub const INVALID_NOTICE: &str = "Por favor, preencha todos os campos obrigatórios corretamente.";
pub const REDIRECT_NOTICE: &str = "Redirecionando para o WhatsApp...";

const SUBMIT_SELECTOR: &str = "button[type=\"submit\"]";
const LOADING_LABEL: &str = r#"<i class="fas fa-spinner fa-spin me-2"></i>Enviando..."#;
const IDLE_LABEL: &str = r#"<i class="fab fa-whatsapp me-2"></i>Enviar via WhatsApp"#;

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Phone,
    Email,
    PropertyType,
    Message,
}

impl Field {
    pub const ALL: [Field; 5] = [
        Field::Name,
        Field::Phone,
        Field::Email,
        Field::PropertyType,
        Field::Message,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Field::Name => "nome",
            Field::Phone => "telefone",
            Field::Email => "email",
            Field::PropertyType => "tipo_imovel",
            Field::Message => "mensagem",
        }
    }
}

/// Field values as read at submit time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormSnapshot {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub property_type: String,
    pub message: String,
}

impl FormSnapshot {
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Phone => &self.phone,
            Field::Email => &self.email,
            Field::PropertyType => &self.property_type,
            Field::Message => &self.message,
        }
    }

    /// The text sent to WhatsApp.
    pub fn to_message(&self) -> String {
        format!(
            "*Solicitação de Avaliação Imobiliária*\n\
             \n\
             *Dados do Cliente:*\n\
             • Nome: {}\n\
             • Telefone: {}\n\
             • E-mail: {}\n\
             • Tipo de Imóvel: {}\n\
             \n\
             *Mensagem:*\n\
             {}\n\
             \n\
             _Enviado através do site da Prisma Avaliações Imobiliárias_",
            self.name, self.phone, self.email, self.property_type, self.message
        )
        .trim()
        .to_string()
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    invalid: Vec<Field>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.invalid.is_empty()
    }

    pub fn is_invalid(&self, field: Field) -> bool {
        self.invalid.contains(&field)
    }

    pub fn invalid_fields(&self) -> &[Field] {
        &self.invalid
    }
}

pub fn validate(snapshot: &FormSnapshot) -> ValidationReport {
    let invalid = Field::ALL
        .into_iter()
        .filter(|&field| {
            let value = snapshot.get(field).trim();
            value.is_empty() || (field == Field::Email && !is_valid_email(value))
        })
        .collect();
    ValidationReport { invalid }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Submitting,
}

struct FormState<H> {
    phase: Phase,
    // held so the callbacks stay scheduled; dropping one cancels it
    #[allow(dead_code)]
    send_timer: Option<H>,
    // one per send, oldest first; every send gets its own reset
    reset_timers: VecDeque<H>,
    resets_done: usize,
}

pub struct ContactFormController<P: Page, T: Timers> {
    page: P,
    timers: T,
    form: P::Element,
    alerts: AlertPresenter<P, T>,
    opener: DeepLinkOpener<P>,
    submit_delay_ms: u32,
    reset_delay_ms: u32,
    state: Rc<RefCell<FormState<T::Pending>>>,
}

impl<P: Page, T: Timers> Clone for ContactFormController<P, T> {
    fn clone(&self) -> Self {
        Self {
            page: self.page.clone(),
            timers: self.timers.clone(),
            form: self.form.clone(),
            alerts: self.alerts.clone(),
            opener: self.opener.clone(),
            submit_delay_ms: self.submit_delay_ms,
            reset_delay_ms: self.reset_delay_ms,
            state: self.state.clone(),
        }
    }
}

impl<P: Page, T: Timers> ContactFormController<P, T> {
    /// Hooks the contact form's submit event. `None` when the page has no form.
    pub fn attach(
        page: P,
        timers: T,
        alerts: AlertPresenter<P, T>,
        opener: DeepLinkOpener<P>,
        config: &SiteConfig,
    ) -> Option<Self> {
        let form = page.by_id(FORM_ID)?;
        let controller = Self {
            page,
            timers,
            form,
            alerts,
            opener,
            submit_delay_ms: config.submit_delay_ms,
            reset_delay_ms: config.reset_delay_ms,
            state: Rc::new(RefCell::new(FormState {
                phase: Phase::Idle,
                send_timer: None,
                reset_timers: VecDeque::new(),
                resets_done: 0,
            })),
        };
        let handler = controller.clone();
        controller.page.listen(
            &controller.form,
            "submit",
            Listen::Intercept,
            Box::new(move || handler.submit()),
        );
        Some(controller)
    }

    pub fn phase(&self) -> Phase {
        self.state.borrow().phase
    }

    pub fn submit(&self) {
        if self.phase() == Phase::Submitting {
            debug!("submit ignored, a message is already on its way");
            return;
        }

        let snapshot = self.snapshot();
        let report = validate(&snapshot);
        self.mark_fields(&report);
        if !report.is_valid() {
            debug!("contact form rejected: {:?}", report.invalid_fields());
            self.alerts.show(INVALID_NOTICE, Severity::Warning);
            return;
        }

        info!("contact form accepted for {}", snapshot.name);
        self.state.borrow_mut().phase = Phase::Submitting;
        self.show_loading(true);

        let controller = self.clone();
        let pending = self
            .timers
            .schedule(self.submit_delay_ms, Box::new(move || controller.send(snapshot)));
        self.state.borrow_mut().send_timer = Some(pending);
    }

    fn send(&self, snapshot: FormSnapshot) {
        self.opener.open(&snapshot.to_message());
        self.alerts.show(REDIRECT_NOTICE, Severity::Success);
        self.show_loading(false);
        self.state.borrow_mut().phase = Phase::Idle;

        let controller = self.clone();
        let pending = self
            .timers
            .schedule(self.reset_delay_ms, Box::new(move || controller.reset()));
        let mut state = self.state.borrow_mut();
        // resets share one delay, so they fire in the order they were queued
        let fired = std::mem::take(&mut state.resets_done).min(state.reset_timers.len());
        state.reset_timers.drain(..fired);
        state.reset_timers.push_back(pending);
    }

    fn reset(&self) {
        debug!("clearing contact form");
        self.state.borrow_mut().resets_done += 1;
        self.page.reset_form(&self.form);
    }

    fn snapshot(&self) -> FormSnapshot {
        let read = |field: Field| {
            self.page
                .by_id(field.id())
                .map(|element| self.page.value(&element))
                .unwrap_or_else(|| {
                    warn!("contact form has no #{} field", field.id());
                    String::new()
                })
        };
        FormSnapshot {
            name: read(Field::Name).trim().to_string(),
            phone: read(Field::Phone).trim().to_string(),
            email: read(Field::Email).trim().to_string(),
            property_type: read(Field::PropertyType),
            message: read(Field::Message).trim().to_string(),
        }
    }

    fn mark_fields(&self, report: &ValidationReport) {
        for field in Field::ALL {
            let Some(element) = self.page.by_id(field.id()) else {
                continue;
            };
            self.page.remove_class(&element, INVALID_CLASS);
            if report.is_invalid(field) {
                self.page.add_class(&element, INVALID_CLASS);
            }
        }
    }

    fn show_loading(&self, loading: bool) {
        if loading {
            self.page.add_class(&self.form, LOADING_CLASS);
        } else {
            self.page.remove_class(&self.form, LOADING_CLASS);
        }
        if let Some(button) = self.page.query_in(&self.form, SUBMIT_SELECTOR) {
            self.page
                .set_html(&button, if loading { LOADING_LABEL } else { IDLE_LABEL });
            self.page.set_disabled(&button, loading);
        }
    }
}
