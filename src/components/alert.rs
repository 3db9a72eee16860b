use std::cell::RefCell;
use std::rc::{Rc, Weak};

use log::debug;

use crate::page::{NewElement, Page};
use crate::timing::Timers;

pub const ALERT_CLASS: &str = "custom-alert";

const ALERT_STYLE: &str =
    "top: 100px; right: 20px; z-index: 9999; min-width: 300px; box-shadow: 0 4px 12px rgba(0,0,0,0.15);";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Warning => "warning",
        }
    }

    fn icon(self) -> &'static str {
        match self {
            Severity::Success => "fas fa-check-circle me-2",
            Severity::Warning => "fas fa-exclamation-triangle me-2",
            Severity::Info => "fas fa-info-circle me-2",
        }
    }
}

struct Shown<E> {
    element: E,
    generation: u64,
}

struct Slot<P: Page, T: Timers> {
    current: Option<Shown<P::Element>>,
    generation: u64,
    // held only so that replacing it cancels the old timer
    #[allow(dead_code)]
    expiry: Option<T::Pending>,
    close: Option<P::Listener>,
}

type SharedSlot<P, T> = Rc<RefCell<Slot<P, T>>>;

/// Owns the page's single alert slot.
pub struct AlertPresenter<P: Page, T: Timers> {
    page: P,
    timers: T,
    timeout_ms: u32,
    slot: SharedSlot<P, T>,
}

impl<P: Page, T: Timers> Clone for AlertPresenter<P, T> {
    fn clone(&self) -> Self {
        Self {
            page: self.page.clone(),
            timers: self.timers.clone(),
            timeout_ms: self.timeout_ms,
            slot: self.slot.clone(),
        }
    }
}

impl<P: Page, T: Timers> AlertPresenter<P, T> {
    pub fn new(page: P, timers: T, timeout_ms: u32) -> Self {
        Self {
            page,
            timers,
            timeout_ms,
            slot: Rc::new(RefCell::new(Slot {
                current: None,
                generation: 0,
                expiry: None,
                close: None,
            })),
        }
    }

    pub fn show(&self, message: &str, severity: Severity) {
        self.clear();

        let Some(element) = self.build(message, severity) else {
            debug!("alert not shown, body unavailable: {}", message);
            return;
        };

        let generation = {
            let mut slot = self.slot.borrow_mut();
            slot.generation += 1;
            slot.generation
        };

        let close = self.page.query_in(&element, ".btn-close").and_then(|button| {
            let page = self.page.clone();
            let slot = Rc::downgrade(&self.slot);
            self.page.listen_scoped(
                &button,
                "click",
                Box::new(move || dismiss::<P, T>(&page, &slot, generation)),
            )
        });

        let page = self.page.clone();
        let weak = Rc::downgrade(&self.slot);
        let expiry = self.timers.schedule(
            self.timeout_ms,
            Box::new(move || {
                dismiss::<P, T>(&page, &weak, generation);
                release_close::<P, T>(&weak, generation);
            }),
        );

        let mut slot = self.slot.borrow_mut();
        slot.current = Some(Shown {
            element,
            generation,
        });
        slot.expiry = Some(expiry);
        slot.close = close;
    }

    /// Removes the current alert and any stray alert markup on the page.
    fn clear(&self) {
        let (previous, close) = {
            let mut slot = self.slot.borrow_mut();
            (slot.current.take(), slot.close.take())
        };
        drop(close);
        if let Some(previous) = previous {
            if self.page.is_attached(&previous.element) {
                self.page.remove(&previous.element);
            }
        }
        for stray in self.page.query_all(&format!(".{}", ALERT_CLASS)) {
            self.page.remove(&stray);
        }
    }

    fn build(&self, message: &str, severity: Severity) -> Option<P::Element> {
        let class = format!("alert alert-{} {} position-fixed", severity.as_str(), ALERT_CLASS);
        let outer = self.page.append_to_body(
            &NewElement::new("div", &class)
                .attributes(&[("role", "alert"), ("style", ALERT_STYLE)]),
        )?;
        let row = self
            .page
            .append_child(&outer, &NewElement::new("div", "d-flex align-items-center"))?;
        self.page.append_child(&row, &NewElement::new("i", severity.icon()));
        self.page
            .append_child(&row, &NewElement::new("span", "").text(message));
        self.page.append_child(
            &row,
            &NewElement::new("button", "btn-close ms-auto")
                .attributes(&[("type", "button"), ("aria-label", "Fechar")]),
        );
        Some(outer)
    }
}

/// Removes the alert of `generation` if it is still the one on screen.
fn dismiss<P: Page, T: Timers>(
    page: &P,
    slot: &Weak<RefCell<Slot<P, T>>>,
    generation: u64,
) {
    let Some(slot) = slot.upgrade() else {
        return;
    };
    let shown = {
        let mut slot = slot.borrow_mut();
        let on_screen = slot
            .current
            .as_ref()
            .is_some_and(|shown| shown.generation == generation);
        if on_screen {
            slot.current.take()
        } else {
            None
        }
    };
    if let Some(shown) = shown {
        if page.is_attached(&shown.element) {
            page.remove(&shown.element);
        }
    }
}

/// Drops the close listener of `generation`. The close button's own click
/// leaves it in place; the expiry or the next alert frees it.
fn release_close<P: Page, T: Timers>(slot: &Weak<RefCell<Slot<P, T>>>, generation: u64) {
    let Some(slot) = slot.upgrade() else {
        return;
    };
    let close = {
        let mut slot = slot.borrow_mut();
        if slot.generation == generation {
            slot.close.take()
        } else {
            None
        }
    };
    drop(close);
}
