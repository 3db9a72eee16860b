use gloo_timers::callback::Timeout;
use log::{debug, info, warn};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::js_sys::{Array, Date, Function, Reflect};
use web_sys::{
    Document, Element, Event, HtmlElement, HtmlFormElement, HtmlInputElement,
    HtmlSelectElement, HtmlTextAreaElement, IntersectionObserver, IntersectionObserverEntry,
    EventTarget, IntersectionObserverInit, ScrollBehavior, ScrollToOptions, Window,
};

use crate::components::deep_link::{message_or_greeting, DeepLinkOpener};
use crate::components::share;
use crate::config::SiteConfig;
use crate::error::{LandingError, Result};
use crate::landing;
use crate::page::{Handler, Intersection, IntersectionHandler, Listen, NewElement, ObserverOptions, Page};
use crate::timing::Timers;

#[derive(Clone)]
pub struct BrowserPage {
    window: Window,
    document: Document,
}

impl BrowserPage {
    pub fn new() -> Result<Self> {
        let window = web_sys::window().ok_or(LandingError::NoWindow)?;
        let document = window.document().ok_or(LandingError::NoDocument)?;
        Ok(Self { window, document })
    }

    fn build(&self, spec: &NewElement<'_>) -> Result<Element> {
        let element = self.document.create_element(spec.tag)?;
        if !spec.class.is_empty() {
            element.set_class_name(spec.class);
        }
        for (name, value) in spec.attributes {
            element.set_attribute(name, value)?;
        }
        if let Some(text) = spec.text {
            element.set_text_content(Some(text));
        }
        Ok(element)
    }

    fn append(&self, parent: &Element, spec: &NewElement<'_>) -> Result<Element> {
        let element = self.build(spec)?;
        parent.append_child(&element)?;
        Ok(element)
    }

    fn register(
        target: &EventTarget,
        event: &str,
        mode: Listen,
        mut handler: Handler,
    ) -> Result<Closure<dyn FnMut(Event)>> {
        let callback = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            if mode == Listen::Intercept {
                event.prevent_default();
            }
            handler();
        });
        target.add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())?;
        Ok(callback)
    }

    fn listen_on(&self, target: &EventTarget, event: &str, mode: Listen, handler: Handler) {
        match Self::register(target, event, mode, handler) {
            // listeners live as long as the page
            Ok(callback) => callback.forget(),
            Err(e) => warn!("could not listen for {}: {}", event, e),
        }
    }
}

/// Event listener removed from its target on drop.
pub struct BrowserListener {
    target: EventTarget,
    event: &'static str,
    callback: Closure<dyn FnMut(Event)>,
}

impl Drop for BrowserListener {
    fn drop(&mut self) {
        let removed = self
            .target
            .remove_event_listener_with_callback(self.event, self.callback.as_ref().unchecked_ref());
        logged("removeEventListener", removed);
    }
}

fn logged<T>(what: &str, result: std::result::Result<T, JsValue>) {
    if let Err(e) = result {
        debug!("{} failed: {}", what, LandingError::from(e));
    }
}

impl Page for BrowserPage {
    type Element = Element;
    type Listener = BrowserListener;

    fn by_id(&self, id: &str) -> Option<Element> {
        self.document.get_element_by_id(id)
    }

    fn query(&self, selector: &str) -> Option<Element> {
        self.document.query_selector(selector).ok().flatten()
    }

    fn query_all(&self, selector: &str) -> Vec<Element> {
        match self.document.query_selector_all(selector) {
            Ok(list) => (0..list.length())
                .filter_map(|i| list.item(i))
                .filter_map(|node| node.dyn_into::<Element>().ok())
                .collect(),
            Err(e) => {
                warn!("bad selector {}: {}", selector, LandingError::from(e));
                Vec::new()
            }
        }
    }

    fn query_in(&self, parent: &Element, selector: &str) -> Option<Element> {
        parent.query_selector(selector).ok().flatten()
    }

    fn attribute(&self, element: &Element, name: &str) -> Option<String> {
        element.get_attribute(name)
    }

    fn text(&self, element: &Element) -> String {
        element.text_content().unwrap_or_default()
    }

    fn has_class(&self, element: &Element, class: &str) -> bool {
        element.class_list().contains(class)
    }

    fn add_class(&self, element: &Element, class: &str) {
        logged("classList.add", element.class_list().add_1(class));
    }

    fn remove_class(&self, element: &Element, class: &str) {
        logged("classList.remove", element.class_list().remove_1(class));
    }

    fn value(&self, element: &Element) -> String {
        if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
            input.value()
        } else if let Some(select) = element.dyn_ref::<HtmlSelectElement>() {
            select.value()
        } else if let Some(area) = element.dyn_ref::<HtmlTextAreaElement>() {
            area.value()
        } else {
            String::new()
        }
    }

    fn set_value(&self, element: &Element, value: &str) {
        if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
            input.set_value(value);
        } else if let Some(select) = element.dyn_ref::<HtmlSelectElement>() {
            select.set_value(value);
        } else if let Some(area) = element.dyn_ref::<HtmlTextAreaElement>() {
            area.set_value(value);
        }
    }

    fn set_html(&self, element: &Element, html: &str) {
        element.set_inner_html(html);
    }

    fn set_disabled(&self, element: &Element, disabled: bool) {
        if disabled {
            logged("setAttribute(disabled)", element.set_attribute("disabled", ""));
        } else {
            logged("removeAttribute(disabled)", element.remove_attribute("disabled"));
        }
    }

    fn reset_form(&self, form: &Element) {
        match form.dyn_ref::<HtmlFormElement>() {
            Some(form) => form.reset(),
            None => warn!("{}", LandingError::WrongElement("form")),
        }
    }

    fn click(&self, element: &Element) {
        if let Some(element) = element.dyn_ref::<HtmlElement>() {
            element.click();
        }
    }

    fn append_to_body(&self, spec: &NewElement<'_>) -> Option<Element> {
        let result = self
            .document
            .body()
            .ok_or(LandingError::NoBody)
            .and_then(|body| self.append(&body, spec));
        result
            .map_err(|e| warn!("could not add <{}>: {}", spec.tag, e))
            .ok()
    }

    fn append_child(&self, parent: &Element, spec: &NewElement<'_>) -> Option<Element> {
        self.append(parent, spec)
            .map_err(|e| warn!("could not add <{}>: {}", spec.tag, e))
            .ok()
    }

    fn remove(&self, element: &Element) {
        element.remove();
    }

    fn is_attached(&self, element: &Element) -> bool {
        element.is_connected()
    }

    fn document_top(&self, element: &Element) -> f64 {
        element.get_bounding_client_rect().top() + self.scroll_y()
    }

    fn height(&self, element: &Element) -> f64 {
        match element.dyn_ref::<HtmlElement>() {
            Some(element) => f64::from(element.offset_height()),
            None => element.get_bounding_client_rect().height(),
        }
    }

    fn scroll_y(&self) -> f64 {
        self.window.scroll_y().unwrap_or(0.0)
    }

    fn smooth_scroll_to(&self, top: f64) {
        let options = ScrollToOptions::new();
        options.set_top(top);
        options.set_behavior(ScrollBehavior::Smooth);
        self.window.scroll_to_with_scroll_to_options(&options);
    }

    fn open_new_context(&self, url: &str) {
        // a blocked popup comes back as Ok(None); nothing to report either way
        logged("window.open", self.window.open_with_url_and_target(url, "_blank"));
    }

    fn listen(&self, target: &Element, event: &'static str, mode: Listen, handler: Handler) {
        self.listen_on(target, event, mode, handler);
    }

    fn listen_scoped(&self, target: &Element, event: &'static str, handler: Handler) -> Option<BrowserListener> {
        let target: EventTarget = target.clone().into();
        match Self::register(&target, event, Listen::Passive, handler) {
            Ok(callback) => Some(BrowserListener {
                target,
                event,
                callback,
            }),
            Err(e) => {
                warn!("could not listen for {}: {}", event, e);
                None
            }
        }
    }

    fn listen_scroll(&self, handler: Handler) {
        self.listen_on(&self.window, "scroll", Listen::Passive, handler);
    }

    fn watch_intersections(
        &self,
        options: &ObserverOptions,
        targets: &[Element],
        mut handler: IntersectionHandler<Element>,
    ) {
        let callback = Closure::<dyn FnMut(Array, IntersectionObserver)>::new(
            move |entries: Array, observer: IntersectionObserver| {
                let batch = entries
                    .iter()
                    .filter_map(|entry| entry.dyn_into::<IntersectionObserverEntry>().ok())
                    .map(|entry| Intersection {
                        target: entry.target(),
                        intersecting: entry.is_intersecting(),
                    })
                    .collect();
                for done in handler(batch) {
                    observer.unobserve(&done);
                }
            },
        );

        let init = IntersectionObserverInit::new();
        init.set_threshold(&JsValue::from_f64(options.threshold));
        init.set_root_margin(options.root_margin);

        match IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &init) {
            Ok(observer) => {
                for target in targets {
                    observer.observe(target);
                }
                callback.forget();
            }
            Err(e) => warn!("entrance animations disabled: {}", LandingError::from(e)),
        }
    }
}

#[derive(Clone, Copy, Default)]
pub struct BrowserTimers;

impl Timers for BrowserTimers {
    type Pending = Timeout;

    fn now(&self) -> f64 {
        Date::now()
    }

    fn schedule(&self, millis: u32, callback: Box<dyn FnOnce()>) -> Timeout {
        Timeout::new(millis, callback)
    }
}

/// Runs the landing behaviours once the document has been parsed.
pub fn boot() -> Result<()> {
    let page = BrowserPage::new()?;
    if is_parsed(&page.document.ready_state()) {
        start(page);
        return Ok(());
    }

    let ready_page = page.clone();
    let on_ready: Closure<dyn FnMut()> = Closure::once(move || start(ready_page));
    page.document
        .add_event_listener_with_callback("DOMContentLoaded", on_ready.as_ref().unchecked_ref())?;
    on_ready.forget();
    Ok(())
}

/// `document.readyState` moves from `loading` to `interactive` once parsing ends.
fn is_parsed(ready_state: &str) -> bool {
    ready_state != "loading"
}

fn start(page: BrowserPage) {
    let config = SiteConfig::load(&page);
    let landing = landing::install(page.clone(), BrowserTimers, config.clone());
    if landing.form.is_none() {
        info!("no contact form on this page");
    }
    init_tooltips(&page);
    if let Err(e) = install_globals(&page, landing.opener.clone(), config) {
        warn!("page-level helpers unavailable: {}", e);
    }
    info!("Prisma Avaliações - behaviours loaded");
}

/// Exposes `openWhatsApp` and `sharePage` for inline `onclick` handlers.
fn install_globals(page: &BrowserPage, opener: DeepLinkOpener<BrowserPage>, config: SiteConfig) -> Result<()> {
    let greeting_config = config.clone();
    let open_whatsapp = Closure::<dyn Fn(JsValue)>::new(move |message: JsValue| {
        opener.open(&message_or_greeting(message.as_string(), &greeting_config));
    });
    Reflect::set(
        &page.window,
        &JsValue::from_str("openWhatsApp"),
        open_whatsapp.as_ref().unchecked_ref(),
    )?;
    open_whatsapp.forget();

    let share_page = Closure::<dyn Fn()>::new(move || {
        if let Err(e) = share::share_page(&config) {
            warn!("sharing failed: {}", e);
        }
    });
    Reflect::set(
        &page.window,
        &JsValue::from_str("sharePage"),
        share_page.as_ref().unchecked_ref(),
    )?;
    share_page.forget();
    Ok(())
}

/// Bootstrap tooltips, when the page ships Bootstrap's bundle.
fn init_tooltips(page: &BrowserPage) {
    let targets = page.query_all("[data-bs-toggle=\"tooltip\"]");
    if targets.is_empty() {
        return;
    }
    let result: Result<usize> = (|| {
        let bootstrap = Reflect::get(&page.window, &JsValue::from_str("bootstrap"))?;
        if bootstrap.is_undefined() {
            return Ok(0);
        }
        let tooltip: Function = Reflect::get(&bootstrap, &JsValue::from_str("Tooltip"))?.dyn_into()?;
        for target in &targets {
            Reflect::construct(&tooltip, &Array::of1(target))?;
        }
        Ok(targets.len())
    })();
    match result {
        Ok(count) => debug!("{} tooltips ready", count),
        Err(e) => warn!("tooltips not initialised: {}", e),
    }
}
