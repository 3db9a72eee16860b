//! The slice of the hosting document the landing behaviours touch.
//!
//! Every lookup returns `Option`: a missing element is a normal outcome on a
//! page that only carries some of the sections, and callers turn it into a
//! no-op. The browser implementation lives in `browser.rs`; tests drive the
//! same components through `testing::FakePage`.

/// Whether a listener suppresses the event's default action before running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Listen {
    Passive,
    Intercept,
}

/// Description of an element to create and append.
#[derive(Debug, Clone, Copy)]
pub struct NewElement<'a> {
    pub tag: &'a str,
    pub class: &'a str,
    pub text: Option<&'a str>,
    pub attributes: &'a [(&'a str, &'a str)],
}

impl<'a> NewElement<'a> {
    pub fn new(tag: &'a str, class: &'a str) -> Self {
        Self {
            tag,
            class,
            text: None,
            attributes: &[],
        }
    }

    pub fn text(mut self, text: &'a str) -> Self {
        self.text = Some(text);
        self
    }

    pub fn attributes(mut self, attributes: &'a [(&'a str, &'a str)]) -> Self {
        self.attributes = attributes;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObserverOptions {
    pub threshold: f64,
    pub root_margin: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Intersection<E> {
    pub target: E,
    pub intersecting: bool,
}

pub type Handler = Box<dyn FnMut()>;

/// Receives a batch of intersection entries and returns the targets that
/// should no longer be observed.
pub type IntersectionHandler<E> = Box<dyn FnMut(Vec<Intersection<E>>) -> Vec<E>>;

pub trait Page: Clone + 'static {
    type Element: Clone + PartialEq + 'static;
    /// A registered listener. Dropping it unregisters the handler.
    type Listener: 'static;

    fn by_id(&self, id: &str) -> Option<Self::Element>;
    fn query(&self, selector: &str) -> Option<Self::Element>;
    fn query_all(&self, selector: &str) -> Vec<Self::Element>;
    fn query_in(&self, parent: &Self::Element, selector: &str) -> Option<Self::Element>;

    fn attribute(&self, element: &Self::Element, name: &str) -> Option<String>;
    fn text(&self, element: &Self::Element) -> String;
    fn has_class(&self, element: &Self::Element, class: &str) -> bool;
    fn add_class(&self, element: &Self::Element, class: &str);
    fn remove_class(&self, element: &Self::Element, class: &str);

    /// Current value of an input, select or textarea; empty for anything else.
    fn value(&self, element: &Self::Element) -> String;
    fn set_value(&self, element: &Self::Element, value: &str);
    fn set_html(&self, element: &Self::Element, html: &str);
    fn set_disabled(&self, element: &Self::Element, disabled: bool);
    fn reset_form(&self, form: &Self::Element);
    fn click(&self, element: &Self::Element);

    fn append_to_body(&self, spec: &NewElement<'_>) -> Option<Self::Element>;
    fn append_child(&self, parent: &Self::Element, spec: &NewElement<'_>) -> Option<Self::Element>;
    fn remove(&self, element: &Self::Element);
    fn is_attached(&self, element: &Self::Element) -> bool;

    /// Top edge of the element relative to the document, not the viewport.
    fn document_top(&self, element: &Self::Element) -> f64;
    fn height(&self, element: &Self::Element) -> f64;
    fn scroll_y(&self) -> f64;
    fn smooth_scroll_to(&self, top: f64);

    /// Opens `url` in a new browsing context. Blocked popups are not reported.
    fn open_new_context(&self, url: &str);

    fn listen(&self, target: &Self::Element, event: &'static str, mode: Listen, handler: Handler);
    /// Like `listen`, for elements that come and go. Must not be dropped
    /// from inside its own handler.
    fn listen_scoped(
        &self,
        target: &Self::Element,
        event: &'static str,
        handler: Handler,
    ) -> Option<Self::Listener>;
    fn listen_scroll(&self, handler: Handler);
    fn watch_intersections(
        &self,
        options: &ObserverOptions,
        targets: &[Self::Element],
        handler: IntersectionHandler<Self::Element>,
    );
}
