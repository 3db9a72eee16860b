//! In-memory page and manual clock used by the unit tests.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use crate::page::{
    Handler, Intersection, IntersectionHandler, Listen, NewElement, ObserverOptions, Page,
};
use crate::timing::Timers;

pub type NodeId = usize;

#[derive(Default)]
struct Node {
    tag: String,
    id: Option<String>,
    classes: Vec<String>,
    attributes: BTreeMap<String, String>,
    value: String,
    text: String,
    html: String,
    disabled: bool,
    removed: bool,
    parent: Option<NodeId>,
    top: f64,
    height: f64,
}

impl Node {
    fn matches_attribute(&self, spec: &str) -> bool {
        let unquote = |v: &str| v.trim_matches(|c| c == '"' || c == '\'').to_string();
        if let Some((name, prefix)) = spec.split_once("^=") {
            self.attributes
                .get(name)
                .is_some_and(|v| v.starts_with(&unquote(prefix)))
        } else if let Some((name, value)) = spec.split_once('=') {
            self.attributes.get(name) == Some(&unquote(value))
        } else {
            self.attributes.contains_key(spec)
        }
    }
}

struct Listener {
    id: u64,
    target: NodeId,
    event: &'static str,
    mode: Listen,
    handler: Rc<RefCell<Handler>>,
}

struct Observer {
    options: ObserverOptions,
    observed: Vec<NodeId>,
    handler: Rc<RefCell<IntersectionHandler<NodeId>>>,
}

#[derive(Default)]
struct Dom {
    nodes: Vec<Node>,
    scroll_y: f64,
    scrolls: Vec<f64>,
    opened: Vec<String>,
    resets: Vec<NodeId>,
    clicks: Vec<NodeId>,
    listeners: Vec<Listener>,
    next_listener: u64,
    scroll_listeners: Vec<Rc<RefCell<Handler>>>,
    observers: Vec<Observer>,
}

impl Dom {
    fn attached(&self, mut id: NodeId) -> bool {
        loop {
            let node = &self.nodes[id];
            if node.removed {
                return false;
            }
            match node.parent {
                Some(parent) => id = parent,
                None => return true,
            }
        }
    }

    fn descends_from(&self, id: NodeId, ancestor: NodeId) -> bool {
        let mut cursor = self.nodes[id].parent;
        while let Some(parent) = cursor {
            if parent == ancestor {
                return true;
            }
            cursor = self.nodes[parent].parent;
        }
        false
    }

    fn matches(&self, id: NodeId, selector: &str) -> bool {
        selector.split(',').any(|alternative| {
            let parts: Vec<&str> = alternative.split_whitespace().collect();
            self.matches_chain(id, &parts)
        })
    }

    fn matches_chain(&self, id: NodeId, parts: &[&str]) -> bool {
        let Some((last, mut ancestors)) = parts.split_last() else {
            return false;
        };
        if !self.matches_compound(id, last) {
            return false;
        }
        let mut cursor = self.nodes[id].parent;
        while let Some((wanted, rest)) = ancestors.split_last() {
            loop {
                let Some(parent) = cursor else {
                    return false;
                };
                cursor = self.nodes[parent].parent;
                if self.matches_compound(parent, wanted) {
                    break;
                }
            }
            ancestors = rest;
        }
        true
    }

    fn matches_compound(&self, id: NodeId, compound: &str) -> bool {
        let node = &self.nodes[id];
        let is_marker = |c: char| matches!(c, '.' | '#' | '[');
        let tag_end = compound.find(is_marker).unwrap_or(compound.len());
        let (tag, mut rest) = compound.split_at(tag_end);
        if !tag.is_empty() && tag != node.tag {
            return false;
        }
        while !rest.is_empty() {
            if let Some(attribute) = rest.strip_prefix('[') {
                let Some(end) = attribute.find(']') else {
                    return false;
                };
                if !node.matches_attribute(&attribute[..end]) {
                    return false;
                }
                rest = &attribute[end + 1..];
                continue;
            }
            let marker = rest.as_bytes()[0];
            let body = &rest[1..];
            let end = body.find(is_marker).unwrap_or(body.len());
            let name = &body[..end];
            let found = match marker {
                b'.' => node.classes.iter().any(|c| c == name),
                b'#' => node.id.as_deref() == Some(name),
                _ => false,
            };
            if !found {
                return false;
            }
            rest = &body[end..];
        }
        true
    }

    fn find_all(&self, selector: &str) -> Vec<NodeId> {
        (0..self.nodes.len())
            .filter(|&id| self.attached(id) && self.matches(id, selector))
            .collect()
    }

    fn create(&mut self, parent: Option<NodeId>, spec: &NewElement<'_>) -> NodeId {
        let mut node = Node {
            tag: spec.tag.to_string(),
            classes: spec.class.split_whitespace().map(str::to_string).collect(),
            text: spec.text.unwrap_or_default().to_string(),
            parent,
            ..Node::default()
        };
        for (name, value) in spec.attributes {
            if *name == "id" {
                node.id = Some(value.to_string());
            }
            node.attributes.insert(name.to_string(), value.to_string());
        }
        self.nodes.push(node);
        self.nodes.len() - 1
    }
}

/// A page held entirely in memory. Elements are plain node ids.
#[derive(Clone, Default)]
pub struct FakePage {
    dom: Rc<RefCell<Dom>>,
}

/// Scoped listener on a `FakePage`; dropping it removes the listener.
pub struct FakeListener {
    id: u64,
    dom: Weak<RefCell<Dom>>,
}

impl Drop for FakeListener {
    fn drop(&mut self) {
        if let Some(dom) = self.dom.upgrade() {
            if let Ok(mut dom) = dom.try_borrow_mut() {
                dom.listeners.retain(|l| l.id != self.id);
            }
        }
    }
}

impl FakePage {
    pub fn new() -> Self {
        Self::default()
    }

    fn add_listener(&self, target: NodeId, event: &'static str, mode: Listen, handler: Handler) -> u64 {
        let mut dom = self.dom.borrow_mut();
        dom.next_listener += 1;
        let id = dom.next_listener;
        dom.listeners.push(Listener {
            id,
            target,
            event,
            mode,
            handler: Rc::new(RefCell::new(handler)),
        });
        id
    }

    /// Element listeners currently registered anywhere on the page.
    pub fn listener_count(&self) -> usize {
        self.dom.borrow().listeners.len()
    }

    pub fn add(&self, tag: &str, id: Option<&str>, classes: &[&str]) -> NodeId {
        self.add_node(None, tag, id, classes)
    }

    pub fn add_child(&self, parent: NodeId, tag: &str, id: Option<&str>, classes: &[&str]) -> NodeId {
        self.add_node(Some(parent), tag, id, classes)
    }

    fn add_node(&self, parent: Option<NodeId>, tag: &str, id: Option<&str>, classes: &[&str]) -> NodeId {
        let mut dom = self.dom.borrow_mut();
        let node_id = dom.create(parent, &NewElement::new(tag, &classes.join(" ")));
        let node = &mut dom.nodes[node_id];
        if let Some(id) = id {
            node.id = Some(id.to_string());
            node.attributes.insert("id".to_string(), id.to_string());
        }
        node_id
    }

    pub fn set_attr(&self, node: NodeId, name: &str, value: &str) {
        self.dom.borrow_mut().nodes[node]
            .attributes
            .insert(name.to_string(), value.to_string());
    }

    pub fn set_text(&self, node: NodeId, text: &str) {
        self.dom.borrow_mut().nodes[node].text = text.to_string();
    }

    pub fn place(&self, node: NodeId, top: f64, height: f64) {
        let mut dom = self.dom.borrow_mut();
        dom.nodes[node].top = top;
        dom.nodes[node].height = height;
    }

    pub fn classes(&self, node: NodeId) -> Vec<String> {
        self.dom.borrow().nodes[node].classes.clone()
    }

    pub fn html(&self, node: NodeId) -> String {
        self.dom.borrow().nodes[node].html.clone()
    }

    pub fn is_disabled(&self, node: NodeId) -> bool {
        self.dom.borrow().nodes[node].disabled
    }

    pub fn scrolls(&self) -> Vec<f64> {
        self.dom.borrow().scrolls.clone()
    }

    pub fn opened(&self) -> Vec<String> {
        self.dom.borrow().opened.clone()
    }

    pub fn resets(&self) -> Vec<NodeId> {
        self.dom.borrow().resets.clone()
    }

    pub fn clicks(&self) -> Vec<NodeId> {
        self.dom.borrow().clicks.clone()
    }

    pub fn observed(&self) -> Vec<NodeId> {
        self.dom
            .borrow()
            .observers
            .iter()
            .flat_map(|o| o.observed.iter().copied())
            .collect()
    }

    pub fn observer_options(&self) -> Vec<ObserverOptions> {
        self.dom.borrow().observers.iter().map(|o| o.options).collect()
    }

    /// Dispatches `event` on `node`. Returns whether a listener intercepted it.
    pub fn fire(&self, node: NodeId, event: &str) -> bool {
        let (handlers, intercepted) = {
            let dom = self.dom.borrow();
            let matching: Vec<&Listener> = dom
                .listeners
                .iter()
                .filter(|l| l.target == node && l.event == event)
                .collect();
            let intercepted = matching.iter().any(|l| l.mode == Listen::Intercept);
            let handlers: Vec<_> = matching.iter().map(|l| l.handler.clone()).collect();
            (handlers, intercepted)
        };
        for handler in handlers {
            (handler.borrow_mut())();
        }
        intercepted
    }

    /// Types into a field the way a user would: new value, then `input`.
    pub fn type_into(&self, node: NodeId, value: &str) {
        self.set_value(&node, value);
        self.fire(node, "input");
    }

    /// Moves the viewport and dispatches a scroll event.
    pub fn scroll_window(&self, y: f64) {
        let handlers = {
            let mut dom = self.dom.borrow_mut();
            dom.scroll_y = y;
            dom.scroll_listeners.clone()
        };
        for handler in handlers {
            (handler.borrow_mut())();
        }
    }

    /// Delivers one intersection batch to every observer watching the nodes.
    pub fn intersect(&self, entries: &[(NodeId, bool)]) {
        let count = self.dom.borrow().observers.len();
        for index in 0..count {
            let (batch, handler) = {
                let dom = self.dom.borrow();
                let observer = &dom.observers[index];
                let batch: Vec<Intersection<NodeId>> = entries
                    .iter()
                    .filter(|(node, _)| observer.observed.contains(node))
                    .map(|&(target, intersecting)| Intersection {
                        target,
                        intersecting,
                    })
                    .collect();
                (batch, observer.handler.clone())
            };
            if batch.is_empty() {
                continue;
            }
            let done = (handler.borrow_mut())(batch);
            self.dom.borrow_mut().observers[index]
                .observed
                .retain(|node| !done.contains(node));
        }
    }
}

impl Page for FakePage {
    type Element = NodeId;
    type Listener = FakeListener;

    fn by_id(&self, id: &str) -> Option<NodeId> {
        let dom = self.dom.borrow();
        (0..dom.nodes.len()).find(|&n| dom.attached(n) && dom.nodes[n].id.as_deref() == Some(id))
    }

    fn query(&self, selector: &str) -> Option<NodeId> {
        self.dom.borrow().find_all(selector).into_iter().next()
    }

    fn query_all(&self, selector: &str) -> Vec<NodeId> {
        self.dom.borrow().find_all(selector)
    }

    fn query_in(&self, parent: &NodeId, selector: &str) -> Option<NodeId> {
        let dom = self.dom.borrow();
        dom.find_all(selector)
            .into_iter()
            .find(|&n| dom.descends_from(n, *parent))
    }

    fn attribute(&self, element: &NodeId, name: &str) -> Option<String> {
        self.dom.borrow().nodes[*element].attributes.get(name).cloned()
    }

    fn text(&self, element: &NodeId) -> String {
        self.dom.borrow().nodes[*element].text.clone()
    }

    fn has_class(&self, element: &NodeId, class: &str) -> bool {
        self.dom.borrow().nodes[*element].classes.iter().any(|c| c == class)
    }

    fn add_class(&self, element: &NodeId, class: &str) {
        let mut dom = self.dom.borrow_mut();
        let classes = &mut dom.nodes[*element].classes;
        if !classes.iter().any(|c| c == class) {
            classes.push(class.to_string());
        }
    }

    fn remove_class(&self, element: &NodeId, class: &str) {
        self.dom.borrow_mut().nodes[*element]
            .classes
            .retain(|c| c != class);
    }

    fn value(&self, element: &NodeId) -> String {
        self.dom.borrow().nodes[*element].value.clone()
    }

    fn set_value(&self, element: &NodeId, value: &str) {
        self.dom.borrow_mut().nodes[*element].value = value.to_string();
    }

    fn set_html(&self, element: &NodeId, html: &str) {
        self.dom.borrow_mut().nodes[*element].html = html.to_string();
    }

    fn set_disabled(&self, element: &NodeId, disabled: bool) {
        self.dom.borrow_mut().nodes[*element].disabled = disabled;
    }

    fn reset_form(&self, form: &NodeId) {
        let mut dom = self.dom.borrow_mut();
        dom.resets.push(*form);
        for id in 0..dom.nodes.len() {
            if dom.descends_from(id, *form) {
                dom.nodes[id].value.clear();
            }
        }
    }

    fn click(&self, element: &NodeId) {
        self.dom.borrow_mut().clicks.push(*element);
        self.fire(*element, "click");
    }

    fn append_to_body(&self, spec: &NewElement<'_>) -> Option<NodeId> {
        Some(self.dom.borrow_mut().create(None, spec))
    }

    fn append_child(&self, parent: &NodeId, spec: &NewElement<'_>) -> Option<NodeId> {
        Some(self.dom.borrow_mut().create(Some(*parent), spec))
    }

    fn remove(&self, element: &NodeId) {
        self.dom.borrow_mut().nodes[*element].removed = true;
    }

    fn is_attached(&self, element: &NodeId) -> bool {
        self.dom.borrow().attached(*element)
    }

    fn document_top(&self, element: &NodeId) -> f64 {
        self.dom.borrow().nodes[*element].top
    }

    fn height(&self, element: &NodeId) -> f64 {
        self.dom.borrow().nodes[*element].height
    }

    fn scroll_y(&self) -> f64 {
        self.dom.borrow().scroll_y
    }

    fn smooth_scroll_to(&self, top: f64) {
        let mut dom = self.dom.borrow_mut();
        dom.scrolls.push(top);
        dom.scroll_y = top;
    }

    fn open_new_context(&self, url: &str) {
        self.dom.borrow_mut().opened.push(url.to_string());
    }

    fn listen(&self, target: &NodeId, event: &'static str, mode: Listen, handler: Handler) {
        self.add_listener(*target, event, mode, handler);
    }

    fn listen_scoped(&self, target: &NodeId, event: &'static str, handler: Handler) -> Option<FakeListener> {
        let id = self.add_listener(*target, event, Listen::Passive, handler);
        Some(FakeListener {
            id,
            dom: Rc::downgrade(&self.dom),
        })
    }

    fn listen_scroll(&self, handler: Handler) {
        self.dom
            .borrow_mut()
            .scroll_listeners
            .push(Rc::new(RefCell::new(handler)));
    }

    fn watch_intersections(
        &self,
        options: &ObserverOptions,
        targets: &[NodeId],
        handler: IntersectionHandler<NodeId>,
    ) {
        self.dom.borrow_mut().observers.push(Observer {
            options: *options,
            observed: targets.to_vec(),
            handler: Rc::new(RefCell::new(handler)),
        });
    }
}

#[derive(Default)]
struct Queue {
    now: f64,
    next_id: u64,
    entries: Vec<(f64, u64, Box<dyn FnOnce()>)>,
}

/// Virtual clock. Nothing fires until `advance` is called.
#[derive(Clone, Default)]
pub struct ManualTimers {
    queue: Rc<RefCell<Queue>>,
}

pub struct ManualPending {
    id: u64,
    queue: Weak<RefCell<Queue>>,
}

impl Drop for ManualPending {
    fn drop(&mut self) {
        if let Some(queue) = self.queue.upgrade() {
            if let Ok(mut queue) = queue.try_borrow_mut() {
                queue.entries.retain(|(_, id, _)| *id != self.id);
            }
        }
    }
}

impl ManualTimers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.queue.borrow().entries.len()
    }

    /// Moves the clock forward, firing due callbacks in deadline order.
    pub fn advance(&self, millis: u32) {
        let target = self.queue.borrow().now + f64::from(millis);
        loop {
            let next = {
                let mut queue = self.queue.borrow_mut();
                let due = queue
                    .entries
                    .iter()
                    .enumerate()
                    .filter(|(_, (at, _, _))| *at <= target)
                    .min_by(|(_, a), (_, b)| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)))
                    .map(|(index, _)| index);
                match due {
                    Some(index) => {
                        let (at, _, callback) = queue.entries.remove(index);
                        queue.now = at;
                        Some(callback)
                    }
                    None => {
                        queue.now = target;
                        None
                    }
                }
            };
            match next {
                Some(callback) => callback(),
                None => break,
            }
        }
    }
}

impl Timers for ManualTimers {
    type Pending = ManualPending;

    fn now(&self) -> f64 {
        self.queue.borrow().now
    }

    fn schedule(&self, millis: u32, callback: Box<dyn FnOnce()>) -> ManualPending {
        let mut queue = self.queue.borrow_mut();
        let id = queue.next_id;
        queue.next_id += 1;
        let at = queue.now + f64::from(millis);
        queue.entries.push((at, id, callback));
        ManualPending {
            id,
            queue: Rc::downgrade(&self.queue),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selectors_cover_the_shapes_the_page_uses() {
        let page = FakePage::new();
        let nav = page.add("ul", None, &["navbar-nav"]);
        let link = page.add_child(nav, "a", None, &["nav-link"]);
        page.set_attr(link, "href", "#contato");
        let stray = page.add("a", None, &["nav-link"]);
        page.set_attr(stray, "href", "https://example.com");
        let card = page.add("div", None, &["card", "shadow"]);

        assert_eq!(page.query_all(".navbar-nav .nav-link"), vec![link]);
        assert_eq!(page.query_all("a[href^=\"#\"]"), vec![link]);
        assert_eq!(page.query_all(".card, .stat-item"), vec![card]);
        assert_eq!(page.query("#missing"), None);
    }

    #[test]
    fn removed_parents_detach_children() {
        let page = FakePage::new();
        let outer = page.add("div", None, &[]);
        let inner = page.add_child(outer, "button", None, &["btn-close"]);
        assert!(page.is_attached(&inner));
        page.remove(&outer);
        assert!(!page.is_attached(&inner));
        assert!(page.query(".btn-close").is_none());
    }

    #[test]
    fn timers_fire_in_deadline_order() {
        let timers = ManualTimers::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        for (delay, name) in [(30, "c"), (10, "a"), (20, "b")] {
            let log = log.clone();
            std::mem::forget(timers.schedule(delay, Box::new(move || log.borrow_mut().push(name))));
        }
        timers.advance(25);
        assert_eq!(*log.borrow(), vec!["a", "b"]);
        timers.advance(5);
        assert_eq!(*log.borrow(), vec!["a", "b", "c"]);
        assert_eq!(timers.now(), 30.0);
    }
}
