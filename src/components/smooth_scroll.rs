use crate::components::navbar::NavbarController;
use crate::page::{Listen, Page};

pub const ANCHOR_SELECTOR: &str = "a[href^=\"#\"]";

/// Element id named by an in-page `href`, if any.
pub fn fragment_id(href: &str) -> Option<&str> {
    href.strip_prefix('#').filter(|id| !id.is_empty())
}

pub fn scroll_destination(target_top: f64, navbar_height: f64, margin: f64) -> f64 {
    target_top - navbar_height - margin
}

pub struct SmoothScroller<P: Page> {
    page: P,
    navbar: NavbarController<P>,
    margin: f64,
}

impl<P: Page> Clone for SmoothScroller<P> {
    fn clone(&self) -> Self {
        Self {
            page: self.page.clone(),
            navbar: self.navbar.clone(),
            margin: self.margin,
        }
    }
}

impl<P: Page> SmoothScroller<P> {
    pub fn new(page: P, navbar: NavbarController<P>, margin: f64) -> Self {
        Self {
            page,
            navbar,
            margin,
        }
    }

    /// Intercepts every in-page anchor on the page.
    pub fn install(&self) {
        for anchor in self.page.query_all(ANCHOR_SELECTOR) {
            let scroller = self.clone();
            let target = anchor.clone();
            self.page.listen(
                &anchor,
                "click",
                Listen::Intercept,
                Box::new(move || {
                    if let Some(href) = scroller.page.attribute(&target, "href") {
                        scroller.scroll_to_fragment(&href);
                    }
                }),
            );
        }
    }

    /// Returns whether a target was found; a miss leaves the page untouched.
    pub fn scroll_to_fragment(&self, href: &str) -> bool {
        let Some(target) = fragment_id(href).and_then(|id| self.page.by_id(id)) else {
            return false;
        };
        let top = scroll_destination(self.page.document_top(&target), self.navbar.height(), self.margin);
        self.page.smooth_scroll_to(top);
        true
    }
}
