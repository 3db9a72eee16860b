use std::cell::RefCell;
use std::rc::Rc;

use log::warn;

use crate::page::{Listen, NewElement, Page};
use crate::timing::{Debounce, Throttle, Timers};

pub const NAVBAR_SELECTOR: &str = ".navbar";
pub const SCROLLED_CLASS: &str = "scrolled";
pub const VISIBLE_CLASS: &str = "visible";

pub fn is_scrolled(offset: f64, threshold: f64) -> bool {
    offset > threshold
}

/// Fixed navbar plus the floating scroll-to-top button it drives.
pub struct NavbarController<P: Page> {
    page: P,
    navbar: Option<P::Element>,
    to_top: Option<P::Element>,
    threshold: f64,
}

impl<P: Page> Clone for NavbarController<P> {
    fn clone(&self) -> Self {
        Self {
            page: self.page.clone(),
            navbar: self.navbar.clone(),
            to_top: self.to_top.clone(),
            threshold: self.threshold,
        }
    }
}

impl<P: Page> NavbarController<P> {
    pub fn new(page: P, threshold: f64) -> Self {
        let navbar = page.query(NAVBAR_SELECTOR);
        if navbar.is_none() {
            warn!("no {} on this page", NAVBAR_SELECTOR);
        }
        let to_top = create_scroll_to_top(&page);
        Self {
            page,
            navbar,
            to_top,
            threshold,
        }
    }

    pub fn height(&self) -> f64 {
        self.navbar
            .as_ref()
            .map(|navbar| self.page.height(navbar))
            .unwrap_or(0.0)
    }

    pub fn sync(&self) {
        let scrolled = is_scrolled(self.page.scroll_y(), self.threshold);
        let targets = [
            (self.navbar.as_ref(), SCROLLED_CLASS),
            (self.to_top.as_ref(), VISIBLE_CLASS),
        ];
        for (element, class) in targets {
            let Some(element) = element else { continue };
            if scrolled {
                self.page.add_class(element, class);
            } else {
                self.page.remove_class(element, class);
            }
        }
    }

    /// Syncs on scroll at most once per window, plus once more after the
    /// scrolling stops so the resting position always wins.
    pub fn watch_scroll<T: Timers>(&self, timers: T, window_ms: u32) {
        let navbar = self.clone();
        // the trailing sync counts against the same window as the leading one
        let throttle = Rc::new(RefCell::new(Throttle::new(window_ms)));
        let mut trailing = Debounce::new(timers.clone(), window_ms);
        self.page.listen_scroll(Box::new(move || {
            if throttle.borrow_mut().admit(timers.now()) {
                navbar.sync();
            }
            let navbar = navbar.clone();
            let throttle = throttle.clone();
            let clock = timers.clone();
            trailing.call(move || {
                throttle.borrow_mut().mark(clock.now());
                navbar.sync();
            });
        }));
    }
}

fn create_scroll_to_top<P: Page>(page: &P) -> Option<P::Element> {
    let button = page.append_to_body(
        &NewElement::new("button", "scroll-to-top")
            .attributes(&[("type", "button"), ("aria-label", "Voltar ao topo")]),
    )?;
    page.append_child(&button, &NewElement::new("i", "fas fa-chevron-up"));
    let handler_page = page.clone();
    page.listen(
        &button,
        "click",
        Listen::Passive,
        Box::new(move || handler_page.smooth_scroll_to(0.0)),
    );
    Some(button)
}
