//! Wires every behaviour into the page, once.

use log::debug;

use crate::components::alert::AlertPresenter;
use crate::components::contact_form::ContactFormController;
use crate::components::deep_link::DeepLinkOpener;
use crate::components::entrance;
use crate::components::navbar::NavbarController;
use crate::components::phone_mask;
use crate::components::smooth_scroll::SmoothScroller;
use crate::config::SiteConfig;
use crate::page::{Listen, Page};
use crate::timing::Timers;

pub struct Landing<P: Page, T: Timers> {
    pub opener: DeepLinkOpener<P>,
    pub form: Option<ContactFormController<P, T>>,
}

pub fn install<P: Page, T: Timers>(page: P, timers: T, config: SiteConfig) -> Landing<P, T> {
    let navbar = NavbarController::new(page.clone(), config.navbar_threshold);
    SmoothScroller::new(page.clone(), navbar.clone(), config.anchor_margin).install();

    let animated = entrance::install(&page);
    debug!("{} elements waiting for their entrance", animated);

    let alerts = AlertPresenter::new(page.clone(), timers.clone(), config.alert_timeout_ms);
    let opener = DeepLinkOpener::new(page.clone(), &config);
    let form = ContactFormController::attach(
        page.clone(),
        timers.clone(),
        alerts,
        opener.clone(),
        &config,
    );

    phone_mask::install(&page);
    close_mobile_menu_on_navigation(&page);

    navbar.watch_scroll(timers, config.scroll_throttle_ms);
    navbar.sync();

    Landing { opener, form }
}

/// Collapses the expanded mobile menu when one of its links is followed.
fn close_mobile_menu_on_navigation<P: Page>(page: &P) {
    for link in page.query_all(".navbar-nav .nav-link") {
        let handler_page = page.clone();
        page.listen(
            &link,
            "click",
            Listen::Passive,
            Box::new(move || {
                let expanded = handler_page
                    .query(".navbar-collapse")
                    .is_some_and(|menu| handler_page.has_class(&menu, "show"));
                if !expanded {
                    return;
                }
                if let Some(toggler) = handler_page.query(".navbar-toggler") {
                    handler_page.click(&toggler);
                }
            }),
        );
    }
}
