use log::{error, info};

mod browser;
mod config;
mod error;
mod landing;
mod page;
mod timing;
mod components {
    pub mod alert;
    pub mod contact_form;
    pub mod deep_link;
    pub mod entrance;
    pub mod navbar;
    pub mod phone_mask;
    pub mod share;
    pub mod smooth_scroll;
}
#[cfg(test)]
mod testing;

fn main() {
    // Initialize console error panic hook for better error messages
    console_error_panic_hook::set_once();

    console_log::init_with_level(config::log_level()).expect("error initializing log");

    info!("Starting landing page behaviours");
    if let Err(e) = browser::boot() {
        error!("landing behaviours not started: {}", e);
    }
}
