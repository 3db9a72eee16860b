use log::{debug, warn};
use serde::Serialize;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::js_sys::{Function, Promise, Reflect};
use web_sys::{Navigator, Window};

use crate::config::SiteConfig;
use crate::error::{LandingError, Result};

pub const COPIED_NOTICE: &str = "Link copiado para a área de transferência!";

/// Payload for `navigator.share`.
#[derive(Debug, Serialize, PartialEq)]
pub struct ShareRequest<'a> {
    pub title: &'a str,
    pub text: &'a str,
    pub url: &'a str,
}

impl<'a> ShareRequest<'a> {
    pub fn new(config: &'a SiteConfig, url: &'a str) -> Self {
        Self {
            title: &config.share_title,
            text: &config.share_text,
            url,
        }
    }
}

/// Shares the current page through the platform share sheet, or copies its
/// address to the clipboard where there is none.
pub fn share_page(config: &SiteConfig) -> Result<()> {
    let window = web_sys::window().ok_or(LandingError::NoWindow)?;
    let url = window.location().href()?;
    let navigator = window.navigator();

    let share = Reflect::get(&navigator, &JsValue::from_str("share"))?;
    match share.dyn_ref::<Function>() {
        Some(share) => {
            let data = serde_wasm_bindgen::to_value(&ShareRequest::new(config, &url))?;
            let promise: Promise = share.call1(&navigator, &data)?.dyn_into()?;
            spawn_local(async move {
                if let Err(e) = JsFuture::from(promise).await {
                    debug!("share sheet closed without sharing: {:?}", e);
                }
            });
            Ok(())
        }
        None => copy_link(window, &navigator, url),
    }
}

fn copy_link(window: Window, navigator: &Navigator, url: String) -> Result<()> {
    let clipboard = Reflect::get(navigator, &JsValue::from_str("clipboard"))?;
    if clipboard.is_undefined() {
        return Err(LandingError::Js("clipboard API unavailable".to_string()));
    }
    let write_text: Function = Reflect::get(&clipboard, &JsValue::from_str("writeText"))?.dyn_into()?;
    let promise: Promise = write_text
        .call1(&clipboard, &JsValue::from_str(&url))?
        .dyn_into()?;
    spawn_local(async move {
        match JsFuture::from(promise).await {
            Ok(_) => {
                let _ = window.alert_with_message(COPIED_NOTICE);
            }
            // no user-facing fallback when the copy is refused
            Err(e) => warn!("clipboard write rejected: {:?}", e),
        }
    });
    Ok(())
}
