use log::debug;

use crate::config::SiteConfig;
use crate::page::Page;

pub fn deep_link_url(base_url: &str, recipient: &str, message: &str) -> String {
    format!(
        "{}/{}?text={}",
        base_url.trim_end_matches('/'),
        recipient,
        urlencoding::encode(message)
    )
}

/// `message` when it has content, the configured greeting otherwise.
pub fn message_or_greeting(message: Option<String>, config: &SiteConfig) -> String {
    match message {
        Some(message) if !message.is_empty() => message,
        _ => config.default_greeting.clone(),
    }
}

/// Opens the messaging app on a chat with the site's number.
#[derive(Clone)]
pub struct DeepLinkOpener<P: Page> {
    page: P,
    base_url: String,
    recipient: String,
}

impl<P: Page> DeepLinkOpener<P> {
    pub fn new(page: P, config: &SiteConfig) -> Self {
        Self {
            page,
            base_url: config.messaging_base_url.clone(),
            recipient: config.whatsapp_number.clone(),
        }
    }

    pub fn url_for(&self, message: &str) -> String {
        deep_link_url(&self.base_url, &self.recipient, message)
    }

    pub fn open(&self, message: &str) {
        let url = self.url_for(message);
        debug!("opening {}", url);
        self.page.open_new_context(&url);
    }
}
