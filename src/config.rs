use log::Level;
use serde::Deserialize;

use crate::error::Result;
use crate::page::Page;

/// Id of the optional `<script type="application/json">` block that overrides
/// [`SiteConfig`] fields for a given deployment.
pub const CONFIG_ELEMENT_ID: &str = "landing-config";

#[cfg(debug_assertions)]
pub fn log_level() -> Level {
    Level::Debug
}

#[cfg(not(debug_assertions))]
pub fn log_level() -> Level {
    Level::Info
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SiteConfig {
    pub messaging_base_url: String,
    pub whatsapp_number: String,
    pub default_greeting: String,
    pub share_title: String,
    pub share_text: String,
    pub navbar_threshold: f64,
    pub anchor_margin: f64,
    pub scroll_throttle_ms: u32,
    pub alert_timeout_ms: u32,
    pub submit_delay_ms: u32,
    pub reset_delay_ms: u32,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            messaging_base_url: "https://wa.me".to_string(),
            whatsapp_number: "5577999515837".to_string(),
            default_greeting:
                "Olá! Gostaria de saber mais sobre os serviços de avaliação imobiliária."
                    .to_string(),
            share_title: "Prisma Avaliações Imobiliárias".to_string(),
            share_text: "Avaliações imobiliárias com precisão e confiança".to_string(),
            navbar_threshold: 100.0,
            anchor_margin: 20.0,
            scroll_throttle_ms: 100,
            alert_timeout_ms: 5_000,
            submit_delay_ms: 1_000,
            reset_delay_ms: 1_500,
        }
    }
}

impl SiteConfig {
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Defaults, overridden by the page's config block when it has one.
    pub fn load<P: Page>(page: &P) -> Self {
        let Some(block) = page.by_id(CONFIG_ELEMENT_ID) else {
            return Self::default();
        };
        let raw = page.text(&block);
        if raw.trim().is_empty() {
            return Self::default();
        }
        match Self::from_json(&raw) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("ignoring #{}: {}", CONFIG_ELEMENT_ID, e);
                Self::default()
            }
        }
    }
}
