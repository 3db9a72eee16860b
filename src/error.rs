use thiserror::Error;
use wasm_bindgen::JsValue;

pub type Result<T> = std::result::Result<T, LandingError>;

#[derive(Error, Debug)]
pub enum LandingError {
    #[error("no global window")]
    NoWindow,

    #[error("window has no document")]
    NoDocument,

    #[error("document has no body")]
    NoBody,

    #[error("element is not a {0}")]
    WrongElement(&'static str),

    #[error("javascript error: {0}")]
    Js(String),

    #[error("invalid site config: {0}")]
    Config(#[from] serde_json::Error),
}

impl From<JsValue> for LandingError {
    fn from(value: JsValue) -> Self {
        let text = value
            .as_string()
            .unwrap_or_else(|| format!("{:?}", value));
        LandingError::Js(text)
    }
}

impl From<serde_wasm_bindgen::Error> for LandingError {
    fn from(err: serde_wasm_bindgen::Error) -> Self {
        LandingError::Js(err.to_string())
    }
}
