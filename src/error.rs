//! Error type shared by the scene core and the browser backend.

use wasm_bindgen::JsValue;

#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("no window")]
    NoWindow,
    #[error("no document")]
    NoDocument,
    #[error("canvas element unavailable: {0}")]
    Canvas(String),
    #[error("2d context unavailable")]
    NoContext,
    #[error("failed to schedule spawn timer: {0}")]
    Timer(String),
    #[error("failed to install {event} listener: {reason}")]
    Listener { event: &'static str, reason: String },
    #[cfg(feature = "serde_json")]
    #[error("invalid scene config: {0}")]
    Config(#[from] serde_json::Error),
}

impl From<SceneError> for JsValue {
    fn from(err: SceneError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}
