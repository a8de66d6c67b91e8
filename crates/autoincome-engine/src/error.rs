use autoincome_core::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("analyst returned status {status}: {body}")]
    AnalystStatus { status: u16, body: String },

    #[error("analyst protocol error: {0}")]
    Analyst(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
