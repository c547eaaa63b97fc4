use ig_core::RequestError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Error from backend: {0}")]
    BackendError(String),
    #[error("Missing required setting {0}")]
    MissingSetting(&'static str),
    #[error("Invalid value for {key}: {reason}")]
    InvalidSetting { key: &'static str, reason: String },
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
    #[error(transparent)]
    Request(#[from] RequestError),
}
