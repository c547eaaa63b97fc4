use thiserror::Error;

/// Rejections raised while building a request locally, before anything is sent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("Prompt must not be empty")]
    EmptyPrompt,
    #[error("Username must not be empty")]
    EmptyUsername,
    #[error("{name} must be between 256 and 1024 px, got {value}")]
    DimensionOutOfRange { name: &'static str, value: u32 },
    #[error("{name} must be a multiple of 64 px, got {value}")]
    DimensionNotAligned { name: &'static str, value: u32 },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Backend returned HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("Backend response did not contain a task id")]
    MissingTaskId,
    #[error("Session expired, sign in again")]
    AuthExpired,
}

/// Terminal failures of a polling sequence. None of them are retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PollError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Session expired, sign in again")]
    AuthExpired,
    #[error("Image generation failed: {0}")]
    BackendFailed(String),
    #[error("Image generation timed out after {attempts} attempts")]
    Timeout { attempts: u8 },
}

impl PollError {
    pub fn requires_reauth(&self) -> bool {
        matches!(self, Self::AuthExpired)
    }
}
