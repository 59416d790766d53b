//! SDK Error Types

use mlops_codex_core::CodexError;
use thiserror::Error;

/// SDK Result type
pub type Result<T> = std::result::Result<T, SdkError>;

/// SDK Error
#[derive(Debug, Error)]
pub enum SdkError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error(transparent)]
    Codex(#[from] CodexError),
}

impl From<mlops_codex_core::port::TransportError> for SdkError {
    fn from(e: mlops_codex_core::port::TransportError) -> Self {
        SdkError::Transport(e.to_string())
    }
}

impl SdkError {
    /// The underlying client error, if this came from a platform call
    pub fn as_codex(&self) -> Option<&CodexError> {
        match self {
            SdkError::Codex(e) => Some(e),
            _ => None,
        }
    }
}
