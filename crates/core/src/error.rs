// Central Error Type for the Client

use thiserror::Error;

/// Client-level error type
///
/// Remote failures (status mapping, transport) and local precondition
/// failures share one enum so orchestrators can translate between them.
#[derive(Error, Debug)]
pub enum CodexError {
    // --- Remote: status mapping ---
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Bad request: {message}")]
    BadRequest { message: String },

    #[error("Resource not found: {message}")]
    NotFound { message: String },

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Unexpected API response. Status code: {status} Response: {body}")]
    Api { status: u16, body: String },

    // --- Remote: transport ---
    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Invalid response: {field} - {reason}")]
    InvalidResponse { field: String, reason: String },

    // --- Local preconditions ---
    #[error("Input error: {0}")]
    Input(String),

    #[error("Invalid python version: {0}")]
    PythonVersion(String),

    #[error("Invalid extension for '{path}'. Allowed: {allowed}")]
    InvalidExtension { path: String, allowed: String },

    #[error("Group error: {0}")]
    Group(String),

    #[error("Training error: {0}")]
    Training(String),

    #[error("Preprocessing error: {0}")]
    Preprocessing(String),

    #[error("Domain error: {0}")]
    Domain(#[from] crate::domain::DomainError),

    // --- Lifecycle ---
    #[error("Training execution {execution_id} failed: {}", message.as_deref().unwrap_or("check the logs"))]
    TrainExecution {
        execution_id: u64,
        message: Option<String>,
    },

    /// The run was uploaded; `execution_id` can be triggered again
    #[error("Training execution {execution_id} was uploaded but not triggered: {source}")]
    TriggerFailed {
        execution_id: u64,
        source: Box<CodexError>,
    },

    /// The model was promoted; `model_hash` can be hosted or polled again
    #[error("Model {model_hash} was promoted but is not hosted: {source}")]
    Hosting {
        model_hash: String,
        source: Box<CodexError>,
    },

    #[error("Wait cancelled")]
    Cancelled,

    #[error("Gave up waiting after {0:?}")]
    PollDeadlineExceeded(std::time::Duration),

    // --- Plumbing ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias using CodexError
pub type Result<T> = std::result::Result<T, CodexError>;

impl CodexError {
    pub fn invalid_response(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Worth retrying at the caller level (never retried internally)
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            CodexError::Timeout(_) | CodexError::Connection(_) | CodexError::Server { .. } => true,
            CodexError::TriggerFailed { source, .. } | CodexError::Hosting { source, .. } => {
                source.is_recoverable()
            }
            _ => false,
        }
    }

    /// Raised before any network call was attempted
    #[must_use]
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            CodexError::Input(_)
                | CodexError::PythonVersion(_)
                | CodexError::InvalidExtension { .. }
                | CodexError::Io(_)
                | CodexError::Domain(_)
                | CodexError::Config(_)
        )
    }
}
