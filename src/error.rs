//! Error types for chorewarrior
//!
//! One enum covers every failure a sync run can hit. Nothing is retried: any
//! variant that reaches the caller ends the run.

use thiserror::Error;

/// Result type alias for chorewarrior operations
pub type Result<T> = std::result::Result<T, ChoreSyncError>;

/// Error type for chorewarrior operations
#[derive(Error, Debug)]
pub enum ChoreSyncError {
    /// Login rejected, or the login response carried no usable API key
    #[error("Authentication error: {0}")]
    Auth(String),

    /// The service answered with an error status or an unreadable body
    #[error("Transport error: {0}")]
    Transport(String),

    /// HTTP request errors (connect, timeout, TLS)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A chore record lacks a required field
    #[error("Chore record is missing required field '{0}'")]
    MissingField(&'static str),

    /// A chore record field is present but unusable
    #[error("Chore record field '{field}' is invalid: {reason}")]
    InvalidField { field: &'static str, reason: String },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Label template errors
    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl ChoreSyncError {
    /// Whether this is a network or HTTP-level failure
    pub fn is_transport(&self) -> bool {
        matches!(self, ChoreSyncError::Transport(_) | ChoreSyncError::Http(_))
    }

    /// Whether this error came from a malformed chore record
    pub fn is_record_error(&self) -> bool {
        matches!(
            self,
            ChoreSyncError::MissingField(_) | ChoreSyncError::InvalidField { .. }
        )
    }

    pub(crate) fn invalid_field(field: &'static str, reason: impl Into<String>) -> Self {
        ChoreSyncError::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}
