//! Error types module
//!
//! Every API call resolves to `Ok(data)` or one of the `VaultError` variants below.
//! Callers turn the error into local state (an inline message or a queued
//! notification); nothing is expected to escape to a global handler.

use std::io;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like an unreachable backend
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata describing how an error should be presented to the user.
pub trait ErrorMetadata {
    /// HTTP status that produced the error, if any
    fn http_status_code(&self) -> Option<u16>;

    /// Machine-readable error code (e.g., "TRANSPORT_ERROR")
    fn error_code(&self) -> &'static str;

    /// Whether this error is transient (may succeed if repeated)
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the user
    fn suggested_action(&self) -> Option<&'static str>;

    /// User-facing message
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum VaultError {
    /// Backend unreachable (connection refused, DNS failure, timeout).
    #[error("{0}")]
    Transport(String),

    /// 401 from any endpoint. The session has been torn down by the time this is seen.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// 4xx other than 401, message taken verbatim from the response body.
    #[error("{message}")]
    Validation { status: u16, message: String },

    /// 5xx, message from the response body or a generic fallback.
    #[error("{message}")]
    Server { status: u16, message: String },

    /// Operation needs a credential and none is present. No request was sent.
    #[error("Authentication required")]
    AuthRequired,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// Local credential persistence or file access failed.
    #[error("Storage error: {0}")]
    Storage(String),
}

pub type VaultResult<T> = Result<T, VaultError>;

impl VaultError {
    /// Classify a non-success HTTP status.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 => VaultError::Unauthorized(message),
            400..=499 => VaultError::Validation { status, message },
            _ => VaultError::Server { status, message },
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, VaultError::Transport(_))
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, VaultError::Unauthorized(_))
    }

    /// Get the error type name
    pub fn error_type(&self) -> &'static str {
        match self {
            VaultError::Transport(_) => "Transport",
            VaultError::Unauthorized(_) => "Unauthorized",
            VaultError::Validation { .. } => "Validation",
            VaultError::Server { .. } => "Server",
            VaultError::AuthRequired => "AuthRequired",
            VaultError::InvalidInput(_) => "InvalidInput",
            VaultError::Decode(_) => "Decode",
            VaultError::Storage(_) => "Storage",
        }
    }
}

impl From<io::Error> for VaultError {
    fn from(err: io::Error) -> Self {
        VaultError::Storage(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for VaultError {
    fn from(err: serde_json::Error) -> Self {
        VaultError::Decode(format!("JSON parsing error: {}", err))
    }
}

/// Static metadata for each variant: (error_code, recoverable, suggested_action, log_level).
fn vault_error_static_metadata(
    err: &VaultError,
) -> (&'static str, bool, Option<&'static str>, LogLevel) {
    match err {
        VaultError::Transport(_) => (
            "TRANSPORT_ERROR",
            true,
            Some("Check that the backend is running and reachable"),
            LogLevel::Warn,
        ),
        VaultError::Unauthorized(_) => (
            "UNAUTHORIZED",
            false,
            Some("Sign in again"),
            LogLevel::Debug,
        ),
        VaultError::Validation { .. } => (
            "VALIDATION_ERROR",
            false,
            Some("Check the submitted values and try again"),
            LogLevel::Debug,
        ),
        VaultError::Server { .. } => (
            "SERVER_ERROR",
            true,
            Some("Retry after a short delay"),
            LogLevel::Error,
        ),
        VaultError::AuthRequired => (
            "AUTH_REQUIRED",
            false,
            Some("Sign in before performing this action"),
            LogLevel::Debug,
        ),
        VaultError::InvalidInput(_) => (
            "INVALID_INPUT",
            false,
            Some("Check the input and try again"),
            LogLevel::Debug,
        ),
        VaultError::Decode(_) => (
            "DECODE_ERROR",
            false,
            Some("Check that client and backend versions match"),
            LogLevel::Error,
        ),
        VaultError::Storage(_) => (
            "STORAGE_ERROR",
            false,
            Some("Check permissions of the credentials file"),
            LogLevel::Error,
        ),
    }
}

impl ErrorMetadata for VaultError {
    fn http_status_code(&self) -> Option<u16> {
        match self {
            VaultError::Unauthorized(_) => Some(401),
            VaultError::Validation { status, .. } | VaultError::Server { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    fn error_code(&self) -> &'static str {
        vault_error_static_metadata(self).0
    }

    fn is_recoverable(&self) -> bool {
        vault_error_static_metadata(self).1
    }

    fn suggested_action(&self) -> Option<&'static str> {
        vault_error_static_metadata(self).2
    }

    fn log_level(&self) -> LogLevel {
        vault_error_static_metadata(self).3
    }

    fn client_message(&self) -> String {
        match self {
            VaultError::Transport(ref msg) => msg.clone(),
            VaultError::Unauthorized(_) => "Your session has expired. Please sign in again.".to_string(),
            VaultError::Validation { ref message, .. } => message.clone(),
            VaultError::Server { ref message, .. } => message.clone(),
            VaultError::AuthRequired => "You must be signed in to do that.".to_string(),
            VaultError::InvalidInput(ref msg) => msg.clone(),
            VaultError::Decode(_) => "Unexpected response from server".to_string(),
            VaultError::Storage(_) => "Failed to access local credential storage".to_string(),
        }
    }
}
