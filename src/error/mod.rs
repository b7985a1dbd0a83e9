//! Error types for tuplectl.

use thiserror::Error;

/// Broad error category used by the CLI to pick help text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Authentication,
    Network,
    Server,
    Api,
    NotFound,
    Configuration,
    Unknown,
}

/// Primary error type for command-level operations.
#[derive(Error, Debug)]
pub enum TuplectlError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Request error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Resource not found")]
    NotFound,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Authentication error: {0}")]
    Authentication(String),
}

impl TuplectlError {
    /// Create an API error from a status code and message.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Authentication(_) => ErrorCategory::Authentication,
            Self::Network(_) => ErrorCategory::Network,
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::NotFound => ErrorCategory::NotFound,
            Self::Io(_) => ErrorCategory::Unknown,
            Self::Api { status, .. } => match status {
                401 | 403 => ErrorCategory::Authentication,
                404 => ErrorCategory::NotFound,
                500..=599 => ErrorCategory::Server,
                _ => ErrorCategory::Api,
            },
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, TuplectlError>;
