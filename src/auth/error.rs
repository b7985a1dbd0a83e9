use thiserror::Error;

use crate::error::TuplectlError;

/// Errors raised by the device-code login, credential cache and token validation.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Auth failed, came back with {code}{}", describe(.description))]
    Denied {
        code: String,
        description: Option<String>,
    },
    #[error("Couldn't verify device token in time")]
    DeadlineExceeded,
    #[error("Token expired")]
    TokenExpired,
    #[error("Invalid token: {0}")]
    InvalidToken(String),
    #[error("Unable to find appropriate key for kid {0}")]
    NoMatchingKey(String),
    #[error("Credential store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("IO error: {0}")]
    Io(String),
}

fn describe(description: &Option<String>) -> String {
    description
        .as_deref()
        .map(|d| format!(" ({d})"))
        .unwrap_or_default()
}

impl AuthError {
    /// Transport-level failures are the only errors worth retrying within a single poll.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            return Self::InvalidResponse(error.to_string());
        }
        Self::Network(error.to_string())
    }
}

impl From<std::io::Error> for AuthError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

impl From<keyring::Error> for AuthError {
    fn from(error: keyring::Error) -> Self {
        Self::StoreUnavailable(error.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(error: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match error.kind() {
            ErrorKind::ExpiredSignature => Self::TokenExpired,
            _ => Self::InvalidToken(error.to_string()),
        }
    }
}

impl From<AuthError> for TuplectlError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::Configuration(message) => TuplectlError::Configuration(message),
            other => TuplectlError::Authentication(other.to_string()),
        }
    }
}
