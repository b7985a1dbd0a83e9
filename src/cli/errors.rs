//! CLI-specific error formatting for user-facing messages.

use crate::config::{ENV_AUTH_BASE_URL, ENV_AUTH_CLIENT_ID};
use crate::error::{ErrorCategory, TuplectlError};

/// Map a [`TuplectlError`] to a user-facing help string with actionable guidance.
pub fn format_error_help(err: &TuplectlError) -> String {
    match (err, err.category()) {
        (TuplectlError::Authentication(msg), _) => {
            format!("{msg}. Run: tuplectl auth login")
        }
        (TuplectlError::Configuration(msg), _) => {
            format!("Configuration error: {msg}. Check {ENV_AUTH_BASE_URL} and {ENV_AUTH_CLIENT_ID} in your environment or .env")
        }
        (other, ErrorCategory::Authentication) => {
            format!("{other}. Your session may have expired; run: tuplectl auth login")
        }
        (other, ErrorCategory::Server) => {
            format!("{other}. The platform may be having problems; try again shortly")
        }
        (other, _) => format!("{other}"),
    }
}
