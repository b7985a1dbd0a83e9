use std::fmt;

use chrono::{DateTime, Duration, Utc};

use super::error::AuthError;

const DEFAULT_TOKEN_TYPE: &str = "Bearer";

/// Bearer credential obtained from the token endpoint or read back from the keyring.
///
/// Only `access_token` is persisted; `expires_at` is filled in from the token
/// response on login, or from the validated `exp` claim on a cache hit.
///
/// # Example
/// ```
/// use tuplectl::auth::Credential;
///
/// let credential = Credential::bearer("eyJhbGciOi...");
/// assert_eq!(credential.authorization_header(), "Bearer eyJhbGciOi...");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub access_token: String,
    pub token_type: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Credential {
    /// A bearer credential with unknown expiry.
    pub fn bearer(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: DEFAULT_TOKEN_TYPE.to_string(),
            expires_at: None,
        }
    }

    /// Build from a token-endpoint response received at `issued_at`.
    ///
    /// An `expires_in` too large to land on a calendar date is an
    /// [`AuthError::InvalidResponse`].
    pub fn from_token_response(
        access_token: String,
        token_type: Option<String>,
        expires_in: Option<u64>,
        issued_at: DateTime<Utc>,
    ) -> Result<Self, AuthError> {
        let token_type = token_type
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TOKEN_TYPE.to_string());
        let expires_at = match expires_in {
            None => None,
            Some(secs) => Some(
                i64::try_from(secs)
                    .ok()
                    .and_then(Duration::try_seconds)
                    .and_then(|lifetime| issued_at.checked_add_signed(lifetime))
                    .ok_or_else(|| {
                        AuthError::InvalidResponse("expires_in out of range".to_string())
                    })?,
            ),
        };
        Ok(Self {
            access_token,
            token_type,
            expires_at,
        })
    }

    pub fn with_expires_at(mut self, expires_at: Option<DateTime<Utc>>) -> Self {
        self.expires_at = expires_at;
        self
    }

    /// Value for the `Authorization` header.
    ///
    /// Auth0 reports `token_type` as `Bearer`; anything else is passed through as given.
    pub fn authorization_header(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"[redacted]")
            .field("token_type", &self.token_type)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
