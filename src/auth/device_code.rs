use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::time::Instant;

use super::error::AuthError;
use super::token::Credential;

/// Poll spacing used when the provider omits `interval` (RFC 8628 section 3.2).
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Device authorization issued by the provider's `/oauth/device/code` endpoint.
///
/// Never persisted. `device_code` is only sent back to the token endpoint and is
/// left out of the `Debug` output.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use tuplectl::auth::DeviceAuthorization;
///
/// let authorization = DeviceAuthorization::new(
///     "device-code",
///     "ABCD-EFGH",
///     "https://tenant.example.com/activate?user_code=ABCD-EFGH",
///     Duration::from_secs(5),
///     Duration::from_secs(900),
/// )?;
/// assert_eq!(authorization.user_code, "ABCD-EFGH");
/// # Ok::<(), tuplectl::auth::AuthError>(())
/// ```
#[derive(Clone)]
pub struct DeviceAuthorization {
    pub device_code: String,
    pub user_code: String,
    pub verification_uri: String,
    pub poll_interval: Duration,
    pub expires_in: Duration,
    pub issued_at: Instant,
    pub expires_at: DateTime<Utc>,
    deadline: Instant,
}

impl DeviceAuthorization {
    /// Lifetimes that cannot be represented as instants are rejected as
    /// [`AuthError::InvalidResponse`].
    pub fn new(
        device_code: impl Into<String>,
        user_code: impl Into<String>,
        verification_uri: impl Into<String>,
        poll_interval: Duration,
        expires_in: Duration,
    ) -> Result<Self, AuthError> {
        let poll_interval = if poll_interval.is_zero() {
            DEFAULT_POLL_INTERVAL
        } else {
            poll_interval
        };
        let issued_at = Instant::now();
        let deadline = issued_at
            .checked_add(expires_in)
            .ok_or_else(|| out_of_range("expires_in"))?;
        issued_at
            .checked_add(poll_interval)
            .ok_or_else(|| out_of_range("interval"))?;
        let expires_at = chrono::Duration::from_std(expires_in)
            .ok()
            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
            .ok_or_else(|| out_of_range("expires_in"))?;
        Ok(Self {
            device_code: device_code.into(),
            user_code: user_code.into(),
            verification_uri: verification_uri.into(),
            poll_interval,
            expires_in,
            issued_at,
            expires_at,
            deadline,
        })
    }

    /// Absolute deadline, fixed at issuance.
    pub fn deadline(&self) -> Instant {
        self.deadline
    }
}

pub(crate) fn out_of_range(field: &str) -> AuthError {
    AuthError::InvalidResponse(format!("{field} out of range"))
}

impl std::fmt::Debug for DeviceAuthorization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceAuthorization")
            .field("user_code", &self.user_code)
            .field("verification_uri", &self.verification_uri)
            .field("poll_interval", &self.poll_interval)
            .field("expires_in", &self.expires_in)
            .finish_non_exhaustive()
    }
}

/// Wire shape of the device-code response.
#[derive(Debug, Deserialize)]
pub(crate) struct DeviceCodeResponse {
    device_code: String,
    user_code: String,
    #[serde(default)]
    verification_uri: Option<String>,
    #[serde(default)]
    verification_uri_complete: Option<String>,
    #[serde(default)]
    interval: Option<u64>,
    expires_in: u64,
}

impl TryFrom<DeviceCodeResponse> for DeviceAuthorization {
    type Error = AuthError;

    fn try_from(payload: DeviceCodeResponse) -> Result<Self, Self::Error> {
        let verification_uri = payload
            .verification_uri_complete
            .or(payload.verification_uri)
            .filter(|uri| !uri.trim().is_empty())
            .ok_or_else(|| {
                AuthError::InvalidResponse(
                    "Device code response missing verification uri".to_string(),
                )
            })?;
        Self::new(
            payload.device_code,
            payload.user_code,
            verification_uri,
            Duration::from_secs(payload.interval.unwrap_or(0)),
            Duration::from_secs(payload.expires_in),
        )
    }
}

/// Polling-loop bookkeeping for a single login attempt.
#[derive(Debug, Clone)]
pub struct PollState {
    pub attempts: u32,
    pub next_eligible_poll: Instant,
    pub deadline: Instant,
    interval: Duration,
}

impl PollState {
    /// Start polling `authorization`; the first poll is due one interval after `now`.
    pub fn new(authorization: &DeviceAuthorization, now: Instant) -> Result<Self, AuthError> {
        let interval = authorization.poll_interval;
        Ok(Self {
            attempts: 0,
            next_eligible_poll: now
                .checked_add(interval)
                .ok_or_else(|| out_of_range("interval"))?,
            deadline: authorization.deadline(),
            interval,
        })
    }

    pub fn is_expired_at(&self, now: Instant) -> bool {
        now > self.deadline
    }

    /// Count a poll issued at `now` and push the next one out by a full interval.
    pub fn record_attempt(&mut self, now: Instant) -> Result<(), AuthError> {
        self.attempts += 1;
        self.next_eligible_poll = now
            .checked_add(self.interval)
            .ok_or_else(|| out_of_range("interval"))?;
        Ok(())
    }
}

/// Outcome of one token-endpoint poll that did not end the flow with an error.
#[derive(Debug, Clone)]
pub enum DeviceCodePoll {
    Pending,
    Authorized { credential: Credential },
}

/// Wire shape of a successful token response.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Wire shape of an OAuth error response.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenErrorResponse {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
}
