use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use super::device_code::{
    DeviceAuthorization, DeviceCodePoll, DeviceCodeResponse, PollState, TokenErrorResponse,
    TokenResponse,
};
use super::error::AuthError;
use super::jwks::KeyResolver;
use super::presenter::Presenter;
use super::store::CredentialStore;
use super::token::Credential;
use super::validator::CredentialValidator;
use crate::config::AuthConfig;
use crate::util::retry::RetryPolicy;

const DEVICE_CODE_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:device_code";
const AUTHORIZATION_PENDING: &str = "authorization_pending";

/// What `auth status` reports about the cached credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthStatus {
    LoggedIn { expires_at: Option<DateTime<Utc>> },
    NotLoggedIn,
}

/// Device Authorization Flow Controller.
///
/// Owns no credential state of its own: callers get the credential back from
/// [`AuthService::ensure_authenticated`] or [`AuthService::login`] and pass it on
/// explicitly. Every failure is returned as an [`AuthError`]; deciding whether
/// to exit the process is left to the caller.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use tuplectl::auth::{select_presenter, AuthService, KeyringCredentialStore};
/// use tuplectl::config::AuthConfig;
///
/// # async fn example() -> Result<(), tuplectl::auth::AuthError> {
/// let config = AuthConfig::from_env();
/// let store = Arc::new(KeyringCredentialStore::new(
///     &config.keyring_service,
///     &config.keyring_account,
/// ));
/// let presenter = select_presenter(config.open_browser);
/// let svc = AuthService::new(config, store, presenter);
/// let credential = svc.ensure_authenticated().await?;
/// println!("{}", credential.token_type);
/// # Ok(())
/// # }
/// ```
pub struct AuthService {
    client: reqwest::Client,
    config: AuthConfig,
    store: Arc<dyn CredentialStore>,
    validator: CredentialValidator,
    presenter: Arc<dyn Presenter>,
    transport_retry: RetryPolicy,
}

impl AuthService {
    pub fn new(
        config: AuthConfig,
        store: Arc<dyn CredentialStore>,
        presenter: Arc<dyn Presenter>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .unwrap_or_else(|err| {
                warn!(error = %err, "Failed to build HTTP client with custom config, using defaults");
                reqwest::Client::new()
            });
        let validator = CredentialValidator::new(
            KeyResolver::with_client(client.clone(), config.jwks_url()),
            config.audience.clone(),
        );
        let transport_retry = if config.transport_retries == 0 {
            RetryPolicy::fail_fast()
        } else {
            RetryPolicy::with_retries(config.transport_retries)
        };
        Self {
            client,
            config,
            store,
            validator,
            presenter,
            transport_retry,
        }
    }

    /// Return the cached credential if it still validates, otherwise log in.
    pub async fn ensure_authenticated(&self) -> Result<Credential, AuthError> {
        if let Some(credential) = self.cached_credential().await {
            debug!("Using cached credential");
            return Ok(credential);
        }
        self.login().await
    }

    /// Read and validate the cached credential; a rejected one is evicted.
    pub async fn cached_credential(&self) -> Option<Credential> {
        let cached = self.store.get()?;
        match self.validator.validate(&cached.access_token).await {
            Ok(claims) => Some(cached.with_expires_at(claims.expires_at())),
            Err(err) => {
                debug!(error = %err, "Cached credential rejected, evicting");
                if let Err(err) = self.store.delete() {
                    warn!(error = %err, "Unable to remove stale credential");
                }
                None
            }
        }
    }

    pub async fn status(&self) -> AuthStatus {
        match self.cached_credential().await {
            Some(credential) => AuthStatus::LoggedIn {
                expires_at: credential.expires_at,
            },
            None => AuthStatus::NotLoggedIn,
        }
    }

    /// Run the interactive device-code handshake, ignoring any cached credential.
    #[instrument(skip(self), fields(client_id = %self.config.client_id))]
    pub async fn login(&self) -> Result<Credential, AuthError> {
        let authorization = self.start_device_authorization().await?;
        self.presenter.present(&authorization)?;

        let result = self.wait_for_authorization(&authorization).await;
        self.presenter.finished();
        let credential = result?;

        if let Err(err) = self.store.put(&credential) {
            warn!(error = %err, "Unable to store credential");
            self.presenter.warn(
                "unable to store credentials in the system keychain. \
                 You'll have to repeat this process next time you run an authenticated tuplectl command",
            );
        }
        info!("Device authorization complete");
        Ok(credential)
    }

    /// Drop the cached credential. No network traffic.
    pub fn logout(&self) -> Result<(), AuthError> {
        self.store.delete()
    }

    /// Init step: ask the provider for a device code. Not retried.
    pub async fn start_device_authorization(&self) -> Result<DeviceAuthorization, AuthError> {
        let resp = self
            .client
            .post(self.config.device_code_url())
            .header("Accept", "application/json")
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("scope", self.config.scope.as_str()),
                ("audience", self.config.audience.as_str()),
            ])
            .send()
            .await?;
        debug!(status = %resp.status(), "Device code response");
        if !resp.status().is_success() {
            return Err(AuthError::InvalidResponse(format!(
                "Device code request failed with status {}",
                resp.status()
            )));
        }
        let payload: DeviceCodeResponse = resp.json().await?;
        let authorization = DeviceAuthorization::try_from(payload)?;
        debug!(
            verification_uri = %authorization.verification_uri,
            interval = ?authorization.poll_interval,
            expires_in = ?authorization.expires_in,
            "Device authorization issued"
        );
        Ok(authorization)
    }

    /// One token-endpoint request. Anything other than success or
    /// `authorization_pending` is terminal.
    pub async fn poll_token(
        &self,
        authorization: &DeviceAuthorization,
    ) -> Result<DeviceCodePoll, AuthError> {
        let resp = self
            .transport_retry
            .execute(|| async {
                self.client
                    .post(self.config.token_url())
                    .header("Accept", "application/json")
                    .form(&[
                        ("grant_type", DEVICE_CODE_GRANT_TYPE),
                        ("client_id", self.config.client_id.as_str()),
                        ("device_code", authorization.device_code.as_str()),
                    ])
                    .send()
                    .await
                    .map_err(AuthError::from)
            })
            .await?;

        if resp.status().is_success() {
            let payload: TokenResponse = resp.json().await?;
            let credential = Credential::from_token_response(
                payload.access_token,
                payload.token_type,
                payload.expires_in,
                Utc::now(),
            )?;
            return Ok(DeviceCodePoll::Authorized { credential });
        }

        let status = resp.status();
        let payload: TokenErrorResponse = resp.json().await.map_err(|err| {
            AuthError::InvalidResponse(format!(
                "Device token request failed with status {status}: {err}"
            ))
        })?;
        debug!(error = %payload.error, "Token endpoint refused");
        if payload.error == AUTHORIZATION_PENDING {
            return Ok(DeviceCodePoll::Pending);
        }
        Err(AuthError::Denied {
            code: payload.error,
            description: payload.error_description,
        })
    }

    async fn wait_for_authorization(
        &self,
        authorization: &DeviceAuthorization,
    ) -> Result<Credential, AuthError> {
        let mut state = PollState::new(authorization, Instant::now())?;
        loop {
            debug!(
                attempt = state.attempts + 1,
                "Sleeping for {:?} before polling again",
                authorization.poll_interval
            );
            tokio::time::sleep_until(state.next_eligible_poll).await;

            let now = Instant::now();
            if state.is_expired_at(now) {
                debug!(attempts = state.attempts, "Device code deadline passed");
                return Err(AuthError::DeadlineExceeded);
            }

            state.record_attempt(now)?;
            self.presenter.poll_started(state.attempts);
            match self.poll_token(authorization).await? {
                DeviceCodePoll::Pending => continue,
                DeviceCodePoll::Authorized { credential } => return Ok(credential),
            }
        }
    }
}
