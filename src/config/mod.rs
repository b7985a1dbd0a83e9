//! Configuration (layered: code > env > build-time defaults).
//!
//! Read once at startup; nothing here is reloaded while a command runs.

use std::time::Duration;

use reqwest::Url;
use tracing::warn;

use crate::auth::store::{DEFAULT_KEYRING_ACCOUNT, DEFAULT_KEYRING_SERVICE};
use crate::auth::AuthError;

pub const ENV_AUTH_BASE_URL: &str = "TUPLECTL_AUTH_BASE_URL";
pub const ENV_AUTH_CLIENT_ID: &str = "TUPLECTL_AUTH_CLIENT_ID";
pub const ENV_OPEN_BROWSER: &str = "TUPLECTL_OPEN_BROWSER";
pub const ENV_DEBUG: &str = "TUPLECTL_DEBUG";
pub const ENV_PRINT_AUTH_TOKEN: &str = "TUPLECTL_PRINT_AUTH_TOKEN";
pub const ENV_TRANSPORT_RETRIES: &str = "TUPLECTL_AUTH_TRANSPORT_RETRIES";
pub const ENV_CONTROL_API_BASE_URL: &str = "TUPLECTL_CONTROL_API_BASE_URL";

pub const DEFAULT_SCOPE: &str = "logstream";
pub const DEFAULT_AUDIENCE: &str = "https://api.tuplestream.net/";
pub const DEFAULT_API_BASE_URL: &str = "https://api.tuplestream.com";
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Release builds bake the tenant and client id in; env vars override them.
const BUILD_TENANT_URL: Option<&str> = option_env!("TUPLECTL_DEFAULT_TENANT_URL");
const BUILD_CLIENT_ID: Option<&str> = option_env!("TUPLECTL_DEFAULT_CLIENT_ID");

/// Identity-provider settings for the device-code login.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub tenant_url: String,
    pub client_id: String,
    pub scope: String,
    pub audience: String,
    pub open_browser: bool,
    pub keyring_service: String,
    pub keyring_account: String,
    /// Extra attempts for transport errors while polling; 0 keeps the flow fail-fast.
    pub transport_retries: u32,
    pub http_timeout: Duration,
}

impl AuthConfig {
    pub fn new(tenant_url: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            tenant_url: trim_base_url(tenant_url.into()),
            client_id: client_id.into(),
            scope: DEFAULT_SCOPE.to_string(),
            audience: DEFAULT_AUDIENCE.to_string(),
            open_browser: true,
            keyring_service: DEFAULT_KEYRING_SERVICE.to_string(),
            keyring_account: DEFAULT_KEYRING_ACCOUNT.to_string(),
            transport_retries: 0,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }

    /// Load from environment variables (and `.env` if present).
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let tenant_url = get(ENV_AUTH_BASE_URL)
            .or_else(|| BUILD_TENANT_URL.map(str::to_string))
            .unwrap_or_default();
        let client_id = get(ENV_AUTH_CLIENT_ID)
            .or_else(|| BUILD_CLIENT_ID.map(str::to_string))
            .unwrap_or_default();

        let mut config = Self::new(tenant_url, client_id);
        config.open_browser = get(ENV_OPEN_BROWSER)
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(true);
        if let Some(raw) = get(ENV_TRANSPORT_RETRIES) {
            match raw.trim().parse() {
                Ok(retries) => config.transport_retries = retries,
                Err(_) => warn!(value = %raw, "Ignoring invalid {ENV_TRANSPORT_RETRIES}"),
            }
        }
        config
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = audience.into();
        self
    }

    pub fn with_open_browser(mut self, open_browser: bool) -> Self {
        self.open_browser = open_browser;
        self
    }

    pub fn with_keyring(mut self, service: impl Into<String>, account: impl Into<String>) -> Self {
        self.keyring_service = service.into();
        self.keyring_account = account.into();
        self
    }

    pub fn with_transport_retries(mut self, retries: u32) -> Self {
        self.transport_retries = retries;
        self
    }

    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    pub fn device_code_url(&self) -> String {
        format!("{}/oauth/device/code", self.tenant_url)
    }

    pub fn token_url(&self) -> String {
        format!("{}/oauth/token", self.tenant_url)
    }

    pub fn jwks_url(&self) -> String {
        format!("{}/.well-known/jwks.json", self.tenant_url)
    }

    /// Reject settings the login flow cannot run with.
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.client_id.trim().is_empty() {
            return Err(AuthError::Configuration(format!(
                "no OAuth client id configured (set {ENV_AUTH_CLIENT_ID})"
            )));
        }
        if self.tenant_url.trim().is_empty() {
            return Err(AuthError::Configuration(format!(
                "no identity provider URL configured (set {ENV_AUTH_BASE_URL})"
            )));
        }
        check_base_url(&self.tenant_url, ENV_AUTH_BASE_URL).map_err(AuthError::Configuration)
    }
}

/// Everything a command reads from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub auth: AuthConfig,
    pub api_base_url: String,
    pub debug: bool,
    pub print_token: bool,
}

impl Config {
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            auth: AuthConfig::from_lookup(&lookup),
            api_base_url: trim_base_url(
                get(ENV_CONTROL_API_BASE_URL).unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            ),
            debug: get(ENV_DEBUG).is_some(),
            print_token: get(ENV_PRINT_AUTH_TOKEN).is_some(),
        }
    }

    pub fn validate(&self) -> Result<(), AuthError> {
        self.auth.validate()?;
        check_base_url(&self.api_base_url, ENV_CONTROL_API_BASE_URL).map_err(AuthError::Configuration)
    }
}

fn trim_base_url(url: String) -> String {
    url.trim().trim_end_matches('/').to_string()
}

/// Parse `url`; plain http is accepted with a warning.
fn check_base_url(url: &str, source: &str) -> Result<(), String> {
    let parsed = Url::parse(url).map_err(|e| format!("invalid URL in {source}: {e}"))?;
    match parsed.scheme() {
        "https" => Ok(()),
        "http" => {
            warn!(url = %url, "Using insecure base url from {source}. Consider using an 'https' endpoint.");
            Ok(())
        }
        other => Err(format!("unsupported scheme '{other}' in {source}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn env_overrides_tenant_and_client() {
        let config = AuthConfig::from_lookup(lookup(&[
            (ENV_AUTH_BASE_URL, "https://tenant.example.com/"),
            (ENV_AUTH_CLIENT_ID, "client-123"),
        ]));
        assert_eq!(config.tenant_url, "https://tenant.example.com");
        assert_eq!(config.client_id, "client-123");
        assert_eq!(config.device_code_url(), "https://tenant.example.com/oauth/device/code");
        assert_eq!(config.token_url(), "https://tenant.example.com/oauth/token");
        assert_eq!(
            config.jwks_url(),
            "https://tenant.example.com/.well-known/jwks.json"
        );
    }

    #[test]
    fn defaults_scope_audience_and_browser() {
        let config = AuthConfig::from_lookup(lookup(&[]));
        assert_eq!(config.scope, "logstream");
        assert_eq!(config.audience, "https://api.tuplestream.net/");
        assert!(config.open_browser);
        assert_eq!(config.transport_retries, 0);
        assert_eq!(config.keyring_service, "com.tuplestream.tuplectl.AccessToken");
        assert_eq!(config.keyring_account, "default");
    }

    #[test]
    fn open_browser_is_disabled_by_anything_but_true() {
        let off = AuthConfig::from_lookup(lookup(&[(ENV_OPEN_BROWSER, "false")]));
        assert!(!off.open_browser);
        let odd = AuthConfig::from_lookup(lookup(&[(ENV_OPEN_BROWSER, "yes")]));
        assert!(!odd.open_browser);
        let on = AuthConfig::from_lookup(lookup(&[(ENV_OPEN_BROWSER, "true")]));
        assert!(on.open_browser);
        let empty = AuthConfig::from_lookup(lookup(&[(ENV_OPEN_BROWSER, "")]));
        assert!(empty.open_browser);
    }

    #[test]
    fn invalid_retry_count_is_ignored() {
        let config = AuthConfig::from_lookup(lookup(&[(ENV_TRANSPORT_RETRIES, "many")]));
        assert_eq!(config.transport_retries, 0);
        let config = AuthConfig::from_lookup(lookup(&[(ENV_TRANSPORT_RETRIES, "2")]));
        assert_eq!(config.transport_retries, 2);
    }

    #[test]
    fn validate_requires_client_id() {
        let config = AuthConfig::new("https://tenant.example.com", "");
        assert!(
            matches!(config.validate(), Err(AuthError::Configuration(msg)) if msg.contains(ENV_AUTH_CLIENT_ID))
        );
    }

    #[test]
    fn validate_rejects_unparsable_and_non_http_urls() {
        assert!(AuthConfig::new("not a url", "client").validate().is_err());
        assert!(AuthConfig::new("ftp://tenant.example.com", "client")
            .validate()
            .is_err());
        assert!(AuthConfig::new("http://localhost:8080", "client")
            .validate()
            .is_ok());
    }

    #[test]
    fn config_reads_debug_print_token_and_api_url() {
        let config = Config::from_lookup(lookup(&[
            (ENV_AUTH_BASE_URL, "https://tenant.example.com"),
            (ENV_AUTH_CLIENT_ID, "client"),
            (ENV_DEBUG, "1"),
            (ENV_PRINT_AUTH_TOKEN, "yes"),
            (ENV_CONTROL_API_BASE_URL, "http://localhost:9000/"),
        ]));
        assert!(config.debug);
        assert!(config.print_token);
        assert_eq!(config.api_base_url, "http://localhost:9000");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_defaults_api_url() {
        let config = Config::from_lookup(lookup(&[]));
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert!(!config.debug);
        assert!(!config.print_token);
    }
}
