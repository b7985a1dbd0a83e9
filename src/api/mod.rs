//! Thin authenticated wrapper over the control-plane API.

use std::time::Duration;

use reqwest::{redirect, Method, Response};
use tracing::debug;

use crate::auth::Credential;
use crate::error::{Result, TuplectlError};

const STATUS_PATH: &str = "/platform/status";

/// `tuplectl-{version}-{os}-{arch}`.
pub fn user_agent() -> String {
    format!(
        "tuplectl-{}-{}-{}",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}

/// Control-plane client carrying the operator's bearer credential.
///
/// Redirects are not followed so callers can read `Location` headers.
///
/// # Example
/// ```no_run
/// use tuplectl::api::ApiClient;
/// use tuplectl::auth::Credential;
///
/// # async fn example() -> tuplectl::error::Result<()> {
/// let client = ApiClient::new("https://api.tuplestream.com", Credential::bearer("token"))?;
/// if client.platform_status().await? {
///     println!("All systems are operational");
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    credential: Credential,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, credential: Credential) -> Result<Self> {
        let http = reqwest::Client::builder()
            .redirect(redirect::Policy::none())
            .user_agent(user_agent())
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credential,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get(&self, path: &str) -> Result<Response> {
        self.send(Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: Option<String>) -> Result<Response> {
        self.send(Method::POST, path, body).await
    }

    pub async fn delete(&self, path: &str) -> Result<Response> {
        self.send(Method::DELETE, path, None).await
    }

    /// GET a resource and return its body, mapping error statuses to errors.
    pub async fn get_string(&self, path: &str) -> Result<String> {
        let resp = self.get(path).await?;
        let resp = error_for_status(resp)?;
        Ok(resp.text().await?)
    }

    /// `true` when the platform reports itself healthy.
    pub async fn platform_status(&self) -> Result<bool> {
        let resp = self.get(STATUS_PATH).await?;
        Ok(resp.status().is_success())
    }

    async fn send(&self, method: Method, path: &str, body: Option<String>) -> Result<Response> {
        let target = format!("{}{}", self.base_url, path);
        debug!(method = %method, target = %target, "Calling control-plane API");
        let mut request = self
            .http
            .request(method, &target)
            .header("Authorization", self.credential.authorization_header());
        if let Some(body) = body {
            request = request
                .header("Content-Type", "application/json")
                .body(body);
        }
        Ok(request.send().await?)
    }
}

/// Map 4xx/5xx into [`TuplectlError`]; 404 gets its own variant.
pub fn error_for_status(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.as_u16() == 404 {
        return Err(TuplectlError::NotFound);
    }
    if status.is_client_error() || status.is_server_error() {
        return Err(TuplectlError::api(status.as_u16(), status.to_string()));
    }
    Ok(resp)
}
