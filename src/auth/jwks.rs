//! Key Resolver: fetch the provider's JWKS and pick the signing key for a `kid`.
//!
//! Keys are fetched on every lookup. A CLI process validates at most one token,
//! so caching would only hide key rotation.

use std::time::Duration;

use jsonwebtoken::DecodingKey;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::error::AuthError;

const SIGNING_USE: &str = "sig";

/// One entry of the provider's JSON Web Key Set.
#[derive(Debug, Clone, Deserialize)]
pub struct Jwk {
    pub kid: String,
    #[serde(default)]
    pub kty: Option<String>,
    #[serde(default, rename = "use")]
    pub key_use: Option<String>,
    #[serde(default)]
    pub alg: Option<String>,
    #[serde(default)]
    pub n: Option<String>,
    #[serde(default)]
    pub e: Option<String>,
    /// Base64 DER certificate chain; the first entry carries the signing key.
    #[serde(default)]
    pub x5c: Vec<String>,
}

impl Jwk {
    fn is_signing_key(&self) -> bool {
        self.key_use.as_deref() == Some(SIGNING_USE)
    }
}

/// JWKS document served at `/.well-known/jwks.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct JwkSet {
    pub keys: Vec<Jwk>,
}

impl JwkSet {
    /// Linear scan; published sets hold a handful of keys.
    pub fn find_signing_key(&self, kid: &str) -> Option<&Jwk> {
        self.keys
            .iter()
            .find(|key| key.kid == kid && key.is_signing_key())
    }
}

/// Public key selected for a token's `kid`, ready for signature verification.
#[derive(Clone)]
pub struct SigningKey {
    pub kid: String,
    pub key_use: String,
    pub decoding_key: DecodingKey,
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("kid", &self.kid)
            .field("key_use", &self.key_use)
            .finish_non_exhaustive()
    }
}

impl TryFrom<&Jwk> for SigningKey {
    type Error = AuthError;

    fn try_from(jwk: &Jwk) -> Result<Self, Self::Error> {
        let decoding_key = match (jwk.x5c.first(), jwk.n.as_deref(), jwk.e.as_deref()) {
            (Some(cert), _, _) => DecodingKey::from_rsa_pem(certificate_pem(cert).as_bytes())?,
            (None, Some(n), Some(e)) if jwk.kty.as_deref() == Some("RSA") => {
                DecodingKey::from_rsa_components(n, e)?
            }
            _ => {
                return Err(AuthError::InvalidToken(format!(
                    "key {} carries no usable certificate material",
                    jwk.kid
                )))
            }
        };
        Ok(Self {
            kid: jwk.kid.clone(),
            key_use: SIGNING_USE.to_string(),
            decoding_key,
        })
    }
}

/// Wrap a base64 DER certificate from `x5c` in PEM armour.
pub fn certificate_pem(x5c_entry: &str) -> String {
    let body: String = x5c_entry.split_whitespace().collect();
    let mut pem = String::from("-----BEGIN CERTIFICATE-----\n");
    let mut rest = body.as_str();
    while !rest.is_empty() {
        let split = rest.len().min(64);
        let (line, tail) = rest.split_at(split);
        pem.push_str(line);
        pem.push('\n');
        rest = tail;
    }
    pem.push_str("-----END CERTIFICATE-----\n");
    pem
}

/// Fetches the identity provider's key set and resolves signing keys by `kid`.
///
/// # Example
/// ```no_run
/// use tuplectl::auth::KeyResolver;
///
/// # async fn example() -> Result<(), tuplectl::auth::AuthError> {
/// let resolver = KeyResolver::new("https://tenant.example.com/.well-known/jwks.json");
/// let key = resolver.resolve_key("key-1").await?;
/// println!("resolved {}", key.kid);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct KeyResolver {
    client: reqwest::Client,
    jwks_url: String,
}

impl KeyResolver {
    pub fn new(jwks_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|err| {
                tracing::warn!(error = %err, "Failed to build JWKS HTTP client, using defaults");
                reqwest::Client::new()
            });
        Self::with_client(client, jwks_url)
    }

    pub fn with_client(client: reqwest::Client, jwks_url: impl Into<String>) -> Self {
        Self {
            client,
            jwks_url: jwks_url.into(),
        }
    }

    /// Unauthenticated GET of the published key set.
    #[instrument(skip(self), fields(url = %self.jwks_url))]
    pub async fn fetch_key_set(&self) -> Result<JwkSet, AuthError> {
        let resp = self.client.get(&self.jwks_url).send().await?;
        if !resp.status().is_success() {
            return Err(AuthError::InvalidResponse(format!(
                "JWKS request failed with status {}",
                resp.status()
            )));
        }
        let set: JwkSet = resp.json().await?;
        debug!(key_count = set.keys.len(), "Fetched JWKS");
        Ok(set)
    }

    /// Resolve the signing key for `kid`; a missing or non-signing entry is an error.
    #[instrument(skip(self))]
    pub async fn resolve_key(&self, kid: &str) -> Result<SigningKey, AuthError> {
        let set = self.fetch_key_set().await?;
        let jwk = set
            .find_signing_key(kid)
            .ok_or_else(|| AuthError::NoMatchingKey(kid.to_string()))?;
        SigningKey::try_from(jwk)
    }
}
