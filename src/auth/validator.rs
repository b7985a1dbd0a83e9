use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, decode_header, Algorithm, Validation};
use serde::Deserialize;
use tracing::{debug, instrument};

use super::error::AuthError;
use super::jwks::KeyResolver;

/// RSA-family algorithms accepted for provider-issued access tokens.
const ACCEPTED_ALGORITHMS: [Algorithm; 6] = [
    Algorithm::RS256,
    Algorithm::RS384,
    Algorithm::RS512,
    Algorithm::PS256,
    Algorithm::PS384,
    Algorithm::PS512,
];

/// Claims read from a validated access token.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenClaims {
    pub exp: i64,
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub iss: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

impl TokenClaims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp(self.exp, 0)
    }
}

/// Checks a cached access token's signature against the provider's JWKS and
/// that its `exp` claim is still in the future.
///
/// The `aud` claim must also name the configured audience, so a correctly
/// signed, unexpired token minted for another API is still rejected. Pass an
/// empty audience to skip that check.
///
/// # Example
/// ```no_run
/// use tuplectl::auth::{CredentialValidator, KeyResolver};
///
/// # async fn example(raw: &str) {
/// let validator = CredentialValidator::new(
///     KeyResolver::new("https://tenant.example.com/.well-known/jwks.json"),
///     "https://api.tuplestream.net/",
/// );
/// if !validator.is_valid(raw).await {
///     println!("cached token rejected");
/// }
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct CredentialValidator {
    resolver: KeyResolver,
    audience: Option<String>,
}

impl CredentialValidator {
    pub fn new(resolver: KeyResolver, audience: impl Into<String>) -> Self {
        let audience = audience.into();
        Self {
            resolver,
            audience: (!audience.trim().is_empty()).then_some(audience),
        }
    }

    /// Full check; the error says which step rejected the token.
    #[instrument(skip_all)]
    pub async fn validate(&self, raw_token: &str) -> Result<TokenClaims, AuthError> {
        let header = decode_header(raw_token)?;
        if !ACCEPTED_ALGORITHMS.contains(&header.alg) {
            return Err(AuthError::InvalidToken(format!(
                "unsupported signing algorithm {:?}",
                header.alg
            )));
        }
        let kid = header
            .kid
            .ok_or_else(|| AuthError::InvalidToken("missing kid in header".to_string()))?;

        let key = self.resolver.resolve_key(&kid).await?;

        let mut validation = Validation::new(header.alg);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);
        match &self.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        let data = decode::<TokenClaims>(raw_token, &key.decoding_key, &validation)?;
        debug!(kid = %kid, "Access token verified");
        Ok(data.claims)
    }

    /// `false` on any failure: malformed token, no matching key, bad signature, expired.
    pub async fn is_valid(&self, raw_token: &str) -> bool {
        match self.validate(raw_token).await {
            Ok(_) => true,
            Err(err) => {
                debug!(error = %err, "Cached credential failed validation");
                false
            }
        }
    }
}
