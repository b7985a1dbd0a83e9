//! Device-code login, keyring credential cache and JWKS-backed token validation.
//!
//! Control flow: [`AuthService::ensure_authenticated`] reads the
//! [`CredentialStore`], checks the token with [`CredentialValidator`] (which asks
//! [`KeyResolver`] for the signing key), and only falls back to the interactive
//! device-code handshake when nothing valid is cached.

pub mod device_code;
pub mod error;
pub mod jwks;
pub mod presenter;
pub mod service;
pub mod store;
pub mod token;
pub mod validator;

pub use device_code::{DeviceAuthorization, DeviceCodePoll, PollState};
pub use error::AuthError;
pub use jwks::{JwkSet, KeyResolver, SigningKey};
pub use presenter::{select_presenter, BrowserPresenter, Presenter, PrintPresenter};
pub use service::{AuthService, AuthStatus};
pub use store::{CredentialStore, KeyringCredentialStore};
pub use token::Credential;
pub use validator::{CredentialValidator, TokenClaims};
