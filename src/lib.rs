//! tuplectl: the TupleStream command-line client.
//!
//! The [`auth`] module carries the device-code login: a keyring-backed
//! credential cache, JWKS signature checks on the cached token, and the
//! polling state machine that obtains a fresh one. [`api`] wraps the
//! control-plane endpoints that consume the resulting credential.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use tuplectl::auth::{select_presenter, AuthService, KeyringCredentialStore};
//! use tuplectl::config::Config;
//!
//! # async fn example() -> tuplectl::error::Result<()> {
//! let config = Config::from_env();
//! config.validate()?;
//! let store = Arc::new(KeyringCredentialStore::new_default());
//! let svc = AuthService::new(config.auth.clone(), store, select_presenter(false));
//! let credential = svc.ensure_authenticated().await?;
//! let client = tuplectl::api::ApiClient::new(&config.api_base_url, credential)?;
//! println!("healthy: {}", client.platform_status().await?);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;
