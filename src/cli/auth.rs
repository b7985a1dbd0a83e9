//! CLI auth command handlers for login, status, and logout.

use std::io::Write;
use std::sync::Arc;

use crate::auth::{
    select_presenter, AuthService, AuthStatus, Credential, KeyringCredentialStore,
};
use crate::config::Config;
use crate::error::Result;

/// Wire the keyring store and the platform presenter into a flow controller.
///
/// Does not validate `config`; commands that talk to the provider call
/// [`Config::validate`] first.
pub fn build_service(config: &Config) -> AuthService {
    let auth = config.auth.clone();
    let store = Arc::new(KeyringCredentialStore::new(
        &auth.keyring_service,
        &auth.keyring_account,
    ));
    let presenter = select_presenter(auth.open_browser);
    AuthService::new(auth, store, presenter)
}

/// Cached credential if it still validates, otherwise an interactive login.
///
/// Only the interactive path reports on `out`/`err`.
pub async fn authenticate<O: Write, E: Write>(
    config: &Config,
    service: &AuthService,
    out: &mut O,
    err: &mut E,
) -> Result<Credential> {
    if let Some(credential) = service.cached_credential().await {
        return Ok(credential);
    }
    interactive_login(config, service, out, err).await
}

/// Run the device-code login and announce the result. With
/// TUPLECTL_PRINT_AUTH_TOKEN set, the raw token goes to `err`.
pub async fn interactive_login<O: Write, E: Write>(
    config: &Config,
    service: &AuthService,
    out: &mut O,
    err: &mut E,
) -> Result<Credential> {
    let credential = service.login().await?;
    if config.print_token {
        writeln!(err, "{}", credential.access_token)?;
    }
    writeln!(out, "Finished authentication!")?;
    Ok(credential)
}

/// Handle `tuplectl auth login`.
pub async fn handle_login(config: &Config) -> Result<()> {
    config.validate()?;
    let service = build_service(config);
    interactive_login(
        config,
        &service,
        &mut std::io::stdout(),
        &mut std::io::stderr(),
    )
    .await?;
    Ok(())
}

/// Handle `tuplectl auth logout`. Needs no provider settings.
pub fn handle_logout(config: &Config) -> Result<()> {
    build_service(config).logout()?;
    println!("Logged out");
    Ok(())
}

/// Handle `tuplectl auth status`.
pub async fn handle_status(config: &Config) -> Result<()> {
    config.validate()?;
    let service = build_service(config);
    match service.status().await {
        AuthStatus::LoggedIn {
            expires_at: Some(expires),
        } => println!("Logged in (expires {})", expires.format("%Y-%m-%d %H:%M")),
        AuthStatus::LoggedIn { expires_at: None } => println!("Logged in"),
        AuthStatus::NotLoggedIn => println!("Not logged in. Run: tuplectl auth login"),
    }
    Ok(())
}
