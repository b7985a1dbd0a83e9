use tracing::{debug, warn};

use super::error::AuthError;
use super::token::Credential;

/// Keyring service name for the cached access token.
pub const DEFAULT_KEYRING_SERVICE: &str = "com.tuplestream.tuplectl.AccessToken";
/// Keyring account for the cached access token.
pub const DEFAULT_KEYRING_ACCOUNT: &str = "default";

/// Single-slot storage for the operator's credential.
///
/// `get` folds "nothing stored" and "store unreachable" into `None` so callers
/// always fall through to an interactive login. `put` surfaces its failures so
/// the caller can warn the operator.
pub trait CredentialStore: Send + Sync {
    fn get(&self) -> Option<Credential>;
    fn put(&self, credential: &Credential) -> Result<(), AuthError>;
    /// Removing an empty slot succeeds.
    fn delete(&self) -> Result<(), AuthError>;
}

/// Credential store backed by the host keyring (macOS Keychain, Windows
/// Credential Manager, Linux kernel keyutils).
///
/// There is no locking across processes: two concurrent logins race on the
/// final `put` and the last write wins.
///
/// # Example
/// ```no_run
/// use tuplectl::auth::{Credential, CredentialStore, KeyringCredentialStore};
///
/// let store = KeyringCredentialStore::new_default();
/// store.put(&Credential::bearer("token"))?;
/// assert!(store.get().is_some());
/// # Ok::<(), tuplectl::auth::AuthError>(())
/// ```
pub struct KeyringCredentialStore {
    service: String,
    account: String,
    entry: Result<keyring::Entry, String>,
}

impl KeyringCredentialStore {
    pub fn new(service: impl Into<String>, account: impl Into<String>) -> Self {
        let service = service.into();
        let account = account.into();
        let entry = keyring::Entry::new(&service, &account).map_err(|err| {
            warn!(service = %service, error = %err, "Unable to open keyring entry");
            err.to_string()
        });
        Self {
            service,
            account,
            entry,
        }
    }

    pub fn new_default() -> Self {
        Self::new(DEFAULT_KEYRING_SERVICE, DEFAULT_KEYRING_ACCOUNT)
    }

    fn entry(&self) -> Result<&keyring::Entry, AuthError> {
        self.entry
            .as_ref()
            .map_err(|message| AuthError::StoreUnavailable(message.clone()))
    }
}

impl CredentialStore for KeyringCredentialStore {
    fn get(&self) -> Option<Credential> {
        let entry = self.entry().ok()?;
        match entry.get_password() {
            Ok(secret) if !secret.trim().is_empty() => Some(Credential::bearer(secret)),
            Ok(_) => None,
            Err(keyring::Error::NoEntry) => None,
            Err(err) => {
                debug!(service = %self.service, account = %self.account, error = %err, "Keyring read failed");
                None
            }
        }
    }

    fn put(&self, credential: &Credential) -> Result<(), AuthError> {
        self.entry()?.set_password(&credential.access_token)?;
        Ok(())
    }

    fn delete(&self) -> Result<(), AuthError> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
