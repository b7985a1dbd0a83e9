#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};

use tuplectl::auth::{AuthError, Credential, CredentialStore, DeviceAuthorization, Presenter};
use tuplectl::config::AuthConfig;

pub const SIGNING_KID: &str = "test-signing-key";
pub const AUDIENCE: &str = "https://api.tuplestream.net/";

const SIGNING_KEY_A: &str = include_str!("../fixtures/signing_key_a.pem");
const SIGNING_KEY_B: &str = include_str!("../fixtures/signing_key_b.pem");
const SIGNING_CERT_A: &str = include_str!("../fixtures/signing_cert_a.b64");
const SIGNING_MODULUS_A: &str = include_str!("../fixtures/signing_key_a.n");

/// Which private key signs a test token. Only `A` is published in the JWKS.
#[derive(Debug, Clone, Copy)]
pub enum TestKey {
    A,
    B,
}

/// RS256 token for `kid`, expiring `exp_offset_secs` from now.
pub fn signed_token(kid: &str, exp_offset_secs: i64, key: TestKey) -> String {
    signed_token_with_claims(
        kid,
        json!({
            "sub": "auth0|operator",
            "iss": "https://tenant.example.com/",
            "aud": AUDIENCE,
            "scope": "logstream",
            "exp": Utc::now().timestamp() + exp_offset_secs,
        }),
        key,
    )
}

pub fn signed_token_with_claims(kid: &str, claims: Value, key: TestKey) -> String {
    let pem = match key {
        TestKey::A => SIGNING_KEY_A,
        TestKey::B => SIGNING_KEY_B,
    };
    let mut header = Header::new(jsonwebtoken::Algorithm::RS256);
    header.kid = Some(kid.to_string());
    let key = EncodingKey::from_rsa_pem(pem.as_bytes()).expect("fixture key parses");
    encode(&header, &claims, &key).expect("token encodes")
}

/// Key set publishing key A as an `x5c` certificate under [`SIGNING_KID`].
pub fn jwks_body() -> Value {
    jwks_with(SIGNING_KID, "sig")
}

pub fn jwks_with(kid: &str, key_use: &str) -> Value {
    json!({
        "keys": [{
            "kid": kid,
            "kty": "RSA",
            "use": key_use,
            "alg": "RS256",
            "x5c": [SIGNING_CERT_A.trim()],
        }]
    })
}

/// Key set publishing key A only as bare `n`/`e` components.
pub fn jwks_components_body() -> Value {
    json!({
        "keys": [{
            "kid": SIGNING_KID,
            "kty": "RSA",
            "use": "sig",
            "alg": "RS256",
            "n": SIGNING_MODULUS_A.trim(),
            "e": "AQAB",
        }]
    })
}

pub fn test_config(base_url: &str) -> AuthConfig {
    AuthConfig::new(base_url, "test-client").with_open_browser(false)
}

/// Single-slot store that can be told to refuse writes.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    slot: Mutex<Option<Credential>>,
    fail_puts: bool,
    puts: AtomicUsize,
    deletes: AtomicUsize,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_puts() -> Self {
        Self {
            fail_puts: true,
            ..Self::default()
        }
    }

    pub fn seeded(credential: Credential) -> Self {
        let store = Self::default();
        *store.slot.lock().expect("store lock poisoned") = Some(credential);
        store
    }

    pub fn current(&self) -> Option<Credential> {
        self.slot.lock().expect("store lock poisoned").clone()
    }

    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn delete_count(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn get(&self) -> Option<Credential> {
        self.current()
    }

    fn put(&self, credential: &Credential) -> Result<(), AuthError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if self.fail_puts {
            return Err(AuthError::StoreUnavailable("keychain locked".to_string()));
        }
        *self.slot.lock().expect("store lock poisoned") = Some(credential.clone());
        Ok(())
    }

    fn delete(&self) -> Result<(), AuthError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.slot.lock().expect("store lock poisoned").take();
        Ok(())
    }
}

/// Presenter that never blocks and remembers what it was asked to show.
#[derive(Default)]
pub struct RecordingPresenter {
    presented: Mutex<Vec<String>>,
    warnings: Mutex<Vec<String>>,
    polls: AtomicUsize,
    finished: AtomicUsize,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn presented_codes(&self) -> Vec<String> {
        self.presented.lock().expect("presenter lock poisoned").clone()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.warnings.lock().expect("presenter lock poisoned").clone()
    }

    pub fn poll_count(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }

    pub fn finished_count(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }
}

impl Presenter for RecordingPresenter {
    fn present(&self, authorization: &DeviceAuthorization) -> Result<(), AuthError> {
        self.presented
            .lock()
            .expect("presenter lock poisoned")
            .push(authorization.user_code.clone());
        Ok(())
    }

    fn poll_started(&self, _attempt: u32) {
        self.polls.fetch_add(1, Ordering::SeqCst);
    }

    fn finished(&self) {
        self.finished.fetch_add(1, Ordering::SeqCst);
    }

    fn warn(&self, message: &str) {
        self.warnings
            .lock()
            .expect("presenter lock poisoned")
            .push(message.to_string());
    }
}
