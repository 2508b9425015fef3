//! Identity for remote calls: credential storage, bearer attachment, and
//! token refresh.

mod client;
mod interceptor;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use thiserror::Error;

pub use client::AuthClient;
pub use interceptor::AuthInterceptor;

use crate::transport::TransportError;

pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
pub const BACKEND_URL_KEY: &str = "backend_url";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("Secure storage error: {0}")]
    SecureStorage(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("No stored session; log in again")]
    MissingSession,
}

pub type AuthResult<T> = Result<T, AuthError>;

/// Signals for whoever drives the login flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    /// Token refresh failed and stored credentials were cleared.
    ReauthenticationRequired,
}

/// Secure string store keyed by `access_token`, `refresh_token`, and
/// `backend_url`.
pub trait CredentialStore: Send + Sync + 'static {
    fn get(&self, key: &str) -> AuthResult<Option<String>>;
    fn put(&self, key: &str, value: &str) -> AuthResult<()>;
    /// Deleting a missing key is not an error.
    fn delete(&self, key: &str) -> AuthResult<()>;
}

impl<S: CredentialStore + ?Sized> CredentialStore for Arc<S> {
    fn get(&self, key: &str) -> AuthResult<Option<String>> {
        (**self).get(key)
    }

    fn put(&self, key: &str, value: &str) -> AuthResult<()> {
        (**self).put(key, value)
    }

    fn delete(&self, key: &str) -> AuthResult<()> {
        (**self).delete(key)
    }
}

/// Process-local store, used by tests and for sessions that should not
/// outlive the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryCredentialStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> AuthResult<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|error| AuthError::SecureStorage(error.to_string()))
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, key: &str) -> AuthResult<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> AuthResult<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> AuthResult<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

/// Remove both tokens. Idempotent.
pub fn clear_tokens(store: &impl CredentialStore) -> AuthResult<()> {
    store.delete(ACCESS_TOKEN_KEY)?;
    store.delete(REFRESH_TOKEN_KEY)
}
