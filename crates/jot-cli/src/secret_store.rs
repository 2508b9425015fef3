//! Credential storage in the OS keychain.

#[cfg(test)]
use std::collections::HashMap;
#[cfg(test)]
use std::sync::{Mutex, OnceLock};

use jot_core::auth::{AuthError, AuthResult};
use jot_core::CredentialStore;
#[cfg(not(test))]
use keyring::Entry;

#[cfg(not(test))]
const KEYRING_SERVICE_NAME: &str = "jot-cli";

/// `CredentialStore` backed by the platform keyring, one entry per key.
#[derive(Debug, Clone, Default)]
pub struct KeyringCredentialStore;

impl KeyringCredentialStore {
    pub const fn new() -> Self {
        Self
    }

    #[cfg(test)]
    fn test_store() -> &'static Mutex<HashMap<String, String>> {
        static STORE: OnceLock<Mutex<HashMap<String, String>>> = OnceLock::new();
        STORE.get_or_init(|| Mutex::new(HashMap::new()))
    }

    #[cfg(not(test))]
    fn entry(key: &str) -> AuthResult<Entry> {
        Entry::new(KEYRING_SERVICE_NAME, key)
            .map_err(|error| AuthError::SecureStorage(error.to_string()))
    }
}

impl CredentialStore for KeyringCredentialStore {
    #[cfg(not(test))]
    fn get(&self, key: &str) -> AuthResult<Option<String>> {
        match Self::entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(error) => Err(AuthError::SecureStorage(error.to_string())),
        }
    }

    #[cfg(test)]
    fn get(&self, key: &str) -> AuthResult<Option<String>> {
        let guard = Self::test_store()
            .lock()
            .map_err(|error| AuthError::SecureStorage(error.to_string()))?;
        Ok(guard.get(key).cloned())
    }

    #[cfg(not(test))]
    fn put(&self, key: &str, value: &str) -> AuthResult<()> {
        Self::entry(key)?
            .set_password(value)
            .map_err(|error| AuthError::SecureStorage(error.to_string()))
    }

    #[cfg(test)]
    fn put(&self, key: &str, value: &str) -> AuthResult<()> {
        let mut guard = Self::test_store()
            .lock()
            .map_err(|error| AuthError::SecureStorage(error.to_string()))?;
        guard.insert(key.to_string(), value.to_string());
        Ok(())
    }

    #[cfg(not(test))]
    fn delete(&self, key: &str) -> AuthResult<()> {
        match Self::entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(error) => Err(AuthError::SecureStorage(error.to_string())),
        }
    }

    #[cfg(test)]
    fn delete(&self, key: &str) -> AuthResult<()> {
        let mut guard = Self::test_store()
            .lock()
            .map_err(|error| AuthError::SecureStorage(error.to_string()))?;
        guard.remove(key);
        Ok(())
    }
}
