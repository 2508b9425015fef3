//! Session lifecycle: login, logout, and restoring the stored backend.

use super::{
    AuthError, CredentialStore, ACCESS_TOKEN_KEY, BACKEND_URL_KEY, REFRESH_TOKEN_KEY,
};
use crate::config::{validated_base_url, SharedBaseUrl};
use crate::rpc::{LoginRequest, LoginResponse, LOGIN_PATH};
use crate::transport::{decode_message, encode_message, RpcRequest, Transport};
use crate::util::normalize_text_option;
use crate::Result;

/// Login client for the auth service.
///
/// A successful login repoints `base_url` at the account's backend, so
/// every transport sharing it follows.
pub struct AuthClient<T, S> {
    transport: T,
    store: S,
    base_url: SharedBaseUrl,
}

impl<T: Transport, S: CredentialStore> AuthClient<T, S> {
    pub const fn new(transport: T, store: S, base_url: SharedBaseUrl) -> Self {
        Self {
            transport,
            store,
            base_url,
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<()> {
        let email = normalize_text_option(Some(email.to_string()))
            .ok_or_else(|| AuthError::InvalidInput("Email is required".into()))?;
        if password.is_empty() {
            return Err(AuthError::InvalidInput("Password is required".into()).into());
        }

        let body = encode_message(&LoginRequest {
            email: email.clone(),
            password: password.to_string(),
        })?;
        let payload = self.transport.call(RpcRequest::new(LOGIN_PATH, body)).await?;
        let response: LoginResponse = decode_message(&payload)?;

        // Repoint only once the session is stored
        let backend_url = validated_base_url(&response.backend_url)?;
        self.store.put(ACCESS_TOKEN_KEY, &response.access_token)?;
        self.store.put(REFRESH_TOKEN_KEY, &response.refresh_token)?;
        self.store.put(BACKEND_URL_KEY, &backend_url)?;
        self.base_url.set(&backend_url)?;

        tracing::info!(backend = %backend_url, "Logged in as {}", email);
        Ok(())
    }

    /// Forget the session. Idempotent.
    pub fn logout(&self) -> Result<()> {
        self.store.delete(ACCESS_TOKEN_KEY)?;
        self.store.delete(REFRESH_TOKEN_KEY)?;
        self.store.delete(BACKEND_URL_KEY)?;
        tracing::info!("Logged out");
        Ok(())
    }

    /// Point `base_url` at the backend saved by the last login, if any.
    /// Returns whether a stored URL was applied.
    pub fn restore_backend_url(&self) -> Result<bool> {
        let Some(url) = normalize_text_option(self.store.get(BACKEND_URL_KEY)?) else {
            return Ok(false);
        };
        self.base_url.set(&url)?;
        tracing::debug!(backend = %url, "Restored backend URL");
        Ok(true)
    }

    pub fn is_authenticated(&self) -> Result<bool> {
        Ok(normalize_text_option(self.store.get(ACCESS_TOKEN_KEY)?).is_some())
    }

    pub const fn base_url(&self) -> &SharedBaseUrl {
        &self.base_url
    }
}
