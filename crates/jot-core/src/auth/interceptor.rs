//! Bearer attachment and single-flight token refresh around a transport.

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::{broadcast, Mutex};

use super::{
    clear_tokens, AuthError, AuthEvent, AuthResult, CredentialStore, ACCESS_TOKEN_KEY,
    REFRESH_TOKEN_KEY,
};
use crate::rpc::{
    is_public_auth_path, RefreshTokenRequest, RefreshTokenResponse, REFRESH_TOKEN_PATH,
};
use crate::transport::{
    decode_message, encode_message, RpcRequest, Transport, TransportError, TransportResult,
};

const AUTH_EVENT_CAPACITY: usize = 16;

/// Wraps a transport with identity.
///
/// Protected calls carry the stored access token. A 401 triggers one token
/// refresh shared by every caller that hit it concurrently, then a single
/// reissue of the original request. If the refresh fails, stored tokens are
/// cleared and `AuthEvent::ReauthenticationRequired` is broadcast.
pub struct AuthInterceptor<T, S> {
    inner: T,
    store: S,
    refresh_lock: Mutex<()>,
    events: broadcast::Sender<AuthEvent>,
}

impl<T: Transport, S: CredentialStore> AuthInterceptor<T, S> {
    pub fn new(inner: T, store: S) -> Self {
        let (events, _) = broadcast::channel(AUTH_EVENT_CAPACITY);
        Self {
            inner,
            store,
            refresh_lock: Mutex::new(()),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    pub fn access_token(&self) -> AuthResult<Option<String>> {
        self.store.get(ACCESS_TOKEN_KEY)
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    pub const fn inner(&self) -> &T {
        &self.inner
    }

    fn stored_access_token(&self) -> Option<String> {
        match self.access_token() {
            Ok(token) => token.filter(|token| !token.trim().is_empty()),
            Err(error) => {
                tracing::warn!("Failed to read access token, sending unauthenticated: {}", error);
                None
            }
        }
    }

    /// Returns the token to retry with, or `None` when the session is gone.
    ///
    /// The lock covers only the refresh exchange. A caller that waited on it
    /// reuses the token another caller just obtained instead of refreshing
    /// again.
    async fn refresh_after_unauthorized(&self, rejected_token: Option<&str>) -> Option<String> {
        let _guard = self.refresh_lock.lock().await;

        if let Some(current) = self.stored_access_token() {
            if Some(current.as_str()) != rejected_token {
                tracing::debug!("Access token already refreshed by a concurrent call");
                return Some(current);
            }
        }

        match self.refresh_tokens().await {
            Ok(token) => {
                tracing::info!("Access token refreshed");
                Some(token)
            }
            Err(error) => {
                tracing::warn!("Token refresh failed, re-authentication required: {}", error);
                if let Err(error) = clear_tokens(&self.store) {
                    tracing::warn!("Failed to clear stored credentials: {}", error);
                }
                let _ = self.events.send(AuthEvent::ReauthenticationRequired);
                None
            }
        }
    }

    async fn refresh_tokens(&self) -> AuthResult<String> {
        let refresh_token = self
            .store
            .get(REFRESH_TOKEN_KEY)?
            .filter(|token| !token.trim().is_empty())
            .ok_or(AuthError::MissingSession)?;

        let body = encode_message(&RefreshTokenRequest { refresh_token })?;
        let payload = self
            .inner
            .call(RpcRequest::new(REFRESH_TOKEN_PATH, body))
            .await?;
        let response: RefreshTokenResponse = decode_message(&payload)?;

        self.store.put(ACCESS_TOKEN_KEY, &response.access_token)?;
        if let Some(rotated) = response
            .refresh_token
            .as_deref()
            .filter(|token| !token.trim().is_empty())
        {
            self.store.put(REFRESH_TOKEN_KEY, rotated)?;
        }
        Ok(response.access_token)
    }
}

#[async_trait]
impl<T: Transport, S: CredentialStore> Transport for AuthInterceptor<T, S> {
    async fn call(&self, request: RpcRequest) -> TransportResult<Bytes> {
        if is_public_auth_path(&request.path) {
            return self.inner.call(request).await;
        }

        let token = self.stored_access_token();
        let mut outgoing = request.clone();
        outgoing.bearer.clone_from(&token);

        let unauthorized: TransportError = match self.inner.call(outgoing).await {
            Err(error) if error.is_unauthorized() => error,
            other => return other,
        };
        tracing::debug!(path = %request.path, "Call rejected as unauthorized");

        let Some(fresh_token) = self.refresh_after_unauthorized(token.as_deref()).await else {
            return Err(unauthorized);
        };
        self.inner.call(request.with_bearer(fresh_token)).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use pretty_assertions::assert_eq;
    use tokio::sync::broadcast::error::TryRecvError;

    use super::*;
    use crate::auth::MemoryCredentialStore;
    use crate::rpc::{GET_NOTE_PATH, LIST_NOTES_PATH, LOGIN_PATH};
    use crate::test_support::{FakeAuthBackend, RefreshBehavior};

    fn store_with(access: Option<&str>, refresh: Option<&str>) -> MemoryCredentialStore {
        let store = MemoryCredentialStore::new();
        if let Some(token) = access {
            store.put(ACCESS_TOKEN_KEY, token).unwrap();
        }
        if let Some(token) = refresh {
            store.put(REFRESH_TOKEN_KEY, token).unwrap();
        }
        store
    }

    #[tokio::test]
    async fn attaches_stored_token_to_protected_calls() {
        let backend = Arc::new(FakeAuthBackend::accepting("tokA"));
        let interceptor = AuthInterceptor::new(Arc::clone(&backend), store_with(Some("tokA"), None));

        interceptor
            .call(RpcRequest::new(GET_NOTE_PATH, Vec::new()))
            .await
            .unwrap();

        assert_eq!(
            backend.recorded_calls(),
            vec![(GET_NOTE_PATH.to_string(), Some("tokA".to_string()))]
        );
    }

    #[tokio::test]
    async fn sends_unauthenticated_without_token_and_never_decorates_public_paths() {
        let backend = Arc::new(FakeAuthBackend::accepting("tokA"));
        let interceptor = AuthInterceptor::new(Arc::clone(&backend), store_with(None, None));
        let _ = interceptor
            .call(RpcRequest::new(GET_NOTE_PATH, Vec::new()))
            .await;

        let authed = AuthInterceptor::new(Arc::clone(&backend), store_with(Some("tokA"), None));
        let _ = authed.call(RpcRequest::new(LOGIN_PATH, Vec::new())).await;

        let calls = backend.recorded_calls();
        assert_eq!(calls[0], (GET_NOTE_PATH.to_string(), None));
        assert_eq!(calls[1], (LOGIN_PATH.to_string(), None));
    }

    #[tokio::test]
    async fn public_path_401_is_returned_without_refresh() {
        let backend = Arc::new(FakeAuthBackend::accepting("tokA"));
        let interceptor =
            AuthInterceptor::new(Arc::clone(&backend), store_with(Some("tokA"), Some("refA")));

        let error = interceptor
            .call(RpcRequest::new(LOGIN_PATH, Vec::new()))
            .await
            .unwrap_err();

        assert!(error.is_unauthorized());
        assert_eq!(backend.refresh_calls(), 0);
    }

    #[tokio::test]
    async fn refreshes_once_and_reissues_original_request() {
        let backend = Arc::new(
            FakeAuthBackend::accepting("tokB").with_refresh(RefreshBehavior::Issue("tokB".into())),
        );
        let store = store_with(Some("tokA"), Some("refA"));
        let interceptor = AuthInterceptor::new(Arc::clone(&backend), store.clone());

        interceptor
            .call(RpcRequest::new(GET_NOTE_PATH, Vec::new()))
            .await
            .unwrap();

        assert_eq!(backend.refresh_calls(), 1);
        assert_eq!(store.get(ACCESS_TOKEN_KEY).unwrap().as_deref(), Some("tokB"));
        assert_eq!(
            backend.recorded_calls(),
            vec![
                (GET_NOTE_PATH.to_string(), Some("tokA".to_string())),
                (REFRESH_TOKEN_PATH.to_string(), None),
                (GET_NOTE_PATH.to_string(), Some("tokB".to_string())),
            ]
        );
    }

    #[tokio::test]
    async fn rotated_refresh_token_is_stored() {
        let backend = Arc::new(FakeAuthBackend::accepting("tokB").with_refresh(
            RefreshBehavior::IssueRotating("tokB".into(), "refB".into()),
        ));
        let store = store_with(Some("tokA"), Some("refA"));
        let interceptor = AuthInterceptor::new(Arc::clone(&backend), store.clone());

        interceptor
            .call(RpcRequest::new(GET_NOTE_PATH, Vec::new()))
            .await
            .unwrap();

        assert_eq!(store.get(REFRESH_TOKEN_KEY).unwrap().as_deref(), Some("refB"));
    }

    #[tokio::test]
    async fn retry_failure_after_refresh_is_final() {
        // Refresh succeeds but the backend keeps rejecting the new token.
        let backend = Arc::new(
            FakeAuthBackend::accepting("never").with_refresh(RefreshBehavior::Issue("tokB".into())),
        );
        let interceptor =
            AuthInterceptor::new(Arc::clone(&backend), store_with(Some("tokA"), Some("refA")));

        let error = interceptor
            .call(RpcRequest::new(GET_NOTE_PATH, Vec::new()))
            .await
            .unwrap_err();

        assert!(error.is_unauthorized());
        assert_eq!(backend.refresh_calls(), 1);
        assert_eq!(backend.calls_to(GET_NOTE_PATH), 2);
    }

    #[tokio::test]
    async fn failed_refresh_clears_tokens_and_emits_one_event() {
        let backend =
            Arc::new(FakeAuthBackend::accepting("tokB").with_refresh(RefreshBehavior::Fail));
        let store = store_with(Some("tokA"), Some("refA"));
        let interceptor = AuthInterceptor::new(Arc::clone(&backend), store.clone());
        let mut events = interceptor.subscribe();

        let error = interceptor
            .call(RpcRequest::new(GET_NOTE_PATH, Vec::new()))
            .await
            .unwrap_err();

        assert_eq!(error, TransportError::client(401, "invalid token"));
        assert_eq!(interceptor.access_token().unwrap(), None);
        assert_eq!(store.get(REFRESH_TOKEN_KEY).unwrap(), None);
        assert_eq!(events.try_recv(), Ok(AuthEvent::ReauthenticationRequired));
        assert_eq!(events.try_recv(), Err(TryRecvError::Empty));
    }

    #[tokio::test]
    async fn missing_refresh_token_fails_without_network_call() {
        let backend =
            Arc::new(FakeAuthBackend::accepting("tokB").with_refresh(RefreshBehavior::Fail));
        let interceptor = AuthInterceptor::new(Arc::clone(&backend), store_with(Some("tokA"), None));
        let mut events = interceptor.subscribe();

        let _ = interceptor
            .call(RpcRequest::new(GET_NOTE_PATH, Vec::new()))
            .await;

        assert_eq!(backend.refresh_calls(), 0);
        assert_eq!(events.try_recv(), Ok(AuthEvent::ReauthenticationRequired));
    }

    #[tokio::test]
    async fn other_failures_pass_through_untouched() {
        let backend = Arc::new(
            FakeAuthBackend::accepting("tokA")
                .with_protected_failure(TransportError::server(500, "boom")),
        );
        let interceptor =
            AuthInterceptor::new(Arc::clone(&backend), store_with(Some("tokA"), Some("refA")));

        let error = interceptor
            .call(RpcRequest::new(GET_NOTE_PATH, Vec::new()))
            .await
            .unwrap_err();

        assert_eq!(error, TransportError::server(500, "boom"));
        assert_eq!(backend.refresh_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_unauthorized_calls_share_one_refresh() {
        let backend = Arc::new(
            FakeAuthBackend::accepting("tokB")
                .with_refresh(RefreshBehavior::Issue("tokB".into()))
                .with_refresh_delay(Duration::from_millis(50)),
        );
        let interceptor =
            AuthInterceptor::new(Arc::clone(&backend), store_with(Some("tokA"), Some("refA")));

        let (first, second) = tokio::join!(
            interceptor.call(RpcRequest::new(GET_NOTE_PATH, Vec::new())),
            interceptor.call(RpcRequest::new(LIST_NOTES_PATH, Vec::new())),
        );

        assert!(first.is_ok());
        assert!(second.is_ok());
        assert_eq!(backend.refresh_calls(), 1);

        let retried_with: Vec<Option<String>> = backend
            .recorded_calls()
            .into_iter()
            .filter(|(path, _)| path != REFRESH_TOKEN_PATH)
            .map(|(_, bearer)| bearer)
            .collect();
        assert_eq!(
            retried_with,
            vec![
                Some("tokA".to_string()),
                Some("tokA".to_string()),
                Some("tokB".to_string()),
                Some("tokB".to_string()),
            ]
        );
    }
}
