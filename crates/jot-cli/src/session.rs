//! Wires the core stack together for one CLI run.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use jot_core::{
    AuthClient, AuthEvent, AuthInterceptor, ClientConfig, HttpTransport, NotesRepository,
    RpcNetworkDataSource, SharedBaseUrl, SqliteNoteCache,
};
use tokio::sync::broadcast::{self, error::TryRecvError};

use crate::error::CliError;
use crate::secret_store::KeyringCredentialStore;

pub type CliStore = Arc<KeyringCredentialStore>;
pub type CliTransport = Arc<AuthInterceptor<HttpTransport, CliStore>>;
pub type CliRepository = NotesRepository<RpcNetworkDataSource<CliTransport>, SqliteNoteCache>;

const BACKGROUND_WAIT_LIMIT: Duration = Duration::from_secs(2);

pub struct Session {
    repository: CliRepository,
    auth: AuthClient<CliTransport, CliStore>,
    events: broadcast::Receiver<AuthEvent>,
    interactive: bool,
}

impl Session {
    /// `restore_backend` applies the backend URL saved by the last login;
    /// pass `false` when the user named a backend explicitly.
    pub fn open(
        config: &ClientConfig,
        cache_path: &Path,
        restore_backend: bool,
    ) -> Result<Self, CliError> {
        let store: CliStore = Arc::new(KeyringCredentialStore::new());
        let base_url = SharedBaseUrl::new(&config.base_url)?;
        let http = HttpTransport::new(base_url.clone(), config)?;
        let transport: CliTransport = Arc::new(AuthInterceptor::new(http, Arc::clone(&store)));
        let events = transport.subscribe();

        let auth = AuthClient::new(Arc::clone(&transport), store, base_url);
        if restore_backend {
            auth.restore_backend_url()?;
        }

        let cache = SqliteNoteCache::open(cache_path)?;
        let repository = NotesRepository::new(RpcNetworkDataSource::new(transport), cache);
        tracing::debug!(
            backend = %auth.base_url().get(),
            cache = %cache_path.display(),
            "Session opened"
        );

        Ok(Self {
            repository,
            auth,
            events,
            interactive: false,
        })
    }

    pub const fn repository(&self) -> &CliRepository {
        &self.repository
    }

    pub const fn auth(&self) -> &AuthClient<CliTransport, CliStore> {
        &self.auth
    }

    /// Interactive sessions keep offline writes queued for a later `sync`.
    pub const fn set_interactive(&mut self, interactive: bool) {
        self.interactive = interactive;
    }

    pub const fn is_interactive(&self) -> bool {
        self.interactive
    }

    /// Print a login hint if a token refresh failed since the last check.
    pub fn report_auth_events(&mut self) {
        let mut reauth_required = false;
        loop {
            match self.events.try_recv() {
                Ok(AuthEvent::ReauthenticationRequired) => reauth_required = true,
                Err(TryRecvError::Lagged(_)) => {}
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
        if reauth_required {
            eprintln!("Session expired. Run `jot login` to sign in again.");
        }
    }

    /// Wait for background refreshes and warn about writes that will be
    /// lost when the process exits.
    pub async fn finish(&mut self) {
        let wait = self.repository.wait_for_background_tasks();
        if tokio::time::timeout(BACKGROUND_WAIT_LIMIT, wait).await.is_err() {
            tracing::debug!(
                limit_secs = BACKGROUND_WAIT_LIMIT.as_secs(),
                "Gave up waiting for background refreshes"
            );
        }
        self.report_auth_events();

        let pending = self.repository.pending_operation_count().await;
        if pending > 0 {
            eprintln!(
                "Warning: {pending} queued write(s) were not synced and will be discarded. \
                 Use `jot shell` to keep writes queued until `sync` succeeds."
            );
        }
    }
}
