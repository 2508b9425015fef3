//! Scripted collaborators shared by unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::Notify;

use crate::models::{CreateNoteParams, Note, UpdateNoteParams};
use crate::network::NetworkDataSource;
use crate::rpc::{LoginResponse, RefreshTokenResponse, LOGIN_PATH, REFRESH_TOKEN_PATH};
use crate::transport::{encode_message, RpcRequest, Transport, TransportError, TransportResult};
use crate::Result;

pub enum RefreshBehavior {
    Issue(String),
    IssueRotating(String, String),
    Fail,
}

/// Backend that accepts exactly one bearer token on protected paths.
pub struct FakeAuthBackend {
    valid_token: Mutex<String>,
    refresh: RefreshBehavior,
    refresh_delay: Duration,
    protected_failure: Option<TransportError>,
    login: Option<LoginResponse>,
    refresh_calls: AtomicUsize,
    calls: Mutex<Vec<(String, Option<String>)>>,
}

impl FakeAuthBackend {
    pub fn accepting(token: &str) -> Self {
        Self {
            valid_token: Mutex::new(token.to_string()),
            refresh: RefreshBehavior::Fail,
            refresh_delay: Duration::ZERO,
            protected_failure: None,
            login: None,
            refresh_calls: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_refresh(mut self, behavior: RefreshBehavior) -> Self {
        self.refresh = behavior;
        self
    }

    pub const fn with_refresh_delay(mut self, delay: Duration) -> Self {
        self.refresh_delay = delay;
        self
    }

    pub fn with_protected_failure(mut self, error: TransportError) -> Self {
        self.protected_failure = Some(error);
        self
    }

    pub fn with_login(mut self, response: LoginResponse) -> Self {
        self.login = Some(response);
        self
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn recorded_calls(&self) -> Vec<(String, Option<String>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, path: &str) -> usize {
        self.recorded_calls()
            .iter()
            .filter(|(called, _)| called == path)
            .count()
    }

    async fn refresh(&self) -> TransportResult<Bytes> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        if !self.refresh_delay.is_zero() {
            tokio::time::sleep(self.refresh_delay).await;
        }
        let response = match &self.refresh {
            RefreshBehavior::Issue(token) => RefreshTokenResponse {
                access_token: token.clone(),
                refresh_token: None,
            },
            RefreshBehavior::IssueRotating(token, refresh) => RefreshTokenResponse {
                access_token: token.clone(),
                refresh_token: Some(refresh.clone()),
            },
            RefreshBehavior::Fail => {
                return Err(TransportError::client(401, "refresh token revoked"));
            }
        };
        *self.valid_token.lock().unwrap() = response.access_token.clone();
        encode_message(&response)
    }
}

#[async_trait]
impl Transport for FakeAuthBackend {
    async fn call(&self, request: RpcRequest) -> TransportResult<Bytes> {
        self.calls
            .lock()
            .unwrap()
            .push((request.path.clone(), request.bearer.clone()));

        match request.path.as_str() {
            REFRESH_TOKEN_PATH => self.refresh().await,
            LOGIN_PATH => match &self.login {
                Some(response) => encode_message(response),
                None => Err(TransportError::client(401, "invalid credentials")),
            },
            _ => {
                if let Some(error) = &self.protected_failure {
                    return Err(error.clone());
                }
                let valid = self.valid_token.lock().unwrap().clone();
                if request.bearer.as_deref() == Some(valid.as_str()) {
                    encode_message(&"ok")
                } else {
                    Err(TransportError::client(401, "invalid token"))
                }
            }
        }
    }
}

/// One recorded call against `FakeNetwork`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkCall {
    Create(String),
    Get(String),
    List(String),
    Update(String),
    Delete(String),
}

/// In-memory backend with scriptable failures and an optional gate that
/// holds `get_note`/`list_notes` until released.
#[derive(Default)]
pub struct FakeNetwork {
    notes: Mutex<HashMap<String, Note>>,
    failures: Mutex<VecDeque<TransportError>>,
    get_failures: Mutex<VecDeque<TransportError>>,
    offline: Mutex<Option<TransportError>>,
    clock: AtomicUsize,
    calls: Mutex<Vec<NetworkCall>>,
    read_gate: Mutex<Option<std::sync::Arc<Notify>>>,
}

impl FakeNetwork {
    pub fn new() -> Self {
        Self {
            clock: AtomicUsize::new(1_000),
            ..Self::default()
        }
    }

    pub fn seed(&self, note: Note) {
        self.notes
            .lock()
            .unwrap()
            .insert(note.file_path.clone(), note);
    }

    pub fn remote_note(&self, file_path: &str) -> Option<Note> {
        self.notes.lock().unwrap().get(file_path).cloned()
    }

    /// Every call fails with `error` until `go_online`.
    pub fn go_offline(&self, error: TransportError) {
        *self.offline.lock().unwrap() = Some(error);
    }

    pub fn go_online(&self) {
        *self.offline.lock().unwrap() = None;
    }

    /// The next call fails with `error`, then behavior returns to normal.
    pub fn fail_next(&self, error: TransportError) {
        self.failures.lock().unwrap().push_back(error);
    }

    /// The next `get_note` fails with `error`; other calls are unaffected.
    pub fn fail_next_get(&self, error: TransportError) {
        self.get_failures.lock().unwrap().push_back(error);
    }

    /// Hold reads until the returned `Notify` is signalled.
    pub fn gate_reads(&self) -> std::sync::Arc<Notify> {
        let gate = std::sync::Arc::new(Notify::new());
        *self.read_gate.lock().unwrap() = Some(std::sync::Arc::clone(&gate));
        gate
    }

    pub fn calls(&self) -> Vec<NetworkCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn begin(&self, call: NetworkCall) -> TransportResult<()> {
        self.calls.lock().unwrap().push(call);
        if let Some(error) = self.offline.lock().unwrap().clone() {
            return Err(error);
        }
        if let Some(error) = self.failures.lock().unwrap().pop_front() {
            return Err(error);
        }
        Ok(())
    }

    async fn wait_for_gate(&self) {
        let gate = self.read_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }

    fn tick(&self) -> i64 {
        i64::try_from(self.clock.fetch_add(1, Ordering::SeqCst)).unwrap_or(i64::MAX)
    }

    fn not_found(file_path: &str) -> TransportError {
        TransportError::client(404, format!("note {file_path} not found"))
    }
}

#[async_trait]
impl NetworkDataSource for FakeNetwork {
    async fn create_note(&self, params: &CreateNoteParams) -> Result<Note> {
        self.begin(NetworkCall::Create(params.file_path.clone()))?;
        let note = Note {
            file_path: params.file_path.clone(),
            title: params.title.clone(),
            content: params.content.clone(),
            updated_at: self.tick(),
        };
        self.seed(note.clone());
        Ok(note)
    }

    async fn get_note(&self, file_path: &str) -> Result<Note> {
        self.wait_for_gate().await;
        self.begin(NetworkCall::Get(file_path.to_string()))?;
        if let Some(error) = self.get_failures.lock().unwrap().pop_front() {
            return Err(error.into());
        }
        Ok(self
            .remote_note(file_path)
            .ok_or_else(|| Self::not_found(file_path))?)
    }

    async fn list_notes(&self, path: &str) -> Result<Vec<Note>> {
        self.wait_for_gate().await;
        self.begin(NetworkCall::List(path.to_string()))?;
        let mut notes: Vec<Note> = self
            .notes
            .lock()
            .unwrap()
            .values()
            .filter(|note| note.file_path.starts_with(path))
            .cloned()
            .collect();
        notes.sort_by(|a, b| a.file_path.cmp(&b.file_path));
        Ok(notes)
    }

    async fn update_note(&self, params: &UpdateNoteParams) -> Result<i64> {
        self.begin(NetworkCall::Update(params.file_path.clone()))?;
        let existing = self
            .remote_note(&params.file_path)
            .ok_or_else(|| Self::not_found(&params.file_path))?;
        let updated = existing.with_update(params, self.tick());
        let updated_at = updated.updated_at;
        self.seed(updated);
        Ok(updated_at)
    }

    async fn delete_note(&self, file_path: &str) -> Result<()> {
        self.begin(NetworkCall::Delete(file_path.to_string()))?;
        self.notes
            .lock()
            .unwrap()
            .remove(file_path)
            .map(|_| ())
            .ok_or_else(|| Self::not_found(file_path).into())
    }
}
