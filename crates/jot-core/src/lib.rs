//! jot-core - Core library for Jot
//!
//! This crate contains the data-access layer used by every Jot interface:
//! the RPC transport, the auth interceptor with token refresh, the local note
//! cache, and the notes repository that ties them together with offline
//! write queueing.

pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod network;
pub mod repository;
pub mod rpc;
pub mod transport;
pub mod util;

#[cfg(test)]
mod test_support;

pub use auth::{AuthClient, AuthEvent, AuthInterceptor, CredentialStore, MemoryCredentialStore};
pub use cache::{NoteCache, SqliteNoteCache};
pub use config::{ClientConfig, SharedBaseUrl};
pub use error::{Error, Result};
pub use models::{CreateNoteParams, Note, PendingOperation, UpdateNoteParams};
pub use network::{NetworkDataSource, RpcNetworkDataSource};
pub use repository::{NotesRepository, SyncReport};
pub use transport::{HttpTransport, RetryPolicy, Transport, TransportError};
