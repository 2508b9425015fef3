use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] jot_core::Error),
    #[error(transparent)]
    Transport(#[from] jot_core::TransportError),
    #[error(transparent)]
    Auth(#[from] jot_core::auth::AuthError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("No note content provided")]
    EmptyContent,
    #[error("Nothing to update; pass --title and/or --content")]
    NothingToUpdate,
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("{0}")]
    Shell(String),
    #[error("Backend unreachable, write not saved: {0}")]
    WriteNotSaved(jot_core::Error),
}
