//! Writes made while the backend was unreachable.

use serde::{Deserialize, Serialize};

use super::note::{CreateNoteParams, UpdateNoteParams};

/// A write waiting to be replayed against the backend, in the order it was
/// made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PendingOperation {
    Create(CreateNoteParams),
    Update(UpdateNoteParams),
}

impl PendingOperation {
    pub fn file_path(&self) -> &str {
        match self {
            Self::Create(params) => &params.file_path,
            Self::Update(params) => &params.file_path,
        }
    }

    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Create(_) => "create",
            Self::Update(_) => "update",
        }
    }
}
