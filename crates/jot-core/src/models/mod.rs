//! Data models for Jot

mod note;
mod pending;

pub use note::{validate_file_path, CreateNoteParams, Note, UpdateNoteParams};
pub use pending::PendingOperation;
