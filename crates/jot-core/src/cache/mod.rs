//! Local note cache keyed by file path.

mod migrations;
mod sqlite;

use std::sync::Arc;

pub use sqlite::SqliteNoteCache;

use crate::models::Note;
use crate::Result;

/// Persistent note cache.
///
/// At most one entry per `file_path`; saving an existing path replaces it.
/// Calls are blocking and are expected to run off the async executor.
pub trait NoteCache: Send + Sync + 'static {
    fn save_note(&self, note: &Note) -> Result<()>;

    /// All-or-nothing bulk save.
    fn save_notes(&self, notes: &[Note]) -> Result<()>;

    fn get_note(&self, file_path: &str) -> Result<Option<Note>>;

    /// Notes whose path starts with `path_prefix`, ordered by path. An empty
    /// prefix lists every note.
    fn list_notes(&self, path_prefix: &str) -> Result<Vec<Note>>;

    fn delete_note(&self, file_path: &str) -> Result<()>;

    fn clear(&self) -> Result<()>;
}

impl<C: NoteCache + ?Sized> NoteCache for Arc<C> {
    fn save_note(&self, note: &Note) -> Result<()> {
        (**self).save_note(note)
    }

    fn save_notes(&self, notes: &[Note]) -> Result<()> {
        (**self).save_notes(notes)
    }

    fn get_note(&self, file_path: &str) -> Result<Option<Note>> {
        (**self).get_note(file_path)
    }

    fn list_notes(&self, path_prefix: &str) -> Result<Vec<Note>> {
        (**self).list_notes(path_prefix)
    }

    fn delete_note(&self, file_path: &str) -> Result<()> {
        (**self).delete_note(file_path)
    }

    fn clear(&self) -> Result<()> {
        (**self).clear()
    }
}
