//! `SQLite` implementation of `NoteCache`

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{migrations, NoteCache};
use crate::models::Note;
use crate::util::unix_millis_now;
use crate::{Error, Result};

/// Note cache stored in a single `SQLite` file.
pub struct SqliteNoteCache {
    conn: Mutex<Connection>,
}

impl SqliteNoteCache {
    /// Open the cache at `path`, creating the file and its parent
    /// directories if needed. Runs migrations automatically.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA synchronous = NORMAL;")
            .ok();
        Self::from_connection(conn)
    }

    /// Open an in-memory cache (useful for testing)
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(mut conn: Connection) -> Result<Self> {
        migrations::run(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::Cache("cache connection lock poisoned".into()))
    }

    fn parse_note(row: &Row<'_>) -> rusqlite::Result<Note> {
        Ok(Note {
            file_path: row.get(0)?,
            title: row.get(1)?,
            content: row.get(2)?,
            updated_at: row.get(3)?,
        })
    }

    fn upsert(conn: &Connection, note: &Note, cached_at: i64) -> Result<()> {
        conn.execute(
            "INSERT OR REPLACE INTO notes (file_path, title, content, updated_at, cached_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                note.file_path,
                note.title,
                note.content,
                note.updated_at,
                cached_at
            ],
        )?;
        Ok(())
    }
}

impl NoteCache for SqliteNoteCache {
    fn save_note(&self, note: &Note) -> Result<()> {
        let conn = self.lock()?;
        Self::upsert(&conn, note, unix_millis_now())
    }

    fn save_notes(&self, notes: &[Note]) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let now = unix_millis_now();
        for note in notes {
            Self::upsert(&tx, note, now)?;
        }
        tx.commit()?;
        Ok(())
    }

    fn get_note(&self, file_path: &str) -> Result<Option<Note>> {
        let conn = self.lock()?;
        let note = conn
            .query_row(
                "SELECT file_path, title, content, updated_at FROM notes WHERE file_path = ?1",
                params![file_path],
                Self::parse_note,
            )
            .optional()?;
        Ok(note)
    }

    fn list_notes(&self, path_prefix: &str) -> Result<Vec<Note>> {
        let conn = self.lock()?;
        // substr comparison keeps `%` and `_` in paths literal
        let mut stmt = conn.prepare(
            "SELECT file_path, title, content, updated_at FROM notes
             WHERE substr(file_path, 1, length(?1)) = ?1
             ORDER BY file_path",
        )?;
        let notes = stmt
            .query_map(params![path_prefix], Self::parse_note)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(notes)
    }

    fn delete_note(&self, file_path: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM notes WHERE file_path = ?1", params![file_path])?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM notes", [])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    use super::*;

    fn note(file_path: &str, title: &str, updated_at: i64) -> Note {
        Note {
            file_path: file_path.to_string(),
            title: title.to_string(),
            content: format!("body of {title}"),
            updated_at,
        }
    }

    #[test]
    fn test_save_and_get() {
        let cache = SqliteNoteCache::open_in_memory().unwrap();
        let saved = note("docs/a.md", "A", 1_700_000_000_000);
        cache.save_note(&saved).unwrap();

        assert_eq!(cache.get_note("docs/a.md").unwrap(), Some(saved));
        assert_eq!(cache.get_note("docs/missing.md").unwrap(), None);
    }

    #[test]
    fn test_save_replaces_existing_path() {
        let cache = SqliteNoteCache::open_in_memory().unwrap();
        cache.save_note(&note("docs/a.md", "A", 1)).unwrap();
        cache.save_note(&note("docs/a.md", "A2", 2)).unwrap();

        let all = cache.list_notes("").unwrap();
        assert_eq!(all, vec![note("docs/a.md", "A2", 2)]);
    }

    #[test]
    fn test_list_by_prefix_is_ordered_and_literal() {
        let cache = SqliteNoteCache::open_in_memory().unwrap();
        cache
            .save_notes(&[
                note("docs/b.md", "B", 1),
                note("work/x.md", "X", 1),
                note("docs/a.md", "A", 1),
                note("docs_old/c.md", "C", 1),
            ])
            .unwrap();

        let paths: Vec<String> = cache
            .list_notes("docs/")
            .unwrap()
            .into_iter()
            .map(|n| n.file_path)
            .collect();
        assert_eq!(paths, vec!["docs/a.md", "docs/b.md"]);

        // `_` must not behave as a wildcard
        assert!(cache.list_notes("docs_o").unwrap().len() == 1);
        assert!(cache.list_notes("docs%").unwrap().is_empty());
        assert_eq!(cache.list_notes("").unwrap().len(), 4);
    }

    #[test]
    fn test_delete_and_clear() {
        let cache = SqliteNoteCache::open_in_memory().unwrap();
        cache
            .save_notes(&[note("a.md", "A", 1), note("b.md", "B", 1)])
            .unwrap();

        cache.delete_note("a.md").unwrap();
        cache.delete_note("a.md").unwrap();
        assert_eq!(cache.get_note("a.md").unwrap(), None);

        cache.clear().unwrap();
        assert!(cache.list_notes("").unwrap().is_empty());
    }

    #[test]
    fn test_open_on_disk_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("cache.db");

        {
            let cache = SqliteNoteCache::open(&path).unwrap();
            cache.save_note(&note("docs/a.md", "A", 5)).unwrap();
        }

        let reopened = SqliteNoteCache::open(&path).unwrap();
        assert_eq!(
            reopened.get_note("docs/a.md").unwrap(),
            Some(note("docs/a.md", "A", 5))
        );
    }
}
