//! Note model

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A note as the backend knows it.
///
/// `updated_at` is server-assigned (Unix ms); the client only stamps it
/// locally for offline placeholders, which a later sync overwrites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Unique identifier and hierarchical path, e.g. `docs/todo.md`
    pub file_path: String,
    pub title: String,
    pub content: String,
    /// Last update timestamp (Unix ms)
    pub updated_at: i64,
}

impl Note {
    /// Local stand-in for a create that has not reached the backend yet.
    #[must_use]
    pub fn placeholder(params: &CreateNoteParams, now_ms: i64) -> Self {
        Self {
            file_path: params.file_path.clone(),
            title: params.title.clone(),
            content: params.content.clone(),
            updated_at: now_ms,
        }
    }

    /// Copy of this note with the fields an update carries applied.
    #[must_use]
    pub fn with_update(&self, params: &UpdateNoteParams, now_ms: i64) -> Self {
        Self {
            file_path: self.file_path.clone(),
            title: params.title.clone().unwrap_or_else(|| self.title.clone()),
            content: params.content.clone().unwrap_or_else(|| self.content.clone()),
            updated_at: now_ms,
        }
    }
}

/// Fields needed to create a note remotely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateNoteParams {
    pub file_path: String,
    pub title: String,
    pub content: String,
}

impl CreateNoteParams {
    pub fn new(
        file_path: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            file_path: file_path.into(),
            title: title.into(),
            content: content.into(),
        }
    }
}

/// Fields to change on an existing note; `None` leaves a field untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UpdateNoteParams {
    pub file_path: String,
    pub title: Option<String>,
    pub content: Option<String>,
}

impl UpdateNoteParams {
    pub fn new(file_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub const fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none()
    }
}

/// Check that a note path is relative, non-empty, and free of `..` and
/// empty segments.
///
/// # Examples
///
/// ```
/// use jot_core::models::validate_file_path;
///
/// assert!(validate_file_path("docs/todo.md").is_ok());
/// assert!(validate_file_path("/etc/passwd").is_err());
/// ```
pub fn validate_file_path(file_path: &str) -> Result<()> {
    if file_path.trim().is_empty() {
        return Err(Error::InvalidInput("file path must not be empty".into()));
    }
    if file_path.starts_with('/') {
        return Err(Error::InvalidInput(format!(
            "file path must be relative: {file_path}"
        )));
    }
    if file_path
        .split('/')
        .any(|segment| segment.is_empty() || segment == "..")
    {
        return Err(Error::InvalidInput(format!(
            "file path has an empty or '..' segment: {file_path}"
        )));
    }
    Ok(())
}
