use std::io::{self, IsTerminal, Read};

use chrono::Utc;
use jot_core::util::compact_text;
use jot_core::{Note, PendingOperation};
use serde::Serialize;

use crate::error::CliError;

#[derive(Debug, Serialize)]
pub struct NoteListItem {
    pub file_path: String,
    pub title: String,
    pub preview: String,
    pub updated_at: i64,
    pub relative_time: String,
}

#[derive(Debug, Serialize)]
pub struct PendingItem {
    pub kind: &'static str,
    pub file_path: String,
}

pub fn format_note_lines(notes: &[Note]) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    let width = notes
        .iter()
        .map(|note| note.file_path.chars().count())
        .max()
        .unwrap_or(0);
    notes
        .iter()
        .map(|note| {
            let title = truncate(&note.title, 40);
            let relative_time = format_relative_time(note.updated_at, now_ms);
            format!("{:<width$}  {title:<40}  {relative_time}", note.file_path)
        })
        .collect()
}

pub fn note_to_list_item(note: &Note) -> NoteListItem {
    let now_ms = Utc::now().timestamp_millis();
    NoteListItem {
        file_path: note.file_path.clone(),
        title: note.title.clone(),
        preview: note_preview(note, 80),
        updated_at: note.updated_at,
        relative_time: format_relative_time(note.updated_at, now_ms),
    }
}

pub fn render_note(note: &Note) -> String {
    format!(
        "# {}\n{}  (updated {})\n\n{}",
        note.title,
        note.file_path,
        format_timestamp(note.updated_at),
        note.content
    )
}

pub fn pending_to_item(operation: &PendingOperation) -> PendingItem {
    PendingItem {
        kind: operation.kind(),
        file_path: operation.file_path().to_string(),
    }
}

pub fn note_preview(note: &Note, max_chars: usize) -> String {
    let first_line = note.content.lines().next().unwrap_or("").trim();
    let collapsed = first_line.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate(&collapsed, max_chars)
}

fn truncate(value: &str, max_chars: usize) -> String {
    let value = compact_text(value);
    if value.chars().count() <= max_chars {
        value
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = value.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn format_timestamp(timestamp_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |date_time| date_time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else {
        format_timestamp(timestamp_ms)
    }
}

pub fn normalize_content(content: &str) -> Option<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Content from the flag, or from piped stdin when the flag is absent.
pub fn resolve_note_content(content: Option<String>) -> Result<String, CliError> {
    if let Some(content) = content.as_deref().and_then(normalize_content) {
        return Ok(content);
    }
    if let Some(content) = read_piped_stdin()? {
        return Ok(content);
    }
    Err(CliError::EmptyContent)
}

fn read_piped_stdin() -> Result<Option<String>, CliError> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }

    let mut buffer = String::new();
    stdin.lock().read_to_string(&mut buffer)?;
    Ok(normalize_content(&buffer))
}

#[cfg(test)]
mod tests {
    use jot_core::{CreateNoteParams, UpdateNoteParams};
    use pretty_assertions::assert_eq;

    use super::*;

    fn note(content: &str) -> Note {
        Note {
            file_path: "docs/a.md".to_string(),
            title: "A".to_string(),
            content: content.to_string(),
            updated_at: 0,
        }
    }

    #[test]
    fn normalize_content_trims_and_rejects_empty() {
        assert_eq!(normalize_content("  hello  "), Some("hello".to_string()));
        assert_eq!(normalize_content(" \n\t "), None);
    }

    #[test]
    fn format_relative_time_units() {
        let now = 10_000_000_000;
        assert_eq!(format_relative_time(now - 30_000, now), "just now");
        assert_eq!(format_relative_time(now - 120_000, now), "2m ago");
        assert_eq!(format_relative_time(now - 2 * 60 * 60_000, now), "2h ago");
        assert_eq!(format_relative_time(now - 3 * 24 * 60 * 60_000, now), "3d ago");
    }

    #[test]
    fn note_preview_uses_first_line_and_truncates() {
        assert_eq!(note_preview(&note("first   line\nsecond"), 80), "first line");
        assert_eq!(note_preview(&note("abcdefghij"), 6), "abc...");
    }

    #[test]
    fn pending_item_describes_operation() {
        let create = PendingOperation::Create(CreateNoteParams::new("a.md", "A", "x"));
        let update = PendingOperation::Update(UpdateNoteParams::new("b.md").title("B"));

        let rendered = serde_json::to_string(&[pending_to_item(&create), pending_to_item(&update)])
            .unwrap();
        assert_eq!(
            rendered,
            r#"[{"kind":"create","file_path":"a.md"},{"kind":"update","file_path":"b.md"}]"#
        );
    }

    #[test]
    fn format_note_lines_aligns_paths() {
        let mut short = note("x");
        short.file_path = "a.md".to_string();
        let lines = format_note_lines(&[short, note("y")]);
        assert!(lines[0].starts_with("a.md       "));
        assert!(lines[1].starts_with("docs/a.md  "));
    }
}
