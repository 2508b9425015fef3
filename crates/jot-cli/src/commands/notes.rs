use jot_core::{CreateNoteParams, UpdateNoteParams};

use crate::commands::common::{
    format_note_lines, note_to_list_item, render_note, resolve_note_content, NoteListItem,
};
use crate::error::CliError;
use crate::session::Session;

pub async fn run_get(session: &Session, path: &str, as_json: bool) -> Result<(), CliError> {
    let note = session.repository().get_note(path.trim()).await?;
    if as_json {
        println!("{}", serde_json::to_string_pretty(&note)?);
    } else {
        println!("{}", render_note(&note));
    }
    Ok(())
}

pub async fn run_list(session: &Session, prefix: &str, as_json: bool) -> Result<(), CliError> {
    let notes = session.repository().list_notes(prefix.trim()).await?;

    if as_json {
        let json_items = notes
            .iter()
            .map(note_to_list_item)
            .collect::<Vec<NoteListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else if notes.is_empty() {
        println!("No notes found.");
    } else {
        for line in format_note_lines(&notes) {
            println!("{line}");
        }
    }
    Ok(())
}

pub async fn run_create(
    session: &Session,
    path: &str,
    title: &str,
    content: Option<String>,
) -> Result<(), CliError> {
    let content = resolve_note_content(content)?;
    let params = CreateNoteParams::new(path.trim(), title.trim(), content);

    match session.repository().create_note(params).await {
        Ok(note) => {
            println!("{}", note.file_path);
            Ok(())
        }
        Err(error) if error.is_connectivity() => offline_write(session, error).await,
        Err(error) => Err(error.into()),
    }
}

pub async fn run_update(
    session: &Session,
    path: &str,
    title: Option<String>,
    content: Option<String>,
) -> Result<(), CliError> {
    let mut params = UpdateNoteParams::new(path.trim());
    params.title = title;
    params.content = content;
    if params.is_empty() {
        return Err(CliError::NothingToUpdate);
    }

    match session.repository().update_note(params).await {
        Ok(note) => {
            println!("Updated {} (updated_at={})", note.file_path, note.updated_at);
            Ok(())
        }
        Err(error) if error.is_connectivity() => offline_write(session, error).await,
        Err(error) => Err(error.into()),
    }
}

pub async fn run_delete(session: &Session, path: &str) -> Result<(), CliError> {
    session.repository().delete_note(path.trim()).await?;
    println!("Deleted {}", path.trim());
    Ok(())
}

/// Outside the shell nothing replays the queue, so the write counts as failed.
async fn offline_write(session: &Session, error: jot_core::Error) -> Result<(), CliError> {
    if !session.is_interactive() {
        return Err(CliError::WriteNotSaved(error));
    }
    let pending = session.repository().pending_operation_count().await;
    eprintln!("Backend unreachable ({error}); write queued locally ({pending} pending).");
    Ok(())
}
