//! Wire messages and procedure paths for the notes and auth services.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::Note;

pub const CREATE_NOTE_PATH: &str = "/notes.v1.NoteService/CreateNote";
pub const GET_NOTE_PATH: &str = "/notes.v1.NoteService/GetNote";
pub const LIST_NOTES_PATH: &str = "/notes.v1.NoteService/ListNotes";
pub const UPDATE_NOTE_PATH: &str = "/notes.v1.NoteService/UpdateNote";
pub const DELETE_NOTE_PATH: &str = "/notes.v1.NoteService/DeleteNote";

pub const LOGIN_PATH: &str = "/auth.v1.AuthService/Login";
pub const REFRESH_TOKEN_PATH: &str = "/auth.v1.AuthService/RefreshToken";

/// Login and token refresh are callable without a bearer credential.
pub fn is_public_auth_path(path: &str) -> bool {
    path == LOGIN_PATH || path == REFRESH_TOKEN_PATH
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateNoteRequest {
    pub file_path: String,
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateNoteResponse {
    pub note: Note,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetNoteRequest {
    pub file_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetNoteResponse {
    pub note: Note,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListNotesRequest {
    /// Path prefix; empty lists every note.
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListNotesResponse {
    pub notes: Vec<Note>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateNoteRequest {
    pub file_path: String,
    pub title: Option<String>,
    pub content: Option<String>,
}

/// Partial confirmation; the full note must be fetched separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateNoteResponse {
    pub file_path: String,
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteNoteRequest {
    pub file_path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteNoteResponse {}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Backend that serves this account's notes.
    pub backend_url: String,
}

impl fmt::Debug for LoginResponse {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("LoginResponse")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("backend_url", &self.backend_url)
            .finish()
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

impl fmt::Debug for RefreshTokenRequest {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("RefreshTokenRequest")
            .field("refresh_token", &"[REDACTED]")
            .finish()
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshTokenResponse {
    pub access_token: String,
    /// Present when the backend rotates refresh tokens.
    pub refresh_token: Option<String>,
}

impl fmt::Debug for RefreshTokenResponse {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("RefreshTokenResponse")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}
