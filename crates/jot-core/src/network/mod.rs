//! Typed note operations over any `Transport`.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::models::{CreateNoteParams, Note, UpdateNoteParams};
use crate::rpc::{
    CreateNoteRequest, CreateNoteResponse, DeleteNoteRequest, DeleteNoteResponse, GetNoteRequest,
    GetNoteResponse, ListNotesRequest, ListNotesResponse, UpdateNoteRequest, UpdateNoteResponse,
    CREATE_NOTE_PATH, DELETE_NOTE_PATH, GET_NOTE_PATH, LIST_NOTES_PATH, UPDATE_NOTE_PATH,
};
use crate::transport::{decode_message, encode_message, RpcRequest, Transport, TransportResult};
use crate::Result;

/// Remote note operations as the repository sees them.
#[async_trait]
pub trait NetworkDataSource: Send + Sync + 'static {
    async fn create_note(&self, params: &CreateNoteParams) -> Result<Note>;

    async fn get_note(&self, file_path: &str) -> Result<Note>;

    /// Notes whose path starts with `path`; empty means all.
    async fn list_notes(&self, path: &str) -> Result<Vec<Note>>;

    /// Returns the server's new `updated_at`. The full note has to be
    /// fetched with `get_note`.
    async fn update_note(&self, params: &UpdateNoteParams) -> Result<i64>;

    async fn delete_note(&self, file_path: &str) -> Result<()>;
}

#[async_trait]
impl<N: NetworkDataSource + ?Sized> NetworkDataSource for Arc<N> {
    async fn create_note(&self, params: &CreateNoteParams) -> Result<Note> {
        (**self).create_note(params).await
    }

    async fn get_note(&self, file_path: &str) -> Result<Note> {
        (**self).get_note(file_path).await
    }

    async fn list_notes(&self, path: &str) -> Result<Vec<Note>> {
        (**self).list_notes(path).await
    }

    async fn update_note(&self, params: &UpdateNoteParams) -> Result<i64> {
        (**self).update_note(params).await
    }

    async fn delete_note(&self, file_path: &str) -> Result<()> {
        (**self).delete_note(file_path).await
    }
}

/// `NetworkDataSource` backed by the notes RPC service.
pub struct RpcNetworkDataSource<T> {
    transport: T,
}

impl<T: Transport> RpcNetworkDataSource<T> {
    pub const fn new(transport: T) -> Self {
        Self { transport }
    }

    pub const fn transport(&self) -> &T {
        &self.transport
    }

    async fn unary<Req, Resp>(&self, path: &str, request: &Req) -> TransportResult<Resp>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let body = encode_message(request)?;
        let payload = self.transport.call(RpcRequest::new(path, body)).await?;
        decode_message(&payload)
    }
}

#[async_trait]
impl<T: Transport + 'static> NetworkDataSource for RpcNetworkDataSource<T> {
    async fn create_note(&self, params: &CreateNoteParams) -> Result<Note> {
        let request = CreateNoteRequest {
            file_path: params.file_path.clone(),
            title: params.title.clone(),
            content: params.content.clone(),
        };
        let response: CreateNoteResponse = self.unary(CREATE_NOTE_PATH, &request).await?;
        Ok(response.note)
    }

    async fn get_note(&self, file_path: &str) -> Result<Note> {
        let request = GetNoteRequest {
            file_path: file_path.to_string(),
        };
        let response: GetNoteResponse = self.unary(GET_NOTE_PATH, &request).await?;
        Ok(response.note)
    }

    async fn list_notes(&self, path: &str) -> Result<Vec<Note>> {
        let request = ListNotesRequest {
            path: path.to_string(),
        };
        let response: ListNotesResponse = self.unary(LIST_NOTES_PATH, &request).await?;
        Ok(response.notes)
    }

    async fn update_note(&self, params: &UpdateNoteParams) -> Result<i64> {
        let request = UpdateNoteRequest {
            file_path: params.file_path.clone(),
            title: params.title.clone(),
            content: params.content.clone(),
        };
        let response: UpdateNoteResponse = self.unary(UPDATE_NOTE_PATH, &request).await?;
        Ok(response.updated_at)
    }

    async fn delete_note(&self, file_path: &str) -> Result<()> {
        let request = DeleteNoteRequest {
            file_path: file_path.to_string(),
        };
        let _: DeleteNoteResponse = self.unary(DELETE_NOTE_PATH, &request).await?;
        Ok(())
    }
}
