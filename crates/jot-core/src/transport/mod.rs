//! RPC transport: one opaque request in, one opaque response or a
//! classified failure out.

mod codec;
mod error;
mod http;
mod retry;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

pub use codec::{decode_message, encode_message};
pub use error::{TransportError, TransportResult};
pub use http::HttpTransport;
pub use retry::{retry_with_backoff, RetryPolicy};

pub const CONNECT_PROTOCOL_VERSION_HEADER: &str = "Connect-Protocol-Version";
pub const CONNECT_PROTOCOL_VERSION: &str = "1";
pub const PROTO_CONTENT_TYPE: &str = "application/proto";

/// A single unary call addressed to `/{package}.{version}.{Service}/{Method}`.
#[derive(Clone)]
pub struct RpcRequest {
    pub path: String,
    pub body: Bytes,
    /// Access token sent as a bearer credential, if any.
    pub bearer: Option<String>,
}

impl RpcRequest {
    pub fn new(path: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self {
            path: path.into(),
            body: body.into(),
            bearer: None,
        }
    }

    #[must_use]
    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }
}

impl fmt::Debug for RpcRequest {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("RpcRequest")
            .field("path", &self.path)
            .field("body_len", &self.body.len())
            .field("bearer", &self.bearer.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Sends one request and returns the raw response payload.
///
/// Dropping the returned future cancels the underlying I/O.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn call(&self, request: RpcRequest) -> TransportResult<Bytes>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn call(&self, request: RpcRequest) -> TransportResult<Bytes> {
        (**self).call(request).await
    }
}
