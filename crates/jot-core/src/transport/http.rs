//! reqwest-backed transport speaking the Connect unary protocol.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;

use super::error::{TransportError, TransportResult};
use super::retry::{retry_with_backoff, RetryPolicy};
use super::{
    RpcRequest, Transport, CONNECT_PROTOCOL_VERSION, CONNECT_PROTOCOL_VERSION_HEADER,
    PROTO_CONTENT_TYPE,
};
use crate::config::{ClientConfig, SharedBaseUrl};

/// POSTs binary payloads to `{base_url}{path}` and retries transient
/// failures according to its `RetryPolicy`.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: SharedBaseUrl,
    retry_policy: RetryPolicy,
}

impl HttpTransport {
    pub fn new(base_url: SharedBaseUrl, config: &ClientConfig) -> TransportResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .build()?;

        Ok(Self {
            client,
            base_url,
            retry_policy: config.retry_policy(),
        })
    }

    pub const fn base_url(&self) -> &SharedBaseUrl {
        &self.base_url
    }

    pub const fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// One attempt, no retry.
    pub async fn send_once(&self, request: &RpcRequest) -> TransportResult<Bytes> {
        let url = format!("{}{}", self.base_url.get(), request.path);

        let mut builder = self
            .client
            .post(&url)
            .header(CONNECT_PROTOCOL_VERSION_HEADER, CONNECT_PROTOCOL_VERSION)
            .header(CONTENT_TYPE, PROTO_CONTENT_TYPE)
            .body(request.body.clone());
        if let Some(token) = request.bearer.as_deref() {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.bytes().await?);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::debug!(path = %request.path, status = status.as_u16(), "RPC call failed");
        Err(TransportError::from_status(status.as_u16(), body))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn call(&self, request: RpcRequest) -> TransportResult<Bytes> {
        retry_with_backoff(&self.retry_policy, || self.send_once(&request)).await
    }
}
