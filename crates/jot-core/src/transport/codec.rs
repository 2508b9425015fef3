//! Binary message encoding for request and response payloads.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::error::{TransportError, TransportResult};

/// Serialize a request message into an opaque payload.
pub fn encode_message<M: Serialize>(message: &M) -> TransportResult<Bytes> {
    bincode::serde::encode_to_vec(message, bincode::config::standard())
        .map(Bytes::from)
        .map_err(|error| TransportError::Serialization(format!("failed to encode message: {error}")))
}

/// Deserialize a response payload, classifying any failure as a
/// serialization error instead of surfacing the decoder's own error type.
pub fn decode_message<M: DeserializeOwned>(payload: &[u8]) -> TransportResult<M> {
    let (message, consumed) =
        bincode::serde::decode_from_slice::<M, _>(payload, bincode::config::standard()).map_err(
            |error| TransportError::Serialization(format!("failed to decode message: {error}")),
        )?;
    if consumed != payload.len() {
        return Err(TransportError::Serialization(format!(
            "trailing bytes after message: {} of {} consumed",
            consumed,
            payload.len()
        )));
    }
    Ok(message)
}
