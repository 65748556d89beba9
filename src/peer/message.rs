//! Data-exchange wire format.
//!
//! # Frames
//! - Text frames carry JSON `DataMessage` records tagged by `type`
//! - Binary frames carry a compact DATA_RESPONSE:
//!
//! ```text
//! +----------------+------------------+-------------------+
//! | id_len: u16 BE | request id UTF-8 | chunk bytes ...   |
//! +----------------+------------------+-------------------+
//! ```

use axum::body::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::correlation::RequestId;

/// A data-exchange message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DataMessage {
    /// Server → peer: send bytes `[start, end]` of `file_id`.
    #[serde(rename = "REQUEST_DATA", rename_all = "camelCase")]
    RequestData {
        request_id: RequestId,
        start: u64,
        end: u64,
        file_id: String,
    },

    /// Peer → server: the requested bytes.
    #[serde(rename = "DATA_RESPONSE", rename_all = "camelCase")]
    DataResponse { request_id: RequestId, chunk: Vec<u8> },

    /// Peer → server: the request cannot be served.
    #[serde(rename = "DATA_ERROR", rename_all = "camelCase")]
    DataError { request_id: RequestId },
}

/// Errors decoding an inbound frame.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("malformed JSON message: {0}")]
    Json(#[from] serde_json::Error),

    #[error("binary frame truncated: {0} bytes")]
    Truncated(usize),

    #[error("request id is not valid UTF-8")]
    InvalidId(#[from] std::str::Utf8Error),

    #[error("request id too long: {0} bytes")]
    IdTooLong(usize),

    #[error("peers may not send {0}")]
    Unexpected(&'static str),
}

/// A decoded answer from a peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerReply {
    Data { request_id: RequestId, chunk: Bytes },
    Error { request_id: RequestId },
}

impl PeerReply {
    pub fn request_id(&self) -> &RequestId {
        match self {
            PeerReply::Data { request_id, .. } | PeerReply::Error { request_id } => request_id,
        }
    }

    /// Split into the correlation id and the table value (`None` on error).
    pub fn into_parts(self) -> (RequestId, Option<Bytes>) {
        match self {
            PeerReply::Data { request_id, chunk } => (request_id, Some(chunk)),
            PeerReply::Error { request_id } => (request_id, None),
        }
    }
}

/// Decode a JSON text frame from a peer.
pub fn parse_text(text: &str) -> Result<PeerReply, FrameError> {
    match serde_json::from_str::<DataMessage>(text)? {
        DataMessage::DataResponse { request_id, chunk } => Ok(PeerReply::Data {
            request_id,
            chunk: Bytes::from(chunk),
        }),
        DataMessage::DataError { request_id } => Ok(PeerReply::Error { request_id }),
        DataMessage::RequestData { .. } => Err(FrameError::Unexpected("REQUEST_DATA")),
    }
}

/// Decode a binary DATA_RESPONSE frame. The chunk shares the frame buffer.
pub fn parse_binary(frame: Bytes) -> Result<PeerReply, FrameError> {
    if frame.len() < 2 {
        return Err(FrameError::Truncated(frame.len()));
    }
    let id_len = u16::from_be_bytes([frame[0], frame[1]]) as usize;
    let body_start = 2 + id_len;
    if frame.len() < body_start {
        return Err(FrameError::Truncated(frame.len()));
    }

    let id = std::str::from_utf8(&frame[2..body_start])?;
    Ok(PeerReply::Data {
        request_id: RequestId::from(id),
        chunk: frame.slice(body_start..),
    })
}

/// Encode a binary DATA_RESPONSE frame.
pub fn encode_binary_response(request_id: &RequestId, chunk: &[u8]) -> Result<Vec<u8>, FrameError> {
    let id = request_id.as_str().as_bytes();
    let id_len = u16::try_from(id.len()).map_err(|_| FrameError::IdTooLong(id.len()))?;

    let mut frame = Vec::with_capacity(2 + id.len() + chunk.len());
    frame.extend_from_slice(&id_len.to_be_bytes());
    frame.extend_from_slice(id);
    frame.extend_from_slice(chunk);
    Ok(frame)
}
