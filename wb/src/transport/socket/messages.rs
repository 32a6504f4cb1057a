//! Frame types for the socket transport
//!
//! Each frame is a single line of JSON followed by `\n`; the listener answers
//! every frame with one [`FrameResponse`] line.

use serde::{Deserialize, Serialize};

use crate::transport::{TransportError, TransportMessage};

/// One message on the wire
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SocketFrame {
    pub path: String,
    /// Payload text (payloads are JSON, so always UTF-8)
    pub data: String,
}

impl SocketFrame {
    pub fn new(path: &str, data: &[u8]) -> Result<Self, TransportError> {
        let data = std::str::from_utf8(data)
            .map_err(|e| TransportError::Frame(format!("payload is not UTF-8: {e}")))?
            .to_string();
        Ok(Self {
            path: path.to_string(),
            data,
        })
    }
}

impl From<SocketFrame> for TransportMessage {
    fn from(frame: SocketFrame) -> Self {
        TransportMessage::new(frame.path, frame.data.into_bytes())
    }
}

/// Listener's answer to a frame
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum FrameResponse {
    /// Frame accepted for local handling
    Ok,

    /// Frame refused
    Error { message: String },
}
