//! Payload decode errors

use thiserror::Error;

/// Errors that can occur while decoding a transport payload
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("Unknown topic: {0}")]
    UnknownTopic(String),

    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("Malformed value for field: {0}")]
    MalformedValue(&'static str),

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),
}
