//! Transport error types

use std::time::Duration;
use thiserror::Error;

use crate::domain::EventError;

/// Errors that can occur while moving payloads between devices
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Invalid event: {0}")]
    InvalidEvent(#[from] EventError),

    #[error("Node discovery failed: {0}")]
    Discovery(String),

    #[error("Send to node {node} failed: {reason}")]
    Send { node: String, reason: String },

    #[error("Invalid frame: {0}")]
    Frame(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
