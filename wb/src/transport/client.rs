//! MessageClient trait definition

use async_trait::async_trait;

use super::TransportError;

/// A payload received from a remote node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportMessage {
    /// Message path, which doubles as the payload topic
    pub path: String,
    pub data: Vec<u8>,
}

impl TransportMessage {
    pub fn new(path: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            data: data.into(),
        }
    }
}

/// Sending side of the device-to-device transport
///
/// Each call is independent; the bridge keeps no per-node state.
#[async_trait]
pub trait MessageClient: Send + Sync {
    /// Ids of the nodes reachable right now
    async fn connected_nodes(&self) -> Result<Vec<String>, TransportError>;

    /// Deliver one payload to one node under `path`
    async fn send_message(&self, node_id: &str, path: &str, data: &[u8]) -> Result<(), TransportError>;
}
