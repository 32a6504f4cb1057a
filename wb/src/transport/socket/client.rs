//! Sending side of the socket transport

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tracing::debug;

use super::messages::{FrameResponse, SocketFrame};
use crate::transport::{MessageClient, TransportError};

/// Default timeout for one frame round trip
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// [`MessageClient`] over local Unix sockets
///
/// Each configured peer socket is one node; a peer is "connected" when its
/// socket file exists.
#[derive(Debug, Clone)]
pub struct SocketClient {
    peers: Vec<PathBuf>,
    timeout: Duration,
}

impl SocketClient {
    pub fn new(peers: Vec<PathBuf>) -> Self {
        Self {
            peers,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set a custom timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn round_trip(&self, node_id: &str, frame: &SocketFrame) -> Result<FrameResponse, TransportError> {
        let mut stream = UnixStream::connect(node_id).await?;

        let frame_json = serde_json::to_string(frame)?;
        stream.write_all(frame_json.as_bytes()).await?;
        stream.write_all(b"\n").await?;
        stream.flush().await?;

        let mut reader = BufReader::new(&mut stream);
        let mut line = String::new();
        let bytes_read = reader.read_line(&mut line).await?;
        if bytes_read == 0 {
            return Err(TransportError::Frame("connection closed before acknowledgement".to_string()));
        }

        serde_json::from_str(line.trim()).map_err(|e| TransportError::Frame(format!("Failed to parse response: {e}")))
    }
}

#[async_trait]
impl MessageClient for SocketClient {
    async fn connected_nodes(&self) -> Result<Vec<String>, TransportError> {
        let nodes: Vec<String> = self
            .peers
            .iter()
            .filter(|peer| peer.exists())
            .map(|peer| peer.display().to_string())
            .collect();
        debug!(configured = self.peers.len(), connected = nodes.len(), "SocketClient::connected_nodes: called");
        Ok(nodes)
    }

    async fn send_message(&self, node_id: &str, path: &str, data: &[u8]) -> Result<(), TransportError> {
        debug!(%node_id, %path, len = data.len(), "SocketClient::send_message: called");
        let frame = SocketFrame::new(path, data)?;

        let response = tokio::time::timeout(self.timeout, self.round_trip(node_id, &frame))
            .await
            .map_err(|_| TransportError::Timeout(self.timeout))?
            .map_err(|e| match e {
                TransportError::Io(io) => TransportError::Send {
                    node: node_id.to_string(),
                    reason: io.to_string(),
                },
                other => other,
            })?;

        match response {
            FrameResponse::Ok => Ok(()),
            FrameResponse::Error { message } => Err(TransportError::Send {
                node: node_id.to_string(),
                reason: message,
            }),
        }
    }
}
