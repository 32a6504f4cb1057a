//! Listening side of the socket transport
//!
//! Accepts connections, reads frames, and forwards them as
//! [`TransportMessage`]s to whoever drains the channel (normally a
//! [`WalkReceiver`](crate::transport::WalkReceiver)).

use std::path::{Path, PathBuf};

use eyre::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::messages::{FrameResponse, SocketFrame};
use crate::transport::{TransportError, TransportMessage};

/// Create and bind a listener at `socket_path`
///
/// Handles cleanup of stale socket files from previous runs.
pub fn create_listener_at(socket_path: &Path) -> Result<(UnixListener, PathBuf)> {
    debug!(?socket_path, "create_listener_at: creating socket");

    if let Some(parent) = socket_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create socket directory")?;
    }

    if socket_path.exists() {
        debug!(?socket_path, "create_listener_at: removing stale socket");
        std::fs::remove_file(socket_path).context("Failed to remove stale socket")?;
    }

    let listener = UnixListener::bind(socket_path).context("Failed to bind socket")?;
    debug!(?socket_path, "create_listener_at: socket bound successfully");

    Ok((listener, socket_path.to_path_buf()))
}

/// Remove the socket file on shutdown
pub fn cleanup_socket(socket_path: &Path) {
    if socket_path.exists() {
        debug!(?socket_path, "cleanup_socket: removing socket file");
        if let Err(e) = std::fs::remove_file(socket_path) {
            warn!(?socket_path, error = %e, "Failed to remove socket file");
        }
    }
}

/// Accept connections forever, forwarding every frame to `tx`
///
/// Returns once `tx`'s receiver is gone.
pub async fn serve(listener: UnixListener, tx: mpsc::Sender<TransportMessage>, max_frame_bytes: usize) -> Result<()> {
    info!(max_frame_bytes, "Socket listener started");
    loop {
        let (stream, _) = listener.accept().await.context("Failed to accept connection")?;
        if tx.is_closed() {
            info!("Receiver gone, socket listener stopping");
            return Ok(());
        }

        let tx = tx.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, tx, max_frame_bytes).await {
                warn!(error = %e, "Connection closed with error");
            }
        });
    }
}

async fn handle_connection(
    stream: UnixStream,
    tx: mpsc::Sender<TransportMessage>,
    max_frame_bytes: usize,
) -> Result<(), TransportError> {
    debug!("handle_connection: accepted");
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    loop {
        let frame = match read_frame(&mut reader, max_frame_bytes).await {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                debug!("handle_connection: peer closed");
                return Ok(());
            }
            Err(e) => {
                let response = FrameResponse::Error { message: e.to_string() };
                let _ = send_response(&mut write_half, &response).await;
                return Err(e);
            }
        };

        debug!(path = %frame.path, "handle_connection: frame received");
        if tx.send(frame.into()).await.is_err() {
            let response = FrameResponse::Error {
                message: "receiver stopped".to_string(),
            };
            send_response(&mut write_half, &response).await?;
            return Ok(());
        }

        send_response(&mut write_half, &FrameResponse::Ok).await?;
    }
}

/// Read one frame; `None` at end of stream
///
/// `max_frame_bytes` bounds the JSON text, excluding the trailing `\n`.
pub async fn read_frame<R>(reader: &mut R, max_frame_bytes: usize) -> Result<Option<SocketFrame>, TransportError>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    let limit = u64::try_from(max_frame_bytes).unwrap_or(u64::MAX).saturating_add(1);
    let bytes_read = (&mut *reader).take(limit).read_line(&mut line).await?;

    if bytes_read == 0 {
        return Ok(None);
    }
    // The terminator does not count against the limit
    let frame_len = line.strip_suffix('\n').map_or(line.len(), str::len);
    if frame_len > max_frame_bytes {
        return Err(TransportError::Frame(format!("Frame too large: more than {max_frame_bytes} bytes")));
    }

    let frame: SocketFrame =
        serde_json::from_str(line.trim()).map_err(|e| TransportError::Frame(format!("Failed to parse frame: {e}")))?;
    Ok(Some(frame))
}

/// Write one response line
pub async fn send_response<W>(writer: &mut W, response: &FrameResponse) -> Result<(), TransportError>
where
    W: AsyncWrite + Unpin,
{
    let response_json = serde_json::to_string(response)?;
    writer.write_all(response_json.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    debug!(?response, "send_response: sent response");
    Ok(())
}
