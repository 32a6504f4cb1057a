//! Local Unix-socket transport
//!
//! Each endpoint listens on its own socket; a peer's socket path is its node
//! id. Newline-delimited JSON frames, one acknowledgement line per frame.

use std::path::PathBuf;

pub mod client;
pub mod listener;
pub mod messages;

pub use client::SocketClient;
pub use listener::{cleanup_socket, create_listener_at, serve};
pub use messages::{FrameResponse, SocketFrame};

/// Get the default socket path for an endpoint role ("handheld", "wearable")
pub fn default_socket_path(role: &str) -> PathBuf {
    dirs::runtime_dir()
        .or_else(dirs::data_local_dir)
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("walkbridge")
        .join(format!("{role}.sock"))
}
