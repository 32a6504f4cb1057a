//! Device-to-device transport seam
//!
//! The bridge does not own the physical transport. It consumes received
//! frames ([`TransportMessage`]) and sends through the [`MessageClient`]
//! trait:
//!
//! ```text
//! wearable                                   handheld
//! ┌──────────────┐                           ┌──────────────┐   ┌──────────────┐
//! │ WalkSender   │── MessageClient ─────────▶│ WalkReceiver │──▶│ DispatchQueue│──▶ consumer
//! │ encode()     │   (every reachable node)  │ decode()     │   │              │
//! └──────────────┘                           └──────────────┘   └──────────────┘
//! ```
//!
//! [`socket`] provides a local Unix-socket implementation of both directions
//! so two endpoints can talk on one machine.

pub mod client;
mod error;
pub mod receiver;
pub mod sender;
pub mod socket;

pub use client::{MessageClient, TransportMessage};
pub use error::TransportError;
pub use receiver::{ReceiverStats, WalkReceiver};
pub use sender::{FailedNode, SendReport, WalkSender};
pub use socket::SocketClient;
