//! WalkBridge - ordered walk-session event bridge
//!
//! WalkBridge relays walk session lifecycle events (a walk started, a walk
//! ended) between a wearable and its companion handheld. The receiving side's
//! event handler is not always attached: the UI may not exist yet, may be torn
//! down, or may be mid-initialization. The bridge never drops an event because
//! of that.
//!
//! # Core Concepts
//!
//! - **Typed Events**: Raw transport payloads become [`WalkEvent`]s via the [`codec`]
//! - **Single Consumer Slot**: At most one consumer is attached at a time; binding replaces
//! - **Ordered Buffering**: Events arriving while unbound wait in arrival order
//! - **Exactly Once**: Every accepted event reaches a consumer at most once, in order
//!
//! # Modules
//!
//! - [`domain`] - Walk events and wire topics
//! - [`codec`] - Payload encoding and decoding
//! - [`dispatch`] - The dispatch queue actor and its handle
//! - [`consumer`] - Consumer adapter trait and execution context
//! - [`transport`] - Receiver, sender and the local socket transport
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod cli;
pub mod codec;
pub mod config;
pub mod consumer;
pub mod dispatch;
pub mod domain;
pub mod transport;

// Re-export commonly used types
pub use codec::{DecodeError, decode, encode};
pub use config::{Config, TransportConfig};
pub use consumer::{ConsumerHandle, Delivery, JsonLinesConsumer, WalkConsumer, spawn_consumer};
pub use dispatch::{DispatchConfig, DispatchHandle, DispatchMetrics, DispatchQueue, DispatchRequest};
pub use domain::{END_WALK, EventError, START_WALK, Topic, WalkEvent};
pub use transport::{
    MessageClient, ReceiverStats, SendReport, SocketClient, TransportError, TransportMessage, WalkReceiver, WalkSender,
};
