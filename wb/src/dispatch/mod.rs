//! Dispatch queue for walk events
//!
//! The dispatch queue owns a single consumer slot and a pending queue:
//! - **Bound:** events are posted straight to the consumer's task queue
//! - **Unbound:** events wait in the pending queue in arrival order
//! - **Bind:** replaces the consumer, then flushes pending events in order
//!
//! All state lives in one actor task; [`DispatchHandle`] is the cloneable,
//! non-blocking front that transport and UI code hold.

mod config;
mod core;
mod handle;
mod messages;

pub use config::DispatchConfig;
pub use core::DispatchQueue;
pub use handle::DispatchHandle;
pub use messages::{DispatchMetrics, DispatchRequest};
