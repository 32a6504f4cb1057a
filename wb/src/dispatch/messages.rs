//! Message types for the dispatch queue

use serde::Serialize;
use tokio::sync::oneshot;

use crate::consumer::{ConsumerHandle, Delivery};

/// Requests to the dispatch queue task
#[derive(Debug)]
pub enum DispatchRequest {
    /// Install a consumer, replacing any previous one, then flush
    Bind { consumer: ConsumerHandle },

    /// Clear the consumer slot
    Unbind,

    /// Deliver or buffer a method call
    Dispatch { delivery: Delivery },

    /// Get current metrics
    GetMetrics {
        reply_tx: oneshot::Sender<DispatchMetrics>,
    },

    /// Shutdown the dispatch queue
    Shutdown,
}

/// Dispatch queue metrics for observability
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchMetrics {
    /// Id of the bound consumer, if any
    pub consumer_id: Option<u64>,
    /// Events currently waiting for a consumer
    pub pending: usize,
    /// Events accepted by dispatch
    pub accepted: u64,
    /// Events posted to a consumer (immediately or by a flush)
    pub delivered: u64,
    /// Events that went through the pending queue
    pub buffered: u64,
    /// Events posted by flushes
    pub flushed: u64,
    pub binds: u64,
    pub unbinds: u64,
    /// Consumers found gone while bound
    pub detached: u64,
}

impl DispatchMetrics {
    pub fn is_bound(&self) -> bool {
        self.consumer_id.is_some()
    }
}
