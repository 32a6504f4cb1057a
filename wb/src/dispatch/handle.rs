//! DispatchHandle - client interface for the dispatch queue

use eyre::{Result, eyre};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use super::messages::{DispatchMetrics, DispatchRequest};
use crate::consumer::{ConsumerHandle, Delivery};
use crate::domain::WalkEvent;

/// Handle for transport and UI code to interact with the dispatch queue
///
/// This handle is cloneable and every operation except [`metrics`](Self::metrics)
/// is synchronous and non-blocking, so it can be called from transport
/// threads that have no async runtime of their own. Requests are processed in
/// the order they are made.
#[derive(Debug, Clone)]
pub struct DispatchHandle {
    tx: mpsc::UnboundedSender<DispatchRequest>,
}

impl DispatchHandle {
    pub(crate) fn new(tx: mpsc::UnboundedSender<DispatchRequest>) -> Self {
        Self { tx }
    }

    /// Attach a consumer, replacing any previous one, and flush pending events
    pub fn bind(&self, consumer: ConsumerHandle) {
        debug!(consumer_id = consumer.id(), "DispatchHandle::bind: called");
        self.send(DispatchRequest::Bind { consumer }, "bind");
    }

    /// Detach the current consumer; later events are buffered
    pub fn unbind(&self) {
        debug!("DispatchHandle::unbind: called");
        self.send(DispatchRequest::Unbind, "unbind");
    }

    /// Hand an event to the consumer, or buffer it if none is bound
    ///
    /// Fire-and-forget: delivery is not acknowledged.
    pub fn dispatch(&self, method: impl Into<String>, event: WalkEvent) {
        let delivery = Delivery::new(method, event);
        debug!(method = %delivery.method, "DispatchHandle::dispatch: called");
        self.send(DispatchRequest::Dispatch { delivery }, "dispatch");
    }

    /// Dispatch a walk started event as `start_walk`
    pub fn send_start(&self, start_epoch_ms: u64, intensity: impl Into<String>) {
        let event = WalkEvent::started(start_epoch_ms, intensity);
        self.dispatch(event.method_name(), event);
    }

    /// Dispatch a walk ended event as `end_walk`
    pub fn send_end(&self, end_epoch_ms: u64, duration_sec: u32, intensity: impl Into<String>) {
        let event = WalkEvent::ended(end_epoch_ms, duration_sec, intensity);
        self.dispatch(event.method_name(), event);
    }

    /// Get current dispatch queue metrics
    ///
    /// The reply reflects every request made through this handle beforehand.
    pub async fn metrics(&self) -> Result<DispatchMetrics> {
        debug!("DispatchHandle::metrics: called");
        let (reply_tx, reply_rx) = oneshot::channel();

        self.tx
            .send(DispatchRequest::GetMetrics { reply_tx })
            .map_err(|_| eyre!("Dispatch queue channel closed"))?;

        reply_rx.await.map_err(|_| eyre!("Dispatch queue shutdown before reply"))
    }

    /// Request shutdown of the dispatch queue
    pub fn shutdown(&self) {
        debug!("DispatchHandle::shutdown: called");
        self.send(DispatchRequest::Shutdown, "shutdown");
    }

    fn send(&self, req: DispatchRequest, op: &'static str) {
        if let Err(e) = self.tx.send(req) {
            warn!(op, request = ?e.0, "Dispatch queue is stopped, request dropped");
        }
    }
}
