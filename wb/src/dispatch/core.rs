//! Main dispatch queue task implementation

use std::collections::VecDeque;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::config::DispatchConfig;
use super::handle::DispatchHandle;
use super::messages::{DispatchMetrics, DispatchRequest};
use crate::consumer::{ConsumerHandle, Delivery};

/// Consumer slot plus pending queue
///
/// Owned by exactly one task, so every transition below is atomic with
/// respect to the others. While a consumer is bound the pending queue is
/// empty.
struct DispatchState {
    slot: Option<ConsumerHandle>,
    pending: VecDeque<Delivery>,
    pending_warn_threshold: usize,
    warn_armed: bool,
    metrics: DispatchMetrics,
}

impl DispatchState {
    fn new(config: &DispatchConfig) -> Self {
        Self {
            slot: None,
            pending: VecDeque::new(),
            pending_warn_threshold: config.pending_warn_threshold,
            warn_armed: true,
            metrics: DispatchMetrics::default(),
        }
    }

    fn bind(&mut self, consumer: ConsumerHandle) {
        let consumer_id = consumer.id();
        match self.slot.replace(consumer) {
            Some(previous) if previous.id() != consumer_id => {
                debug!(previous = previous.id(), consumer_id, "Replacing bound consumer");
            }
            Some(_) => debug!(consumer_id, "Consumer already bound, rebinding"),
            None => debug!(consumer_id, "Binding consumer"),
        }
        self.metrics.binds += 1;
        self.flush();
    }

    fn unbind(&mut self) {
        match self.slot.take() {
            Some(consumer) => debug!(consumer_id = consumer.id(), "Unbinding consumer"),
            None => debug!("Unbind while already unbound"),
        }
        self.metrics.unbinds += 1;
    }

    fn dispatch(&mut self, delivery: Delivery) {
        self.metrics.accepted += 1;

        let Some(consumer) = &self.slot else {
            debug!(method = %delivery.method, "No consumer bound, queuing");
            self.buffer(delivery);
            return;
        };

        match consumer.post(delivery) {
            Ok(()) => self.metrics.delivered += 1,
            Err(undelivered) => {
                self.detach();
                self.buffer(undelivered);
            }
        }
    }

    /// Drain the pending queue into the bound consumer in order
    fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let Some(consumer) = self.slot.clone() else {
            return;
        };

        let snapshot = std::mem::take(&mut self.pending);
        debug!(count = snapshot.len(), consumer_id = consumer.id(), "Flushing pending events");

        let mut remaining = snapshot.into_iter();
        while let Some(delivery) = remaining.next() {
            if let Err(undelivered) = consumer.post(delivery) {
                // Put back everything not handed over, order unchanged
                self.detach();
                self.pending.push_back(undelivered);
                self.pending.extend(remaining);
                warn!(pending = self.pending.len(), "Consumer went away during flush, events kept");
                return;
            }
            self.metrics.delivered += 1;
            self.metrics.flushed += 1;
        }

        self.warn_armed = true;
    }

    fn buffer(&mut self, delivery: Delivery) {
        self.pending.push_back(delivery);
        self.metrics.buffered += 1;

        if self.warn_armed && self.pending_warn_threshold > 0 && self.pending.len() >= self.pending_warn_threshold {
            warn!(
                pending = self.pending.len(),
                threshold = self.pending_warn_threshold,
                "Pending queue is growing, is a consumer ever going to bind?"
            );
            self.warn_armed = false;
        }
    }

    /// Clear the slot after finding the consumer's queue closed
    fn detach(&mut self) {
        if let Some(consumer) = self.slot.take() {
            warn!(consumer_id = consumer.id(), "Bound consumer is gone, treating as unbound");
            self.metrics.detached += 1;
        }
    }

    fn metrics(&self) -> DispatchMetrics {
        DispatchMetrics {
            consumer_id: self.slot.as_ref().map(ConsumerHandle::id),
            pending: self.pending.len(),
            ..self.metrics.clone()
        }
    }
}

/// The dispatch queue actor
///
/// Create one per endpoint and hand its [`DispatchHandle`] to both the
/// transport side and the UI side.
pub struct DispatchQueue {
    config: DispatchConfig,
    tx: mpsc::UnboundedSender<DispatchRequest>,
    rx: mpsc::UnboundedReceiver<DispatchRequest>,
}

impl DispatchQueue {
    /// Create a new dispatch queue with the given configuration
    pub fn new(config: DispatchConfig) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { config, tx, rx }
    }

    /// Get a handle for binding consumers and dispatching events
    pub fn handle(&self) -> DispatchHandle {
        DispatchHandle::new(self.tx.clone())
    }

    /// Create a queue, spawn its task, and return a handle to it
    pub fn spawn(config: DispatchConfig) -> (DispatchHandle, JoinHandle<()>) {
        let queue = Self::new(config);
        let handle = queue.handle();
        let task = tokio::spawn(queue.run());
        (handle, task)
    }

    /// Run the dispatch queue task
    ///
    /// This consumes the queue and runs until shutdown is requested or every
    /// handle has been dropped.
    pub async fn run(self) {
        let Self { config, tx, mut rx } = self;
        drop(tx);

        let mut state = DispatchState::new(&config);

        info!("Dispatch queue started");

        while let Some(req) = rx.recv().await {
            match req {
                DispatchRequest::Bind { consumer } => state.bind(consumer),

                DispatchRequest::Unbind => state.unbind(),

                DispatchRequest::Dispatch { delivery } => state.dispatch(delivery),

                DispatchRequest::GetMetrics { reply_tx } => {
                    let _ = reply_tx.send(state.metrics());
                }

                DispatchRequest::Shutdown => {
                    info!("Dispatch queue shutting down");
                    break;
                }
            }
        }

        if !state.pending.is_empty() {
            warn!(pending = state.pending.len(), "Dispatch queue stopped with undelivered events");
        }
        info!("Dispatch queue stopped");
    }
}
