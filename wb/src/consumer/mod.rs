//! Consumer adapters and their execution context
//!
//! A consumer is whatever ultimately handles walk events on the receiving
//! endpoint (typically the UI layer). The dispatch queue never calls a consumer
//! directly: it posts [`Delivery`]s to the consumer's own ordered task queue,
//! represented by a [`ConsumerHandle`]. Whoever owns the other end of that
//! queue drains it on the consumer's execution context, in FIFO order.

mod json_lines;

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::domain::{END_WALK, START_WALK, WalkEvent};

pub use json_lines::JsonLinesConsumer;

static NEXT_CONSUMER_ID: AtomicU64 = AtomicU64::new(1);

/// Handler invoked for walk events on the receiving endpoint
///
/// Argument names and shapes are the cross-boundary contract:
/// `start_walk(startEpochMs, intensity)` and
/// `end_walk(endEpochMs, durationSec, intensity)`.
pub trait WalkConsumer: Send + 'static {
    fn start_walk(&mut self, start_epoch_ms: u64, intensity: &str);

    fn end_walk(&mut self, end_epoch_ms: u64, duration_sec: u32, intensity: &str);

    /// Called for a method name this consumer does not handle
    fn not_implemented(&mut self, method: &str, event: &WalkEvent) {
        warn!(%method, ?event, "WalkConsumer: method not implemented");
    }
}

/// A single method call posted to a consumer's execution context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub method: String,
    pub event: WalkEvent,
}

impl Delivery {
    pub fn new(method: impl Into<String>, event: WalkEvent) -> Self {
        Self {
            method: method.into(),
            event,
        }
    }

    /// Invoke the consumer method this delivery names
    ///
    /// The method name must agree with the event variant; anything else is
    /// routed to [`WalkConsumer::not_implemented`].
    pub fn invoke<C: WalkConsumer + ?Sized>(&self, consumer: &mut C) {
        debug!(method = %self.method, "Delivery::invoke: called");
        match (self.method.as_str(), &self.event) {
            (START_WALK, WalkEvent::WalkStarted { start_time, intensity }) => {
                consumer.start_walk(*start_time, intensity);
            }
            (
                END_WALK,
                WalkEvent::WalkEnded {
                    end_time,
                    duration_seconds,
                    intensity,
                },
            ) => {
                consumer.end_walk(*end_time, *duration_seconds, intensity);
            }
            (method, event) => consumer.not_implemented(method, event),
        }
    }
}

/// Sending side of a consumer's ordered task queue
///
/// This is what gets bound into the dispatch queue's consumer slot. Clones
/// share the same queue and the same id.
#[derive(Debug, Clone)]
pub struct ConsumerHandle {
    id: u64,
    tx: mpsc::UnboundedSender<Delivery>,
}

impl ConsumerHandle {
    /// Create a consumer task queue
    ///
    /// The receiver must be drained on the consumer's execution context.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Delivery>) {
        let id = NEXT_CONSUMER_ID.fetch_add(1, Ordering::Relaxed);
        debug!(consumer_id = id, "ConsumerHandle::channel: created");
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { id, tx }, rx)
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Post a delivery to the consumer's queue
    ///
    /// Returns the delivery back if the consumer is gone, so the caller can
    /// keep it.
    pub(crate) fn post(&self, delivery: Delivery) -> Result<(), Delivery> {
        self.tx.send(delivery).map_err(|e| e.0)
    }
}

/// Run a consumer on its own tokio task
///
/// Deliveries are invoked one at a time in the order they were posted. The
/// task finishes, handing the consumer back, once every [`ConsumerHandle`]
/// clone (including the one held by a dispatch queue) is dropped.
pub fn spawn_consumer<C: WalkConsumer>(mut consumer: C) -> (ConsumerHandle, JoinHandle<C>) {
    let (handle, mut rx) = ConsumerHandle::channel();
    let consumer_id = handle.id();

    let task = tokio::spawn(async move {
        debug!(consumer_id, "consumer context started");
        while let Some(delivery) = rx.recv().await {
            delivery.invoke(&mut consumer);
        }
        debug!(consumer_id, "consumer context closed");
        consumer
    });

    (handle, task)
}
