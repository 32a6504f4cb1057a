//! Receiving side: transport frames into the dispatch queue

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::TransportMessage;
use crate::codec::{self, DecodeError};
use crate::dispatch::DispatchHandle;

/// Counters for frames seen by a [`WalkReceiver`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReceiverStats {
    pub received: u64,
    pub dispatched: u64,
    pub rejected: u64,
}

#[derive(Default)]
struct Counters {
    received: AtomicU64,
    dispatched: AtomicU64,
    rejected: AtomicU64,
}

/// Decodes received payloads and hands them to the dispatch queue
///
/// Undecodable payloads are logged and dropped; they never reach the
/// consumer and are not retried.
#[derive(Clone)]
pub struct WalkReceiver {
    dispatch: DispatchHandle,
    counters: Arc<Counters>,
}

impl WalkReceiver {
    pub fn new(dispatch: DispatchHandle) -> Self {
        Self {
            dispatch,
            counters: Arc::default(),
        }
    }

    /// Handle one received message
    ///
    /// The decode failure, if any, is returned so the transport callback can
    /// report it; the bridge itself is unaffected.
    pub fn on_message_received(&self, message: &TransportMessage) -> Result<(), DecodeError> {
        debug!(path = %message.path, len = message.data.len(), "WalkReceiver::on_message_received: called");
        self.counters.received.fetch_add(1, Ordering::Relaxed);

        match codec::decode(&message.path, &message.data) {
            Ok(event) => {
                self.dispatch.dispatch(event.method_name(), event);
                self.counters.dispatched.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(e) => {
                warn!(path = %message.path, error = %e, "Dropping undecodable message");
                self.counters.rejected.fetch_add(1, Ordering::Relaxed);
                Err(e)
            }
        }
    }

    /// Consume messages until the channel closes
    pub async fn run(self, rx: mpsc::Receiver<TransportMessage>) -> ReceiverStats {
        self.run_until(rx, std::future::pending()).await
    }

    /// Consume messages until the channel closes or `shutdown` resolves
    ///
    /// On shutdown the channel is closed to new messages and everything
    /// already queued in it is still handled, so no message a transport has
    /// accepted is lost.
    pub async fn run_until<F>(self, mut rx: mpsc::Receiver<TransportMessage>, shutdown: F) -> ReceiverStats
    where
        F: Future<Output = ()>,
    {
        info!("WalkReceiver started");
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                message = rx.recv() => match message {
                    Some(message) => {
                        let _ = self.on_message_received(&message);
                    }
                    None => break,
                },
                _ = &mut shutdown => {
                    debug!("WalkReceiver::run_until: shutdown requested, draining");
                    rx.close();
                    while let Some(message) = rx.recv().await {
                        let _ = self.on_message_received(&message);
                    }
                    break;
                }
            }
        }

        let stats = self.stats();
        info!(?stats, "WalkReceiver stopped");
        stats
    }

    pub fn stats(&self) -> ReceiverStats {
        ReceiverStats {
            received: self.counters.received.load(Ordering::Relaxed),
            dispatched: self.counters.dispatched.load(Ordering::Relaxed),
            rejected: self.counters.rejected.load(Ordering::Relaxed),
        }
    }
}
