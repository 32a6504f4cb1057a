//! Sending side: typed events out to every reachable node

use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::{MessageClient, TransportError};
use crate::codec;
use crate::domain::WalkEvent;

/// A node the payload could not be delivered to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedNode {
    pub node: String,
    pub reason: String,
}

/// Outcome of one logical send
///
/// Partial delivery is a normal outcome, not an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SendReport {
    pub topic: String,
    pub delivered: Vec<String>,
    pub failed: Vec<FailedNode>,
}

impl SendReport {
    /// True when every discovered node got the payload (vacuously true for none)
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn reached_any(&self) -> bool {
        !self.delivered.is_empty()
    }
}

/// Encodes walk events and fans them out to every connected node
#[derive(Clone)]
pub struct WalkSender {
    client: Arc<dyn MessageClient>,
}

impl WalkSender {
    pub fn new(client: Arc<dyn MessageClient>) -> Self {
        Self { client }
    }

    /// Send an event to every currently reachable node
    ///
    /// Each node is tried independently. Only an event that could not be
    /// decoded on the other side, or a failed node discovery, is an error.
    pub async fn send(&self, event: &WalkEvent) -> Result<SendReport, TransportError> {
        let topic = event.topic();
        debug!(%topic, ?event, "WalkSender::send: called");
        event.validate()?;
        let payload = codec::encode(event);

        let nodes = self.client.connected_nodes().await?;
        if nodes.is_empty() {
            info!(%topic, "No connected nodes, nothing sent");
        }

        let attempts = nodes.iter().map(|node| {
            let payload = &payload;
            async move {
                let result = self.client.send_message(node, topic.as_str(), payload).await;
                (node.clone(), result)
            }
        });

        let mut report = SendReport {
            topic: topic.to_string(),
            ..Default::default()
        };
        for (node, result) in join_all(attempts).await {
            match result {
                Ok(()) => {
                    debug!(%node, %topic, "Payload delivered");
                    report.delivered.push(node);
                }
                Err(e) => {
                    warn!(%node, %topic, error = %e, "Payload not delivered to node");
                    report.failed.push(FailedNode {
                        node,
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            %topic,
            delivered = report.delivered.len(),
            failed = report.failed.len(),
            "Send finished"
        );
        Ok(report)
    }

    /// Send a walk started event
    pub async fn start_walk(&self, start_epoch_ms: u64, intensity: &str) -> Result<SendReport, TransportError> {
        self.send(&WalkEvent::try_started(start_epoch_ms, intensity)?).await
    }

    /// Send a walk ended event
    pub async fn end_walk(
        &self,
        end_epoch_ms: u64,
        duration_sec: u32,
        intensity: &str,
    ) -> Result<SendReport, TransportError> {
        self.send(&WalkEvent::try_ended(end_epoch_ms, duration_sec, intensity)?)
            .await
    }
}
