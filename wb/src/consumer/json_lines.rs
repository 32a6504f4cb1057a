//! Consumer that writes each method call as a line of JSON

use std::io::Write;

use serde_json::json;
use tracing::{debug, warn};

use super::WalkConsumer;
use crate::domain::WalkEvent;

/// Writes `{"method": ..., "args": {...}}` per call
///
/// Used by `wb listen` to hand events to whatever reads its stdout.
pub struct JsonLinesConsumer<W: Write + Send + 'static> {
    writer: W,
}

impl<W: Write + Send + 'static> JsonLinesConsumer<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_call(&mut self, event: &WalkEvent) {
        let line = json!({
            "method": event.method_name(),
            "args": event.method_args(),
        });
        debug!(method = event.method_name(), "JsonLinesConsumer::write_call: called");
        if let Err(e) = writeln!(self.writer, "{line}").and_then(|_| self.writer.flush()) {
            warn!(error = %e, "JsonLinesConsumer: failed to write call");
        }
    }
}

impl<W: Write + Send + 'static> WalkConsumer for JsonLinesConsumer<W> {
    fn start_walk(&mut self, start_epoch_ms: u64, intensity: &str) {
        self.write_call(&WalkEvent::started(start_epoch_ms, intensity));
    }

    fn end_walk(&mut self, end_epoch_ms: u64, duration_sec: u32, intensity: &str) {
        self.write_call(&WalkEvent::ended(end_epoch_ms, duration_sec, intensity));
    }

    fn not_implemented(&mut self, method: &str, event: &WalkEvent) {
        warn!(%method, ?event, "JsonLinesConsumer: not implemented");
    }
}
