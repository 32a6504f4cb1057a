//! Dispatch queue configuration

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Dispatch queue configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Pending queue length that triggers a warning (0 disables it)
    ///
    /// The queue itself is never capped; this only surfaces a consumer that
    /// stays detached for too long.
    #[serde(rename = "pending-warn-threshold", default = "default_pending_warn_threshold")]
    pub pending_warn_threshold: usize,
}

fn default_pending_warn_threshold() -> usize {
    debug!("default_pending_warn_threshold: called");
    1000
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            pending_warn_threshold: default_pending_warn_threshold(),
        }
    }
}
