//! Walk events, wire topics and consumer method names

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::debug;

use crate::codec::DecodeError;

/// Consumer method invoked for a started walk
pub const START_WALK: &str = "start_walk";

/// Consumer method invoked for an ended walk
pub const END_WALK: &str = "end_walk";

/// Transport topic (message path) a payload travels under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    WalkStart,
    WalkEnd,
}

impl Topic {
    /// All topics the bridge understands
    pub const ALL: [Topic; 2] = [Topic::WalkStart, Topic::WalkEnd];

    /// Wire path for this topic
    pub const fn as_str(&self) -> &'static str {
        match self {
            Topic::WalkStart => "/walk/start",
            Topic::WalkEnd => "/walk/end",
        }
    }

    /// Consumer method name events on this topic are delivered as
    pub const fn method_name(&self) -> &'static str {
        match self {
            Topic::WalkStart => START_WALK,
            Topic::WalkEnd => END_WALK,
        }
    }
}

impl FromStr for Topic {
    type Err = DecodeError;

    /// Look up a topic by its wire path
    fn from_str(path: &str) -> Result<Self, Self::Err> {
        debug!(%path, "Topic::from_str: called");
        Self::ALL
            .into_iter()
            .find(|topic| topic.as_str() == path)
            .ok_or_else(|| DecodeError::UnknownTopic(path.to_string()))
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejected event contents
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    #[error("Intensity must not be empty")]
    EmptyIntensity,
}

/// A walk session lifecycle event
///
/// Timestamps are milliseconds since the Unix epoch. `intensity` is an opaque,
/// non-empty label chosen by the wearable UI ("brisk", "slow", ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WalkEvent {
    /// A walk session began
    WalkStarted { start_time: u64, intensity: String },

    /// A walk session finished
    WalkEnded {
        end_time: u64,
        duration_seconds: u32,
        intensity: String,
    },
}

impl WalkEvent {
    /// Create a walk started event, rejecting an empty intensity
    pub fn try_started(start_time: u64, intensity: impl Into<String>) -> Result<Self, EventError> {
        let event = Self::started(start_time, intensity);
        event.validate()?;
        Ok(event)
    }

    /// Create a walk ended event, rejecting an empty intensity
    pub fn try_ended(end_time: u64, duration_seconds: u32, intensity: impl Into<String>) -> Result<Self, EventError> {
        let event = Self::ended(end_time, duration_seconds, intensity);
        event.validate()?;
        Ok(event)
    }

    /// Create a walk started event
    ///
    /// Unchecked; see [`try_started`](Self::try_started).
    pub fn started(start_time: u64, intensity: impl Into<String>) -> Self {
        Self::WalkStarted {
            start_time,
            intensity: intensity.into(),
        }
    }

    /// Create a walk ended event
    ///
    /// Unchecked; see [`try_ended`](Self::try_ended).
    pub fn ended(end_time: u64, duration_seconds: u32, intensity: impl Into<String>) -> Self {
        Self::WalkEnded {
            end_time,
            duration_seconds,
            intensity: intensity.into(),
        }
    }

    /// Topic this event travels under
    pub fn topic(&self) -> Topic {
        match self {
            WalkEvent::WalkStarted { .. } => Topic::WalkStart,
            WalkEvent::WalkEnded { .. } => Topic::WalkEnd,
        }
    }

    /// Consumer method this event is delivered as
    pub fn method_name(&self) -> &'static str {
        self.topic().method_name()
    }

    pub fn intensity(&self) -> &str {
        match self {
            WalkEvent::WalkStarted { intensity, .. } | WalkEvent::WalkEnded { intensity, .. } => intensity,
        }
    }

    /// Check the event can cross the wire and decode back unchanged
    ///
    /// The intensity is opaque: any non-empty string is accepted, whitespace
    /// included.
    pub fn validate(&self) -> Result<(), EventError> {
        if self.intensity().is_empty() {
            return Err(EventError::EmptyIntensity);
        }
        Ok(())
    }

    /// Named arguments handed across the consumer boundary
    ///
    /// Key names are the persisted cross-boundary contract and match the
    /// wire payload exactly.
    pub fn method_args(&self) -> Value {
        match self {
            WalkEvent::WalkStarted { start_time, intensity } => json!({
                "startEpochMs": start_time,
                "intensity": intensity,
            }),
            WalkEvent::WalkEnded {
                end_time,
                duration_seconds,
                intensity,
            } => json!({
                "endEpochMs": end_time,
                "durationSec": duration_seconds,
                "intensity": intensity,
            }),
        }
    }
}
