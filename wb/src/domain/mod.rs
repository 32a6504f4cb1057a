//! Domain types for walk session events

mod event;

pub use event::{END_WALK, EventError, START_WALK, Topic, WalkEvent};
