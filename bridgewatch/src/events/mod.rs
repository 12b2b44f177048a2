//! Event sink system for observability.
//!
//! Sessions receive an `Arc<dyn EventSink>` at construction; there is no
//! process-wide sink.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};

/// A connection attempt is starting.
pub const CONNECTING: &str = "session.connecting";
/// A connection attempt failed.
pub const CONNECT_ERROR: &str = "session.connect_error";
/// The subscribe request was sent on a fresh connection.
pub const SUBSCRIBED: &str = "session.subscribed";
/// An established connection was lost.
pub const DISCONNECTED: &str = "session.disconnected";
/// The reconnection budget ran out; the session stopped.
pub const RECONNECT_EXHAUSTED: &str = "session.reconnect_exhausted";
/// The session was torn down by its owner.
pub const TORN_DOWN: &str = "session.torn_down";
/// The completion cache already recorded the pipeline as complete.
pub const ALREADY_COMPLETE: &str = "session.already_complete";
/// An inbound payload was malformed and ignored.
pub const SNAPSHOT_REJECTED: &str = "snapshot.rejected";
/// The observed pipeline just reached all-completed.
pub const PIPELINE_COMPLETED: &str = "pipeline.completed";

/// Returns true for events reporting a failure.
#[must_use]
pub fn is_failure_event(event_type: &str) -> bool {
    matches!(
        event_type,
        CONNECT_ERROR | DISCONNECTED | RECONNECT_EXHAUSTED | SNAPSHOT_REJECTED
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_events() {
        assert!(is_failure_event(CONNECT_ERROR));
        assert!(is_failure_event(RECONNECT_EXHAUSTED));
        assert!(!is_failure_event(SUBSCRIBED));
        assert!(!is_failure_event(PIPELINE_COMPLETED));
    }
}
