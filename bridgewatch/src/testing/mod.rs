//! Testing utilities for bridge status sessions.
//!
//! This module provides:
//! - A scripted in-memory [`Transport`](crate::transport::Transport)
//! - Frame and snapshot builders

mod fixtures;
mod mocks;

pub use fixtures::{completed_through, gas_event, gas_frame, status_event, status_frame};
pub use mocks::{ConnectBehavior, MockTransport, MockTransportController, TransportCall};
