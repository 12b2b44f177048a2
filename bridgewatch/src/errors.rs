//! Error types for bridgewatch.
//!
//! Connection and decode failures are handled inside the subscription
//! session and only logged; the umbrella [`BridgeError`] is what reaches
//! callers, and the only session failure it carries is an exhausted
//! reconnection budget.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::core::Step;

/// The main error type for bridgewatch operations.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// A transport-level failure.
    #[error("{0}")]
    Transport(#[from] TransportError),

    /// An inbound payload could not be decoded.
    #[error("{0}")]
    Decode(#[from] DecodeError),

    /// The session gave up reconnecting.
    #[error("Reconnection budget exhausted after {attempts} attempts: {last_error}")]
    ReconnectExhausted {
        /// Number of consecutive failed attempts.
        attempts: u32,
        /// The error of the final attempt.
        last_error: String,
    },

    /// The completion cache backend failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Invalid configuration or argument.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Stable code for observability sinks.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Transport(_) => "BRIDGE-001-TRANSPORT",
            Self::Decode(_) => "BRIDGE-002-DECODE",
            Self::ReconnectExhausted { .. } => "BRIDGE-003-RECONNECT-EXHAUSTED",
            Self::Storage(_) => "BRIDGE-004-STORAGE",
            Self::Config(_) => "BRIDGE-005-CONFIG",
            Self::Serialization(_) => "BRIDGE-006-SERIALIZATION",
            Self::Io(_) => "BRIDGE-007-IO",
        }
    }

    /// Returns true if the error ends the session for good.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::ReconnectExhausted { .. })
    }

    /// Converts to a dictionary representation for event payloads.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("code".to_string(), serde_json::Value::from(self.code()));
        map.insert("message".to_string(), serde_json::Value::from(self.to_string()));
        map
    }
}

/// Errors raised by a [`Transport`](crate::transport::Transport).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The connection could not be established.
    #[error("Connect error: {0}")]
    Connect(String),

    /// An established connection was lost.
    #[error("Disconnected: {0}")]
    Disconnected(String),

    /// A message could not be sent.
    #[error("Send error: {0}")]
    Send(String),

    /// The operation did not finish in time.
    #[error("Timed out after {0}ms")]
    Timeout(u64),
}

/// Errors raised while decoding inbound frames.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    /// The frame is not valid JSON or not an event envelope.
    #[error("Invalid frame: {0}")]
    InvalidJson(String),

    /// A status snapshot did not restate every step.
    #[error("Snapshot for '{token_address}' is missing steps: {}", format_steps(.missing))]
    MissingSteps {
        /// Address named in the payload.
        token_address: String,
        /// Steps absent from the payload.
        missing: Vec<Step>,
    },

    /// The payload of a known event has missing fields or bad values.
    #[error("Invalid '{event}' payload: {message}")]
    InvalidPayload {
        /// The event name.
        event: String,
        /// Address named in the payload, if it could be read.
        token_address: Option<String>,
        /// Decoder message.
        message: String,
    },

    /// The event name is not one this client consumes.
    #[error("Unknown event: {0}")]
    UnknownEvent(String),
}

impl DecodeError {
    /// Returns true for payloads that violate the protocol, as opposed to
    /// events this client simply does not consume.
    #[must_use]
    pub fn is_malformed(&self) -> bool {
        !matches!(self, Self::UnknownEvent(_))
    }

    /// Address the rejected payload was meant for, when known.
    #[must_use]
    pub fn token_address(&self) -> Option<&str> {
        match self {
            Self::MissingSteps { token_address, .. } => Some(token_address),
            Self::InvalidPayload { token_address, .. } => token_address.as_deref(),
            Self::InvalidJson(_) | Self::UnknownEvent(_) => None,
        }
    }
}

/// Raised when a status snapshot lacks one or more steps.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("snapshot is missing steps: {}", format_steps(.missing))]
pub struct IncompleteSnapshotError {
    /// Steps absent from the snapshot.
    pub missing: Vec<Step>,
}

impl IncompleteSnapshotError {
    /// Creates a new incomplete snapshot error.
    #[must_use]
    pub fn new(missing: Vec<Step>) -> Self {
        Self { missing }
    }
}

fn format_steps(steps: &[Step]) -> String {
    steps
        .iter()
        .map(Step::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
