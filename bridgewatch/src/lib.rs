//! # Bridgewatch
//!
//! Client-side status synchronization for a cross-chain token bridging
//! pipeline.
//!
//! A bridge runs four steps in a fixed order on a remote executor. This
//! crate keeps a local view of one token address's progress in sync with a
//! push-based status server:
//!
//! - **Subscription sessions**: connect, subscribe, reconnect within a bound,
//!   and tear down with unsubscribe-then-close ordering
//! - **Snapshot state machine**: every status event replaces the whole view
//! - **Gas telemetry**: latest reading wins
//! - **Completion cache**: completion is remembered across sessions
//! - **Event sinks**: structured observability of session lifecycle
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use bridgewatch::prelude::*;
//!
//! let cache = Arc::new(FileCompletionCache::new("/var/lib/bridgewatch"));
//! let handle = SubscriptionSession::new(TokenAddress::new("0xabc")?, transport, cache)
//!     .with_config(SessionConfig::default())
//!     .start()?;
//!
//! let view = handle.wait_for_view(BridgeView::is_complete).await;
//! handle.teardown().await;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod cache;
pub mod cancellation;
pub mod core;
pub mod errors;
pub mod events;
pub mod observability;
pub mod protocol;
pub mod session;
pub mod state;
pub mod testing;
pub mod transport;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cache::{CompletionCache, FileCompletionCache, InMemoryCompletionCache};
    pub use crate::cancellation::CancellationToken;
    pub use crate::core::{PipelineState, Step, StepRegistry, StepStatus, TokenAddress};
    pub use crate::errors::{BridgeError, DecodeError, TransportError};
    pub use crate::events::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::protocol::{decode_event, ClientMessage, ServerEvent};
    pub use crate::session::{
        DisconnectReason, ReconnectPolicy, SessionConfig, SessionHandle, SessionState,
        SubscriptionSession,
    };
    pub use crate::state::{ApplyOutcome, BridgeView, GasMonitor, GasStatus, PipelineStateMachine};
    pub use crate::transport::Transport;
    pub use std::sync::Arc;
}
