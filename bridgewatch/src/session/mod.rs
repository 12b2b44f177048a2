//! Subscription sessions.
//!
//! A [`SubscriptionSession`] observes one token address. Starting it spawns
//! a task that owns the transport, the [`PipelineStateMachine`] and the
//! [`GasMonitor`]; every inbound frame is handled on that task in arrival
//! order. The returned [`SessionHandle`] exposes the current [`BridgeView`]
//! and [`SessionState`] and is the single cancellation point.
//!
//! State flow:
//!
//! ```text
//! Disconnected(Idle) -> Connecting -> Subscribed -> Disconnected(TornDown)
//!                            |            |
//!                            |            v
//!                            |       Reconnecting -> Subscribed
//!                            v            v
//!              Disconnected(ReconnectExhausted)
//! ```
//!
//! [`PipelineStateMachine`]: crate::state::PipelineStateMachine
//! [`GasMonitor`]: crate::state::GasMonitor

mod config;
mod reconnect;
mod runner;

pub use config::SessionConfig;
pub use reconnect::{
    BackoffStrategy, JitterStrategy, ReconnectDecision, ReconnectPolicy, ReconnectState,
};

use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::Instrument;
use uuid::Uuid;

use crate::cache::CompletionCache;
use crate::cancellation::CancellationToken;
use crate::core::TokenAddress;
use crate::errors::BridgeError;
use crate::events::{EventSink, NoOpEventSink};
use crate::state::BridgeView;
use crate::transport::Transport;
use runner::SessionRunner;

/// Why a session is not connected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectReason {
    /// Not started yet.
    Idle,
    /// The owner stopped observing.
    TornDown,
    /// The reconnection budget ran out.
    ReconnectExhausted {
        /// Consecutive failed attempts.
        attempts: u32,
        /// Error of the final attempt.
        last_error: String,
    },
    /// The completion cache already recorded the pipeline as complete.
    AlreadyComplete,
}

/// Connection state of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No connection.
    Disconnected(DisconnectReason),
    /// First connection round.
    Connecting {
        /// 1-based attempt in the current round.
        attempt: u32,
    },
    /// Connected and the subscribe request was sent.
    Subscribed,
    /// Re-establishing a lost connection.
    Reconnecting {
        /// 1-based attempt in the current round.
        attempt: u32,
    },
}

impl SessionState {
    /// Returns true once the session will make no further progress.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Disconnected(reason) if *reason != DisconnectReason::Idle)
    }

    /// Returns true while live updates are flowing.
    #[must_use]
    pub fn is_subscribed(&self) -> bool {
        matches!(self, Self::Subscribed)
    }

    /// Returns true if the session ended because reconnecting failed.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(
            self,
            Self::Disconnected(DisconnectReason::ReconnectExhausted { .. })
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected(DisconnectReason::Idle) => write!(f, "disconnected"),
            Self::Disconnected(DisconnectReason::TornDown) => write!(f, "disconnected(torn_down)"),
            Self::Disconnected(DisconnectReason::ReconnectExhausted { attempts, .. }) => {
                write!(f, "disconnected(failed after {attempts} attempts)")
            }
            Self::Disconnected(DisconnectReason::AlreadyComplete) => {
                write!(f, "disconnected(already_complete)")
            }
            Self::Connecting { attempt } => write!(f, "connecting(attempt {attempt})"),
            Self::Subscribed => write!(f, "subscribed"),
            Self::Reconnecting { attempt } => write!(f, "reconnecting(attempt {attempt})"),
        }
    }
}

/// Builder for a session observing one token address.
pub struct SubscriptionSession<T: Transport> {
    subject: TokenAddress,
    transport: T,
    cache: Arc<dyn CompletionCache>,
    sink: Arc<dyn EventSink>,
    config: SessionConfig,
}

impl<T: Transport> SubscriptionSession<T> {
    /// Creates a session with the reference configuration and no event sink.
    #[must_use]
    pub fn new(subject: TokenAddress, transport: T, cache: Arc<dyn CompletionCache>) -> Self {
        Self {
            subject,
            transport,
            cache,
            sink: Arc::new(NoOpEventSink),
            config: SessionConfig::default(),
        }
    }

    /// Sets the configuration.
    #[must_use]
    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the observability sink.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Spawns the session task on the current tokio runtime.
    ///
    /// Returns immediately; connecting and subscribing happen in the
    /// background.
    pub fn start(self) -> Result<SessionHandle, BridgeError> {
        self.config.validate()?;

        let id = Uuid::new_v4();
        let cancel = Arc::new(CancellationToken::new());
        let (view_tx, view_rx) = watch::channel(BridgeView::default());
        let (state_tx, state_rx) = watch::channel(SessionState::Disconnected(DisconnectReason::Idle));

        let span = tracing::info_span!(
            "bridge_session",
            session_id = %id,
            token_address = %self.subject
        );
        let runner = SessionRunner::new(
            self.subject.clone(),
            self.transport,
            self.cache,
            self.sink,
            self.config,
            cancel.clone(),
            view_tx,
            state_tx,
        );
        tokio::spawn(runner.run().instrument(span));

        Ok(SessionHandle {
            id,
            subject: self.subject,
            cancel,
            view_rx,
            state_rx,
        })
    }
}

/// Owner-side handle of a running session.
///
/// Dropping the handle requests teardown.
#[derive(Debug)]
pub struct SessionHandle {
    id: Uuid,
    subject: TokenAddress,
    cancel: Arc<CancellationToken>,
    view_rx: watch::Receiver<BridgeView>,
    state_rx: watch::Receiver<SessionState>,
}

impl SessionHandle {
    /// Session id used in logs and events.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The observed token address.
    #[must_use]
    pub fn subject(&self) -> &TokenAddress {
        &self.subject
    }

    /// Current view of the pipeline.
    #[must_use]
    pub fn view(&self) -> BridgeView {
        self.view_rx.borrow().clone()
    }

    /// Receiver notified on every applied event.
    #[must_use]
    pub fn watch_view(&self) -> watch::Receiver<BridgeView> {
        self.view_rx.clone()
    }

    /// Current connection state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state_rx.borrow().clone()
    }

    /// Receiver notified on every state change.
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.state_rx.clone()
    }

    /// Waits until the state satisfies `predicate` and returns it.
    ///
    /// Returns the last known state if the session task is gone.
    pub async fn wait_for_state<F>(&self, mut predicate: F) -> SessionState
    where
        F: FnMut(&SessionState) -> bool,
    {
        let mut rx = self.state_rx.clone();
        let result = rx.wait_for(|s| predicate(s)).await.map(|s| s.clone());
        result.unwrap_or_else(|_| rx.borrow().clone())
    }

    /// Waits until the view satisfies `predicate` and returns it.
    pub async fn wait_for_view<F>(&self, mut predicate: F) -> BridgeView
    where
        F: FnMut(&BridgeView) -> bool,
    {
        let mut rx = self.view_rx.clone();
        let result = rx.wait_for(|v| predicate(v)).await.map(|v| v.clone());
        result.unwrap_or_else(|_| rx.borrow().clone())
    }

    /// Stops observing: no further reconnects, unsubscribe if subscribed,
    /// then close the transport. Safe to call repeatedly and concurrently.
    ///
    /// Returns the terminal state. A session that had already failed keeps
    /// its failure state.
    pub async fn teardown(&self) -> SessionState {
        self.cancel.cancel("teardown requested");
        self.wait_for_state(SessionState::is_terminal).await
    }

    /// Waits for the session to end and reports how it ended.
    pub async fn finished(&self) -> Result<(), BridgeError> {
        match self.wait_for_state(SessionState::is_terminal).await {
            SessionState::Disconnected(DisconnectReason::ReconnectExhausted {
                attempts,
                last_error,
            }) => Err(BridgeError::ReconnectExhausted {
                attempts,
                last_error,
            }),
            _ => Ok(()),
        }
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.cancel.cancel("session handle dropped");
    }
}
