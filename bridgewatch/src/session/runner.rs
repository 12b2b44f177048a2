//! The session task: connection loop and inbound event dispatch.

use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::{DisconnectReason, ReconnectDecision, ReconnectState, SessionConfig, SessionState};
use crate::cache::CompletionCache;
use crate::cancellation::CancellationToken;
use crate::core::TokenAddress;
use crate::errors::{DecodeError, TransportError};
use crate::events::{self, EventSink};
use crate::protocol::{decode_event, ClientMessage, ServerEvent};
use crate::state::{ApplyOutcome, BridgeView, GasMonitor, PipelineStateMachine};
use crate::transport::Transport;

/// What woke the receive loop.
enum Inbound {
    Cancelled,
    Frame(Result<String, TransportError>),
}

pub(super) struct SessionRunner<T: Transport> {
    subject: TokenAddress,
    transport: T,
    cache: Arc<dyn CompletionCache>,
    sink: Arc<dyn EventSink>,
    config: SessionConfig,
    cancel: Arc<CancellationToken>,
    machine: PipelineStateMachine,
    gas: GasMonitor,
    view_tx: watch::Sender<BridgeView>,
    state_tx: watch::Sender<SessionState>,
}

impl<T: Transport> SessionRunner<T> {
    #[allow(clippy::too_many_arguments)]
    pub(super) fn new(
        subject: TokenAddress,
        transport: T,
        cache: Arc<dyn CompletionCache>,
        sink: Arc<dyn EventSink>,
        config: SessionConfig,
        cancel: Arc<CancellationToken>,
        view_tx: watch::Sender<BridgeView>,
        state_tx: watch::Sender<SessionState>,
    ) -> Self {
        Self {
            machine: PipelineStateMachine::new(subject.clone(), cache.clone()),
            gas: GasMonitor::new(subject.clone()),
            subject,
            transport,
            cache,
            sink,
            config,
            cancel,
            view_tx,
            state_tx,
        }
    }

    pub(super) async fn run(mut self) {
        let cancel = self.cancel.clone();
        let known = tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            known = self.known_complete() => Some(known),
        };

        let reason = match known {
            None => DisconnectReason::TornDown,
            Some(true) => {
                info!("Completion already recorded, not subscribing");
                self.view_tx.send_replace(BridgeView::completed());
                self.emit(events::ALREADY_COMPLETE, json!({})).await;
                self.set_state(SessionState::Disconnected(DisconnectReason::AlreadyComplete));
                return;
            }
            Some(false) => self.connection_loop().await,
        };

        match &reason {
            DisconnectReason::TornDown => {
                info!("Session torn down");
                self.emit(events::TORN_DOWN, json!({})).await;
            }
            DisconnectReason::ReconnectExhausted {
                attempts,
                last_error,
            } => {
                warn!(attempts, error = %last_error, "Giving up on reconnecting");
                self.emit(
                    events::RECONNECT_EXHAUSTED,
                    json!({ "attempts": attempts, "error": last_error }),
                )
                .await;
            }
            DisconnectReason::Idle | DisconnectReason::AlreadyComplete => {}
        }
        self.set_state(SessionState::Disconnected(reason));
    }

    /// Bounded by the connect timeout; a slow or failing cache reads as
    /// "not complete".
    async fn known_complete(&mut self) -> bool {
        let limit = self.config.connect_timeout();
        match tokio::time::timeout(limit, self.cache.has(self.subject.as_str())).await {
            Ok(Ok(known)) => known,
            Ok(Err(e)) => {
                warn!(error = %e, "Completion cache lookup failed, subscribing anyway");
                false
            }
            Err(_) => {
                warn!(
                    timeout_ms = millis(limit),
                    "Completion cache lookup timed out, subscribing anyway"
                );
                false
            }
        }
    }

    /// Connects, subscribes and pumps frames until teardown or until the
    /// reconnection budget is spent. Only this task touches the transport.
    async fn connection_loop(&mut self) -> DisconnectReason {
        let cancel = self.cancel.clone();
        let mut backoff = ReconnectState::new();
        let mut reconnecting = false;

        loop {
            let attempt = backoff.next_attempt();
            self.set_state(if reconnecting {
                SessionState::Reconnecting { attempt }
            } else {
                SessionState::Connecting { attempt }
            });
            debug!(attempt, reconnecting, "Connecting");
            self.emit(events::CONNECTING, json!({ "attempt": attempt })).await;

            let connect_timeout = self.config.connect_timeout();
            let connected = tokio::select! {
                biased;
                () = cancel.cancelled() => None,
                result = tokio::time::timeout(connect_timeout, self.transport.connect()) => {
                    Some(result.unwrap_or_else(|_| Err(timeout_error(connect_timeout))))
                }
            };

            let Some(connected) = connected else {
                debug!("Teardown during connect, abandoning attempt");
                self.close_transport().await;
                return DisconnectReason::TornDown;
            };

            if let Err(e) = connected {
                warn!(attempt, error = %e, "Connection attempt failed");
                self.emit(
                    events::CONNECT_ERROR,
                    json!({ "attempt": attempt, "error": e.to_string() }),
                )
                .await;
                self.close_transport().await;

                match backoff.record_failure(&self.config.reconnect) {
                    ReconnectDecision::GiveUp => {
                        return DisconnectReason::ReconnectExhausted {
                            attempts: backoff.failures(),
                            last_error: e.to_string(),
                        };
                    }
                    ReconnectDecision::Retry(delay) => {
                        if self.sleep_or_cancelled(delay).await {
                            return DisconnectReason::TornDown;
                        }
                        continue;
                    }
                }
            }

            backoff.reset();

            if cancel.is_cancelled() {
                self.close_transport().await;
                return DisconnectReason::TornDown;
            }

            let subscribe = ClientMessage::Subscribe(self.subject.as_str().to_string());
            if let Err(e) = self.send_bounded(&subscribe, connect_timeout).await {
                warn!(error = %e, "Subscribe request failed");
                self.emit(events::DISCONNECTED, json!({ "error": e.to_string() })).await;
                self.close_transport().await;
                reconnecting = true;
                if self.sleep_or_cancelled(self.config.reconnect.delay_for(0)).await {
                    return DisconnectReason::TornDown;
                }
                continue;
            }

            info!("Subscribed to bridge status");
            self.set_state(SessionState::Subscribed);
            self.emit(events::SUBSCRIBED, json!({})).await;

            let lost = loop {
                let inbound = tokio::select! {
                    biased;
                    () = cancel.cancelled() => Inbound::Cancelled,
                    frame = self.transport.recv() => Inbound::Frame(frame),
                };

                match inbound {
                    Inbound::Cancelled => {
                        self.unsubscribe_and_close().await;
                        return DisconnectReason::TornDown;
                    }
                    Inbound::Frame(Ok(frame)) => self.handle_frame(&frame).await,
                    Inbound::Frame(Err(e)) => break e,
                }
            };

            warn!(error = %lost, "Connection lost");
            self.emit(events::DISCONNECTED, json!({ "error": lost.to_string() })).await;
            self.close_transport().await;
            reconnecting = true;
            if self.sleep_or_cancelled(self.config.reconnect.delay_for(0)).await {
                return DisconnectReason::TornDown;
            }
        }
    }

    /// Decodes one frame and routes it. Nothing here ends the session.
    async fn handle_frame(&mut self, frame: &str) {
        let event = match decode_event(frame) {
            Ok(event) => event,
            Err(DecodeError::UnknownEvent(name)) => {
                debug!(event = %name, "Ignoring unconsumed event");
                return;
            }
            Err(e) if e.token_address().is_some_and(|a| !self.subject.matches(a)) => {
                debug!(error = %e, "Dropping malformed payload for foreign address");
                return;
            }
            Err(e) => {
                warn!(error = %e, "Rejected malformed payload, keeping previous state");
                self.emit(events::SNAPSHOT_REJECTED, json!({ "error": e.to_string() }))
                    .await;
                return;
            }
        };

        let outcome = match event {
            ServerEvent::Status(update) => {
                self.machine
                    .apply(&update.token_address, update.status)
                    .await
            }
            ServerEvent::Gas(update) => self.gas.apply(&update.token_address, update.gas),
        };

        if outcome == ApplyOutcome::Completed {
            self.emit(events::PIPELINE_COMPLETED, json!({})).await;
        }
        if outcome.is_applied() {
            self.publish_view();
        }
    }

    fn publish_view(&self) {
        self.view_tx.send_replace(BridgeView {
            bridge_state: self.machine.current(),
            gas_status: self.gas.current(),
            updated_at: Some(Utc::now()),
        });
    }

    fn set_state(&self, state: SessionState) {
        self.state_tx.send_replace(state);
    }

    /// Best effort: no acknowledgment is awaited and each step is bounded.
    async fn unsubscribe_and_close(&mut self) {
        let unsubscribe = ClientMessage::Unsubscribe(self.subject.as_str().to_string());
        if let Err(e) = self
            .send_bounded(&unsubscribe, self.config.teardown_timeout())
            .await
        {
            warn!(error = %e, "Unsubscribe request failed");
        }
        self.close_transport().await;
    }

    async fn send_bounded(
        &mut self,
        message: &ClientMessage,
        limit: Duration,
    ) -> Result<(), TransportError> {
        tokio::time::timeout(limit, self.transport.send(message))
            .await
            .unwrap_or_else(|_| Err(timeout_error(limit)))
    }

    async fn close_transport(&mut self) {
        let limit = self.config.teardown_timeout();
        if tokio::time::timeout(limit, self.transport.close()).await.is_err() {
            warn!(timeout_ms = millis(limit), "Transport close timed out");
        }
    }

    /// Sleeps for `delay`; returns true if teardown was requested meanwhile.
    async fn sleep_or_cancelled(&mut self, delay: Duration) -> bool {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => true,
            () = tokio::time::sleep(delay) => false,
        }
    }

    async fn emit(&mut self, event_type: &str, mut data: serde_json::Value) {
        if let Some(map) = data.as_object_mut() {
            map.insert("token_address".to_string(), json!(self.subject.as_str()));
        }
        self.sink.emit(event_type, Some(data)).await;
    }
}

fn millis(limit: Duration) -> u64 {
    u64::try_from(limit.as_millis()).unwrap_or(u64::MAX)
}

fn timeout_error(limit: Duration) -> TransportError {
    TransportError::Timeout(millis(limit))
}
