//! Scripted in-memory transport.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::errors::TransportError;
use crate::protocol::{ClientMessage, ServerEvent};
use crate::transport::Transport;

/// How a scripted `connect` call behaves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectBehavior {
    /// Connect succeeds.
    Succeed,
    /// Connect fails with the given message.
    Fail(String),
    /// Connect never resolves.
    Hang,
}

impl ConnectBehavior {
    /// Shorthand for a failure.
    #[must_use]
    pub fn fail(message: impl Into<String>) -> Self {
        Self::Fail(message.into())
    }
}

/// A call recorded by [`MockTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCall {
    /// `connect` was invoked.
    Connect,
    /// A message was sent.
    Send(ClientMessage),
    /// `close` was invoked.
    Close,
}

#[derive(Debug)]
enum InboundItem {
    Frame(String),
    Drop(String),
}

#[derive(Debug)]
struct Shared {
    script: Mutex<VecDeque<ConnectBehavior>>,
    fallback: Mutex<ConnectBehavior>,
    calls: Mutex<Vec<TransportCall>>,
    fail_sends: Mutex<Option<String>>,
    inbound_tx: mpsc::UnboundedSender<InboundItem>,
}

/// Transport whose behavior is scripted through a [`MockTransportController`].
#[derive(Debug)]
pub struct MockTransport {
    shared: Arc<Shared>,
    inbound_rx: mpsc::UnboundedReceiver<InboundItem>,
}

/// Test-side control of a [`MockTransport`] after it moved into a session.
#[derive(Debug, Clone)]
pub struct MockTransportController {
    shared: Arc<Shared>,
}

impl MockTransport {
    /// Creates a transport whose connects succeed unless scripted otherwise.
    #[must_use]
    pub fn new() -> (Self, MockTransportController) {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared {
            script: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(ConnectBehavior::Succeed),
            calls: Mutex::new(Vec::new()),
            fail_sends: Mutex::new(None),
            inbound_tx,
        });
        (
            Self {
                shared: shared.clone(),
                inbound_rx,
            },
            MockTransportController { shared },
        )
    }
}

impl MockTransportController {
    /// Queues behaviors for the next `connect` calls, in order.
    pub fn script_connects(&self, behaviors: impl IntoIterator<Item = ConnectBehavior>) {
        self.shared.script.lock().extend(behaviors);
    }

    /// Sets the behavior once the script is exhausted.
    pub fn set_fallback(&self, behavior: ConnectBehavior) {
        *self.shared.fallback.lock() = behavior;
    }

    /// Makes every following `send` fail, or succeed again with `None`.
    pub fn fail_sends(&self, error: Option<&str>) {
        *self.shared.fail_sends.lock() = error.map(ToString::to_string);
    }

    /// Delivers a raw frame.
    pub fn push_frame(&self, frame: impl Into<String>) {
        let _ = self.shared.inbound_tx.send(InboundItem::Frame(frame.into()));
    }

    /// Delivers an encoded server event.
    pub fn push_event(&self, event: &ServerEvent) {
        if let Ok(frame) = event.encode() {
            self.push_frame(frame);
        }
    }

    /// Makes the next `recv` report a lost connection.
    pub fn drop_connection(&self, reason: impl Into<String>) {
        let _ = self.shared.inbound_tx.send(InboundItem::Drop(reason.into()));
    }

    /// All recorded calls, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<TransportCall> {
        self.shared.calls.lock().clone()
    }

    /// Number of `connect` calls so far.
    #[must_use]
    pub fn connect_attempts(&self) -> usize {
        self.shared
            .calls
            .lock()
            .iter()
            .filter(|c| matches!(c, TransportCall::Connect))
            .count()
    }

    /// Messages sent so far.
    #[must_use]
    pub fn sent(&self) -> Vec<ClientMessage> {
        self.shared
            .calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                TransportCall::Send(message) => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    /// Returns true once `close` has been called at least once.
    #[must_use]
    pub fn was_closed(&self) -> bool {
        self.shared.calls.lock().contains(&TransportCall::Close)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn connect(&mut self) -> Result<(), TransportError> {
        self.shared.calls.lock().push(TransportCall::Connect);
        let behavior = {
            let next = self.shared.script.lock().pop_front();
            next.unwrap_or_else(|| self.shared.fallback.lock().clone())
        };
        match behavior {
            ConnectBehavior::Succeed => Ok(()),
            ConnectBehavior::Fail(message) => Err(TransportError::Connect(message)),
            ConnectBehavior::Hang => std::future::pending().await,
        }
    }

    async fn send(&mut self, message: &ClientMessage) -> Result<(), TransportError> {
        if let Some(error) = self.shared.fail_sends.lock().clone() {
            return Err(TransportError::Send(error));
        }
        self.shared
            .calls
            .lock()
            .push(TransportCall::Send(message.clone()));
        Ok(())
    }

    async fn recv(&mut self) -> Result<String, TransportError> {
        match self.inbound_rx.recv().await {
            Some(InboundItem::Frame(frame)) => Ok(frame),
            Some(InboundItem::Drop(reason)) => Err(TransportError::Disconnected(reason)),
            None => Err(TransportError::Disconnected("channel closed".to_string())),
        }
    }

    async fn close(&mut self) {
        self.shared.calls.lock().push(TransportCall::Close);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_connects_then_fallback() {
        let (mut transport, control) = MockTransport::new();
        control.script_connects([ConnectBehavior::fail("refused"), ConnectBehavior::Succeed]);
        control.set_fallback(ConnectBehavior::fail("down"));

        assert_eq!(
            transport.connect().await,
            Err(TransportError::Connect("refused".to_string()))
        );
        assert_eq!(transport.connect().await, Ok(()));
        assert_eq!(
            transport.connect().await,
            Err(TransportError::Connect("down".to_string()))
        );
        assert_eq!(control.connect_attempts(), 3);
    }

    #[tokio::test]
    async fn test_frames_and_drops_in_order() {
        let (mut transport, control) = MockTransport::new();
        control.push_frame("one");
        control.drop_connection("reset");

        assert_eq!(transport.recv().await, Ok("one".to_string()));
        assert!(matches!(
            transport.recv().await,
            Err(TransportError::Disconnected(_))
        ));
    }

    #[tokio::test]
    async fn test_records_sends_and_close() {
        let (mut transport, control) = MockTransport::new();
        let message = ClientMessage::Subscribe("0xabc".to_string());

        transport.send(&message).await.unwrap();
        control.fail_sends(Some("broken pipe"));
        assert!(transport.send(&message).await.is_err());
        transport.close().await;

        assert_eq!(
            control.calls(),
            vec![TransportCall::Send(message), TransportCall::Close]
        );
        assert!(control.was_closed());
    }
}
