//! Pub/sub transport abstraction.
//!
//! The transport carries JSON frames between the client and the status
//! server. Connection lifecycle maps onto the trait as follows:
//! - `connect` returning `Ok` is the "connected" event
//! - `connect` returning `Err` is a "connect error"
//! - `recv` returning `Err` is a transport-level disconnect

use async_trait::async_trait;

use crate::errors::TransportError;
use crate::protocol::ClientMessage;

/// A bidirectional connection to the status server.
///
/// A session owns its transport exclusively and drives it from a single task,
/// so implementations need not be reentrant. `connect` may be called again
/// after a disconnect; subscriptions are not assumed to survive it.
#[async_trait]
pub trait Transport: Send + 'static {
    /// Opens the connection.
    async fn connect(&mut self) -> Result<(), TransportError>;

    /// Sends one message.
    async fn send(&mut self, message: &ClientMessage) -> Result<(), TransportError>;

    /// Waits for the next inbound frame.
    ///
    /// Must be cancel-safe: dropping the future must not lose a frame.
    async fn recv(&mut self) -> Result<String, TransportError>;

    /// Closes the connection. Must be safe to call when not connected.
    async fn close(&mut self);
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Box<T> {
    async fn connect(&mut self) -> Result<(), TransportError> {
        (**self).connect().await
    }

    async fn send(&mut self, message: &ClientMessage) -> Result<(), TransportError> {
        (**self).send(message).await
    }

    async fn recv(&mut self) -> Result<String, TransportError> {
        (**self).recv().await
    }

    async fn close(&mut self) {
        (**self).close().await;
    }
}
