use tokio::sync::mpsc;

use crate::error::GameError;
use super::messages::ClientMessage;

/// Outbound half of the connection to the relay server.
pub trait Transport: Send {
    fn send(&self, message: ClientMessage) -> Result<(), GameError>;

    /// Stops any background work. Later sends fail.
    fn close(&self) {}
}

/// Hands outgoing messages to an in-process channel.
pub struct ChannelTransport {
    sender: mpsc::UnboundedSender<ClientMessage>,
}

impl ChannelTransport {
    pub fn new(sender: mpsc::UnboundedSender<ClientMessage>) -> Self {
        Self { sender }
    }

    pub fn pair() -> (Self, mpsc::UnboundedReceiver<ClientMessage>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self::new(sender), receiver)
    }
}

impl Transport for ChannelTransport {
    fn send(&self, message: ClientMessage) -> Result<(), GameError> {
        self.sender
            .send(message)
            .map_err(|_| GameError::TransportUnavailable("outgoing channel closed".to_string()))
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&self, message: ClientMessage) -> Result<(), GameError> {
        (**self).send(message)
    }

    fn close(&self) {
        (**self).close()
    }
}
