//! In-process message bus backed by a tokio broadcast channel.

use std::future::Future;

use tokio::sync::broadcast;

use millbridge_domain::error::BridgeError;
use millbridge_domain::message::BusMessage;

use crate::ports::BusPublisher;

/// A published message and its topic.
pub type Published = (String, BusMessage);

/// In-process bus using a tokio [`broadcast`] channel.
///
/// Publishing succeeds even when there are no active subscribers
/// (the message is simply dropped).
pub struct InProcessBus {
    sender: broadcast::Sender<Published>,
}

impl InProcessBus {
    /// Create a new bus with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to messages on this bus.
    ///
    /// Returns a receiver that will get all messages published *after*
    /// the subscription is created.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Published> {
        self.sender.subscribe()
    }
}

impl BusPublisher for InProcessBus {
    fn publish(
        &self,
        topic: String,
        message: BusMessage,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send {
        // send only fails without receivers
        let _ = self.sender.send((topic, message));
        async { Ok(()) }
    }
}
