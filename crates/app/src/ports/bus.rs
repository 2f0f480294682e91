//! Bus port: publish messages on the home-automation bus.

use std::future::Future;

use millbridge_domain::error::BridgeError;
use millbridge_domain::message::BusMessage;

/// Publishes messages to a bus topic.
pub trait BusPublisher {
    /// Publish `message` on `topic`.
    fn publish(
        &self,
        topic: String,
        message: BusMessage,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send;
}

impl<T: BusPublisher + Send + Sync> BusPublisher for std::sync::Arc<T> {
    fn publish(
        &self,
        topic: String,
        message: BusMessage,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send {
        (**self).publish(topic, message)
    }
}
