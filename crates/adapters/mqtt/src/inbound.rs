//! Inbound side: drive the rumqttc event loop and queue commands.

use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, Packet, QoS};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use millbridge_app::worker::Job;
use millbridge_domain::address::Address;
use millbridge_domain::message::{BusMessage, Envelope};

use crate::error::MqttError;

const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// Decode one publish into an [`Envelope`].
///
/// # Errors
///
/// Returns [`MqttError::Topic`] when `topic` is not a bus address and
/// [`MqttError::PayloadParse`] when `payload` is not a bus message.
pub fn decode(topic: &str, payload: &[u8]) -> Result<Envelope, MqttError> {
    let address: Address = topic.parse().map_err(|source| MqttError::Topic {
        topic: topic.to_string(),
        source,
    })?;
    let message: BusMessage = serde_json::from_slice(payload).map_err(MqttError::PayloadParse)?;
    Ok(Envelope { address, message })
}

/// Owns the rumqttc event loop.
pub struct MqttInbound {
    client: AsyncClient,
    eventloop: EventLoop,
}

impl MqttInbound {
    pub(crate) fn new(client: AsyncClient, eventloop: EventLoop) -> Self {
        Self { client, eventloop }
    }

    /// Spawn the event loop. Decoded commands are sent to `jobs`; the task
    /// ends when the worker queue is closed.
    pub fn start(self, jobs: mpsc::Sender<Job>) -> JoinHandle<()> {
        tokio::spawn(self.run(jobs))
    }

    async fn run(mut self, jobs: mpsc::Sender<Job>) {
        loop {
            match self.eventloop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    // subscriptions do not survive a reconnect
                    Self::subscribe(&self.client).await;
                }
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    let topic = String::from_utf8_lossy(publish.topic.as_ref()).into_owned();
                    let envelope = match decode(&topic, &publish.payload) {
                        Ok(envelope) => envelope,
                        Err(err) => {
                            tracing::warn!(%topic, error = %err, "dropping inbound message");
                            continue;
                        }
                    };
                    tracing::debug!(
                        %topic,
                        msg_type = %envelope.message.msg_type,
                        "inbound message"
                    );
                    if jobs.send(Job::Inbound(envelope)).await.is_err() {
                        tracing::info!("worker queue closed, stopping mqtt loop");
                        return;
                    }
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::error!(error = %err, "mqtt connection error");
                    if jobs.is_closed() {
                        return;
                    }
                    tokio::time::sleep(RECONNECT_DELAY).await;
                }
            }
        }
    }

    async fn subscribe(client: &AsyncClient) {
        for topic in Address::subscriptions() {
            match client.subscribe(topic.as_str(), QoS::AtLeastOnce).await {
                Ok(()) => tracing::info!(%topic, "subscribed"),
                Err(err) => tracing::error!(%topic, error = %err, "failed to subscribe"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use millbridge_domain::error::ValidationError;
    use millbridge_domain::id::DeviceId;

    #[test]
    fn should_decode_device_command() {
        let payload = br#"{
            "serv": "thermostat",
            "type": "cmd.setpoint.set",
            "val_t": "str_map",
            "val": { "type": "heat", "temp": "21", "unit": "C" },
            "props": null,
            "tags": null,
            "uid": "6f1b0c44"
        }"#;

        let topic = "pt:j1/mt:cmd/rt:dev/rn:mill/ad:1/sv:thermostat/ad:42";
        let envelope = decode(topic, payload).unwrap();

        assert_eq!(envelope.address.device_id().unwrap(), DeviceId::new(42));
        assert_eq!(envelope.message.msg_type, "cmd.setpoint.set");
        assert_eq!(envelope.message.uid, "6f1b0c44");
    }

    #[test]
    fn should_reject_foreign_topic() {
        let result = decode("homeassistant/status", b"{}");
        assert!(matches!(
            result,
            Err(MqttError::Topic {
                source: ValidationError::InvalidAddress(_),
                ..
            })
        ));
    }

    #[test]
    fn should_reject_malformed_payload() {
        let result = decode("pt:j1/mt:cmd/rt:ad/rn:mill/ad:1", b"not json");
        assert!(matches!(result, Err(MqttError::PayloadParse(_))));
    }
}
