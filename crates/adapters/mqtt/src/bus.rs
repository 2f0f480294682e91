//! Outbound side: the [`BusPublisher`] implementation.

use std::future::Future;

use rumqttc::{AsyncClient, QoS};

use millbridge_app::ports::BusPublisher;
use millbridge_domain::error::BridgeError;
use millbridge_domain::message::BusMessage;

use crate::config::MqttConfig;
use crate::error::MqttError;
use crate::inbound::MqttInbound;

/// Create the client for `config`.
///
/// Nothing is sent until the returned [`MqttInbound`] is started: rumqttc
/// only makes progress while its event loop is polled.
#[must_use]
pub fn connect(config: &MqttConfig) -> (MqttBus, MqttInbound) {
    let (client, eventloop) = AsyncClient::new(config.options(), config.channel_capacity);
    tracing::info!(
        broker_host = %config.broker_host,
        broker_port = config.broker_port,
        client_id = %config.client_id,
        "mqtt client created"
    );
    (
        MqttBus {
            client: client.clone(),
        },
        MqttInbound::new(client, eventloop),
    )
}

/// Publishes bus messages as JSON.
#[derive(Clone)]
pub struct MqttBus {
    client: AsyncClient,
}

/// Encode `message` as the JSON payload put on the wire.
///
/// # Errors
///
/// Returns [`MqttError::PayloadEncode`] when serialization fails.
pub fn encode(message: &BusMessage) -> Result<Vec<u8>, MqttError> {
    serde_json::to_vec(message).map_err(MqttError::PayloadEncode)
}

impl BusPublisher for MqttBus {
    fn publish(
        &self,
        topic: String,
        message: BusMessage,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send {
        let client = self.client.clone();
        async move {
            let payload = encode(&message)?;
            client
                .publish(topic.as_str(), QoS::AtLeastOnce, false, payload)
                .await
                .map_err(MqttError::from)?;
            tracing::debug!(%topic, msg_type = %message.msg_type, "published");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use millbridge_domain::message::ValueType;
    use serde_json::{Value, json};

    #[test]
    fn should_encode_message_with_wire_field_names() {
        let message =
            BusMessage::new("sensor_temp", "evt.sensor.report", ValueType::Float, json!(21.5));

        let payload = encode(&message).unwrap();
        let value: Value = serde_json::from_slice(&payload).unwrap();

        assert_eq!(value["serv"], "sensor_temp");
        assert_eq!(value["type"], "evt.sensor.report");
        assert_eq!(value["val_t"], "float");
        assert_eq!(value["val"], 21.5);
    }
}
