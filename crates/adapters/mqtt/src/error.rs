//! MQTT adapter error types.

use millbridge_domain::error::{BridgeError, ValidationError};

/// Errors specific to the MQTT adapter.
#[derive(Debug, thiserror::Error)]
pub enum MqttError {
    /// The rumqttc client returned an error.
    #[error("MQTT client error")]
    Client(#[from] rumqttc::ClientError),

    /// Failed to parse an incoming MQTT payload as JSON.
    #[error("failed to parse MQTT payload")]
    PayloadParse(#[source] serde_json::Error),

    /// Failed to encode an outgoing message.
    #[error("failed to encode MQTT payload")]
    PayloadEncode(#[source] serde_json::Error),

    /// The topic of an incoming publish is not a bus address.
    #[error("unexpected topic {topic}")]
    Topic {
        /// Raw topic.
        topic: String,
        /// Parse failure.
        #[source]
        source: ValidationError,
    },

    /// A domain-level error.
    #[error("domain error")]
    Domain(#[source] BridgeError),
}

impl MqttError {
    /// Convert into a [`BridgeError::Bus`] for propagation across port
    /// boundaries.
    pub fn into_domain(self) -> BridgeError {
        match self {
            Self::Domain(err) => err,
            other => BridgeError::Bus(Box::new(other)),
        }
    }
}

impl From<MqttError> for BridgeError {
    fn from(err: MqttError) -> Self {
        err.into_domain()
    }
}
