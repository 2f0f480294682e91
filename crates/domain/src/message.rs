//! Bus messages: the JSON documents exchanged on the home-automation bus.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::address::Address;
use crate::error::ValidationError;
use crate::time::{Timestamp, now};

/// Type tag of the `val` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// A plain string.
    String,
    /// An integer.
    Int,
    /// A floating point number.
    Float,
    /// A boolean.
    Bool,
    /// A map of string to string.
    StrMap,
    /// A list of strings.
    StrArray,
    /// An arbitrary JSON object.
    Object,
    /// No value.
    Null,
}

/// Properties attached to a message, e.g. `unit = C`.
pub type Props = BTreeMap<String, String>;

/// One message on the bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusMessage {
    /// Service the message belongs to, e.g. `thermostat`.
    pub serv: String,
    /// Message type, e.g. `cmd.setpoint.set`.
    #[serde(rename = "type")]
    pub msg_type: String,
    /// Type of `val`.
    pub val_t: ValueType,
    /// Payload.
    #[serde(default)]
    pub val: Value,
    /// Optional properties.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub props: Option<Props>,
    /// Optional tags.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// Topic the reply should be sent to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resp_to: Option<String>,
    /// Sender.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    /// Format version.
    #[serde(default = "default_version")]
    pub ver: String,
    /// Unique message id.
    #[serde(default)]
    pub uid: String,
    /// Id of the request this message answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corid: Option<String>,
    /// Creation time.
    #[serde(default = "now")]
    pub ctime: Timestamp,
}

fn default_version() -> String {
    "1".to_string()
}

impl BusMessage {
    /// Build a new message with a fresh id.
    #[must_use]
    pub fn new(
        service: impl Into<String>,
        msg_type: impl Into<String>,
        val_t: ValueType,
        val: Value,
    ) -> Self {
        Self {
            serv: service.into(),
            msg_type: msg_type.into(),
            val_t,
            val,
            props: None,
            tags: None,
            resp_to: None,
            src: Some(crate::address::RESOURCE_NAME.to_string()),
            ver: default_version(),
            uid: Uuid::new_v4().to_string(),
            corid: None,
            ctime: now(),
        }
    }

    /// Attach properties.
    #[must_use]
    pub fn with_props(mut self, props: Props) -> Self {
        self.props = Some(props);
        self
    }

    /// Mark this message as the answer to `request`.
    #[must_use]
    pub fn correlated_to(mut self, request: &BusMessage) -> Self {
        if !request.uid.is_empty() {
            self.corid = Some(request.uid.clone());
        }
        self
    }

    /// Read the payload as a string.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MalformedPayload`] when `val` is not a string.
    pub fn string_value(&self) -> Result<&str, ValidationError> {
        self.val
            .as_str()
            .ok_or(ValidationError::MalformedPayload { expected: "string" })
    }

    /// Read the payload as a string map. Scalar values are converted to
    /// their textual form.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MalformedPayload`] when `val` is not an
    /// object of scalars.
    pub fn str_map_value(&self) -> Result<BTreeMap<String, String>, ValidationError> {
        let malformed = ValidationError::MalformedPayload { expected: "str_map" };
        let object = self.val.as_object().ok_or(malformed)?;
        object
            .iter()
            .map(|(key, value)| {
                let text = match value {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    _ => return Err(ValidationError::MalformedPayload { expected: "str_map" }),
                };
                Ok((key.clone(), text))
            })
            .collect()
    }

    /// Decode the payload into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MalformedPayload`] when `val` does not
    /// match `T`.
    pub fn object_value<T: DeserializeOwned>(&self) -> Result<T, ValidationError> {
        T::deserialize(&self.val)
            .map_err(|_| ValidationError::MalformedPayload { expected: "object" })
    }
}

/// An inbound message together with the topic it arrived on.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    /// Parsed topic.
    pub address: Address,
    /// Decoded message.
    pub message: BusMessage,
}
