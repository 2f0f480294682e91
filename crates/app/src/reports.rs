//! Outbound bus messages emitted by the router and the poll cycle.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Value, json};

use millbridge_domain::address::{Address, RESOURCE_NAME};
use millbridge_domain::device::Device;
use millbridge_domain::id::DeviceId;
use millbridge_domain::inclusion::{SENSOR_TEMP, THERMOSTAT, ThingInclusionReport};
use millbridge_domain::lifecycle::{AppLifecycle, AuthStatus};
use millbridge_domain::message::{BusMessage, Props, ValueType};
use millbridge_domain::settings::AdapterSettings;

/// A message and the topic it goes to.
#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    /// Destination topic.
    pub topic: String,
    /// Message to publish.
    pub message: BusMessage,
}

impl Outbound {
    fn to_device(service: &str, device_id: DeviceId, message: BusMessage) -> Self {
        Self {
            topic: Address::device_event(service, device_id).to_string(),
            message,
        }
    }

    fn to_adapter(message: BusMessage) -> Self {
        Self {
            topic: Address::adapter_event().to_string(),
            message,
        }
    }

    /// Send `message` as the answer to `request`: to its `resp_to` topic
    /// when set, to the adapter event topic otherwise.
    #[must_use]
    pub fn reply(request: &BusMessage, message: BusMessage) -> Self {
        let message = message.correlated_to(request);
        match request.resp_to.as_deref().filter(|topic| !topic.is_empty()) {
            Some(topic) => Self {
                topic: topic.to_string(),
                message,
            },
            None => Self::to_adapter(message),
        }
    }

    /// Mark this message as triggered by `request`.
    #[must_use]
    pub fn correlated_to(mut self, request: &BusMessage) -> Self {
        self.message = self.message.correlated_to(request);
        self
    }
}

fn to_value<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|err| {
        tracing::error!(error = %err, "failed to encode report payload");
        Value::Null
    })
}

/// `evt.setpoint.report` with the device's target temperature.
#[must_use]
pub fn setpoint_report(device_id: DeviceId, target_temp: i64) -> Outbound {
    let val = json!({ "type": "heat", "temp": target_temp.to_string(), "unit": "C" });
    Outbound::to_device(
        THERMOSTAT,
        device_id,
        BusMessage::new(THERMOSTAT, "evt.setpoint.report", ValueType::StrMap, val),
    )
}

/// `evt.setpoint.report` echoing the requested setpoint map.
#[must_use]
pub fn setpoint_echo(device_id: DeviceId, requested: &BTreeMap<String, String>) -> Outbound {
    Outbound::to_device(
        THERMOSTAT,
        device_id,
        BusMessage::new(
            THERMOSTAT,
            "evt.setpoint.report",
            ValueType::StrMap,
            to_value(requested),
        ),
    )
}

/// `evt.mode.report`.
#[must_use]
pub fn mode_report(device_id: DeviceId, mode: &str) -> Outbound {
    Outbound::to_device(
        THERMOSTAT,
        device_id,
        BusMessage::new(THERMOSTAT, "evt.mode.report", ValueType::String, json!(mode)),
    )
}

/// `evt.sensor.report` with the measured temperature.
#[must_use]
pub fn sensor_report(device_id: DeviceId, current_temp: f64) -> Outbound {
    let props = Props::from([("unit".to_string(), "C".to_string())]);
    Outbound::to_device(
        SENSOR_TEMP,
        device_id,
        BusMessage::new(SENSOR_TEMP, "evt.sensor.report", ValueType::Float, json!(current_temp))
            .with_props(props),
    )
}

/// `evt.thing.inclusion_report`.
#[must_use]
pub fn inclusion_report(report: &ThingInclusionReport) -> Outbound {
    Outbound::to_adapter(BusMessage::new(
        RESOURCE_NAME,
        "evt.thing.inclusion_report",
        ValueType::Object,
        to_value(report),
    ))
}

/// `evt.thing.exclusion_report` for one thing address.
#[must_use]
pub fn exclusion_report(address: &str) -> Outbound {
    Outbound::to_adapter(BusMessage::new(
        RESOURCE_NAME,
        "evt.thing.exclusion_report",
        ValueType::Object,
        json!({ "address": address }),
    ))
}

/// `evt.auth.status_report`.
#[must_use]
pub fn auth_status(status: &AuthStatus) -> BusMessage {
    BusMessage::new(
        RESOURCE_NAME,
        "evt.auth.status_report",
        ValueType::Object,
        to_value(status),
    )
}

/// `evt.network.get_all_nodes_report` listing every device.
#[must_use]
pub fn all_nodes<'a>(devices: impl Iterator<Item = &'a Device>) -> BusMessage {
    let devices: Vec<&Device> = devices.collect();
    BusMessage::new(
        RESOURCE_NAME,
        "evt.network.get_all_nodes_report",
        ValueType::Object,
        to_value(&devices),
    )
}

/// `evt.app.manifest_report` carrying the manifest document.
#[must_use]
pub fn manifest_report(manifest: Value) -> BusMessage {
    BusMessage::new(
        RESOURCE_NAME,
        "evt.app.manifest_report",
        ValueType::Object,
        manifest,
    )
}

/// `evt.app.manifest_report` carrying the lifecycle states.
#[must_use]
pub fn state_report(lifecycle: &AppLifecycle) -> BusMessage {
    manifest_report(to_value(lifecycle))
}

/// `evt.config.extended_report` with secrets blanked.
#[must_use]
pub fn extended_report(settings: &AdapterSettings) -> BusMessage {
    BusMessage::new(
        RESOURCE_NAME,
        "evt.config.extended_report",
        ValueType::Object,
        to_value(&settings.redacted()),
    )
}

#[derive(Serialize)]
struct ConfigReport<'a> {
    op_status: &'a str,
    app_state: &'a AppLifecycle,
}

/// `evt.app.config_report`.
#[must_use]
pub fn config_report(lifecycle: &AppLifecycle) -> BusMessage {
    BusMessage::new(
        RESOURCE_NAME,
        "evt.app.config_report",
        ValueType::Object,
        to_value(&ConfigReport {
            op_status: "ok",
            app_state: lifecycle,
        }),
    )
}

#[derive(Serialize)]
struct ActionReport<'a> {
    operation: &'a str,
    operation_status: &'a str,
    next: &'a str,
    error_code: &'a str,
    error_text: &'a str,
}

/// `evt.app.config_action_report` for a successful button action.
#[must_use]
pub fn action_report(operation: &str) -> BusMessage {
    BusMessage::new(
        RESOURCE_NAME,
        "evt.app.config_action_report",
        ValueType::Object,
        to_value(&ActionReport {
            operation,
            operation_status: "ok",
            next: "config",
            error_code: "",
            error_text: "",
        }),
    )
}
