//! Inclusion reports: the bus description of one heater and its services.
//!
//! Every heater is announced with a `thermostat` service and a
//! `sensor_temp` service, both addressed by the vendor device id.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::address::{Address, RESOURCE_NAME};
use crate::error::NotFoundError;
use crate::message::ValueType;
use crate::registry::DeviceRegistry;

/// Name of the thermostat service.
pub const THERMOSTAT: &str = "thermostat";

/// Name of the temperature sensor service.
pub const SENSOR_TEMP: &str = "sensor_temp";

const CHANNEL_GROUP: &str = "ch_0";

/// Direction of an interface, seen from the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Commands accepted by the device.
    In,
    /// Events emitted by the device.
    Out,
}

/// One message type a service accepts or emits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interface {
    /// Direction.
    #[serde(rename = "intf_t")]
    pub direction: Direction,
    /// Message type.
    #[serde(rename = "msg_t")]
    pub msg_type: String,
    /// Payload type.
    pub val_t: ValueType,
    /// Interface version.
    pub ver: String,
}

impl Interface {
    fn new(direction: Direction, msg_type: &str, val_t: ValueType) -> Self {
        Self {
            direction,
            msg_type: msg_type.to_string(),
            val_t,
            ver: "1".to_string(),
        }
    }
}

/// One service of an included device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    /// Service name.
    pub name: String,
    /// Human readable name.
    pub alias: String,
    /// Full service address.
    pub address: String,
    /// Whether the service is active.
    pub enabled: bool,
    /// Channel groups.
    pub groups: Vec<String>,
    /// Capability metadata.
    pub props: BTreeMap<String, Value>,
    /// Accepted and emitted message types.
    pub interfaces: Vec<Interface>,
}

/// Bus document announcing one device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThingInclusionReport {
    /// Thing address, the vendor device id.
    pub address: String,
    /// Product fingerprint.
    pub product_hash: String,
    /// Communication technology.
    pub comm_tech: String,
    /// Product name, the device name.
    pub product_name: String,
    /// Manufacturer.
    pub manufacturer_id: String,
    /// Vendor device id.
    pub device_id: String,
    /// Hardware version.
    pub hw_ver: String,
    /// Software version.
    pub sw_ver: String,
    /// Power source.
    pub power_source: String,
    /// Wake-up interval, `-1` for always-on devices.
    pub wakeup_interval: String,
    /// Channel groups.
    pub groups: Vec<String>,
    /// Services exposed by the thing.
    pub services: Vec<Service>,
}

/// Build the inclusion report of the registry entry at `index`.
///
/// # Errors
///
/// Returns [`NotFoundError`] when `index` is out of range.
pub fn build_inclusion_report(
    index: usize,
    registry: &DeviceRegistry,
) -> Result<ThingInclusionReport, NotFoundError> {
    let entry = registry.get(index).ok_or_else(|| NotFoundError {
        entity: "Device",
        id: format!("#{index}"),
    })?;
    let device = &entry.device;
    let id = device.device_id;

    let thermostat = Service {
        name: THERMOSTAT.to_string(),
        alias: THERMOSTAT.to_string(),
        address: Address::service_path(THERMOSTAT, id),
        enabled: true,
        groups: vec![CHANNEL_GROUP.to_string()],
        props: BTreeMap::from([
            ("sup_modes".to_string(), json!(["off", "heat"])),
            ("sup_setpoints".to_string(), json!(["heat"])),
        ]),
        interfaces: vec![
            Interface::new(Direction::In, "cmd.setpoint.set", ValueType::StrMap),
            Interface::new(Direction::Out, "evt.setpoint.report", ValueType::StrMap),
            Interface::new(Direction::In, "cmd.setpoint.get_report", ValueType::String),
            Interface::new(Direction::In, "cmd.mode.set", ValueType::String),
            Interface::new(Direction::In, "cmd.mode.get_report", ValueType::Null),
            Interface::new(Direction::Out, "evt.mode.report", ValueType::String),
        ],
    };

    let sensor = Service {
        name: SENSOR_TEMP.to_string(),
        alias: "Temperature sensor".to_string(),
        address: Address::service_path(SENSOR_TEMP, id),
        enabled: true,
        groups: vec![CHANNEL_GROUP.to_string()],
        props: BTreeMap::from([("sup_units".to_string(), json!(["C"]))]),
        interfaces: vec![
            Interface::new(Direction::In, "cmd.sensor.get_report", ValueType::Null),
            Interface::new(Direction::Out, "evt.sensor.report", ValueType::Float),
        ],
    };

    Ok(ThingInclusionReport {
        address: id.to_string(),
        product_hash: RESOURCE_NAME.to_string(),
        comm_tech: "wifi".to_string(),
        product_name: device.name.clone(),
        manufacturer_id: RESOURCE_NAME.to_string(),
        device_id: id.to_string(),
        hw_ver: "1".to_string(),
        sw_ver: "1".to_string(),
        power_source: "ac".to_string(),
        wakeup_interval: "-1".to_string(),
        groups: vec![CHANNEL_GROUP.to_string()],
        services: vec![thermostat, sensor],
    })
}
