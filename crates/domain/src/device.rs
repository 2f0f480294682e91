//! Device: a heater exposed by the cloud, either attached to a room or
//! independent.

use serde::{Deserialize, Serialize};

use crate::id::DeviceId;

/// A heater known to the cloud account.
///
/// `device_id` is the only durable key: it is stable across sync passes,
/// while the position of a device in the registry is not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    /// Vendor identifier.
    pub device_id: DeviceId,
    /// Display name.
    #[serde(rename = "deviceName", default)]
    pub name: String,
    /// Hardware address.
    #[serde(rename = "mac", default)]
    pub mac_address: String,
    /// Measured temperature in degrees Celsius.
    #[serde(default)]
    pub current_temp: f64,
    /// Current target temperature. Only independent devices carry a
    /// meaningful non-zero value.
    #[serde(rename = "holidayTemp", alias = "setpointTemp", default)]
    pub target_temp: i64,
    /// Whether the target can be changed remotely.
    #[serde(default)]
    pub can_change_temp: i64,
    /// Vendor control type.
    #[serde(default)]
    pub control_type: i64,
    /// Online status reported by the vendor.
    #[serde(default)]
    pub device_status: i64,
    /// Vendor product line.
    #[serde(default)]
    pub sub_domain_id: i64,
    /// Whether the heater element is on.
    #[serde(default)]
    pub heater_flag: i64,
    /// Upper bound for the target temperature.
    #[serde(default)]
    pub max_temperature: i64,
}

impl Device {
    /// Whether the device carries a target temperature worth reporting.
    #[must_use]
    pub fn has_target(&self) -> bool {
        self.target_temp != 0
    }
}
