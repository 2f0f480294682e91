//! Homes and rooms: the upper levels of the vendor account hierarchy.
//!
//! Both are replaced wholesale on every sync pass and never mutated
//! individually.

use serde::{Deserialize, Serialize};

use crate::id::{DeviceId, HomeId, RoomId};

/// Top-level grouping of rooms and devices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Home {
    /// Vendor identifier.
    pub home_id: HomeId,
    /// Display name.
    #[serde(rename = "homeName", default)]
    pub name: String,
    /// Active program mode.
    #[serde(default)]
    pub current_mode: i64,
    /// Temperature applied while the home is in holiday mode.
    #[serde(default)]
    pub holiday_temp: i64,
    /// Whether holiday mode is active.
    #[serde(default)]
    pub is_holiday: i64,
    /// IANA time zone name, when the vendor provides one.
    #[serde(default)]
    pub time_zone: String,
    /// Start of the current mode, epoch milliseconds.
    #[serde(default)]
    pub mode_start_time: i64,
    /// Identifier of the weekly program.
    #[serde(default)]
    pub program_id: i64,
}

/// Mid-level grouping of devices within a home.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    /// Vendor identifier.
    pub room_id: RoomId,
    /// Display name.
    #[serde(rename = "roomName", default)]
    pub name: String,
    /// Comfort program temperature.
    #[serde(default)]
    pub comfort_temp: i64,
    /// Away program temperature.
    #[serde(default)]
    pub away_temp: i64,
    /// Sleep program temperature.
    #[serde(default)]
    pub sleep_temp: i64,
    /// Average measured temperature in the room.
    #[serde(default)]
    pub avg_temp: f64,
    /// Active program mode.
    #[serde(default)]
    pub current_mode: i64,
    /// Whether any heater in the room is heating.
    #[serde(default)]
    pub heat_status: i64,
    /// Devices that run their own program inside this room.
    #[serde(default, deserialize_with = "lenient_ids")]
    pub independent_device_ids: Vec<DeviceId>,
    /// Number of devices currently online.
    #[serde(default)]
    pub online_device_num: i64,
    /// Number of devices currently offline.
    #[serde(rename = "offLineDeviceNum", default)]
    pub offline_device_num: i64,
}

/// The vendor sends `independentDeviceIds` either as a list or as a
/// comma separated string, and sometimes as `null`.
fn lenient_ids<'de, D>(deserializer: D) -> Result<Vec<DeviceId>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        List(Vec<DeviceId>),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(Vec::new()),
        Some(Raw::List(ids)) => Ok(ids),
        Some(Raw::Text(text)) => text
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| part.parse().map_err(serde::de::Error::custom))
            .collect(),
    }
}
