//! Cloud port: request/response operations against the heater cloud.

use std::fmt;
use std::future::Future;
use std::str::FromStr;

use millbridge_domain::credentials::TokenGrant;
use millbridge_domain::device::Device;
use millbridge_domain::error::{BridgeError, ValidationError};
use millbridge_domain::id::{DeviceId, HomeId, RoomId};
use millbridge_domain::topology::{Home, Room};

/// Operating mode accepted by `set_mode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThermostatMode {
    /// Heater switched off.
    Off,
    /// Heater regulating towards its target.
    Heat,
}

impl ThermostatMode {
    /// Bus representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Heat => "heat",
        }
    }
}

impl fmt::Display for ThermostatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThermostatMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "off" => Ok(Self::Off),
            "heat" => Ok(Self::Heat),
            other => Err(ValidationError::UnsupportedMode(other.to_string())),
        }
    }
}

/// Stateless operations against the heater cloud.
///
/// Every operation is a single request/response exchange. Implementations
/// must not retry; the caller decides what to do on failure.
pub trait CloudApi {
    /// Obtain an authorization code for an access key and secret token.
    fn request_authorization_code(
        &self,
        access_key: &str,
        secret_token: &str,
    ) -> impl Future<Output = Result<String, BridgeError>> + Send;

    /// Exchange an authorization code and account credentials for tokens.
    fn exchange_token(
        &self,
        authorization_code: &str,
        username: &str,
        password: &str,
    ) -> impl Future<Output = Result<TokenGrant, BridgeError>> + Send;

    /// Obtain a fresh token pair from a refresh token.
    fn refresh_token(
        &self,
        refresh_token: &str,
    ) -> impl Future<Output = Result<TokenGrant, BridgeError>> + Send;

    /// List the homes of the account.
    fn list_homes(
        &self,
        access_token: &str,
    ) -> impl Future<Output = Result<Vec<Home>, BridgeError>> + Send;

    /// List the rooms of a home.
    fn list_rooms(
        &self,
        access_token: &str,
        home_id: HomeId,
    ) -> impl Future<Output = Result<Vec<Room>, BridgeError>> + Send;

    /// List the devices attached to a room.
    fn list_devices(
        &self,
        access_token: &str,
        room_id: RoomId,
    ) -> impl Future<Output = Result<Vec<Device>, BridgeError>> + Send;

    /// List the devices of a home that are not assigned to a room.
    fn list_independent_devices(
        &self,
        access_token: &str,
        home_id: HomeId,
    ) -> impl Future<Output = Result<Vec<Device>, BridgeError>> + Send;

    /// Change the target temperature of a device. `Ok` means the cloud
    /// accepted the change.
    fn set_temperature(
        &self,
        access_token: &str,
        device_id: DeviceId,
        target_temp: i64,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send;

    /// Change the operating mode of a device, keeping its current target.
    fn set_mode(
        &self,
        access_token: &str,
        device_id: DeviceId,
        current_setpoint: i64,
        mode: ThermostatMode,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send;
}

impl<T: CloudApi + Send + Sync> CloudApi for std::sync::Arc<T> {
    fn request_authorization_code(
        &self,
        access_key: &str,
        secret_token: &str,
    ) -> impl Future<Output = Result<String, BridgeError>> + Send {
        (**self).request_authorization_code(access_key, secret_token)
    }

    fn exchange_token(
        &self,
        authorization_code: &str,
        username: &str,
        password: &str,
    ) -> impl Future<Output = Result<TokenGrant, BridgeError>> + Send {
        (**self).exchange_token(authorization_code, username, password)
    }

    fn refresh_token(
        &self,
        refresh_token: &str,
    ) -> impl Future<Output = Result<TokenGrant, BridgeError>> + Send {
        (**self).refresh_token(refresh_token)
    }

    fn list_homes(
        &self,
        access_token: &str,
    ) -> impl Future<Output = Result<Vec<Home>, BridgeError>> + Send {
        (**self).list_homes(access_token)
    }

    fn list_rooms(
        &self,
        access_token: &str,
        home_id: HomeId,
    ) -> impl Future<Output = Result<Vec<Room>, BridgeError>> + Send {
        (**self).list_rooms(access_token, home_id)
    }

    fn list_devices(
        &self,
        access_token: &str,
        room_id: RoomId,
    ) -> impl Future<Output = Result<Vec<Device>, BridgeError>> + Send {
        (**self).list_devices(access_token, room_id)
    }

    fn list_independent_devices(
        &self,
        access_token: &str,
        home_id: HomeId,
    ) -> impl Future<Output = Result<Vec<Device>, BridgeError>> + Send {
        (**self).list_independent_devices(access_token, home_id)
    }

    fn set_temperature(
        &self,
        access_token: &str,
        device_id: DeviceId,
        target_temp: i64,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send {
        (**self).set_temperature(access_token, device_id, target_temp)
    }

    fn set_mode(
        &self,
        access_token: &str,
        device_id: DeviceId,
        current_setpoint: i64,
        mode: ThermostatMode,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send {
        (**self).set_mode(access_token, device_id, current_setpoint, mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_parse_supported_modes() {
        assert_eq!("heat".parse::<ThermostatMode>().unwrap(), ThermostatMode::Heat);
        assert_eq!("off".parse::<ThermostatMode>().unwrap(), ThermostatMode::Off);
    }

    #[test]
    fn should_reject_unsupported_mode() {
        let err = "cool".parse::<ThermostatMode>().unwrap_err();
        assert!(matches!(err, ValidationError::UnsupportedMode(mode) if mode == "cool"));
    }
}
