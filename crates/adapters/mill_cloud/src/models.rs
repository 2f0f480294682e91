//! Wire types of the Mill open API.
//!
//! Every response is wrapped in the same envelope; the interesting part
//! lives under `data`.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use millbridge_domain::credentials::TokenGrant;
use millbridge_domain::device::Device;
use millbridge_domain::topology::{Home, Room};

use crate::error::CloudError;

/// Common response envelope.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MillResponse<T> {
    /// Vendor error code, `"0"` or empty on success.
    #[serde(default, deserialize_with = "lenient_code")]
    pub error_code: String,
    /// Human readable message.
    #[serde(default)]
    pub message: String,
    /// Success flag. Assumed when absent.
    #[serde(default = "assume_success")]
    pub success: bool,
    /// Payload.
    pub data: Option<T>,
}

impl<T> MillResponse<T> {
    /// Whether the envelope reports a failure.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        !self.success || !matches!(self.error_code.as_str(), "" | "0")
    }

    /// Unwrap the payload, or turn a failure into [`CloudError::Rejected`].
    pub fn into_data(self) -> Result<Option<T>, CloudError> {
        if self.is_failure() {
            return Err(CloudError::Rejected {
                error_code: self.error_code,
                message: self.message,
            });
        }
        Ok(self.data)
    }
}

fn assume_success() -> bool {
    true
}

// the vendor sends either a number or a string
fn lenient_code<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(code) => code,
        other => other.to_string(),
    })
}

/// Payload of `share/applyAuthCode`.
#[derive(Debug, Deserialize)]
pub struct AuthCodeData {
    /// Code to exchange for tokens.
    pub authorization_code: String,
}

/// Payload of `share/applyAccessToken` and `share/refreshtoken`.
#[derive(Debug, Deserialize)]
pub struct TokenData {
    /// Short lived bearer token.
    pub access_token: String,
    /// Long lived token.
    #[serde(default)]
    pub refresh_token: String,
    /// Access token expiry, epoch milliseconds.
    #[serde(rename = "expireTime", default)]
    pub expire_time: i64,
    /// Refresh token expiry, epoch milliseconds.
    #[serde(rename = "refresh_expireTime", default)]
    pub refresh_expire_time: i64,
}

impl From<TokenData> for TokenGrant {
    fn from(data: TokenData) -> Self {
        Self {
            access_token: data.access_token,
            refresh_token: data.refresh_token,
            access_expires_at: data.expire_time,
            refresh_expires_at: data.refresh_expire_time,
        }
    }
}

/// Payload of `uds/selectHomeList`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeList {
    /// Homes of the account.
    #[serde(default)]
    pub home_list: Vec<Home>,
}

/// Payload of `uds/selectRoombyHome`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomList {
    /// Rooms of the home.
    #[serde(default)]
    pub room_list: Vec<Room>,
}

/// Payload of `uds/selectDevicebyRoom` and `uds/getIndependentDevices`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceList {
    /// Devices found.
    #[serde(default)]
    pub device_list: Vec<Device>,
}
