//! HTTP client for the Mill open API.
//!
//! Every endpoint is a POST without a body. Credentials travel in headers,
//! identifiers and values in the query string. Responses share the
//! [`MillResponse`] envelope which is unwrapped before the caller sees it.

use std::future::Future;

use reqwest::StatusCode;
use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace};

use millbridge_app::ports::{CloudApi, ThermostatMode};
use millbridge_domain::credentials::TokenGrant;
use millbridge_domain::device::Device;
use millbridge_domain::error::BridgeError;
use millbridge_domain::id::{DeviceId, HomeId, RoomId};
use millbridge_domain::topology::{Home, Room};

use crate::config::MillCloudConfig;
use crate::error::CloudError;
use crate::models::{AuthCodeData, DeviceList, HomeList, MillResponse, RoomList, TokenData};

const AUTH_CODE: &str = "share/applyAuthCode";
const ACCESS_TOKEN: &str = "share/applyAccessToken";
const REFRESH_TOKEN: &str = "share/refreshtoken";
const HOME_LIST: &str = "uds/selectHomeList";
const ROOMS_BY_HOME: &str = "uds/selectRoombyHome";
const DEVICES_BY_ROOM: &str = "uds/selectDevicebyRoom";
const INDEPENDENT_DEVICES: &str = "uds/getIndependentDevices";
const DEVICE_CONTROL: &str = "uds/deviceControlForOpenApi";

/// `operation` value of a control request changing the power status.
const OPERATION_POWER: u8 = 0;
/// `operation` value of a control request changing the target temperature.
const OPERATION_TEMPERATURE: u8 = 1;

const BODY_PREVIEW: usize = 200;

/// Client for the Mill cloud. Holds no tokens; each call receives the one
/// it needs.
#[derive(Debug, Clone)]
pub struct MillClient {
    http: reqwest::Client,
    base_url: String,
}

impl MillClient {
    /// Build a client with its own connection pool and the configured
    /// timeout.
    pub fn new(config: &MillCloudConfig) -> Result<Self, CloudError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self::with_client(http, &config.base_url))
    }

    /// Wrap an existing [`reqwest::Client`].
    #[must_use]
    pub fn with_client(http: reqwest::Client, base_url: &str) -> Self {
        let mut base_url = base_url.to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self { http, base_url }
    }

    /// Root URL every path is appended to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        headers: &[(&str, &str)],
        query: &[(&str, String)],
    ) -> Result<MillResponse<T>, CloudError> {
        let url = format!("{}{path}", self.base_url);
        debug!(%url, "POST");

        let mut request = self.http.post(&url).header(ACCEPT, "*/*");
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        if !query.is_empty() {
            request = request.query(query);
        }
        let resp = request.send().await?;
        parse_envelope(resp).await
    }

    /// POST and unwrap the `data` field, which must be present.
    async fn fetch<T: DeserializeOwned>(
        &self,
        path: &str,
        headers: &[(&str, &str)],
        query: &[(&str, String)],
    ) -> Result<T, CloudError> {
        self.post(path, headers, query)
            .await?
            .into_data()?
            .ok_or_else(|| CloudError::Rejected {
                error_code: String::new(),
                message: format!("{path} returned no data"),
            })
    }

    /// POST an authentication request. Any rejection is a credentials
    /// problem.
    async fn authenticate<T: DeserializeOwned>(
        &self,
        path: &str,
        headers: &[(&str, &str)],
        query: &[(&str, String)],
    ) -> Result<T, CloudError> {
        self.fetch(path, headers, query)
            .await
            .map_err(|err| match err {
                CloudError::Rejected { message, .. } => CloudError::AuthRejected { message },
                other => other,
            })
    }

    async fn control(
        &self,
        access_token: &str,
        device_id: DeviceId,
        hold_temp: i64,
        operation: u8,
        status: u8,
    ) -> Result<(), CloudError> {
        let query = [
            ("deviceId", device_id.to_string()),
            ("holdTemp", hold_temp.to_string()),
            ("operation", operation.to_string()),
            ("status", status.to_string()),
        ];
        let response: MillResponse<Value> = self
            .post(DEVICE_CONTROL, &[("access_token", access_token)], &query)
            .await?;
        response.into_data()?;
        debug!(%device_id, hold_temp, operation, status, "device control accepted");
        Ok(())
    }
}

/// Check the status, then decode the envelope.
async fn parse_envelope<T: DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<MillResponse<T>, CloudError> {
    let status = resp.status();
    if status != StatusCode::OK {
        let body = resp.text().await.unwrap_or_default();
        return Err(CloudError::Status {
            status: status.as_u16(),
            body: body.chars().take(BODY_PREVIEW).collect(),
        });
    }

    let body = resp.text().await?;
    trace!(body = %body, "response body");
    serde_json::from_str(&body).map_err(|source| CloudError::Decode {
        status: status.as_u16(),
        source,
    })
}

impl CloudApi for MillClient {
    fn request_authorization_code(
        &self,
        access_key: &str,
        secret_token: &str,
    ) -> impl Future<Output = Result<String, BridgeError>> + Send {
        async move {
            let headers = [("access_key", access_key), ("secret_token", secret_token)];
            let data: AuthCodeData = self.authenticate(AUTH_CODE, &headers, &[]).await?;
            Ok(data.authorization_code)
        }
    }

    fn exchange_token(
        &self,
        authorization_code: &str,
        username: &str,
        password: &str,
    ) -> impl Future<Output = Result<TokenGrant, BridgeError>> + Send {
        async move {
            let query = [
                ("password", password.to_string()),
                ("username", username.to_string()),
            ];
            let headers = [("authorization_code", authorization_code)];
            let data: TokenData = self.authenticate(ACCESS_TOKEN, &headers, &query).await?;
            Ok(data.into())
        }
    }

    fn refresh_token(
        &self,
        refresh_token: &str,
    ) -> impl Future<Output = Result<TokenGrant, BridgeError>> + Send {
        async move {
            let query = [("refreshtoken", refresh_token.to_string())];
            let data: TokenData = self.authenticate(REFRESH_TOKEN, &[], &query).await?;
            Ok(data.into())
        }
    }

    fn list_homes(
        &self,
        access_token: &str,
    ) -> impl Future<Output = Result<Vec<Home>, BridgeError>> + Send {
        async move {
            let data: HomeList = self
                .fetch(HOME_LIST, &[("access_token", access_token)], &[])
                .await?;
            Ok(data.home_list)
        }
    }

    fn list_rooms(
        &self,
        access_token: &str,
        home_id: HomeId,
    ) -> impl Future<Output = Result<Vec<Room>, BridgeError>> + Send {
        async move {
            let query = [("homeId", home_id.to_string())];
            let data: RoomList = self
                .fetch(ROOMS_BY_HOME, &[("access_token", access_token)], &query)
                .await?;
            Ok(data.room_list)
        }
    }

    fn list_devices(
        &self,
        access_token: &str,
        room_id: RoomId,
    ) -> impl Future<Output = Result<Vec<Device>, BridgeError>> + Send {
        async move {
            let query = [("roomId", room_id.to_string())];
            let data: DeviceList = self
                .fetch(DEVICES_BY_ROOM, &[("access_token", access_token)], &query)
                .await?;
            Ok(data.device_list)
        }
    }

    fn list_independent_devices(
        &self,
        access_token: &str,
        home_id: HomeId,
    ) -> impl Future<Output = Result<Vec<Device>, BridgeError>> + Send {
        async move {
            let query = [("homeId", home_id.to_string())];
            let data: DeviceList = self
                .fetch(INDEPENDENT_DEVICES, &[("access_token", access_token)], &query)
                .await?;
            Ok(data.device_list)
        }
    }

    fn set_temperature(
        &self,
        access_token: &str,
        device_id: DeviceId,
        target_temp: i64,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send {
        async move {
            self.control(access_token, device_id, target_temp, OPERATION_TEMPERATURE, 1)
                .await?;
            Ok(())
        }
    }

    fn set_mode(
        &self,
        access_token: &str,
        device_id: DeviceId,
        current_setpoint: i64,
        mode: ThermostatMode,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send {
        let status = match mode {
            ThermostatMode::Heat => 1,
            ThermostatMode::Off => 0,
        };
        async move {
            self.control(access_token, device_id, current_setpoint, OPERATION_POWER, status)
                .await?;
            Ok(())
        }
    }
}
