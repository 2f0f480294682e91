//! In-memory port implementations shared by the unit tests of this crate.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Mutex;

use millbridge_domain::credentials::TokenGrant;
use millbridge_domain::device::Device;
use millbridge_domain::error::{AuthError, BridgeError, TransportError};
use millbridge_domain::id::{DeviceId, HomeId, RoomId};
use millbridge_domain::message::BusMessage;
use millbridge_domain::registry::RegistrySnapshot;
use millbridge_domain::settings::AdapterSettings;
use millbridge_domain::topology::{Home, Room};
use tracing::Level;

use crate::ports::{BusPublisher, CloudApi, LogLevelControl, StateStore, ThermostatMode};

pub fn home(id: i64) -> Home {
    serde_json::from_value(serde_json::json!({ "homeId": id, "homeName": format!("home {id}") }))
        .unwrap()
}

pub fn room(id: i64) -> Room {
    serde_json::from_value(serde_json::json!({ "roomId": id, "roomName": format!("room {id}") }))
        .unwrap()
}

pub fn device(id: i64, current_temp: f64, target_temp: i64) -> Device {
    serde_json::from_value(serde_json::json!({
        "deviceId": id,
        "deviceName": format!("heater {id}"),
        "currentTemp": current_temp,
        "holidayTemp": target_temp
    }))
    .unwrap()
}

pub fn grant(access_token: &str, access_expires_at: i64, refresh_expires_at: i64) -> TokenGrant {
    TokenGrant {
        access_token: access_token.to_string(),
        refresh_token: format!("{access_token}-refresh"),
        access_expires_at,
        refresh_expires_at,
    }
}

fn unavailable() -> BridgeError {
    TransportError::Status { status: 503 }.into()
}

#[derive(Default)]
pub struct CloudState {
    pub homes: Vec<Home>,
    pub rooms: HashMap<HomeId, Vec<Room>>,
    pub devices: HashMap<RoomId, Vec<Device>>,
    pub independent: HashMap<HomeId, Vec<Device>>,
    pub fail_homes: bool,
    pub fail_rooms: HashSet<HomeId>,
    pub fail_devices: HashSet<RoomId>,
    pub fail_independent: HashSet<HomeId>,
    pub fail_control: bool,
    pub authorization_code: Option<String>,
    pub login_grant: Option<TokenGrant>,
    pub refresh_grant: Option<TokenGrant>,
    pub calls: Vec<String>,
    pub temperatures: Vec<(DeviceId, i64)>,
    pub modes: Vec<(DeviceId, i64, ThermostatMode)>,
}

#[derive(Default)]
pub struct FakeCloud {
    pub state: Mutex<CloudState>,
}

impl FakeCloud {
    pub fn with(f: impl FnOnce(&mut CloudState)) -> Self {
        let cloud = Self::default();
        f(&mut cloud.state.lock().unwrap());
        cloud
    }

    pub fn update(&self, f: impl FnOnce(&mut CloudState)) {
        f(&mut self.state.lock().unwrap());
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, name: &str) -> usize {
        self.calls().iter().filter(|call| call.as_str() == name).count()
    }

    fn record(&self, name: &str) {
        self.state.lock().unwrap().calls.push(name.to_string());
    }
}

impl CloudApi for FakeCloud {
    fn request_authorization_code(
        &self,
        _access_key: &str,
        _secret_token: &str,
    ) -> impl Future<Output = Result<String, BridgeError>> + Send {
        self.record("request_authorization_code");
        let result = self
            .state
            .lock()
            .unwrap()
            .authorization_code
            .clone()
            .ok_or_else(|| {
                AuthError::Rejected {
                    message: "invalid access key".to_string(),
                }
                .into()
            });
        async move { result }
    }

    fn exchange_token(
        &self,
        _authorization_code: &str,
        _username: &str,
        _password: &str,
    ) -> impl Future<Output = Result<TokenGrant, BridgeError>> + Send {
        self.record("exchange_token");
        let result = self.state.lock().unwrap().login_grant.clone().ok_or_else(|| {
            AuthError::Rejected {
                message: "invalid password".to_string(),
            }
            .into()
        });
        async move { result }
    }

    fn refresh_token(
        &self,
        _refresh_token: &str,
    ) -> impl Future<Output = Result<TokenGrant, BridgeError>> + Send {
        self.record("refresh_token");
        let result = self.state.lock().unwrap().refresh_grant.clone().ok_or_else(|| {
            AuthError::Rejected {
                message: "refresh refused".to_string(),
            }
            .into()
        });
        async move { result }
    }

    fn list_homes(
        &self,
        _access_token: &str,
    ) -> impl Future<Output = Result<Vec<Home>, BridgeError>> + Send {
        self.record("list_homes");
        let state = self.state.lock().unwrap();
        let result = if state.fail_homes {
            Err(unavailable())
        } else {
            Ok(state.homes.clone())
        };
        async move { result }
    }

    fn list_rooms(
        &self,
        _access_token: &str,
        home_id: HomeId,
    ) -> impl Future<Output = Result<Vec<Room>, BridgeError>> + Send {
        self.record("list_rooms");
        let state = self.state.lock().unwrap();
        let result = if state.fail_rooms.contains(&home_id) {
            Err(unavailable())
        } else {
            Ok(state.rooms.get(&home_id).cloned().unwrap_or_default())
        };
        async move { result }
    }

    fn list_devices(
        &self,
        _access_token: &str,
        room_id: RoomId,
    ) -> impl Future<Output = Result<Vec<Device>, BridgeError>> + Send {
        self.record("list_devices");
        let state = self.state.lock().unwrap();
        let result = if state.fail_devices.contains(&room_id) {
            Err(unavailable())
        } else {
            Ok(state.devices.get(&room_id).cloned().unwrap_or_default())
        };
        async move { result }
    }

    fn list_independent_devices(
        &self,
        _access_token: &str,
        home_id: HomeId,
    ) -> impl Future<Output = Result<Vec<Device>, BridgeError>> + Send {
        self.record("list_independent_devices");
        let state = self.state.lock().unwrap();
        let result = if state.fail_independent.contains(&home_id) {
            Err(unavailable())
        } else {
            Ok(state.independent.get(&home_id).cloned().unwrap_or_default())
        };
        async move { result }
    }

    fn set_temperature(
        &self,
        _access_token: &str,
        device_id: DeviceId,
        target_temp: i64,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send {
        self.record("set_temperature");
        let mut state = self.state.lock().unwrap();
        let result = if state.fail_control {
            Err(unavailable())
        } else {
            state.temperatures.push((device_id, target_temp));
            Ok(())
        };
        async move { result }
    }

    fn set_mode(
        &self,
        _access_token: &str,
        device_id: DeviceId,
        current_setpoint: i64,
        mode: ThermostatMode,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send {
        self.record("set_mode");
        let mut state = self.state.lock().unwrap();
        let result = if state.fail_control {
            Err(unavailable())
        } else {
            state.modes.push((device_id, current_setpoint, mode));
            Ok(())
        };
        async move { result }
    }
}

#[derive(Default)]
pub struct RecordingBus {
    pub published: Mutex<Vec<(String, BusMessage)>>,
    /// Topics whose publish fails without being recorded.
    pub failing_topics: Mutex<HashSet<String>>,
}

impl RecordingBus {
    pub fn take(&self) -> Vec<(String, BusMessage)> {
        std::mem::take(&mut *self.published.lock().unwrap())
    }

    pub fn fail_on(&self, topic: &str) {
        self.failing_topics.lock().unwrap().insert(topic.to_string());
    }
}

impl BusPublisher for RecordingBus {
    fn publish(
        &self,
        topic: String,
        message: BusMessage,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send {
        let result = if self.failing_topics.lock().unwrap().contains(&topic) {
            Err(BridgeError::Bus(Box::new(std::io::Error::other("broker gone"))))
        } else {
            self.published.lock().unwrap().push((topic, message));
            Ok(())
        };
        async { result }
    }
}

#[derive(Default)]
pub struct MemoryStore {
    pub settings: Mutex<Option<AdapterSettings>>,
    pub registry: Mutex<Option<RegistrySnapshot>>,
    pub settings_writes: Mutex<usize>,
    pub registry_writes: Mutex<usize>,
}

impl StateStore for MemoryStore {
    fn load_settings(
        &self,
    ) -> impl Future<Output = Result<Option<AdapterSettings>, BridgeError>> + Send {
        let result = Ok(self.settings.lock().unwrap().clone());
        async move { result }
    }

    fn save_settings(
        &self,
        settings: &AdapterSettings,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send {
        *self.settings.lock().unwrap() = Some(settings.clone());
        *self.settings_writes.lock().unwrap() += 1;
        async { Ok(()) }
    }

    fn load_registry(
        &self,
    ) -> impl Future<Output = Result<Option<RegistrySnapshot>, BridgeError>> + Send {
        let result = Ok(self.registry.lock().unwrap().clone());
        async move { result }
    }

    fn save_registry(
        &self,
        snapshot: &RegistrySnapshot,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send {
        *self.registry.lock().unwrap() = Some(snapshot.clone());
        *self.registry_writes.lock().unwrap() += 1;
        async { Ok(()) }
    }
}

#[derive(Default)]
pub struct RecordingLog {
    pub levels: Mutex<Vec<Level>>,
}

impl LogLevelControl for RecordingLog {
    fn set_level(&self, level: Level) -> Result<(), BridgeError> {
        self.levels.lock().unwrap().push(level);
        Ok(())
    }
}
