#![allow(clippy::unwrap_used)]
//! End-to-end tests for the full millbridged stack.
//!
//! Each test wires the real router and worker to an in-memory `SQLite`
//! store, the in-process bus and a `MillClient` pointed at a wiremock
//! server. No broker is needed.

use serde_json::{Value, json};
use tokio::sync::broadcast;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use millbridge_adapter_mill_cloud::MillClient;
use millbridge_adapter_storage_sqlite_sqlx::{Config, SqliteStateStore};
use millbridge_app::event_bus::{InProcessBus, Published};
use millbridge_app::ports::{LogLevelControl, StateStore};
use millbridge_app::router::CommandRouter;
use millbridge_app::worker::{Job, Worker};
use millbridge_domain::error::BridgeError;
use millbridge_domain::message::{BusMessage, Envelope, ValueType};
use millbridge_domain::settings::AdapterSettings;

// 2100-01-01, far enough that no refresh happens during a test
const FAR_FUTURE: i64 = 4_102_444_800_000;

struct IgnoreLevel;

impl LogLevelControl for IgnoreLevel {
    fn set_level(&self, _level: tracing::Level) -> Result<(), BridgeError> {
        Ok(())
    }
}

fn ok(data: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "errorCode": 0,
        "message": "",
        "success": true,
        "data": data,
    }))
}

async fn mill_server() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/share/applyAuthCode"))
        .and(header("access_key", "key"))
        .respond_with(ok(json!({ "authorization_code": "code-1" })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/share/applyAccessToken"))
        .and(header("authorization_code", "code-1"))
        .respond_with(ok(json!({
            "access_token": "access",
            "refresh_token": "refresh",
            "expireTime": FAR_FUTURE,
            "refresh_expireTime": FAR_FUTURE,
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/uds/selectHomeList"))
        .and(header("access_token", "access"))
        .respond_with(ok(json!({ "homeList": [{ "homeId": 1, "homeName": "Cabin" }] })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/uds/selectRoombyHome"))
        .and(query_param("homeId", "1"))
        .respond_with(ok(json!({ "roomList": [{ "roomId": 10, "roomName": "Living room" }] })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/uds/selectDevicebyRoom"))
        .and(query_param("roomId", "10"))
        .respond_with(ok(json!({
            "deviceList": [{ "deviceId": 100, "deviceName": "Panel", "currentTemp": 20.5 }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/uds/getIndependentDevices"))
        .and(query_param("homeId", "1"))
        .respond_with(ok(json!({
            "deviceList": [{
                "deviceId": 150,
                "deviceName": "Garage",
                "currentTemp": 9.0,
                "holidayTemp": 12
            }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/uds/deviceControlForOpenApi"))
        .and(query_param("deviceId", "100"))
        .and(query_param("holdTemp", "22"))
        .respond_with(ok(Value::Null))
        .mount(&server)
        .await;

    server
}

async fn store() -> SqliteStateStore {
    let db = Config {
        database_url: "sqlite::memory:".to_string(),
    }
    .build()
    .await
    .expect("in-memory database should initialise");
    SqliteStateStore::new(db.pool().clone())
}

fn adapter_command(msg_type: &str, val_t: ValueType, val: Value) -> Job {
    Job::Inbound(Envelope {
        address: "pt:j1/mt:cmd/rt:ad/rn:mill/ad:1".parse().unwrap(),
        message: BusMessage::new("mill", msg_type, val_t, val),
    })
}

fn login() -> Job {
    adapter_command(
        "cmd.auth.login",
        ValueType::Object,
        json!({
            "username": "alice@example.com",
            "password": "hunter2",
            "access_key": "key",
            "secret_token": "secret",
        }),
    )
}

fn drain(rx: &mut broadcast::Receiver<Published>) -> Vec<Published> {
    let mut published = Vec::new();
    while let Ok(item) = rx.try_recv() {
        published.push(item);
    }
    published
}

#[tokio::test]
async fn should_login_sync_and_control_a_heater() {
    let server = mill_server().await;
    let store = store().await;
    let bus = InProcessBus::new(64);
    let mut rx = bus.subscribe();

    let router = CommandRouter::restore(
        MillClient::with_client(reqwest::Client::new(), &server.uri()),
        bus,
        store.clone(),
        IgnoreLevel,
        AdapterSettings::default(),
    )
    .await
    .unwrap();
    let (worker, jobs) = Worker::new(router, 16);
    let handle = worker.start();

    jobs.send(login()).await.unwrap();
    jobs.send(Job::Inbound(Envelope {
        address: "pt:j1/mt:cmd/rt:dev/rn:mill/ad:1/sv:thermostat/ad:100"
            .parse()
            .unwrap(),
        message: BusMessage::new(
            "thermostat",
            "cmd.setpoint.set",
            ValueType::StrMap,
            json!({ "type": "heat", "temp": "21.6" }),
        ),
    }))
    .await
    .unwrap();
    jobs.send(Job::Shutdown).await.unwrap();
    let router = handle.await.unwrap();

    let published = drain(&mut rx);
    let types: Vec<&str> = published.iter().map(|(_, m)| m.msg_type.as_str()).collect();
    assert_eq!(
        types,
        vec![
            "evt.auth.status_report",
            "evt.network.get_all_nodes_report",
            "evt.thing.inclusion_report",
            "evt.thing.inclusion_report",
            "evt.setpoint.report",
        ]
    );
    let (topic, echo) = published.last().unwrap();
    assert_eq!(
        topic,
        "pt:j1/mt:evt/rt:dev/rn:mill/ad:1/sv:thermostat/ad:100"
    );
    assert_eq!(echo.val["temp"], "21.6");

    assert_eq!(router.registry().len(), 2);
    let saved = store.load_settings().await.unwrap().unwrap();
    assert_eq!(saved.credentials.access_token, "access");
    assert_eq!(saved.account.username, "alice@example.com");
}

#[tokio::test]
async fn should_restore_registry_after_restart() {
    let server = mill_server().await;
    let store = store().await;

    let router = CommandRouter::restore(
        MillClient::with_client(reqwest::Client::new(), &server.uri()),
        InProcessBus::new(64),
        store.clone(),
        IgnoreLevel,
        AdapterSettings::default(),
    )
    .await
    .unwrap();
    let (worker, jobs) = Worker::new(router, 16);
    let handle = worker.start();
    jobs.send(login()).await.unwrap();
    drop(jobs);
    handle.await.unwrap();

    let bus = InProcessBus::new(64);
    let mut rx = bus.subscribe();
    let mut restored = CommandRouter::restore(
        MillClient::with_client(reqwest::Client::new(), &server.uri()),
        bus,
        store,
        IgnoreLevel,
        AdapterSettings::default(),
    )
    .await
    .unwrap();
    assert_eq!(restored.registry().len(), 2);

    let outcome = restored.poll().await;
    assert_eq!(outcome.published, 3);
    let published = drain(&mut rx);
    let topics: Vec<&str> = published.iter().map(|(topic, _)| topic.as_str()).collect();
    assert_eq!(
        topics,
        vec![
            "pt:j1/mt:evt/rt:dev/rn:mill/ad:1/sv:sensor_temp/ad:100",
            "pt:j1/mt:evt/rt:dev/rn:mill/ad:1/sv:sensor_temp/ad:150",
            "pt:j1/mt:evt/rt:dev/rn:mill/ad:1/sv:thermostat/ad:150",
        ]
    );
}
