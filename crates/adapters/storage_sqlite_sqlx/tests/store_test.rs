use millbridge_adapter_storage_sqlite_sqlx::{Config, SqliteStateStore};
use millbridge_app::ports::StateStore;
use millbridge_domain::credentials::Credentials;
use millbridge_domain::device::Device;
use millbridge_domain::registry::{DeviceRegistry, Placement};
use millbridge_domain::id::{HomeId, RoomId};
use millbridge_domain::settings::{Account, AdapterSettings};

async fn store() -> SqliteStateStore {
    let db = Config {
        database_url: "sqlite::memory:".to_string(),
    }
    .build()
    .await
    .unwrap();
    SqliteStateStore::new(db.pool().clone())
}

fn device(id: i64, current_temp: f64, target_temp: i64) -> Device {
    serde_json::from_value(serde_json::json!({
        "deviceId": id,
        "deviceName": format!("heater {id}"),
        "currentTemp": current_temp,
        "holidayTemp": target_temp
    }))
    .unwrap()
}

#[tokio::test]
async fn should_return_none_before_first_save() {
    let store = store().await;

    assert!(store.load_settings().await.unwrap().is_none());
    assert!(store.load_registry().await.unwrap().is_none());
}

#[tokio::test]
async fn should_save_and_reload_settings() {
    let store = store().await;
    let settings = AdapterSettings {
        account: Account {
            username: "user@example.com".to_string(),
            password: "secret".to_string(),
            access_key: "key".to_string(),
            secret_token: "token".to_string(),
        },
        credentials: Credentials {
            authorization_code: "code".to_string(),
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            access_expires_at: 1_700_000_000_000,
            refresh_expires_at: 1_702_000_000_000,
        },
        poll_time_min: 5,
        ..AdapterSettings::default()
    };

    store.save_settings(&settings).await.unwrap();
    let loaded = store.load_settings().await.unwrap().unwrap();

    assert_eq!(loaded, settings);
}

#[tokio::test]
async fn should_overwrite_previous_document() {
    let store = store().await;
    let mut settings = AdapterSettings::default();
    store.save_settings(&settings).await.unwrap();

    settings.poll_time_min = 10;
    settings.param_2 = "second".to_string();
    store.save_settings(&settings).await.unwrap();

    let loaded = store.load_settings().await.unwrap().unwrap();
    assert_eq!(loaded.poll_time_min, 10);
    assert_eq!(loaded.param_2, "second");
}

#[tokio::test]
async fn should_restore_registry_in_order() {
    let store = store().await;
    let mut registry = DeviceRegistry::new();
    registry.push(device(100, 20.0, 21), Placement::Room(RoomId::new(10)));
    registry.push(device(150, 19.5, 0), Placement::Independent(HomeId::new(1)));
    registry.push(device(101, 18.0, 17), Placement::Room(RoomId::new(10)));

    store.save_registry(&registry.snapshot()).await.unwrap();
    let restored = DeviceRegistry::from(store.load_registry().await.unwrap().unwrap());

    let ids: Vec<i64> = restored.devices().map(|d| d.device_id.get()).collect();
    let original: Vec<i64> = registry.devices().map(|d| d.device_id.get()).collect();
    assert_eq!(ids, original);
    assert_eq!(restored.independent_devices().count(), 1);
}
