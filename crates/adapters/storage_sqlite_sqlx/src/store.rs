//! `SQLite` implementation of [`StateStore`].
//!
//! Each persisted value is one JSON document in the `documents` table,
//! rewritten in full on every save.

use std::future::Future;

use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::SqlitePool;

use millbridge_app::ports::StateStore;
use millbridge_domain::error::BridgeError;
use millbridge_domain::registry::RegistrySnapshot;
use millbridge_domain::settings::AdapterSettings;

use crate::error::StorageError;

const SETTINGS_KEY: &str = "settings";
const REGISTRY_KEY: &str = "registry";

const SELECT_BODY: &str = "SELECT body FROM documents WHERE key = ?";
const UPSERT: &str = "INSERT INTO documents (key, body, updated_at) VALUES (?, ?, ?) \
     ON CONFLICT(key) DO UPDATE SET body = excluded.body, updated_at = excluded.updated_at";

/// `SQLite`-backed settings and registry store.
#[derive(Clone)]
pub struct SqliteStateStore {
    pool: SqlitePool,
}

impl SqliteStateStore {
    /// Create a new store using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

async fn load<T: DeserializeOwned>(
    pool: &SqlitePool,
    key: &'static str,
) -> Result<Option<T>, StorageError> {
    let row: Option<(String,)> = sqlx::query_as(SELECT_BODY)
        .bind(key)
        .fetch_optional(pool)
        .await?;
    row.map(|(body,)| serde_json::from_str(&body))
        .transpose()
        .map_err(|source| StorageError::Json { key, source })
}

fn encode<T: Serialize>(key: &'static str, value: &T) -> Result<String, StorageError> {
    serde_json::to_string(value).map_err(|source| StorageError::Json { key, source })
}

async fn save(pool: &SqlitePool, key: &'static str, body: String) -> Result<(), StorageError> {
    sqlx::query(UPSERT)
        .bind(key)
        .bind(body)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(pool)
        .await?;
    tracing::trace!(key, "document saved");
    Ok(())
}

impl StateStore for SqliteStateStore {
    fn load_settings(
        &self,
    ) -> impl Future<Output = Result<Option<AdapterSettings>, BridgeError>> + Send {
        let pool = self.pool.clone();
        async move { Ok(load(&pool, SETTINGS_KEY).await?) }
    }

    fn save_settings(
        &self,
        settings: &AdapterSettings,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send {
        let pool = self.pool.clone();
        let body = encode(SETTINGS_KEY, settings);
        async move { Ok(save(&pool, SETTINGS_KEY, body?).await?) }
    }

    fn load_registry(
        &self,
    ) -> impl Future<Output = Result<Option<RegistrySnapshot>, BridgeError>> + Send {
        let pool = self.pool.clone();
        async move { Ok(load(&pool, REGISTRY_KEY).await?) }
    }

    fn save_registry(
        &self,
        snapshot: &RegistrySnapshot,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send {
        let pool = self.pool.clone();
        let body = encode(REGISTRY_KEY, snapshot);
        async move { Ok(save(&pool, REGISTRY_KEY, body?).await?) }
    }
}
