//! # millbridged
//!
//! Composition root that wires the adapters together and runs the bridge.
//!
//! ## Responsibilities
//! - Load configuration (config file, env vars)
//! - Install the tracing subscriber
//! - Open the `SQLite` database and run migrations
//! - Restore the persisted settings and device registry
//! - Start the worker, the MQTT inbound loop and the poller
//! - Stop cleanly on Ctrl-C
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer; no domain logic belongs here.

mod config;
mod logging;

use std::str::FromStr;

use tokio::sync::watch;

use millbridge_adapter_mill_cloud::MillClient;
use millbridge_adapter_storage_sqlite_sqlx::SqliteStateStore;
use millbridge_app::poller::{Poller, interval_from_minutes};
use millbridge_app::ports::LogLevelControl;
use millbridge_app::router::CommandRouter;
use millbridge_app::worker::{Job, Worker};
use millbridge_domain::settings::AdapterSettings;

use crate::config::Config;

const JOB_QUEUE: usize = 64;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| config::DEFAULT_PATH.to_string());
    let config = Config::load(&path)?;
    let log_control = logging::init(&config.logging.filter);
    tracing::info!(config = %path, "millbridged starting");

    // Storage
    let db = config.database.clone().build().await?;
    let store = SqliteStateStore::new(db.pool().clone());

    // Cloud and bus
    let cloud = MillClient::new(&config.cloud)?;
    let (bus, inbound) = millbridge_adapter_mqtt::connect(&config.mqtt);
    let manifest = config.load_manifest()?;

    let defaults = AdapterSettings {
        poll_time_min: config.service.default_poll_time_min,
        ..AdapterSettings::default()
    };
    let router =
        CommandRouter::restore(cloud, bus, store, log_control.clone(), defaults).await?;

    // the level chosen over the bus outlives restarts unless the environment overrides it
    if !config.logging.from_env
        && let Ok(level) = tracing::Level::from_str(&router.settings().log_level)
    {
        log_control.set_level(level)?;
    }

    let (interval_tx, interval_rx) =
        watch::channel(interval_from_minutes(router.settings().poll_time_min));
    let router = router.with_manifest(manifest).with_poll_interval(interval_tx);

    // Tasks
    let (worker, jobs) = Worker::new(router, JOB_QUEUE);
    let worker = worker.start();
    let inbound = inbound.start(jobs.clone());
    let poller = Poller::start(jobs.clone(), interval_rx);

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");

    poller.abort();
    inbound.abort();
    if jobs.send(Job::Shutdown).await.is_err() {
        tracing::warn!("worker already stopped");
    }
    worker.await?;
    tracing::info!("millbridged stopped");
    Ok(())
}
