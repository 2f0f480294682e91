//! Command router: translates inbound bus commands into cloud calls and
//! bus events.
//!
//! Every inbound message goes through the same stages:
//! token check, resync of the registry, then dispatch on
//! `(service, message type)`. The router exclusively owns the settings,
//! the credentials and the registry; it must only be driven from the
//! single [`Worker`](crate::worker::Worker).

mod adapter;
mod sensor;
mod thermostat;

use std::time::Duration;

use serde_json::Value;
use tokio::sync::watch;

use millbridge_domain::address::RESOURCE_NAME;
use millbridge_domain::error::{AuthError, BridgeError};
use millbridge_domain::id::DeviceId;
use millbridge_domain::inclusion::{SENSOR_TEMP, THERMOSTAT};
use millbridge_domain::lifecycle::{AppLifecycle, AuthState, ConnectionState};
use millbridge_domain::message::Envelope;
use millbridge_domain::registry::DeviceRegistry;
use millbridge_domain::settings::AdapterSettings;
use millbridge_domain::time::{self, EpochMillis};

use crate::poller::interval_from_minutes;
use crate::ports::{BusPublisher, CloudApi, LogLevelControl, StateStore};
use crate::reports::{self, Outbound};
use crate::services::sync_engine;
use crate::services::token_lifecycle::{self, TokenCheck};

/// Result of the dispatch stage.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// A handler ran to completion.
    Handled,
    /// No handler applies, or the referenced device is unknown.
    Ignored,
    /// The handler aborted.
    Failed(BridgeError),
}

/// Observable result of one inbound message.
#[derive(Debug)]
pub struct HandleOutcome {
    /// Token check stage.
    pub token: TokenCheck,
    /// Whether a resync pass completed.
    pub resynced: bool,
    /// Dispatch stage.
    pub dispatch: DispatchOutcome,
}

/// Observable result of one poll cycle.
#[derive(Debug)]
pub struct PollOutcome {
    /// Token check stage.
    pub token: TokenCheck,
    /// Whether a resync pass completed.
    pub resynced: bool,
    /// Number of reports published.
    pub published: usize,
}

/// State restored at startup.
#[derive(Debug, Clone, Default)]
pub struct RouterState {
    /// Persisted settings, including credentials.
    pub settings: AdapterSettings,
    /// Last persisted registry.
    pub registry: DeviceRegistry,
}

/// Inbound command state machine.
pub struct CommandRouter<C, B, S, L> {
    cloud: C,
    bus: B,
    store: S,
    log_control: L,
    settings: AdapterSettings,
    registry: DeviceRegistry,
    lifecycle: AppLifecycle,
    manifest: Value,
    poll_interval: Option<watch::Sender<Duration>>,
    clock: fn() -> EpochMillis,
}

impl<C, B, S, L> CommandRouter<C, B, S, L>
where
    C: CloudApi + Send + Sync,
    B: BusPublisher + Send + Sync,
    S: StateStore + Send + Sync,
    L: LogLevelControl + Send + Sync,
{
    /// Create a router over restored state.
    pub fn new(cloud: C, bus: B, store: S, log_control: L, state: RouterState) -> Self {
        let lifecycle = AppLifecycle::at_startup(
            state.settings.credentials.has_access_token(),
            !state.settings.credentials.authorization_code.is_empty(),
        );
        Self {
            cloud,
            bus,
            store,
            log_control,
            settings: state.settings,
            registry: state.registry,
            lifecycle,
            manifest: Value::Null,
            poll_interval: None,
            clock: time::now_millis,
        }
    }

    /// Load the persisted documents from `store` and create a router.
    /// `defaults` is used when no settings document was saved yet.
    ///
    /// # Errors
    ///
    /// Returns a storage error when a document cannot be read.
    pub async fn restore(
        cloud: C,
        bus: B,
        store: S,
        log_control: L,
        defaults: AdapterSettings,
    ) -> Result<Self, BridgeError> {
        let settings = store.load_settings().await?.unwrap_or(defaults);
        let registry = store
            .load_registry()
            .await?
            .map(DeviceRegistry::from)
            .unwrap_or_default();
        tracing::info!(
            devices = registry.len(),
            authenticated = settings.credentials.has_access_token(),
            "state restored"
        );
        Ok(Self::new(
            cloud,
            bus,
            store,
            log_control,
            RouterState { settings, registry },
        ))
    }

    /// Set the opaque manifest document served by `cmd.app.get_manifest`.
    #[must_use]
    pub fn with_manifest(mut self, manifest: Value) -> Self {
        self.manifest = manifest;
        self
    }

    /// Notify `sender` whenever the poll interval changes.
    #[must_use]
    pub fn with_poll_interval(mut self, sender: watch::Sender<Duration>) -> Self {
        self.poll_interval = Some(sender);
        self
    }

    /// Replace the clock used for token expiry checks.
    #[must_use]
    pub fn with_clock(mut self, clock: fn() -> EpochMillis) -> Self {
        self.clock = clock;
        self
    }

    /// Current settings.
    #[must_use]
    pub fn settings(&self) -> &AdapterSettings {
        &self.settings
    }

    /// Current registry.
    #[must_use]
    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    /// Current lifecycle states.
    #[must_use]
    pub fn lifecycle(&self) -> &AppLifecycle {
        &self.lifecycle
    }

    /// Poll interval derived from the settings.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        interval_from_minutes(self.settings.poll_time_min)
    }

    /// Handle one inbound message.
    #[tracing::instrument(
        skip_all,
        fields(service = %envelope.message.serv, msg_type = %envelope.message.msg_type)
    )]
    pub async fn handle(&mut self, envelope: Envelope) -> HandleOutcome {
        let token = self.check_token().await;
        let previous_ids = self.registry.device_ids();
        let resynced = if matches!(token, TokenCheck::WindowElapsed) {
            false
        } else {
            self.resync().await
        };

        let dispatch = match self.dispatch(&envelope, &previous_ids).await {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!(error = %err, "command failed");
                self.record_failure(&err);
                DispatchOutcome::Failed(err)
            }
        };
        HandleOutcome {
            token,
            resynced,
            dispatch,
        }
    }

    /// Run one poll cycle: resync, then publish the temperature and, when
    /// set, the target of every device.
    #[tracing::instrument(skip_all)]
    pub async fn poll(&mut self) -> PollOutcome {
        let token = self.check_token().await;
        let resynced = if matches!(token, TokenCheck::WindowElapsed) {
            false
        } else {
            self.resync().await
        };
        if !resynced {
            return PollOutcome {
                token,
                resynced,
                published: 0,
            };
        }

        let mut outbound = Vec::with_capacity(self.registry.len() * 2);
        for device in self.registry.devices() {
            outbound.push(reports::sensor_report(device.device_id, device.current_temp));
            if device.has_target() {
                outbound.push(reports::setpoint_report(device.device_id, device.target_temp));
            }
        }
        let mut published = 0;
        for out in outbound {
            if self.emit(out).await {
                published += 1;
            }
        }
        tracing::debug!(published, "poll cycle complete");
        PollOutcome {
            token,
            resynced,
            published,
        }
    }

    async fn dispatch(
        &mut self,
        envelope: &Envelope,
        previous_ids: &[DeviceId],
    ) -> Result<DispatchOutcome, BridgeError> {
        let message = &envelope.message;
        match (message.serv.as_str(), message.msg_type.as_str()) {
            (THERMOSTAT, "cmd.setpoint.set") => self.set_setpoint(envelope).await,
            (THERMOSTAT, "cmd.setpoint.get_report") => self.get_setpoint_report(envelope).await,
            (THERMOSTAT, "cmd.mode.set") => self.set_mode(envelope).await,
            (THERMOSTAT, "cmd.mode.get_report") => self.get_mode_report(envelope).await,
            (SENSOR_TEMP, "cmd.sensor.get_report") => self.get_sensor_report(envelope).await,
            (RESOURCE_NAME, msg_type) => {
                self.handle_adapter_command(msg_type, envelope, previous_ids)
                    .await
            }
            (service, msg_type) => {
                tracing::debug!(service, msg_type, "no handler for message");
                Ok(DispatchOutcome::Ignored)
            }
        }
    }

    async fn check_token(&mut self) -> TokenCheck {
        let now = (self.clock)();
        let check =
            token_lifecycle::ensure_fresh(&self.cloud, &mut self.settings.credentials, now).await;
        match &check {
            TokenCheck::Skipped => {}
            TokenCheck::Refreshed => {
                self.lifecycle.auth = AuthState::Authenticated;
                self.settings.errors.clear();
            }
            TokenCheck::RefreshFailed(err) => {
                self.lifecycle.auth = AuthState::Error;
                self.settings.errors = err.to_string();
            }
            TokenCheck::WindowElapsed => {
                if self.lifecycle.auth != AuthState::ReloginRequired {
                    tracing::error!("{}", AuthError::RefreshWindowElapsed);
                    self.lifecycle.auth = AuthState::ReloginRequired;
                    self.settings.errors = AuthError::RefreshWindowElapsed.to_string();
                }
            }
        }
        if check.credentials_changed() {
            self.persist_settings().await;
        }
        check
    }

    /// Rebuild the registry. On failure the previous registry is kept and
    /// the connection is marked as lost.
    async fn resync(&mut self) -> bool {
        if !self.settings.credentials.has_access_token() {
            return false;
        }
        match sync_engine::synchronize(&self.cloud, &self.settings.credentials.access_token).await
        {
            Ok(registry) => {
                self.registry = registry;
                self.lifecycle.connection = ConnectionState::Connected;
                self.persist_registry().await;
                true
            }
            Err(err) => {
                tracing::warn!(error = %err, "sync failed, keeping previous registry");
                self.record_failure(&err);
                false
            }
        }
    }

    fn record_failure(&mut self, err: &BridgeError) {
        match err {
            BridgeError::Transport(_) => {
                self.lifecycle.connection = ConnectionState::Disconnected;
                self.settings.errors = err.to_string();
            }
            BridgeError::Auth(_) => {
                self.lifecycle.auth = AuthState::Error;
                self.settings.errors = err.to_string();
            }
            _ => {}
        }
    }

    fn access_token(&self) -> Result<&str, BridgeError> {
        if self.settings.credentials.has_access_token() {
            Ok(&self.settings.credentials.access_token)
        } else {
            Err(AuthError::NotAuthenticated.into())
        }
    }

    /// Publish one message. Failures are logged and reported as `false`.
    async fn emit(&self, out: Outbound) -> bool {
        let Outbound { topic, message } = out;
        let msg_type = message.msg_type.clone();
        match self.bus.publish(topic.clone(), message).await {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(%topic, %msg_type, error = %err, "failed to publish");
                false
            }
        }
    }

    async fn persist_settings(&mut self) {
        self.settings.connection_state = match self.lifecycle.connection {
            ConnectionState::Connected => "connected",
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::NotApplicable => "na",
        }
        .to_string();
        self.settings.touch(time::now());
        if let Err(err) = self.store.save_settings(&self.settings).await {
            tracing::error!(error = %err, "failed to save settings");
        }
    }

    async fn persist_registry(&self) {
        if let Err(err) = self.store.save_registry(&self.registry.snapshot()).await {
            tracing::error!(error = %err, "failed to save registry snapshot");
        }
    }
}
