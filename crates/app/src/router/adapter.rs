//! Handlers of the adapter-level service.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::Deserialize;
use serde_json::Value;

use millbridge_domain::credentials::TokenGrant;
use millbridge_domain::error::{BridgeError, ValidationError};
use millbridge_domain::id::DeviceId;
use millbridge_domain::inclusion::build_inclusion_report;
use millbridge_domain::lifecycle::{AppState, AuthState, AuthStatus, ConfigState};
use millbridge_domain::message::{BusMessage, Envelope};
use millbridge_domain::registry::DeviceRegistry;
use millbridge_domain::settings::{Account, SettingsUpdate};

use super::{CommandRouter, DispatchOutcome};
use crate::poller::interval_from_minutes;
use crate::ports::{BusPublisher, CloudApi, LogLevelControl, StateStore};
use crate::reports::{self, Outbound};

const MANIFEST_STATE: &str = "manifest_state";

/// Payload of `cmd.auth.login`. Empty fields fall back to the stored account.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LoginRequest {
    username: String,
    password: String,
    access_key: String,
    secret_token: String,
}

impl LoginRequest {
    fn merged_with(self, stored: &Account) -> Account {
        let pick = |given: String, fallback: &String| {
            if given.is_empty() {
                fallback.clone()
            } else {
                given
            }
        };
        Account {
            username: pick(self.username, &stored.username),
            password: pick(self.password, &stored.password),
            access_key: pick(self.access_key, &stored.access_key),
            secret_token: pick(self.secret_token, &stored.secret_token),
        }
    }
}

fn parse_expiry(map: &BTreeMap<String, String>, key: &str) -> Result<i64, ValidationError> {
    match map.get(key).map(|raw| raw.trim()).filter(|raw| !raw.is_empty()) {
        None => Ok(0),
        Some(raw) => raw.parse().map_err(|_| ValidationError::MalformedPayload {
            expected: "expiry in epoch milliseconds",
        }),
    }
}

impl<C, B, S, L> CommandRouter<C, B, S, L>
where
    C: CloudApi + Send + Sync,
    B: BusPublisher + Send + Sync,
    S: StateStore + Send + Sync,
    L: LogLevelControl + Send + Sync,
{
    pub(super) async fn handle_adapter_command(
        &mut self,
        msg_type: &str,
        envelope: &Envelope,
        previous_ids: &[DeviceId],
    ) -> Result<DispatchOutcome, BridgeError> {
        let request = &envelope.message;
        match msg_type {
            "cmd.auth.set_tokens" => self.set_tokens(request).await,
            "cmd.auth.login" => self.login(request).await,
            "cmd.auth.logout" => self.logout(request).await,
            "cmd.network.get_all_nodes" => {
                self.reply(request, reports::all_nodes(self.registry.devices()))
                    .await;
                Ok(DispatchOutcome::Handled)
            }
            "cmd.system.sync" => {
                self.emit_inclusions(request).await;
                let vanished: Vec<DeviceId> = previous_ids
                    .iter()
                    .copied()
                    .filter(|id| !self.registry.contains(*id))
                    .collect();
                self.emit_exclusions(request, &vanished).await;
                Ok(DispatchOutcome::Handled)
            }
            "cmd.thing.get_inclusion_report" => self.get_inclusion_report(request).await,
            "cmd.thing.delete" => {
                let map = request.str_map_value()?;
                let address = map
                    .get("address")
                    .filter(|address| !address.is_empty())
                    .ok_or(ValidationError::MalformedPayload {
                        expected: "str_map with address",
                    })?;
                tracing::info!(%address, "thing deleted from hub");
                self.emit(reports::exclusion_report(address).correlated_to(request))
                    .await;
                Ok(DispatchOutcome::Handled)
            }
            "cmd.app.get_manifest" => self.get_manifest(request).await,
            "cmd.app.get_state" => {
                self.reply(request, reports::state_report(&self.lifecycle))
                    .await;
                Ok(DispatchOutcome::Handled)
            }
            "cmd.config.get_extended_report" => {
                self.reply(request, reports::extended_report(&self.settings))
                    .await;
                Ok(DispatchOutcome::Handled)
            }
            "cmd.config.extended_set" => self.extended_set(request).await,
            "cmd.log.set_level" => self.set_log_level(request).await,
            "cmd.system.reconnect" => {
                self.reply(request, reports::action_report(msg_type)).await;
                Ok(DispatchOutcome::Handled)
            }
            "cmd.app.factory_reset" => {
                self.emit_exclusions(request, &self.registry.device_ids())
                    .await;
                self.settings.account = Account::default();
                self.settings.credentials.clear();
                self.registry = DeviceRegistry::new();
                self.lifecycle.reset();
                self.persist_settings().await;
                self.persist_registry().await;
                tracing::info!("factory reset");
                self.reply(request, reports::action_report(msg_type)).await;
                Ok(DispatchOutcome::Handled)
            }
            "cmd.app.uninstall" => {
                self.emit_exclusions(request, &self.registry.device_ids())
                    .await;
                self.settings.credentials.clear();
                self.registry = DeviceRegistry::new();
                self.persist_settings().await;
                self.persist_registry().await;
                tracing::info!("uninstalled");
                Ok(DispatchOutcome::Handled)
            }
            other => {
                tracing::debug!(msg_type = other, "no handler for adapter message");
                Ok(DispatchOutcome::Ignored)
            }
        }
    }

    async fn set_tokens(&mut self, request: &BusMessage) -> Result<DispatchOutcome, BridgeError> {
        let map = request.str_map_value()?;
        let access_token = map
            .get("access_token")
            .filter(|token| !token.is_empty())
            .ok_or(ValidationError::MalformedPayload {
                expected: "str_map with access_token",
            })?;
        let access_expires_at = parse_expiry(&map, "expireTime")?;
        let refresh_expires_at = parse_expiry(&map, "refresh_expireTime")?;
        // Expiries come as a pair, and the refresh window outlives the access token.
        let paired = (access_expires_at == 0) == (refresh_expires_at == 0);
        if !paired || (access_expires_at != 0 && access_expires_at >= refresh_expires_at) {
            return Err(ValidationError::MalformedPayload {
                expected: "expireTime before refresh_expireTime, both or neither",
            }
            .into());
        }
        let grant = TokenGrant {
            access_token: access_token.clone(),
            refresh_token: map.get("refresh_token").cloned().unwrap_or_default(),
            access_expires_at,
            refresh_expires_at,
        };
        self.settings.credentials.replace_with(grant);
        self.mark_authenticated();
        tracing::info!("tokens set manually");

        self.reply(request, reports::auth_status(&AuthStatus::ok(AuthState::Authenticated)))
            .await;
        self.resync().await;
        self.emit_inclusions(request).await;
        self.persist_settings().await;
        Ok(DispatchOutcome::Handled)
    }

    async fn login(&mut self, request: &BusMessage) -> Result<DispatchOutcome, BridgeError> {
        let account = request
            .object_value::<LoginRequest>()?
            .merged_with(&self.settings.account);
        if let Err(err) = account.validate() {
            self.reply(request, reports::auth_status(&AuthStatus::error(err.to_string())))
                .await;
            return Err(err.into());
        }

        let (authorization_code, grant) = match self.authorize(&account).await {
            Ok(tokens) => tokens,
            Err(err) => {
                self.reply(request, reports::auth_status(&AuthStatus::error(err.to_string())))
                    .await;
                return Err(err);
            }
        };
        self.settings.account = account;
        self.settings.credentials.authorization_code = authorization_code;
        self.settings.credentials.replace_with(grant);
        self.mark_authenticated();
        tracing::info!(username = %self.settings.account.username, "logged in");

        self.reply(request, reports::auth_status(&AuthStatus::ok(AuthState::Authenticated)))
            .await;
        self.resync().await;
        self.reply(request, reports::all_nodes(self.registry.devices()))
            .await;
        self.emit_inclusions(request).await;
        self.persist_settings().await;
        Ok(DispatchOutcome::Handled)
    }

    async fn authorize(&self, account: &Account) -> Result<(String, TokenGrant), BridgeError> {
        let code = self
            .cloud
            .request_authorization_code(&account.access_key, &account.secret_token)
            .await?;
        let grant = self
            .cloud
            .exchange_token(&code, &account.username, &account.password)
            .await?;
        Ok((code, grant))
    }

    async fn logout(&mut self, request: &BusMessage) -> Result<DispatchOutcome, BridgeError> {
        self.emit_exclusions(request, &self.registry.device_ids())
            .await;
        self.settings.credentials.clear();
        self.registry = DeviceRegistry::new();
        self.lifecycle.reset();
        tracing::info!("logged out");

        self.reply(
            request,
            reports::auth_status(&AuthStatus::ok(AuthState::NotAuthenticated)),
        )
        .await;
        self.persist_settings().await;
        self.persist_registry().await;
        Ok(DispatchOutcome::Handled)
    }

    async fn get_inclusion_report(
        &mut self,
        request: &BusMessage,
    ) -> Result<DispatchOutcome, BridgeError> {
        let raw = request.string_value()?;
        let device_id = DeviceId::from_str(raw)
            .map_err(|_| ValidationError::InvalidAddress(raw.to_string()))?;
        let Ok(index) = self.registry.find_by_device_id(device_id) else {
            tracing::debug!(%device_id, "inclusion report for unknown device");
            return Ok(DispatchOutcome::Ignored);
        };
        let report = build_inclusion_report(index, &self.registry)?;
        self.emit(reports::inclusion_report(&report).correlated_to(request))
            .await;
        Ok(DispatchOutcome::Handled)
    }

    async fn get_manifest(&mut self, request: &BusMessage) -> Result<DispatchOutcome, BridgeError> {
        let mode = request.string_value().unwrap_or_default();
        let Value::Object(mut manifest) = self.manifest.clone() else {
            tracing::warn!("no manifest loaded");
            return Ok(DispatchOutcome::Ignored);
        };
        if mode == MANIFEST_STATE {
            let app_state = serde_json::to_value(&self.lifecycle).unwrap_or_default();
            let config_state = serde_json::to_value(self.settings.redacted()).unwrap_or_default();
            manifest.insert("app_state".to_string(), app_state);
            manifest.insert("config_state".to_string(), config_state);
        }
        self.reply(request, reports::manifest_report(Value::Object(manifest)))
            .await;
        Ok(DispatchOutcome::Handled)
    }

    async fn extended_set(&mut self, request: &BusMessage) -> Result<DispatchOutcome, BridgeError> {
        let update: SettingsUpdate = request.object_value()?;
        self.settings.apply(update)?;
        self.persist_settings().await;
        if let Some(sender) = &self.poll_interval {
            sender.send_replace(interval_from_minutes(self.settings.poll_time_min));
        }
        tracing::info!(poll_time_min = self.settings.poll_time_min, "settings updated");
        self.reply(request, reports::config_report(&self.lifecycle))
            .await;
        Ok(DispatchOutcome::Handled)
    }

    async fn set_log_level(
        &mut self,
        request: &BusMessage,
    ) -> Result<DispatchOutcome, BridgeError> {
        let raw = request.string_value()?;
        let level = tracing::Level::from_str(raw)
            .map_err(|_| ValidationError::InvalidLogLevel(raw.to_string()))?;
        self.log_control.set_level(level)?;
        self.settings.log_level = raw.to_lowercase();
        tracing::info!(%level, "log level changed");
        self.persist_settings().await;
        Ok(DispatchOutcome::Handled)
    }

    fn mark_authenticated(&mut self) {
        self.lifecycle.auth = AuthState::Authenticated;
        self.lifecycle.app = AppState::Running;
        self.lifecycle.config = ConfigState::Configured;
        self.settings.errors.clear();
    }

    async fn reply(&self, request: &BusMessage, message: BusMessage) {
        self.emit(Outbound::reply(request, message)).await;
    }

    async fn emit_inclusions(&self, request: &BusMessage) {
        for index in 0..self.registry.len() {
            match build_inclusion_report(index, &self.registry) {
                Ok(report) => {
                    self.emit(reports::inclusion_report(&report).correlated_to(request))
                        .await;
                }
                Err(err) => tracing::warn!(error = %err, "failed to build inclusion report"),
            }
        }
    }

    async fn emit_exclusions(&self, request: &BusMessage, device_ids: &[DeviceId]) {
        for device_id in device_ids {
            self.emit(reports::exclusion_report(&device_id.to_string()).correlated_to(request))
                .await;
        }
    }
}
