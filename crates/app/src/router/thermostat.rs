use millbridge_domain::error::{BridgeError, ValidationError};
use millbridge_domain::message::Envelope;
use millbridge_domain::setpoint::parse_target_temp;

use super::{CommandRouter, DispatchOutcome};
use crate::ports::{BusPublisher, CloudApi, LogLevelControl, StateStore, ThermostatMode};
use crate::reports;

impl<C, B, S, L> CommandRouter<C, B, S, L>
where
    C: CloudApi + Send + Sync,
    B: BusPublisher + Send + Sync,
    S: StateStore + Send + Sync,
    L: LogLevelControl + Send + Sync,
{
    pub(super) async fn set_setpoint(
        &mut self,
        envelope: &Envelope,
    ) -> Result<DispatchOutcome, BridgeError> {
        let device_id = envelope.address.device_id()?;
        let requested = envelope.message.str_map_value()?;
        let raw = requested
            .get("temp")
            .ok_or(ValidationError::MalformedPayload {
                expected: "str_map with temp",
            })?;
        let target_temp = parse_target_temp(raw)?;
        if !self.registry.contains(device_id) {
            tracing::debug!(%device_id, "setpoint for unknown device");
            return Ok(DispatchOutcome::Ignored);
        }

        let token = self.access_token()?;
        self.cloud
            .set_temperature(token, device_id, target_temp)
            .await?;
        tracing::info!(%device_id, target_temp, "setpoint applied");

        let out = reports::setpoint_echo(device_id, &requested).correlated_to(&envelope.message);
        self.emit(out).await;
        Ok(DispatchOutcome::Handled)
    }

    pub(super) async fn get_setpoint_report(
        &mut self,
        envelope: &Envelope,
    ) -> Result<DispatchOutcome, BridgeError> {
        let device_id = envelope.address.device_id()?;
        let Some(device) = self.registry.device(device_id) else {
            return Ok(DispatchOutcome::Ignored);
        };
        if !device.has_target() {
            tracing::debug!(%device_id, "device has no target temperature");
            return Ok(DispatchOutcome::Handled);
        }
        let out = reports::setpoint_report(device_id, device.target_temp)
            .correlated_to(&envelope.message);
        self.emit(out).await;
        Ok(DispatchOutcome::Handled)
    }

    pub(super) async fn set_mode(
        &mut self,
        envelope: &Envelope,
    ) -> Result<DispatchOutcome, BridgeError> {
        let device_id = envelope.address.device_id()?;
        let mode: ThermostatMode = envelope.message.string_value()?.parse()?;
        let Some(target_temp) = self.registry.device(device_id).map(|d| d.target_temp) else {
            tracing::debug!(%device_id, "mode for unknown device");
            return Ok(DispatchOutcome::Ignored);
        };

        let token = self.access_token()?;
        self.cloud
            .set_mode(token, device_id, target_temp, mode)
            .await?;
        tracing::info!(%device_id, %mode, "mode applied");

        let out = reports::mode_report(device_id, mode.as_str()).correlated_to(&envelope.message);
        self.emit(out).await;
        Ok(DispatchOutcome::Handled)
    }

    pub(super) async fn get_mode_report(
        &mut self,
        envelope: &Envelope,
    ) -> Result<DispatchOutcome, BridgeError> {
        let device_id = envelope.address.device_id()?;
        let out = reports::mode_report(device_id, ThermostatMode::Heat.as_str())
            .correlated_to(&envelope.message);
        self.emit(out).await;
        Ok(DispatchOutcome::Handled)
    }
}
