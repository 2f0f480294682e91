use millbridge_domain::error::BridgeError;
use millbridge_domain::message::Envelope;

use super::{CommandRouter, DispatchOutcome};
use crate::ports::{BusPublisher, CloudApi, LogLevelControl, StateStore};
use crate::reports;

impl<C, B, S, L> CommandRouter<C, B, S, L>
where
    C: CloudApi + Send + Sync,
    B: BusPublisher + Send + Sync,
    S: StateStore + Send + Sync,
    L: LogLevelControl + Send + Sync,
{
    pub(super) async fn get_sensor_report(
        &mut self,
        envelope: &Envelope,
    ) -> Result<DispatchOutcome, BridgeError> {
        let device_id = envelope.address.device_id()?;
        let Some(device) = self.registry.device(device_id) else {
            tracing::debug!(%device_id, "sensor report for unknown device");
            return Ok(DispatchOutcome::Ignored);
        };
        let out = reports::sensor_report(device_id, device.current_temp)
            .correlated_to(&envelope.message);
        self.emit(out).await;
        Ok(DispatchOutcome::Handled)
    }
}
