//! Hierarchical sync: walk homes, rooms and devices and flatten them into
//! a fresh [`DeviceRegistry`].

use millbridge_domain::error::BridgeError;
use millbridge_domain::registry::{DeviceRegistry, Placement};

use crate::ports::CloudApi;

/// Rebuild the registry from the cloud.
///
/// Devices appear in home, then room, then device order, with the
/// independent devices of a home appended after all of its room devices.
/// A failure listing the rooms, devices or independent devices of one
/// branch is logged and that branch is skipped; only a failure listing
/// the homes aborts the pass.
///
/// # Errors
///
/// Returns the error of `list_homes` when the home list cannot be fetched.
#[tracing::instrument(skip_all)]
pub async fn synchronize<C: CloudApi>(
    cloud: &C,
    access_token: &str,
) -> Result<DeviceRegistry, BridgeError> {
    let mut registry = DeviceRegistry::new();
    if access_token.is_empty() {
        tracing::debug!("no access token, skipping sync");
        return Ok(registry);
    }

    let homes = cloud.list_homes(access_token).await?;
    for home in homes {
        let home_id = home.home_id;
        registry.push_home(home);

        match cloud.list_rooms(access_token, home_id).await {
            Ok(rooms) => {
                for room in rooms {
                    let room_id = room.room_id;
                    registry.push_room(room);
                    match cloud.list_devices(access_token, room_id).await {
                        Ok(devices) => {
                            for device in devices {
                                push_device(&mut registry, device, Placement::Room(room_id));
                            }
                        }
                        Err(err) => {
                            tracing::warn!(%room_id, error = %err, "skipping room devices");
                        }
                    }
                }
            }
            Err(err) => tracing::warn!(%home_id, error = %err, "skipping home rooms"),
        }

        match cloud.list_independent_devices(access_token, home_id).await {
            Ok(devices) => {
                for device in devices {
                    push_device(&mut registry, device, Placement::Independent(home_id));
                }
            }
            Err(err) => tracing::warn!(%home_id, error = %err, "skipping independent devices"),
        }
    }

    tracing::debug!(
        homes = registry.homes().len(),
        rooms = registry.rooms().len(),
        devices = registry.len(),
        "sync pass complete"
    );
    Ok(registry)
}

fn push_device(
    registry: &mut DeviceRegistry,
    device: millbridge_domain::device::Device,
    placement: Placement,
) {
    let device_id = device.device_id;
    if let Some(previous) = registry.push(device, placement) {
        tracing::warn!(
            %device_id,
            ?previous,
            current = ?placement,
            "duplicate device id, keeping the last record"
        );
    }
}
