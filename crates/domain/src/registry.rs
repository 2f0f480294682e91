//! Device registry: the flat, ordered list of every known heater.
//!
//! The registry is rebuilt in full on every sync pass. Positions are only
//! meaningful within one pass; the device id is the durable key.

use serde::{Deserialize, Serialize};

use crate::device::Device;
use crate::error::NotFoundError;
use crate::id::{DeviceId, HomeId, RoomId};
use crate::topology::{Home, Room};

/// Where a device was discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Placement {
    /// Attached to a room.
    Room(RoomId),
    /// Not assigned to any room of the home.
    Independent(HomeId),
}

impl Placement {
    /// Whether the device is an independent one.
    #[must_use]
    pub fn is_independent(self) -> bool {
        matches!(self, Self::Independent(_))
    }
}

/// One device and where it was found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryEntry {
    /// The device record.
    #[serde(flatten)]
    pub device: Device,
    /// Origin of the record.
    pub placement: Placement,
}

/// Flat registry of homes, rooms and devices produced by one sync pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceRegistry {
    homes: Vec<Home>,
    rooms: Vec<Room>,
    entries: Vec<RegistryEntry>,
}

impl DeviceRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a home.
    pub fn push_home(&mut self, home: Home) {
        self.homes.push(home);
    }

    /// Record a room.
    pub fn push_room(&mut self, room: Room) {
        self.rooms.push(room);
    }

    /// Append a device.
    ///
    /// When a device with the same id is already present, the new record
    /// replaces it in place (last write wins) and the previous placement is
    /// returned so the caller can report the collision.
    pub fn push(&mut self, device: Device, placement: Placement) -> Option<Placement> {
        if let Some(existing) = self
            .entries
            .iter_mut()
            .find(|entry| entry.device.device_id == device.device_id)
        {
            let previous = existing.placement;
            *existing = RegistryEntry { device, placement };
            return Some(previous);
        }
        self.entries.push(RegistryEntry { device, placement });
        None
    }

    /// Resolve a device id to its position.
    ///
    /// Room-attached entries are scanned before independent ones.
    ///
    /// # Errors
    ///
    /// Returns [`NotFoundError`] when no entry carries `id`.
    pub fn find_by_device_id(&self, id: DeviceId) -> Result<usize, NotFoundError> {
        let room_match = self
            .entries
            .iter()
            .position(|e| !e.placement.is_independent() && e.device.device_id == id);
        room_match
            .or_else(|| {
                self.entries
                    .iter()
                    .position(|e| e.placement.is_independent() && e.device.device_id == id)
            })
            .ok_or_else(|| NotFoundError {
                entity: "Device",
                id: id.to_string(),
            })
    }

    /// Entry at `index`, if any.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&RegistryEntry> {
        self.entries.get(index)
    }

    /// Device carrying `id`, if any.
    #[must_use]
    pub fn device(&self, id: DeviceId) -> Option<&Device> {
        self.find_by_device_id(id)
            .ok()
            .and_then(|index| self.get(index))
            .map(|entry| &entry.device)
    }

    /// Whether a device with `id` is known.
    #[must_use]
    pub fn contains(&self, id: DeviceId) -> bool {
        self.entries.iter().any(|e| e.device.device_id == id)
    }

    /// Every entry in sync order.
    #[must_use]
    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    /// Every device in sync order.
    pub fn devices(&self) -> impl Iterator<Item = &Device> {
        self.entries.iter().map(|e| &e.device)
    }

    /// Devices that are not assigned to a room.
    pub fn independent_devices(&self) -> impl Iterator<Item = &Device> {
        self.entries
            .iter()
            .filter(|e| e.placement.is_independent())
            .map(|e| &e.device)
    }

    /// Ids of every device in sync order.
    #[must_use]
    pub fn device_ids(&self) -> Vec<DeviceId> {
        self.devices().map(|d| d.device_id).collect()
    }

    /// Homes seen during the pass.
    #[must_use]
    pub fn homes(&self) -> &[Home] {
        &self.homes
    }

    /// Rooms seen during the pass.
    #[must_use]
    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    /// Number of devices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no device is known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Persistable form of the registry.
    #[must_use]
    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            homes: self.homes.clone(),
            rooms: self.rooms.clone(),
            devices: self.entries.clone(),
            independent_devices: self.independent_devices().cloned().collect(),
        }
    }
}

/// Persisted registry document.
///
/// `independent_devices` duplicates the independent subset of `devices`
/// for consumers reading the document directly; restoring only reads
/// `devices`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrySnapshot {
    /// Homes of the last pass.
    pub homes: Vec<Home>,
    /// Rooms of the last pass.
    pub rooms: Vec<Room>,
    /// Every device of the last pass.
    pub devices: Vec<RegistryEntry>,
    /// Independent devices of the last pass.
    pub independent_devices: Vec<Device>,
}

impl From<RegistrySnapshot> for DeviceRegistry {
    fn from(snapshot: RegistrySnapshot) -> Self {
        let mut registry = Self {
            homes: snapshot.homes,
            rooms: snapshot.rooms,
            entries: Vec::with_capacity(snapshot.devices.len()),
        };
        for entry in snapshot.devices {
            registry.push(entry.device, entry.placement);
        }
        registry
    }
}
