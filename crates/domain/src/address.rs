//! Bus addresses: the segments of a FIMP topic.
//!
//! A topic looks like
//! `pt:j1/mt:cmd/rt:dev/rn:mill/ad:1/sv:thermostat/ad:4398046511104_0`.
//! Device service addresses may carry adapter decorations (a logical
//! channel suffix such as `_0` and a leading `l` marker) that must be
//! stripped to recover the vendor device id.

use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::id::DeviceId;

/// Resource name under which this adapter is registered on the bus.
pub const RESOURCE_NAME: &str = "mill";

/// Resource address of this adapter instance.
pub const RESOURCE_ADDRESS: &str = "1";

/// Message kind segment (`mt:`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// Command sent to the adapter.
    Command,
    /// Event emitted by the adapter.
    Event,
}

impl MessageKind {
    fn as_str(self) -> &'static str {
        match self {
            Self::Command => "cmd",
            Self::Event => "evt",
        }
    }
}

/// Resource type segment (`rt:`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceType {
    /// A device hosted by the adapter.
    Device,
    /// The adapter itself.
    Adapter,
    /// An application.
    App,
}

impl ResourceType {
    fn as_str(self) -> &'static str {
        match self {
            Self::Device => "dev",
            Self::Adapter => "ad",
            Self::App => "app",
        }
    }
}

/// Parsed bus topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    /// Message kind.
    pub kind: MessageKind,
    /// Resource type.
    pub resource_type: ResourceType,
    /// Resource name, `mill` for this adapter.
    pub resource_name: String,
    /// Resource address, `1` for this adapter.
    pub resource_address: String,
    /// Service name, present for device topics.
    pub service_name: Option<String>,
    /// Service address, present for device topics.
    pub service_address: Option<String>,
}

impl Address {
    /// Event topic of the adapter itself.
    #[must_use]
    pub fn adapter_event() -> Self {
        Self {
            kind: MessageKind::Event,
            resource_type: ResourceType::Adapter,
            resource_name: RESOURCE_NAME.to_string(),
            resource_address: RESOURCE_ADDRESS.to_string(),
            service_name: None,
            service_address: None,
        }
    }

    /// Event topic of one service of one device.
    #[must_use]
    pub fn device_event(service: &str, device_id: DeviceId) -> Self {
        Self {
            kind: MessageKind::Event,
            resource_type: ResourceType::Device,
            resource_name: RESOURCE_NAME.to_string(),
            resource_address: RESOURCE_ADDRESS.to_string(),
            service_name: Some(service.to_string()),
            service_address: Some(device_id.to_string()),
        }
    }

    /// Topic subscriptions covering every command addressed to the adapter.
    #[must_use]
    pub fn subscriptions() -> [String; 2] {
        [
            format!("pt:j1/+/rt:dev/rn:{RESOURCE_NAME}/ad:{RESOURCE_ADDRESS}/#"),
            format!("pt:j1/+/rt:ad/rn:{RESOURCE_NAME}/ad:{RESOURCE_ADDRESS}"),
        ]
    }

    /// Service address path used inside inclusion reports, e.g.
    /// `/rt:dev/rn:mill/ad:1/sv:thermostat/ad:42`.
    #[must_use]
    pub fn service_path(service: &str, device_id: DeviceId) -> String {
        format!("/rt:dev/rn:{RESOURCE_NAME}/ad:{RESOURCE_ADDRESS}/sv:{service}/ad:{device_id}")
    }

    /// Resolve the vendor device id carried by the service address.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidAddress`] when the topic has no
    /// service address or the stripped address is not numeric.
    pub fn device_id(&self) -> Result<DeviceId, ValidationError> {
        let raw = self
            .service_address
            .as_deref()
            .ok_or_else(|| ValidationError::InvalidAddress(self.to_string()))?;
        device_id_from_service_address(raw)
    }
}

/// Strip adapter decorations from a service address and parse the
/// remainder as a device id.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidAddress`] when nothing numeric is left.
pub fn device_id_from_service_address(raw: &str) -> Result<DeviceId, ValidationError> {
    let trimmed = raw.trim();
    let without_channel = match trimmed.rsplit_once('_') {
        Some((head, tail)) if !tail.is_empty() && tail.bytes().all(|b| b.is_ascii_digit()) => head,
        _ => trimmed,
    };
    let without_marker = without_channel
        .strip_prefix('l')
        .unwrap_or(without_channel);
    without_marker
        .parse()
        .map_err(|_| ValidationError::InvalidAddress(raw.to_string()))
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pt:j1/mt:{}/rt:{}/rn:{}/ad:{}",
            self.kind.as_str(),
            self.resource_type.as_str(),
            self.resource_name,
            self.resource_address
        )?;
        if let (Some(service), Some(address)) = (&self.service_name, &self.service_address) {
            write!(f, "/sv:{service}/ad:{address}")?;
        }
        Ok(())
    }
}

impl FromStr for Address {
    type Err = ValidationError;

    fn from_str(topic: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidAddress(topic.to_string());
        let mut segments = topic.trim_start_matches('/').split('/');

        segment(&mut segments, "pt:").ok_or_else(invalid)?;
        let kind = match segment(&mut segments, "mt:") {
            Some("cmd") => MessageKind::Command,
            Some("evt") => MessageKind::Event,
            _ => return Err(invalid()),
        };
        let resource_type = match segment(&mut segments, "rt:") {
            Some("dev") => ResourceType::Device,
            Some("ad") => ResourceType::Adapter,
            Some("app") => ResourceType::App,
            _ => return Err(invalid()),
        };
        let resource_name = segment(&mut segments, "rn:").ok_or_else(invalid)?.to_string();
        let resource_address = segment(&mut segments, "ad:").ok_or_else(invalid)?.to_string();
        let (service_name, service_address) = match segment(&mut segments, "sv:") {
            Some(service) => {
                let address = segment(&mut segments, "ad:").ok_or_else(invalid)?;
                (Some(service.to_string()), Some(address.to_string()))
            }
            None => (None, None),
        };

        Ok(Self {
            kind,
            resource_type,
            resource_name,
            resource_address,
            service_name,
            service_address,
        })
    }
}

fn segment<'a>(segments: &mut impl Iterator<Item = &'a str>, prefix: &str) -> Option<&'a str> {
    segments.next().and_then(|s| s.strip_prefix(prefix))
}
