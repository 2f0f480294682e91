//! # millbridge-domain
//!
//! Pure domain model for the Mill heater bridge.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Credentials** and the refresh decision for the dual-expiry tokens
//! - Define **Homes**, **Rooms** and **Devices** as returned by the cloud
//! - Define the **Device Registry** and identity resolution by device id
//! - Define **bus addresses** and **bus messages**
//! - Build **inclusion reports** describing a heater's services
//! - Hold the persisted **adapter settings** and the lifecycle states
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod address;
pub mod credentials;
pub mod device;
pub mod inclusion;
pub mod lifecycle;
pub mod message;
pub mod registry;
pub mod setpoint;
pub mod settings;
pub mod topology;
