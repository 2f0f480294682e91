//! # millbridge-adapter-mqtt
//!
//! MQTT adapter: connects the bridge to the hub's message bus.
//!
//! ## Responsibilities
//! - Connect to the MQTT broker and (re)subscribe to the adapter and device
//!   command topics after every connect
//! - Decode inbound publishes into `Envelope`s and queue them for the worker
//! - Implement the `BusPublisher` port for outbound events
//!
//! ## Dependency rule
//! Same as other adapters: depends on `millbridge-app` and `millbridge-domain`.

pub mod bus;
pub mod config;
pub mod error;
pub mod inbound;

pub use bus::{MqttBus, connect};
pub use config::MqttConfig;
pub use error::MqttError;
pub use inbound::MqttInbound;
