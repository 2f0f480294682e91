//! # millbridge-app
//!
//! Application layer: use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `CloudApi`: requests against the heater cloud
//!   - `BusPublisher`: publish messages on the home-automation bus
//!   - `StateStore`: load and save the settings and registry documents
//!   - `LogLevelControl`: change the log level at runtime
//! - Run the **token lifecycle** and the **hierarchical sync** as services
//! - Translate inbound bus commands into cloud calls and bus events
//!   (`CommandRouter`)
//! - Serialize every inbound message and poll tick through one `Worker`
//! - Provide **in-process infrastructure** (bus, poller) that doesn't need IO
//!
//! ## Dependency rule
//! Depends on `millbridge-domain` only (plus `tokio` for channels and timers).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod event_bus;
pub mod poller;
pub mod ports;
pub mod reports;
pub mod router;
pub mod services;
pub mod worker;

#[cfg(test)]
mod fakes;
