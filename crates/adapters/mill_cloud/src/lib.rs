//! Mill cloud adapter.
//!
//! Talks to the vendor's open API over HTTPS and implements
//! [`millbridge_app::ports::CloudApi`]. Every call is a single POST; the
//! client never retries and never holds tokens itself.

pub mod client;
pub mod config;
pub mod error;
pub mod models;

pub use client::MillClient;
pub use config::MillCloudConfig;
pub use error::CloudError;
