//! # millbridge-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the `StateStore` port defined in `millbridge-app::ports::store`
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//! - Store the settings and the registry snapshot as JSON documents
//!
//! ## Dependency rule
//! Depends on `millbridge-app` (for port traits) and `millbridge-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

pub mod error;
pub mod pool;
pub mod store;

pub use error::StorageError;
pub use pool::{Config, Database};
pub use store::SqliteStateStore;
