//! Logging port: runtime log level changes.

use millbridge_domain::error::BridgeError;
use tracing::Level;

/// Applies a new maximum log level to the running process.
pub trait LogLevelControl {
    /// Switch the process to `level`.
    ///
    /// # Errors
    ///
    /// Returns an error when the logging backend refuses the change.
    fn set_level(&self, level: Level) -> Result<(), BridgeError>;
}

impl<T: LogLevelControl> LogLevelControl for std::sync::Arc<T> {
    fn set_level(&self, level: Level) -> Result<(), BridgeError> {
        (**self).set_level(level)
    }
}
