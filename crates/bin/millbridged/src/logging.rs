//! Subscriber setup and runtime log level changes.

use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry, fmt, reload};

use millbridge_app::ports::LogLevelControl;
use millbridge_domain::error::{BridgeError, ValidationError};

/// Swaps the active filter of the global subscriber.
#[derive(Clone)]
pub struct ReloadHandle {
    handle: reload::Handle<EnvFilter, Registry>,
}

/// Install the global subscriber with `filter` as the initial directive.
/// An unparsable directive falls back to `info`.
pub fn init(filter: &str) -> ReloadHandle {
    let env_filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    let (layer, handle) = reload::Layer::new(env_filter);
    tracing_subscriber::registry()
        .with(layer)
        .with(fmt::layer().with_target(true))
        .init();
    ReloadHandle { handle }
}

impl LogLevelControl for ReloadHandle {
    fn set_level(&self, level: Level) -> Result<(), BridgeError> {
        let filter = EnvFilter::default().add_directive(LevelFilter::from_level(level).into());
        self.handle.reload(filter).map_err(|err| {
            tracing::warn!(error = %err, "failed to reload log filter");
            ValidationError::InvalidLogLevel(level.to_string()).into()
        })
    }
}
