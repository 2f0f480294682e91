//! Storage port: the settings and registry documents.

use std::future::Future;

use millbridge_domain::error::BridgeError;
use millbridge_domain::registry::RegistrySnapshot;
use millbridge_domain::settings::AdapterSettings;

/// Loads and saves the two persisted documents.
pub trait StateStore {
    /// Load the settings document, if one was ever saved.
    fn load_settings(
        &self,
    ) -> impl Future<Output = Result<Option<AdapterSettings>, BridgeError>> + Send;

    /// Replace the settings document.
    fn save_settings(
        &self,
        settings: &AdapterSettings,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send;

    /// Load the registry snapshot, if one was ever saved.
    fn load_registry(
        &self,
    ) -> impl Future<Output = Result<Option<RegistrySnapshot>, BridgeError>> + Send;

    /// Replace the registry snapshot.
    fn save_registry(
        &self,
        snapshot: &RegistrySnapshot,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send;
}

impl<T: StateStore + Send + Sync> StateStore for std::sync::Arc<T> {
    fn load_settings(
        &self,
    ) -> impl Future<Output = Result<Option<AdapterSettings>, BridgeError>> + Send {
        (**self).load_settings()
    }

    fn save_settings(
        &self,
        settings: &AdapterSettings,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send {
        (**self).save_settings(settings)
    }

    fn load_registry(
        &self,
    ) -> impl Future<Output = Result<Option<RegistrySnapshot>, BridgeError>> + Send {
        (**self).load_registry()
    }

    fn save_registry(
        &self,
        snapshot: &RegistrySnapshot,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send {
        (**self).save_registry(snapshot)
    }
}
