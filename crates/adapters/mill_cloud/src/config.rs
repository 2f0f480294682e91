use std::time::Duration;

use serde::Deserialize;

/// Connection settings for the Mill cloud API.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MillCloudConfig {
    /// Root of the API, with a trailing slash.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for MillCloudConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.millheat.com/".to_string(),
            timeout_secs: 30,
        }
    }
}

impl MillCloudConfig {
    /// Request timeout as a [`Duration`].
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
