//! Configuration loading: TOML file with environment variable overrides.
//!
//! Reads `millbridge.toml` unless another path is given on the command
//! line. Every field has a default so the file is optional. Environment
//! variables take precedence over file values.

use std::path::PathBuf;

use serde::Deserialize;

use millbridge_adapter_mill_cloud::MillCloudConfig;
use millbridge_adapter_mqtt::MqttConfig;
use millbridge_adapter_storage_sqlite_sqlx::Config as DatabaseConfig;

/// Config file read when no path is given.
pub const DEFAULT_PATH: &str = "millbridge.toml";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// MQTT broker connection.
    pub mqtt: MqttConfig,
    /// Mill cloud endpoint.
    pub cloud: MillCloudConfig,
    /// Database settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Adapter service settings.
    pub service: ServiceConfig,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
    /// Set when the filter came from the environment.
    #[serde(skip)]
    pub from_env: bool,
}

/// Adapter service settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// JSON manifest served by `cmd.app.get_manifest`.
    pub manifest_path: Option<PathBuf>,
    /// Poll interval in minutes until one is set over the bus.
    pub default_poll_time_min: u64,
}

impl Config {
    /// Load configuration from `path` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// result fails validation.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("MILLBRIDGE_MQTT_HOST") {
            self.mqtt.broker_host = val;
        }
        if let Ok(val) = std::env::var("MILLBRIDGE_MQTT_PORT")
            && let Ok(port) = val.parse()
        {
            self.mqtt.broker_port = port;
        }
        if let Ok(val) = std::env::var("MILLBRIDGE_CLOUD_URL") {
            self.cloud.base_url = val;
        }
        if let Ok(val) = std::env::var("MILLBRIDGE_DATABASE_URL") {
            self.database.database_url = val;
        }
        if let Ok(val) = std::env::var("MILLBRIDGE_LOG") {
            self.logging.filter = val;
            self.logging.from_env = true;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
            self.logging.from_env = true;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.mqtt.broker_port == 0 {
            return Err(ConfigError::Validation(
                "mqtt broker port must be non-zero".to_string(),
            ));
        }
        if self.cloud.base_url.trim().is_empty() {
            return Err(ConfigError::Validation(
                "cloud base url must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Read the manifest document, or `null` when none is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not JSON.
    pub fn load_manifest(&self) -> Result<serde_json::Value, ConfigError> {
        let Some(path) = &self.service.manifest_path else {
            return Ok(serde_json::Value::Null);
        };
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(ConfigError::Manifest)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            from_env: false,
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            manifest_path: None,
            default_poll_time_min: 1,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read file")]
    Io(#[from] std::io::Error),
    /// The manifest is not valid JSON.
    #[error("failed to parse manifest")]
    Manifest(#[source] serde_json::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert_eq!(config.mqtt.broker_host, "localhost");
        assert_eq!(config.mqtt.broker_port, 1883);
        assert_eq!(config.cloud.base_url, "https://api.millheat.com/");
        assert_eq!(config.database.database_url, "sqlite:millbridge.db");
        assert_eq!(config.logging.filter, "info");
        assert_eq!(config.service.default_poll_time_min, 1);
        assert!(config.service.manifest_path.is_none());
    }

    #[test]
    fn should_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.mqtt.broker_port, 1883);
    }

    #[test]
    fn should_parse_full_toml() {
        let toml = "
            [mqtt]
            broker_host = 'broker.local'
            broker_port = 1884
            client_id = 'bridge-1'
            username = 'hub'
            password = 'secret'

            [cloud]
            base_url = 'http://127.0.0.1:9000/'
            timeout_secs = 10

            [database]
            url = 'sqlite::memory:'

            [logging]
            filter = 'debug'

            [service]
            manifest_path = '/etc/millbridge/manifest.json'
            default_poll_time_min = 5
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.mqtt.broker_host, "broker.local");
        assert_eq!(config.mqtt.broker_port, 1884);
        assert_eq!(config.mqtt.username.as_deref(), Some("hub"));
        assert_eq!(config.cloud.base_url, "http://127.0.0.1:9000/");
        assert_eq!(config.cloud.timeout_secs, 10);
        assert_eq!(config.database.database_url, "sqlite::memory:");
        assert_eq!(config.logging.filter, "debug");
        assert_eq!(
            config.service.manifest_path,
            Some(PathBuf::from("/etc/millbridge/manifest.json"))
        );
        assert_eq!(config.service.default_poll_time_min, 5);
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert_eq!(config.mqtt.broker_port, 1883);
    }

    #[test]
    fn should_reject_zero_port() {
        let mut config = Config::default();
        config.mqtt.broker_port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_empty_cloud_url() {
        let mut config = Config::default();
        config.cloud.base_url = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_accept_defaults() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn should_return_null_manifest_when_unset() {
        let manifest = Config::default().load_manifest().unwrap();
        assert!(manifest.is_null());
    }

    #[test]
    fn should_fail_on_missing_manifest_file() {
        let mut config = Config::default();
        config.service.manifest_path = Some(PathBuf::from("/nonexistent/manifest.json"));
        assert!(matches!(config.load_manifest(), Err(ConfigError::Io(_))));
    }

    #[test]
    fn should_report_parse_error_for_invalid_toml() {
        let result: Result<Config, _> = toml::from_str("invalid {{{");
        assert!(result.is_err());
    }
}
