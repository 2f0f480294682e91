//! MQTT connection configuration.

use std::time::Duration;

use rumqttc::MqttOptions;
use serde::Deserialize;

/// Configuration for the MQTT connection.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    /// MQTT broker hostname or IP address.
    pub broker_host: String,
    /// MQTT broker port.
    pub broker_port: u16,
    /// MQTT client identifier.
    pub client_id: String,
    /// Optional user name.
    pub username: Option<String>,
    /// Optional password, only used together with `username`.
    pub password: Option<String>,
    /// Keep-alive interval in seconds.
    pub keep_alive_secs: u16,
    /// Capacity of the client request channel.
    pub channel_capacity: usize,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            broker_host: "localhost".to_string(),
            broker_port: 1883,
            client_id: "millbridge".to_string(),
            username: None,
            password: None,
            keep_alive_secs: 30,
            channel_capacity: 64,
        }
    }
}

impl MqttConfig {
    /// Build the rumqttc options for this configuration.
    #[must_use]
    pub fn options(&self) -> MqttOptions {
        let mut options = MqttOptions::new(&self.client_id, &self.broker_host, self.broker_port);
        options.set_keep_alive(Duration::from_secs(u64::from(self.keep_alive_secs)));
        if let Some(username) = &self.username {
            options.set_credentials(username, self.password.clone().unwrap_or_default());
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_have_sensible_defaults() {
        let config = MqttConfig::default();
        assert_eq!(config.broker_host, "localhost");
        assert_eq!(config.broker_port, 1883);
        assert_eq!(config.client_id, "millbridge");
        assert!(config.username.is_none());
        assert_eq!(config.keep_alive_secs, 30);
    }

    #[test]
    fn should_deserialize_from_toml() {
        let toml = r#"
            broker_host = "futurehome.local"
            broker_port = 1884
            client_id = "mill-adapter"
            username = "hub"
            password = "secret"
            keep_alive_secs = 60
        "#;
        let config: MqttConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.broker_host, "futurehome.local");
        assert_eq!(config.broker_port, 1884);
        assert_eq!(config.client_id, "mill-adapter");
        assert_eq!(config.username.as_deref(), Some("hub"));
        assert_eq!(config.password.as_deref(), Some("secret"));
        assert_eq!(config.keep_alive_secs, 60);
    }

    #[test]
    fn should_use_defaults_for_missing_fields() {
        let toml = r#"broker_host = "192.168.1.100""#;
        let config: MqttConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.broker_host, "192.168.1.100");
        assert_eq!(config.broker_port, 1883);
        assert_eq!(config.client_id, "millbridge");
    }

    #[test]
    fn should_build_options_with_keep_alive() {
        let config = MqttConfig {
            keep_alive_secs: 45,
            ..MqttConfig::default()
        };
        let options = config.options();
        assert_eq!(options.keep_alive(), Duration::from_secs(45));
        assert_eq!(options.broker_address(), ("localhost".to_string(), 1883));
    }
}
