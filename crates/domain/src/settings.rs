//! Adapter settings: the persisted, mutable configuration document.

use serde::{Deserialize, Serialize};

use crate::credentials::Credentials;
use crate::error::{AuthError, ValidationError};
use crate::time::Timestamp;

const REDACTED: &str = "********";

/// Vendor account used to obtain tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Account {
    /// Account e-mail.
    pub username: String,
    /// Account password.
    pub password: String,
    /// Open API access key.
    pub access_key: String,
    /// Open API secret token.
    pub secret_token: String,
}

impl Account {
    /// Ensure every field is filled.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingCredentials`] naming the first empty field.
    pub fn validate(&self) -> Result<(), AuthError> {
        let fields = [
            ("username", &self.username),
            ("password", &self.password),
            ("access_key", &self.access_key),
            ("secret_token", &self.secret_token),
        ];
        match fields.into_iter().find(|(_, value)| value.is_empty()) {
            Some((field, _)) => Err(AuthError::MissingCredentials { field }),
            None => Ok(()),
        }
    }
}

/// Persisted adapter settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterSettings {
    /// Vendor account.
    #[serde(flatten)]
    pub account: Account,
    /// Tokens issued for the account.
    #[serde(rename = "auth")]
    pub credentials: Credentials,
    /// Poll interval in minutes.
    pub poll_time_min: u64,
    /// Log level directive.
    pub log_level: String,
    /// Free-form flag settable from the hub.
    pub param_1: bool,
    /// Free-form text settable from the hub.
    pub param_2: String,
    /// Last known connection state, as text.
    pub connection_state: String,
    /// Last error, as text.
    pub errors: String,
    /// Time of the last write.
    pub configured_at: Option<Timestamp>,
    /// Who wrote the document last.
    pub configured_by: String,
}

impl Default for AdapterSettings {
    fn default() -> Self {
        Self {
            account: Account::default(),
            credentials: Credentials::default(),
            poll_time_min: 1,
            log_level: "info".to_string(),
            param_1: false,
            param_2: String::new(),
            connection_state: String::new(),
            errors: String::new(),
            configured_at: None,
            configured_by: String::new(),
        }
    }
}

/// Partial update accepted by `cmd.config.extended_set`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SettingsUpdate {
    /// New `param_1`.
    pub param_1: Option<bool>,
    /// New `param_2`.
    pub param_2: Option<String>,
    /// New poll interval in minutes.
    pub poll_time_min: Option<u64>,
}

impl AdapterSettings {
    /// Copy of the settings with every secret blanked, fit for reports.
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mask = |value: &str| {
            if value.is_empty() {
                String::new()
            } else {
                REDACTED.to_string()
            }
        };
        let mut copy = self.clone();
        copy.account.password = mask(&self.account.password);
        copy.account.secret_token = mask(&self.account.secret_token);
        copy.credentials.authorization_code = mask(&self.credentials.authorization_code);
        copy.credentials.access_token = mask(&self.credentials.access_token);
        copy.credentials.refresh_token = mask(&self.credentials.refresh_token);
        copy
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MalformedPayload`] when the poll interval
    /// is zero.
    pub fn apply(&mut self, update: SettingsUpdate) -> Result<(), ValidationError> {
        if update.poll_time_min == Some(0) {
            return Err(ValidationError::MalformedPayload {
                expected: "poll_time_min of at least one minute",
            });
        }
        if let Some(param_1) = update.param_1 {
            self.param_1 = param_1;
        }
        if let Some(param_2) = update.param_2 {
            self.param_2 = param_2;
        }
        if let Some(poll_time_min) = update.poll_time_min {
            self.poll_time_min = poll_time_min;
        }
        Ok(())
    }

    /// Stamp the document before it is written.
    pub fn touch(&mut self, now: Timestamp) {
        self.configured_at = Some(now);
        self.configured_by = "auto".to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn account() -> Account {
        Account {
            username: "user@example.com".to_string(),
            password: "hunter2".to_string(),
            access_key: "key".to_string(),
            secret_token: "secret".to_string(),
        }
    }

    #[test]
    fn should_accept_complete_account() {
        assert!(account().validate().is_ok());
    }

    #[test]
    fn should_name_first_missing_field() {
        let mut incomplete = account();
        incomplete.access_key.clear();
        let err = incomplete.validate().unwrap_err();
        assert!(matches!(
            err,
            AuthError::MissingCredentials {
                field: "access_key"
            }
        ));
    }

    #[test]
    fn should_blank_secrets_when_redacted() {
        let mut settings = AdapterSettings {
            account: account(),
            ..AdapterSettings::default()
        };
        settings.credentials.access_token = "token".to_string();
        let redacted = settings.redacted();
        assert_eq!(redacted.account.username, "user@example.com");
        assert_eq!(redacted.account.password, REDACTED);
        assert_eq!(redacted.credentials.access_token, REDACTED);
        assert_eq!(redacted.credentials.refresh_token, "");
    }

    #[test]
    fn should_apply_partial_update() {
        let mut settings = AdapterSettings::default();
        settings
            .apply(SettingsUpdate {
                param_2: Some("hello".to_string()),
                poll_time_min: Some(5),
                ..SettingsUpdate::default()
            })
            .unwrap();
        assert_eq!(settings.param_2, "hello");
        assert_eq!(settings.poll_time_min, 5);
        assert!(!settings.param_1);
    }

    #[test]
    fn should_reject_zero_poll_interval() {
        let mut settings = AdapterSettings::default();
        let result = settings.apply(SettingsUpdate {
            poll_time_min: Some(0),
            ..SettingsUpdate::default()
        });
        assert!(result.is_err());
        assert_eq!(settings.poll_time_min, 1);
    }

    #[test]
    fn should_read_document_with_vendor_token_names() {
        let settings: AdapterSettings = serde_json::from_value(json!({
            "username": "a",
            "poll_time_min": 3,
            "auth": { "access_token": "t", "expireTime": 10, "refresh_expireTime": 20 }
        }))
        .unwrap();
        assert_eq!(settings.account.username, "a");
        assert_eq!(settings.poll_time_min, 3);
        assert_eq!(settings.credentials.access_expires_at, 10);
        assert_eq!(settings.log_level, "info");
    }
}
