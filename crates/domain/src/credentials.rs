//! Credentials: the OAuth-style token pair issued by the cloud and its two
//! expiry instants.

use serde::{Deserialize, Serialize};

use crate::time::EpochMillis;

/// Tokens issued by a successful exchange or refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenGrant {
    /// Short lived bearer token.
    pub access_token: String,
    /// Long lived token used to obtain a new access token.
    pub refresh_token: String,
    /// Access token expiry, epoch milliseconds.
    pub access_expires_at: EpochMillis,
    /// Refresh token expiry, epoch milliseconds.
    pub refresh_expires_at: EpochMillis,
}

/// Outcome of comparing the expiry instants against the current time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshDecision {
    /// The access token is still valid, or an expiry is unset.
    Skip,
    /// The access token expired but the refresh token is still valid.
    Refresh,
    /// Both tokens expired. Only a new login can recover.
    WindowElapsed,
}

/// Credentials held by the adapter.
///
/// An expiry of `0` means "unset". A non-empty access token with no expiry
/// is treated as never needing refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    /// Code obtained from the access key and secret token.
    pub authorization_code: String,
    /// Bearer token sent with every resource request.
    pub access_token: String,
    /// Token used to obtain a fresh access token.
    pub refresh_token: String,
    /// Access token expiry, epoch milliseconds.
    #[serde(rename = "expireTime")]
    pub access_expires_at: EpochMillis,
    /// Refresh token expiry, epoch milliseconds.
    #[serde(rename = "refresh_expireTime")]
    pub refresh_expires_at: EpochMillis,
}

impl Credentials {
    /// Whether an access token is held.
    #[must_use]
    pub fn has_access_token(&self) -> bool {
        !self.access_token.is_empty()
    }

    /// Decide whether the access token must be refreshed at `now`.
    #[must_use]
    pub fn refresh_decision(&self, now: EpochMillis) -> RefreshDecision {
        if self.access_expires_at == 0 || self.refresh_expires_at == 0 {
            return RefreshDecision::Skip;
        }
        if now > self.access_expires_at && now < self.refresh_expires_at {
            RefreshDecision::Refresh
        } else if now > self.refresh_expires_at {
            RefreshDecision::WindowElapsed
        } else {
            RefreshDecision::Skip
        }
    }

    /// Replace all four token fields with the content of `grant` in one
    /// assignment.
    pub fn replace_with(&mut self, grant: TokenGrant) {
        *self = Self {
            authorization_code: std::mem::take(&mut self.authorization_code),
            access_token: grant.access_token,
            refresh_token: grant.refresh_token,
            access_expires_at: grant.access_expires_at,
            refresh_expires_at: grant.refresh_expires_at,
        };
    }

    /// Force the next cycle to attempt a refresh.
    pub fn expire_access_token(&mut self, now: EpochMillis) {
        self.access_expires_at = now;
    }

    /// Forget every token.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: i64 = 3_600_000;

    fn credentials(access_expires_at: i64, refresh_expires_at: i64) -> Credentials {
        Credentials {
            authorization_code: "code".to_string(),
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            access_expires_at,
            refresh_expires_at,
        }
    }

    #[test]
    fn should_skip_when_expiry_is_unset() {
        let creds = credentials(0, 0);
        assert_eq!(creds.refresh_decision(10 * HOUR), RefreshDecision::Skip);
    }

    #[test]
    fn should_skip_when_refresh_expiry_is_unset() {
        let creds = credentials(2 * HOUR, 0);
        assert_eq!(creds.refresh_decision(HOUR), RefreshDecision::Skip);
        assert_eq!(creds.refresh_decision(3 * HOUR), RefreshDecision::Skip);
    }

    #[test]
    fn should_skip_when_access_token_is_still_valid() {
        let creds = credentials(2 * HOUR, 720 * HOUR);
        assert_eq!(creds.refresh_decision(HOUR), RefreshDecision::Skip);
    }

    #[test]
    fn should_refresh_when_only_access_token_expired() {
        let creds = credentials(2 * HOUR, 720 * HOUR);
        assert_eq!(creds.refresh_decision(3 * HOUR), RefreshDecision::Refresh);
    }

    #[test]
    fn should_report_window_elapsed_when_refresh_token_expired() {
        let creds = credentials(2 * HOUR, 720 * HOUR);
        assert_eq!(
            creds.refresh_decision(721 * HOUR),
            RefreshDecision::WindowElapsed
        );
    }

    #[test]
    fn should_replace_all_token_fields_and_keep_authorization_code() {
        let mut creds = credentials(2 * HOUR, 720 * HOUR);
        creds.replace_with(TokenGrant {
            access_token: "new-access".to_string(),
            refresh_token: "new-refresh".to_string(),
            access_expires_at: 5 * HOUR,
            refresh_expires_at: 800 * HOUR,
        });
        assert_eq!(creds.authorization_code, "code");
        assert_eq!(creds.access_token, "new-access");
        assert_eq!(creds.refresh_token, "new-refresh");
        assert_eq!(creds.access_expires_at, 5 * HOUR);
        assert_eq!(creds.refresh_expires_at, 800 * HOUR);
    }

    #[test]
    fn should_use_vendor_field_names_when_serialized() {
        let json = serde_json::to_value(credentials(1, 2)).unwrap();
        assert_eq!(json["expireTime"], 1);
        assert_eq!(json["refresh_expireTime"], 2);
        assert_eq!(json["access_token"], "access");
    }

    #[test]
    fn should_clear_every_field() {
        let mut creds = credentials(1, 2);
        creds.clear();
        assert_eq!(creds, Credentials::default());
        assert!(!creds.has_access_token());
    }
}
