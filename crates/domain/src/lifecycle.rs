//! Adapter lifecycle: the states reported to the hub.

use serde::{Deserialize, Serialize};

/// Overall application state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppState {
    /// Booting.
    Starting,
    /// Boot failed.
    StartupError,
    /// Waiting for credentials.
    NotConfigured,
    /// Running with errors.
    Error,
    /// Running.
    Running,
    /// Stopped.
    Terminated,
}

/// Configuration state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfigState {
    /// No account configured.
    NotConfigured,
    /// Account configured.
    Configured,
    /// Configuration in progress.
    InProgress,
}

/// Connection state towards the cloud.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionState {
    /// The last sync pass reached the cloud.
    Connected,
    /// The last sync pass failed.
    Disconnected,
    /// Not applicable.
    #[serde(rename = "NA")]
    NotApplicable,
}

/// Authentication state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthState {
    /// No token held.
    NotAuthenticated,
    /// Tokens held and valid.
    Authenticated,
    /// The last refresh or login failed.
    Error,
    /// The refresh window elapsed; only a new login can recover.
    ReloginRequired,
}

impl AuthState {
    /// Status string used in `evt.auth.status_report`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotAuthenticated => "NOT_AUTHENTICATED",
            Self::Authenticated => "AUTHENTICATED",
            Self::Error => "ERROR",
            Self::ReloginRequired => "RELOGIN_REQUIRED",
        }
    }
}

/// Snapshot of every lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppLifecycle {
    /// Application state.
    pub app: AppState,
    /// Connection state.
    pub connection: ConnectionState,
    /// Configuration state.
    pub config: ConfigState,
    /// Authentication state.
    pub auth: AuthState,
}

impl Default for AppLifecycle {
    fn default() -> Self {
        Self {
            app: AppState::Starting,
            connection: ConnectionState::Disconnected,
            config: ConfigState::NotConfigured,
            auth: AuthState::NotAuthenticated,
        }
    }
}

impl AppLifecycle {
    /// Derive the startup states from whether an access token and an
    /// authorization code are held.
    #[must_use]
    pub fn at_startup(has_access_token: bool, has_authorization: bool) -> Self {
        let (app, config) = if has_access_token {
            (AppState::Running, ConfigState::Configured)
        } else {
            (AppState::NotConfigured, ConfigState::NotConfigured)
        };
        let auth = if has_authorization || has_access_token {
            AuthState::Authenticated
        } else {
            AuthState::NotAuthenticated
        };
        Self {
            app,
            connection: ConnectionState::Disconnected,
            config,
            auth,
        }
    }

    /// Move to the unconfigured, unauthenticated state.
    pub fn reset(&mut self) {
        self.app = AppState::NotConfigured;
        self.config = ConfigState::NotConfigured;
        self.auth = AuthState::NotAuthenticated;
        self.connection = ConnectionState::Disconnected;
    }
}

/// Payload of `evt.auth.status_report`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthStatus {
    /// Status string.
    pub status: String,
    /// Human readable error.
    pub error_text: String,
    /// Machine readable error.
    pub error_code: String,
}

impl AuthStatus {
    /// Status without error.
    #[must_use]
    pub fn ok(state: AuthState) -> Self {
        Self {
            status: state.as_str().to_string(),
            ..Self::default()
        }
    }

    /// Failed status.
    #[must_use]
    pub fn error(error_text: impl Into<String>) -> Self {
        Self {
            status: AuthState::Error.as_str().to_string(),
            error_text: error_text.into(),
            error_code: String::new(),
        }
    }
}
