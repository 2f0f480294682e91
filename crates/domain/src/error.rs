//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`BridgeError`]
//! via `#[from]`. Adapters box their own error type into the `Storage` or
//! `Bus` variant when crossing a port boundary.

/// Base error type for millbridge.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// Authentication with the cloud failed or is missing.
    #[error("authentication error")]
    Auth(#[from] AuthError),

    /// The cloud API could not be reached or answered with an error.
    #[error("transport error")]
    Transport(#[from] TransportError),

    /// A referenced record does not exist.
    #[error("not found")]
    NotFound(#[from] NotFoundError),

    /// An inbound value failed validation.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// The persistence layer failed.
    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The message bus failed to deliver a message.
    #[error("bus error")]
    Bus(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Credential related failures.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No access token is held.
    #[error("not authenticated")]
    NotAuthenticated,

    /// A login field is empty.
    #[error("missing credential field {field}")]
    MissingCredentials {
        /// Name of the empty field.
        field: &'static str,
    },

    /// The vendor refused the supplied credentials.
    #[error("credentials rejected: {message}")]
    Rejected {
        /// Message returned by the vendor.
        message: String,
    },

    /// Both the access and the refresh token are expired.
    #[error("refresh window elapsed; re-authentication required")]
    RefreshWindowElapsed,
}

/// Failures while talking to the cloud API.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The server answered with a non-success HTTP status.
    #[error("unexpected HTTP status {status}")]
    Status {
        /// HTTP status code.
        status: u16,
    },

    /// The body could not be decoded.
    #[error("failed to decode response body (HTTP {status}): {message}")]
    Decode {
        /// HTTP status code.
        status: u16,
        /// Decoder message.
        message: String,
    },

    /// The vendor envelope reported a failure.
    #[error("request rejected by the cloud ({error_code}): {message}")]
    Rejected {
        /// Vendor error code.
        error_code: String,
        /// Vendor message.
        message: String,
    },

    /// The request timed out.
    #[error("request timed out")]
    Timeout,

    /// The connection failed.
    #[error("network failure")]
    Network(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// A lookup did not match any record.
#[derive(Debug, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    /// Kind of record, e.g. `"Device"`.
    pub entity: &'static str,
    /// Identifier that was looked up.
    pub id: String,
}

/// Validation failures for inbound values.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// The payload does not have the expected shape.
    #[error("malformed payload, expected {expected}")]
    MalformedPayload {
        /// Description of the expected payload.
        expected: &'static str,
    },

    /// The temperature value could not be parsed.
    #[error("invalid temperature {0:?}")]
    InvalidTemperature(String),

    /// The bus address could not be parsed.
    #[error("invalid address {0:?}")]
    InvalidAddress(String),

    /// The thermostat mode is not supported.
    #[error("unsupported mode {0:?}")]
    UnsupportedMode(String),

    /// The log level is unknown.
    #[error("invalid log level {0:?}")]
    InvalidLogLevel(String),
}
