//! Mill cloud adapter error types.

use millbridge_domain::error::{AuthError, BridgeError, TransportError};

/// Errors raised while talking to the Mill cloud.
#[derive(Debug, thiserror::Error)]
pub enum CloudError {
    /// The request could not be sent or the body could not be read.
    #[error("HTTP request failed")]
    Network(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("unexpected HTTP status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Start of the response body.
        body: String,
    },

    /// The body is not the expected JSON.
    #[error("failed to decode response (HTTP {status})")]
    Decode {
        /// HTTP status code.
        status: u16,
        /// Underlying parse failure.
        #[source]
        source: serde_json::Error,
    },

    /// The envelope reported a failure, or carried no data.
    #[error("cloud rejected the request ({error_code}): {message}")]
    Rejected {
        /// Vendor error code.
        error_code: String,
        /// Vendor message.
        message: String,
    },

    /// An authentication endpoint refused the credentials.
    #[error("credentials rejected: {message}")]
    AuthRejected {
        /// Vendor message.
        message: String,
    },
}

impl CloudError {
    /// Convert into a [`BridgeError`] for propagation across the port
    /// boundary.
    pub fn into_domain(self) -> BridgeError {
        match self {
            Self::Network(err) if err.is_timeout() => TransportError::Timeout.into(),
            Self::Network(err) => TransportError::Network(Box::new(err)).into(),
            Self::Status { status, .. } => TransportError::Status { status }.into(),
            Self::Decode { status, source } => TransportError::Decode {
                status,
                message: source.to_string(),
            }
            .into(),
            Self::Rejected {
                error_code,
                message,
            } => TransportError::Rejected {
                error_code,
                message,
            }
            .into(),
            Self::AuthRejected { message } => AuthError::Rejected { message }.into(),
        }
    }
}

impl From<CloudError> for BridgeError {
    fn from(err: CloudError) -> Self {
        err.into_domain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_map_status_to_transport_error() {
        let err: BridgeError = CloudError::Status {
            status: 502,
            body: String::new(),
        }
        .into();
        assert!(matches!(
            err,
            BridgeError::Transport(TransportError::Status { status: 502 })
        ));
    }

    #[test]
    fn should_map_decode_error_with_message() {
        let source = serde_json::from_str::<serde_json::Value>("<html>").unwrap_err();
        let err: BridgeError = CloudError::Decode {
            status: 200,
            source,
        }
        .into();
        assert!(matches!(
            err,
            BridgeError::Transport(TransportError::Decode { status: 200, .. })
        ));
    }

    #[test]
    fn should_map_auth_rejection_to_auth_error() {
        let err: BridgeError = CloudError::AuthRejected {
            message: "wrong password".to_string(),
        }
        .into();
        assert!(matches!(
            err,
            BridgeError::Auth(AuthError::Rejected { message }) if message == "wrong password"
        ));
    }

    #[test]
    fn should_keep_vendor_code_on_rejection() {
        let err: BridgeError = CloudError::Rejected {
            error_code: "4001".to_string(),
            message: "device offline".to_string(),
        }
        .into();
        assert!(matches!(
            err,
            BridgeError::Transport(TransportError::Rejected { error_code, .. })
                if error_code == "4001"
        ));
    }
}
