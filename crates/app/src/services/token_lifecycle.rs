//! Token lifecycle: refresh the access token when it expired but the
//! refresh window is still open.

use millbridge_domain::credentials::{Credentials, RefreshDecision};
use millbridge_domain::error::BridgeError;
use millbridge_domain::time::EpochMillis;

use crate::ports::CloudApi;

/// Result of one token check.
#[derive(Debug)]
pub enum TokenCheck {
    /// Nothing to do.
    Skipped,
    /// The credentials were replaced by a fresh grant.
    Refreshed,
    /// The refresh call failed; the access token is now marked expired.
    RefreshFailed(BridgeError),
    /// Both tokens expired; no call was made.
    WindowElapsed,
}

impl TokenCheck {
    /// Whether the credentials changed and must be persisted.
    #[must_use]
    pub fn credentials_changed(&self) -> bool {
        matches!(self, Self::Refreshed | Self::RefreshFailed(_))
    }
}

/// Refresh `credentials` in place if needed at `now`.
///
/// At most one refresh call is issued. On success all token fields are
/// replaced in a single assignment. On failure the access token is marked
/// as expired at `now`, so the next cycle tries again instead of looping
/// here.
#[tracing::instrument(skip(cloud, credentials))]
pub async fn ensure_fresh<C: CloudApi>(
    cloud: &C,
    credentials: &mut Credentials,
    now: EpochMillis,
) -> TokenCheck {
    match credentials.refresh_decision(now) {
        RefreshDecision::Skip => TokenCheck::Skipped,
        RefreshDecision::WindowElapsed => TokenCheck::WindowElapsed,
        RefreshDecision::Refresh => match cloud.refresh_token(&credentials.refresh_token).await {
            Ok(grant) => {
                credentials.replace_with(grant);
                tracing::info!(
                    access_expires_at = credentials.access_expires_at,
                    "access token refreshed"
                );
                TokenCheck::Refreshed
            }
            Err(err) => {
                credentials.expire_access_token(now);
                tracing::warn!(error = %err, "failed to refresh access token");
                TokenCheck::RefreshFailed(err)
            }
        },
    }
}
