//! Time and timestamp helpers.

use chrono::{DateTime, Utc};

/// UTC timestamp used for message creation times and persistence records.
pub type Timestamp = DateTime<Utc>;

/// Epoch milliseconds, the unit the cloud uses for token expiries.
pub type EpochMillis = i64;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Return the current time in epoch milliseconds.
#[must_use]
pub fn now_millis() -> EpochMillis {
    Utc::now().timestamp_millis()
}
