//! Wall-clock helpers for task timestamps.

use chrono::{DateTime, SecondsFormat, Utc};

/// Current wall-clock time in UTC.
#[must_use]
pub fn now_utc() -> DateTime<Utc> {
    Utc::now()
}

/// The Unix epoch, used as the "never stamped" timestamp.
#[must_use]
pub const fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

/// Format a timestamp as ISO-8601 (RFC 3339, microsecond precision, `Z` suffix).
#[must_use]
pub fn to_iso8601(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}
