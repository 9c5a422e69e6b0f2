use chrono::{DateTime, Utc};
use log::warn;

use crate::errors::DataWarning;

/// 2000-01-01T00:00:00Z, anything earlier is treated as a corrupt device clock
pub const EARLIEST_PLAUSIBLE_MS: i64 = 946_684_800_000;

/// Resolves a device time token (epoch millis or RFC 3339) to a UTC instant.
pub fn resolve_time_token(token: &str) -> Option<DateTime<Utc>> {
    let token = token.trim();
    if let Ok(millis) = token.parse::<i64>() {
        return DateTime::from_timestamp_millis(millis);
    }
    if let Ok(millis) = token.parse::<f64>() {
        if millis.is_finite() && millis.abs() < i64::MAX as f64 {
            return DateTime::from_timestamp_millis(millis as i64);
        }
        return None;
    }
    DateTime::parse_from_rfc3339(token)
        .ok()
        .map(|time| time.with_timezone(&Utc))
}

/// Like [`resolve_time_token`] but rejects instants before 2000-01-01.
pub fn resolve_plausible_time(token: &str) -> Option<DateTime<Utc>> {
    resolve_time_token(token).filter(|time| time.timestamp_millis() >= EARLIEST_PLAUSIBLE_MS)
}

/// Picks the session start from the first point's time token.
///
/// Tokens that do not resolve to a plausible date are replaced with `now` and
/// reported through the returned warning.
pub fn resolve_session_start(
    first_token: Option<&str>,
    now: DateTime<Utc>,
) -> (DateTime<Utc>, Option<DataWarning>) {
    let Some(token) = first_token else {
        return (now, None);
    };
    match resolve_plausible_time(token) {
        Some(start) => (start, None),
        None => {
            warn!(
                "Time token {:?} does not resolve to a plausible date, using ingestion time {}",
                token, now
            );
            (
                now,
                Some(DataWarning::CorruptTimestamp {
                    token: token.to_string(),
                    substituted_ms: now.timestamp_millis(),
                }),
            )
        }
    }
}
