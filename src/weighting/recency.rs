use chrono::NaiveDateTime;

/// Elapsed hours assumed when a timestamp is missing or unreadable: stale,
/// never fresh.
pub const STALE_HOURS: f64 = 9999.0;

pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M";

/// Parses a 12-digit `YYYYMMDDHHMM` stamp.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.len() != 12 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT).ok()
}

/// Non-negative hours between `updated_at` and `now`. Future stamps clamp
/// to zero; missing or unparseable stamps are [`STALE_HOURS`].
pub fn hours_elapsed(updated_at: Option<&str>, now: NaiveDateTime) -> f64 {
    match updated_at.and_then(parse_timestamp) {
        Some(last_update) => {
            let seconds = (now - last_update).num_seconds() as f64;
            (seconds / 3600.0).max(0.0)
        }
        None => STALE_HOURS,
    }
}

/// `3 / (hours + 1)`: 3.0 when just updated, strictly decreasing after.
pub fn recency_bonus(hours_elapsed: f64) -> f64 {
    3.0 / (hours_elapsed.max(0.0) + 1.0)
}
