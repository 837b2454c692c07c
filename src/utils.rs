use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use rand::Rng;

/// Current wall-clock time as integer epoch milliseconds (the storage format
/// for `created_at` / `updated_at`).
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Generate a random record id (32 hex chars).
///
/// Ids are minted on the device so records can be created fully offline; the
/// server adopts them verbatim, which is what makes the pull-side upsert
/// idempotent.
pub fn new_record_id() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 16] = rng.random();
    let mut out = String::with_capacity(32);
    for b in bytes {
        out.push_str(&format!("{:02x}", b));
    }
    out
}

/// Render epoch millis as an ISO-8601 UTC string for the push payload.
pub fn millis_to_iso(millis: i64) -> String {
    match Utc.timestamp_millis_opt(millis).single() {
        Some(ts) => ts.to_rfc3339_opts(SecondsFormat::Millis, true),
        None => DateTime::<Utc>::UNIX_EPOCH.to_rfc3339_opts(SecondsFormat::Millis, true),
    }
}

/// Parse an ISO-8601 timestamp (any offset) into epoch millis.
pub fn iso_to_millis(s: &str) -> Option<i64> {
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.timestamp_millis())
}
