//! Timestamps and short ids.
//!
//! All persisted timestamps are UTC with second precision and a `Z` suffix,
//! e.g. `2025-03-01T09:30:00Z`.

use chrono::{DateTime, SubsecRound, Utc};
use uuid::Uuid;

pub const ISO_SECONDS: &str = "%Y-%m-%dT%H:%M:%SZ";
const FILE_STAMP: &str = "%Y%m%dT%H%M%SZ";

/// Current time truncated to whole seconds.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}

pub fn iso(ts: &DateTime<Utc>) -> String {
    ts.format(ISO_SECONDS).to_string()
}

pub fn now_iso() -> String {
    iso(&now())
}

/// Filename-safe stamp, e.g. `20250301T093000Z`.
pub fn file_stamp() -> String {
    Utc::now().format(FILE_STAMP).to_string()
}

/// 8 hex chars from a v4 uuid.
pub fn short_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}

/// Serde adapter for `DateTime<Utc>` in the persisted `...Z` form.
/// Reading accepts any RFC 3339 timestamp.
pub mod iso_seconds {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::iso(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
