//! DateTime parsing and formatting helpers.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Parse a datetime string in the formats found in collection datasets and
/// Neo4j results into a UTC [`DateTime`].
///
/// Attempted in order:
/// 1. RFC 3339 (`"2024-01-15T10:30:00Z"`, `"2024-01-15T10:30:00-03:00"`,
///    Neo4j nanosecond output)
/// 2. ISO 8601 without timezone, with or without sub-seconds (assumed UTC)
/// 3. Date only, midnight UTC (`"2023-06-15"`)
///
/// Returns `None` for empty input or unrecognised formats.
pub fn parse_flexible_datetime(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&ndt));
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|nd| nd.and_hms_opt(0, 0, 0))
        .map(|ndt| Utc.from_utc_datetime(&ndt))
}

/// Format a [`DateTime<Utc>`] for a Cypher `datetime()` call.
///
/// Output format: `"2024-01-15T10:30:00.000000000Z"`.
pub fn format_neo4j_datetime(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.9fZ").to_string()
}

/// Serde adapter for optional timestamps written in any format accepted by
/// [`parse_flexible_datetime`].
///
/// Use with `#[serde(default, with = "crate::utils::datetime::flexible")]`.
pub mod flexible {
    use chrono::{DateTime, Utc};
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(dt) => serializer.serialize_str(&dt.to_rfc3339()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(raw) if raw.trim().is_empty() => Ok(None),
            Some(raw) => super::parse_flexible_datetime(&raw)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("unrecognised datetime '{raw}'"))),
        }
    }
}
