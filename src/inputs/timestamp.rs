//! Timestamp (de)serialization for warehouse-style datetime columns.
//!
//! Extract tables write `2150-03-01 14:05:00`; some exports use an ISO `T`
//! separator and fractional seconds. Both are accepted on input, output is
//! always written in the space-separated form.

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serializer};

/// Format used for every timestamp this crate writes.
pub const OUTPUT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const INPUT_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Parses a timestamp in any accepted input format.
pub fn parse(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    INPUT_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{raw}'")))
}

pub fn serialize<S>(ts: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_str(&ts.format(OUTPUT_FORMAT))
}
