//! Pivot timestamp decoding
//!
//! Drivers hand pivot timestamps back in whatever shape the column type and
//! the select alias produce. Textual and date values are normalised to
//! `DateTime<Utc>`; anything else is kept as delivered.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::{debug, warn};

use crate::backends::DatabaseValue;

const OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M:%S%.f%#z"];
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Parse a textual timestamp, assuming UTC when no offset is present
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }

    for format in OFFSET_FORMATS {
        if let Ok(parsed) = DateTime::parse_from_str(value, format) {
            return Some(parsed.with_timezone(&Utc));
        }
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc())
}

/// Normalised form of one pivot timestamp, `None` when it stays as is
pub fn normalize_timestamp(column: &str, value: &DatabaseValue) -> Option<DatabaseValue> {
    match value {
        DatabaseValue::Null | DatabaseValue::DateTime(_) => None,
        DatabaseValue::String(text) if text.is_empty() => None,
        DatabaseValue::String(text) => match parse_timestamp(text) {
            Some(parsed) => Some(DatabaseValue::DateTime(parsed)),
            None => {
                warn!(column = %column, value = %text, "unparseable pivot timestamp left as text");
                None
            }
        },
        DatabaseValue::Date(date) => date
            .and_hms_opt(0, 0, 0)
            .map(|midnight| DatabaseValue::DateTime(midnight.and_utc())),
        other => {
            debug!(column = %column, value = ?other, "pivot timestamp passed through");
            None
        }
    }
}

/// Normalise every declared timestamp column present in `extras`
pub fn normalize_pivot_timestamps(
    extras: &mut HashMap<String, DatabaseValue>,
    alias_prefix: &str,
    timestamp_columns: &[String],
) {
    for column in timestamp_columns {
        let key = format!("{}{}", alias_prefix, column);
        let replacement = extras
            .get(&key)
            .and_then(|value| normalize_timestamp(&key, value));
        if let Some(value) = replacement {
            extras.insert(key, value);
        }
    }
}
