//! Timestamp encoding for database records.
//!
//! Records written by the browser client carry `Date.now()` milliseconds;
//! records written by the servers carry RFC 3339 strings. Both decode to
//! `DateTime<Utc>`; new writes always use RFC 3339.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum Raw {
    Millis(i64),
    Text(String),
}

/// Serialize as an RFC 3339 string.
///
/// # Errors
///
/// Propagates serializer errors.
pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_rfc3339())
}

/// Deserialize from epoch milliseconds or an RFC 3339 string.
///
/// # Errors
///
/// Returns an error for out-of-range milliseconds or unparseable strings.
pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    match Raw::deserialize(deserializer)? {
        Raw::Millis(ms) => Utc
            .timestamp_millis_opt(ms)
            .single()
            .ok_or_else(|| serde::de::Error::custom(format!("timestamp out of range: {ms}"))),
        Raw::Text(s) => DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Serialize, Deserialize)]
    struct Stamped {
        #[serde(with = "super")]
        at: DateTime<Utc>,
    }

    #[test]
    fn test_accepts_millis_and_rfc3339() {
        let a: Stamped = serde_json::from_str(r#"{"at":1700000000000}"#).unwrap();
        let b: Stamped = serde_json::from_str(r#"{"at":"2023-11-14T22:13:20Z"}"#).unwrap();
        assert_eq!(a.at, b.at);
    }

    #[test]
    fn test_writes_rfc3339() {
        let s = Stamped {
            at: Utc.timestamp_millis_opt(0).single().unwrap(),
        };
        assert_eq!(
            serde_json::to_string(&s).unwrap(),
            r#"{"at":"1970-01-01T00:00:00+00:00"}"#
        );
    }
}
