//! Serde helpers for Realtime Database list encodings.
//!
//! The database has no array type. A list written as a JSON array comes back
//! as an array only while its indices are dense; after a hole it comes back as
//! an object keyed by index, and an empty list comes back as `null`. These
//! helpers accept all three shapes.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

#[derive(Deserialize)]
#[serde(untagged)]
enum ListShape<T> {
    Array(Vec<Option<T>>),
    Object(BTreeMap<String, T>),
}

/// Deserialize a list stored as an array, an index-keyed object, or `null`.
///
/// Array holes (`null` entries) are skipped. Object entries are ordered by
/// their numeric key when every key is numeric, otherwise lexicographically.
///
/// # Errors
///
/// Returns a deserialization error when an element has the wrong shape.
pub fn deserialize_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let shape: Option<ListShape<T>> = Option::deserialize(deserializer)?;
    Ok(match shape {
        None => Vec::new(),
        Some(ListShape::Array(items)) => items.into_iter().flatten().collect(),
        Some(ListShape::Object(map)) => {
            let mut entries: Vec<(String, T)> = map.into_iter().collect();
            if entries.iter().all(|(k, _)| k.parse::<u64>().is_ok()) {
                entries.sort_by_key(|(k, _)| k.parse::<u64>().unwrap_or(u64::MAX));
            }
            entries.into_iter().map(|(_, v)| v).collect()
        }
    })
}

/// Deserialize a keyed collection, treating `null` as empty.
///
/// # Errors
///
/// Returns a deserialization error when a value has the wrong shape.
pub fn deserialize_keyed<'de, D, T>(deserializer: D) -> Result<BTreeMap<String, T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(Option::<BTreeMap<String, T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Deserialize a keyed collection entry by entry, treating `null` as empty.
///
/// Entries that do not decode as `T` are logged and skipped, so one record
/// written by another client cannot hide its siblings.
///
/// # Errors
///
/// Returns a deserialization error when the collection is not an object.
pub fn deserialize_keyed_lenient<'de, D, T>(
    deserializer: D,
) -> Result<BTreeMap<String, T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Option::<BTreeMap<String, Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .into_iter()
        .filter_map(|(key, value)| match serde_json::from_value(value) {
            Ok(entry) => Some((key, entry)),
            Err(e) => {
                warn!(key = %key, error = %e, "skipping malformed entry");
                None
            }
        })
        .collect())
}
