//! In-memory stand-in for the Realtime Database REST API.
//!
//! Holds one JSON tree and answers `GET`, `PUT`, `PATCH`, `POST` and
//! `DELETE` on `<path>.json` the way the real service does, including
//! multi-path `PATCH` keys and `{".sv": {"increment": n}}` server values.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::{Map, Value, json};

/// Shared handle to the fake database tree.
#[derive(Clone, Default)]
pub struct FakeDatabase {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    tree: Mutex<Value>,
    offline: AtomicBool,
    next_key: AtomicU64,
}

impl FakeDatabase {
    /// Create an empty database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Router serving the REST API; mount it at the server root.
    pub fn router(&self) -> Router {
        Router::new().fallback(handle).with_state(self.clone())
    }

    /// Read the node at a slash-separated path (`Value::Null` when absent).
    #[must_use]
    pub fn get(&self, path: &str) -> Value {
        let tree = self.lock();
        lookup(&tree, &split(path)).cloned().unwrap_or(Value::Null)
    }

    /// Overwrite the node at a slash-separated path.
    pub fn put(&self, path: &str, value: Value) {
        let mut tree = self.lock();
        write(&mut tree, &split(path), value);
    }

    /// Make every request fail with 503 until switched back.
    pub fn set_offline(&self, offline: bool) {
        self.inner.offline.store(offline, Ordering::SeqCst);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Value> {
        self.inner
            .tree
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn push_key(&self) -> String {
        let n = self.inner.next_key.fetch_add(1, Ordering::SeqCst);
        format!("-Ntest{n:08}")
    }
}

async fn handle(State(db): State<FakeDatabase>, method: Method, uri: Uri, body: Bytes) -> Response {
    if db.inner.offline.load(Ordering::SeqCst) {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": "database offline" })),
        )
            .into_response();
    }

    let Some(segments) = request_segments(uri.path()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "path must end in .json" })),
        )
            .into_response();
    };
    let payload = if body.is_empty() {
        Value::Null
    } else {
        match serde_json::from_slice::<Value>(&body) {
            Ok(value) => value,
            Err(e) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": format!("Invalid data; couldn't parse JSON object: {e}") })),
                )
                    .into_response();
            }
        }
    };
    let silent = uri.query().is_some_and(|q| q.contains("print=silent"));

    match method {
        Method::GET => {
            let tree = db.lock();
            Json(lookup(&tree, &segments).cloned().unwrap_or(Value::Null)).into_response()
        }
        Method::PUT => {
            write(&mut db.lock(), &segments, payload.clone());
            written(silent, payload)
        }
        Method::PATCH => {
            let Value::Object(updates) = payload else {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": "PATCH body must be an object" })),
                )
                    .into_response();
            };
            apply_updates(&mut db.lock(), &segments, &updates);
            written(silent, Value::Object(updates))
        }
        Method::POST => {
            let key = db.push_key();
            let mut path = segments;
            path.push(key.clone());
            write(&mut db.lock(), &path, payload);
            Json(json!({ "name": key })).into_response()
        }
        Method::DELETE => {
            write(&mut db.lock(), &segments, Value::Null);
            Json(Value::Null).into_response()
        }
        _ => StatusCode::METHOD_NOT_ALLOWED.into_response(),
    }
}

fn written(silent: bool, value: Value) -> Response {
    if silent {
        StatusCode::NO_CONTENT.into_response()
    } else {
        Json(value).into_response()
    }
}

/// `/users/abc/orders.json` -> `["users", "abc", "orders"]`; `/.json` -> `[]`.
fn request_segments(path: &str) -> Option<Vec<String>> {
    let trimmed = path.strip_suffix(".json")?.trim_start_matches('/');
    Some(split(trimmed))
}

fn split(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(|s| {
            urlencoding::decode(s).map_or_else(|_| s.to_string(), std::borrow::Cow::into_owned)
        })
        .collect()
}

fn lookup<'a>(node: &'a Value, path: &[String]) -> Option<&'a Value> {
    path.iter().try_fold(node, |node, segment| match node {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Write `value` at `path`, creating parents. Writing `null` deletes the
/// node and prunes parents left empty.
fn write(node: &mut Value, path: &[String], value: Value) {
    let Some((first, rest)) = path.split_first() else {
        *node = value;
        return;
    };

    if let Value::Array(items) = node {
        let as_map: Map<String, Value> = std::mem::take(items)
            .into_iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v))
            .collect();
        *node = Value::Object(as_map);
    }
    if !node.is_object() {
        if value.is_null() {
            return;
        }
        *node = Value::Object(Map::new());
    }
    let Value::Object(map) = node else {
        return;
    };

    if rest.is_empty() {
        if value.is_null() {
            map.remove(first);
        } else {
            map.insert(first.clone(), value);
        }
        return;
    }

    let child = map.entry(first.clone()).or_insert(Value::Null);
    write(child, rest, value);
    if child.is_null() || child.as_object().is_some_and(Map::is_empty) {
        map.remove(first);
    }
}

fn apply_updates(tree: &mut Value, base: &[String], updates: &Map<String, Value>) {
    for (key, value) in updates {
        let mut path = base.to_vec();
        path.extend(split(key));
        let resolved = match increment_delta(value) {
            Some(delta) => {
                let current = lookup(tree, &path).and_then(Value::as_i64).unwrap_or(0);
                json!(current + delta)
            }
            None => value.clone(),
        };
        write(tree, &path, resolved);
    }
}

fn increment_delta(value: &Value) -> Option<i64> {
    value.get(".sv")?.get("increment")?.as_i64()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_write_and_delete_prunes_empty_parents() {
        let mut tree = Value::Null;
        write(&mut tree, &split("users/u1/orders/o1"), json!({ "status": "pending" }));
        assert_eq!(tree["users"]["u1"]["orders"]["o1"]["status"], "pending");

        write(&mut tree, &split("users/u1/orders/o1"), Value::Null);
        assert_eq!(tree.get("users"), None);
    }

    #[test]
    fn test_patch_merges_nested_keys_and_increments() {
        let mut tree = json!({ "stats": { "totalVisits": 4 }, "keep": true });
        let updates = json!({
            "stats/totalVisits": { ".sv": { "increment": 1 } },
            "stats/daily/2026-10-18": { ".sv": { "increment": 1 } },
        });
        apply_updates(&mut tree, &[], updates.as_object().unwrap());

        assert_eq!(tree["stats"]["totalVisits"], 5);
        assert_eq!(tree["stats"]["daily"]["2026-10-18"], 1);
        assert_eq!(tree["keep"], true);
    }

    #[test]
    fn test_request_segments() {
        assert_eq!(request_segments("/.json"), Some(vec![]));
        assert_eq!(
            request_segments("/catalog/sections.json"),
            Some(vec!["catalog".to_string(), "sections".to_string()])
        );
        assert_eq!(request_segments("/catalog"), None);
    }
}
