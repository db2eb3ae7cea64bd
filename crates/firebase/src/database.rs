//! Realtime Database REST client.
//!
//! Every location is addressed as `<database>/<path>.json`. Writes use
//! `print=silent` so the server does not echo the written data back.

use std::sync::Arc;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use tracing::{debug, instrument};
use url::Url;

use crate::DatabaseConfig;
use crate::error::FirebaseError;
use crate::paths::DbPath;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for one Realtime Database instance.
#[derive(Clone)]
pub struct RealtimeDatabase {
    inner: Arc<Inner>,
}

struct Inner {
    client: reqwest::Client,
    base_url: Url,
    auth: Option<SecretString>,
}

#[derive(serde::Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(serde::Deserialize)]
struct PushResponse {
    name: String,
}

impl RealtimeDatabase {
    /// Create a client for the configured database.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is not an absolute http(s) URL or the HTTP
    /// client fails to build.
    pub fn new(config: &DatabaseConfig) -> Result<Self, FirebaseError> {
        let base_url = Url::parse(config.url.trim())
            .map_err(|e| FirebaseError::InvalidUrl(format!("{}: {e}", config.url)))?;
        if base_url.cannot_be_a_base() || !matches!(base_url.scheme(), "http" | "https") {
            return Err(FirebaseError::InvalidUrl(config.url.clone()));
        }

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            inner: Arc::new(Inner {
                client,
                base_url,
                auth: config.secret.clone(),
            }),
        })
    }

    /// The database root URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    fn endpoint(&self, path: &DbPath) -> Result<Url, FirebaseError> {
        let mut url = self.inner.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| FirebaseError::InvalidUrl(self.inner.base_url.to_string()))?;
            segments.pop_if_empty();
            match path.segments().split_last() {
                None => {
                    segments.push(".json");
                }
                Some((last, parents)) => {
                    segments.extend(parents);
                    segments.push(&format!("{last}.json"));
                }
            }
        }
        if let Some(secret) = &self.inner.auth {
            url.query_pairs_mut()
                .append_pair("auth", secret.expose_secret());
        }
        Ok(url)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, FirebaseError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body).map_or(body, |b| b.error);
        Err(FirebaseError::Api {
            status: status.as_u16(),
            message,
        })
    }

    /// Read the value at `path`. An absent node (`null`) reads as `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the value does not decode as `T`.
    #[instrument(skip_all, fields(path = %path))]
    pub async fn get<T: DeserializeOwned>(&self, path: &DbPath) -> Result<Option<T>, FirebaseError> {
        let url = self.endpoint(path)?;
        let response = Self::check(self.inner.client.get(url).send().await?).await?;
        let bytes = response.bytes().await?;
        let value: Value = serde_json::from_slice(&bytes)?;
        if value.is_null() {
            debug!("node is empty");
            return Ok(None);
        }
        Ok(Some(serde_json::from_value(value)?))
    }

    /// Overwrite the whole subtree at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the database rejects it.
    #[instrument(skip_all, fields(path = %path))]
    pub async fn set<T: Serialize + ?Sized>(&self, path: &DbPath, value: &T) -> Result<(), FirebaseError> {
        let url = self.endpoint(path)?;
        let request = self
            .inner
            .client
            .put(url)
            .query(&[("print", "silent")])
            .json(value);
        Self::check(request.send().await?).await?;
        Ok(())
    }

    /// Write only the given children of `path`, leaving siblings untouched.
    ///
    /// Keys may be nested paths (`"a/b"`) relative to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the database rejects it.
    #[instrument(skip_all, fields(path = %path, fields = updates.len()))]
    pub async fn update(&self, path: &DbPath, updates: &Map<String, Value>) -> Result<(), FirebaseError> {
        let url = self.endpoint(path)?;
        let request = self
            .inner
            .client
            .patch(url)
            .query(&[("print", "silent")])
            .json(updates);
        Self::check(request.send().await?).await?;
        Ok(())
    }

    /// Append `value` under a newly generated chronological key.
    ///
    /// Returns the generated key.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response has no key.
    #[instrument(skip_all, fields(path = %path))]
    pub async fn push<T: Serialize + ?Sized>(&self, path: &DbPath, value: &T) -> Result<String, FirebaseError> {
        let url = self.endpoint(path)?;
        let response = Self::check(self.inner.client.post(url).json(value).send().await?).await?;
        let bytes = response.bytes().await?;
        let pushed: PushResponse = serde_json::from_slice(&bytes)?;
        debug!(key = %pushed.name, "pushed child");
        Ok(pushed.name)
    }

    /// Delete the subtree at `path`. Deleting an absent node succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the database rejects it.
    #[instrument(skip_all, fields(path = %path))]
    pub async fn remove(&self, path: &DbPath) -> Result<(), FirebaseError> {
        let url = self.endpoint(path)?;
        Self::check(self.inner.client.delete(url).send().await?).await?;
        Ok(())
    }

    /// Atomically add `delta` to each counter, in a single multi-path update.
    ///
    /// Missing counters start from zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the database rejects it.
    #[instrument(skip_all, fields(counters = counters.len()))]
    pub async fn increment(&self, counters: &[DbPath], delta: i64) -> Result<(), FirebaseError> {
        let root = DbPath::root();
        let updates: Map<String, Value> = counters
            .iter()
            .filter_map(|path| path.relative_to(&root))
            .map(|key| (key, json!({ ".sv": { "increment": delta } })))
            .collect();
        if updates.is_empty() {
            return Ok(());
        }
        self.update(&root, &updates).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::sync::Mutex;

    use axum::Router;
    use axum::extract::State;
    use axum::http::{Method, StatusCode, Uri};
    use serde_json::json;

    use super::*;
    use crate::paths;

    #[derive(Debug, Clone)]
    struct Seen {
        method: Method,
        path: String,
        query: String,
        body: String,
    }

    type Reply = fn(&Seen) -> (StatusCode, String);

    #[derive(Clone)]
    struct Fake {
        reply: Reply,
        seen: Arc<Mutex<Vec<Seen>>>,
    }

    async fn record(State(fake): State<Fake>, method: Method, uri: Uri, body: String) -> (StatusCode, String) {
        let seen = Seen {
            method,
            path: uri.path().to_string(),
            query: uri.query().unwrap_or_default().to_string(),
            body,
        };
        let reply = (fake.reply)(&seen);
        fake.seen.lock().unwrap().push(seen);
        reply
    }

    async fn spawn(reply: Reply, secret: Option<&str>) -> (RealtimeDatabase, Arc<Mutex<Vec<Seen>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new().fallback(record).with_state(Fake {
            reply,
            seen: Arc::clone(&seen),
        });
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        let db = RealtimeDatabase::new(&DatabaseConfig {
            url: format!("http://{addr}"),
            secret: secret.map(SecretString::from),
        })
        .unwrap();
        (db, seen)
    }

    #[test]
    fn test_rejects_non_http_url() {
        let err = RealtimeDatabase::new(&DatabaseConfig {
            url: "mailto:shop@example.com".to_string(),
            secret: None,
        })
        .err()
        .unwrap();
        assert!(matches!(err, FirebaseError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn test_get_absent_node_is_none() {
        let (db, seen) = spawn(|_| (StatusCode::OK, "null".to_string()), Some("s3cret")).await;
        let value: Option<Value> = db.get(&paths::sections()).await.unwrap();
        assert!(value.is_none());

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].method, Method::GET);
        assert_eq!(seen[0].path, "/catalog/sections.json");
        assert_eq!(seen[0].query, "auth=s3cret");
    }

    #[tokio::test]
    async fn test_get_root_and_decode() {
        let (db, seen) = spawn(|_| (StatusCode::OK, r#"{"a":1}"#.to_string()), None).await;
        let value: Option<Value> = db.get(&DbPath::root()).await.unwrap();
        assert_eq!(value, Some(json!({ "a": 1 })));
        assert_eq!(seen.lock().unwrap()[0].path, "/.json");
    }

    #[tokio::test]
    async fn test_push_returns_generated_key() {
        let (db, seen) = spawn(|_| (StatusCode::OK, r#"{"name":"-Nabc"}"#.to_string()), None).await;
        let uid = vapeshop_core::UserId::parse("u1").unwrap();
        let key = db
            .push(&paths::orders(&uid), &json!({ "status": "pending" }))
            .await
            .unwrap();
        assert_eq!(key, "-Nabc");

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].method, Method::POST);
        assert_eq!(seen[0].path, "/users/u1/orders.json");
        assert_eq!(seen[0].body, r#"{"status":"pending"}"#);
    }

    #[tokio::test]
    async fn test_increment_is_one_root_patch() {
        let (db, seen) = spawn(|_| (StatusCode::NO_CONTENT, String::new()), None).await;
        let date = chrono::NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        db.increment(&[paths::total_visits(), paths::daily_visits(date)], 1)
            .await
            .unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].method, Method::PATCH);
        assert_eq!(seen[0].path, "/.json");
        assert_eq!(seen[0].query, "print=silent");
        let body: Value = serde_json::from_str(&seen[0].body).unwrap();
        assert_eq!(body["stats/totalVisits"][".sv"]["increment"], 1);
        assert_eq!(body["dailyStats/2024-06-01"][".sv"]["increment"], 1);
    }

    #[tokio::test]
    async fn test_error_message_is_extracted() {
        let (db, _) = spawn(
            |_| (StatusCode::UNAUTHORIZED, r#"{"error":"Permission denied"}"#.to_string()),
            None,
        )
        .await;
        let err = db.remove(&paths::users()).await.unwrap_err();
        match err {
            FirebaseError::Api { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Permission denied");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_set_overwrites_with_put() {
        let (db, seen) = spawn(|_| (StatusCode::NO_CONTENT, String::new()), None).await;
        let id = vapeshop_core::SectionId::parse("liquids").unwrap();
        db.set(&paths::section_brands(&id), &json!([{ "name": "Nasty" }]))
            .await
            .unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].method, Method::PUT);
        assert_eq!(seen[0].path, "/catalog/sections/liquids/brands.json");
    }
}
