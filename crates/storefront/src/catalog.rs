//! Catalog retrieval.
//!
//! The catalog is read from `catalog` in the Realtime Database. When that call
//! fails, or the node is empty, the bundled JSON file is served instead. The
//! first source that succeeds is cached for five minutes, so a database outage
//! costs one failed call per cache period rather than one per page view.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use thiserror::Error;
use tracing::{info, instrument, warn};
use vapeshop_core::Catalog;
use vapeshop_firebase::{RealtimeDatabase, paths};

/// Where a loaded catalog came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogSource {
    Remote,
    Fallback,
}

impl CatalogSource {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Remote => "remote",
            Self::Fallback => "fallback",
        }
    }
}

impl std::fmt::Display for CatalogSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A catalog together with its source.
#[derive(Debug)]
pub struct LoadedCatalog {
    pub catalog: Catalog,
    pub source: CatalogSource,
}

/// Both sources failed.
#[derive(Debug, Clone, Error)]
#[error("catalog unavailable (database: {remote}; fallback: {fallback})")]
pub struct CatalogUnavailable {
    pub remote: String,
    pub fallback: String,
}

/// Cached catalog reader shared by all handlers.
#[derive(Clone)]
pub struct CatalogService {
    inner: Arc<CatalogServiceInner>,
}

struct CatalogServiceInner {
    db: RealtimeDatabase,
    fallback_path: PathBuf,
    cache: Cache<String, Arc<LoadedCatalog>>,
}

impl CatalogService {
    /// Create a catalog reader with the given cache lifetime.
    #[must_use]
    pub fn new(db: RealtimeDatabase, fallback_path: PathBuf, ttl: Duration) -> Self {
        let cache = Cache::builder().max_capacity(1).time_to_live(ttl).build();

        Self {
            inner: Arc::new(CatalogServiceInner {
                db,
                fallback_path,
                cache,
            }),
        }
    }

    /// The current catalog, from cache when possible.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogUnavailable`] when neither the database nor the
    /// fallback file produced a catalog.
    pub async fn load(&self) -> Result<Arc<LoadedCatalog>, CatalogUnavailable> {
        let key = paths::catalog().to_string();
        self.inner
            .cache
            .try_get_with(key, self.fetch())
            .await
            .map_err(|e| (*e).clone())
    }

    /// Drop the cached catalog so the next read goes to the database.
    pub async fn invalidate(&self) {
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }

    #[instrument(skip(self))]
    async fn fetch(&self) -> Result<Arc<LoadedCatalog>, CatalogUnavailable> {
        let remote = match self.inner.db.get::<Catalog>(&paths::catalog()).await {
            Ok(Some(catalog)) if !catalog.sections.is_empty() => {
                info!(
                    source = %CatalogSource::Remote,
                    sections = catalog.sections.len(),
                    "catalog loaded"
                );
                return Ok(Arc::new(LoadedCatalog {
                    catalog,
                    source: CatalogSource::Remote,
                }));
            }
            Ok(_) => "catalog node is empty".to_string(),
            Err(e) => e.to_string(),
        };
        warn!(error = %remote, "database catalog unavailable, using bundled file");

        match load_fallback(&self.inner.fallback_path).await {
            Ok(catalog) => {
                info!(
                    source = %CatalogSource::Fallback,
                    path = %self.inner.fallback_path.display(),
                    sections = catalog.sections.len(),
                    "catalog loaded"
                );
                Ok(Arc::new(LoadedCatalog {
                    catalog,
                    source: CatalogSource::Fallback,
                }))
            }
            Err(fallback) => Err(CatalogUnavailable { remote, fallback }),
        }
    }
}

/// Read a catalog JSON file shaped like the `catalog` node.
///
/// # Errors
///
/// Returns a description of the I/O or parse failure.
pub async fn load_fallback(path: &Path) -> Result<Catalog, String> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| format!("{}: {e}", path.display()))?;
    serde_json::from_str(&raw).map_err(|e| format!("{}: {e}", path.display()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Write;

    use axum::Router;
    use axum::routing::get;
    use vapeshop_firebase::DatabaseConfig;

    use super::*;

    const FALLBACK: &str = r#"{
        "sections": {
            "devices": { "name": "Devices", "order": 2, "brands": [] },
            "liquids": { "name": "Liquids", "order": 1, "brands": [{ "name": "Nasty Juice" }] }
        }
    }"#;

    fn unreachable_db() -> RealtimeDatabase {
        // Port 9 (discard) is closed on test hosts, so connects fail fast.
        RealtimeDatabase::new(&DatabaseConfig {
            url: "http://127.0.0.1:9".to_string(),
            secret: None,
        })
        .unwrap()
    }

    fn fallback_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_falls_back_when_database_fails() {
        let file = fallback_file(FALLBACK);
        let service = CatalogService::new(
            unreachable_db(),
            file.path().to_path_buf(),
            Duration::from_secs(60),
        );

        let loaded = service.load().await.unwrap();
        assert_eq!(loaded.source, CatalogSource::Fallback);
        let order: Vec<&str> = loaded
            .catalog
            .ordered_sections()
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(order, vec!["liquids", "devices"]);
    }

    #[tokio::test]
    async fn test_both_sources_failing_is_an_error() {
        let service = CatalogService::new(
            unreachable_db(),
            PathBuf::from("/nonexistent/catalog.json"),
            Duration::from_secs(60),
        );
        let err = service.load().await.unwrap_err();
        assert!(err.fallback.contains("/nonexistent/catalog.json"));
    }

    #[tokio::test]
    async fn test_remote_wins_and_is_cached() {
        let app = Router::new().route(
            "/catalog.json",
            get(|| async {
                axum::Json(serde_json::json!({
                    "sections": { "pods": { "name": "Pods", "brands": [] } }
                }))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let db = RealtimeDatabase::new(&DatabaseConfig {
            url: format!("http://{addr}"),
            secret: None,
        })
        .unwrap();
        let file = fallback_file(FALLBACK);
        let service = CatalogService::new(db, file.path().to_path_buf(), Duration::from_secs(60));

        let first = service.load().await.unwrap();
        assert_eq!(first.source, CatalogSource::Remote);
        assert!(first.catalog.section("pods").is_some());

        // Served from cache once the database goes away.
        server.abort();
        let _ = server.await;
        let second = service.load().await.unwrap();
        assert_eq!(second.source, CatalogSource::Remote);
    }

    #[tokio::test]
    async fn test_empty_remote_uses_fallback() {
        let app = Router::new().route("/catalog.json", get(|| async { "null" }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let db = RealtimeDatabase::new(&DatabaseConfig {
            url: format!("http://{addr}"),
            secret: None,
        })
        .unwrap();
        let file = fallback_file(FALLBACK);
        let service = CatalogService::new(db, file.path().to_path_buf(), Duration::from_secs(60));

        assert_eq!(service.load().await.unwrap().source, CatalogSource::Fallback);
    }
}
