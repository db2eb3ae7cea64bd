//! Catalog import, export and validation.
//!
//! The file format is the `catalog` node itself:
//!
//! ```json
//! { "sections": { "liquids": { "name": "Liquids", "order": 1, "brands": [ ... ] } } }
//! ```
//!
//! This is also the storefront's fallback file, so `export` can refresh it
//! straight from the live database.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;
use vapeshop_core::{Catalog, validate_key};
use vapeshop_firebase::{FirebaseError, RealtimeDatabase, paths};

/// Errors that can occur during catalog commands.
#[derive(Debug, Error)]
pub enum CatalogCommandError {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{}: invalid catalog JSON: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// The file parsed but breaks catalog rules.
    #[error("{count} problem(s) found in {}", path.display())]
    Invalid { path: PathBuf, count: usize },

    #[error("Database error: {0}")]
    Database(#[from] FirebaseError),

    #[error("Failed to serialize catalog: {0}")]
    Serialize(serde_json::Error),
}

/// One rule violation, located by its position in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    pub location: String,
    pub message: String,
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.message)
    }
}

/// Tracks sibling names, case-insensitively.
struct Siblings<'a> {
    seen: HashSet<String>,
    problems: &'a mut Vec<Problem>,
}

impl<'a> Siblings<'a> {
    fn new(problems: &'a mut Vec<Problem>) -> Self {
        Self {
            seen: HashSet::new(),
            problems,
        }
    }

    fn check(&mut self, location: &str, kind: &str, name: &str) {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            self.problems.push(Problem {
                location: location.to_string(),
                message: format!("{kind} name is empty"),
            });
        } else if !self.seen.insert(trimmed.to_lowercase()) {
            self.problems.push(Problem {
                location: location.to_string(),
                message: format!("duplicate {kind} name '{trimmed}'"),
            });
        }
    }
}

/// Check a catalog against the rules the admin enforces on every edit:
/// valid section keys, non-blank names, and names unique among siblings
/// ignoring case.
#[must_use]
pub fn validate(catalog: &Catalog) -> Vec<Problem> {
    let mut problems = Vec::new();

    for (id, section) in catalog.ordered_sections() {
        let at = format!("sections/{id}");
        if let Err(e) = validate_key(id) {
            problems.push(Problem {
                location: at.clone(),
                message: format!("invalid section id: {e}"),
            });
        }
        if section.name.trim().is_empty() {
            problems.push(Problem {
                location: at.clone(),
                message: "section name is empty".to_string(),
            });
        }

        {
            let mut names = Siblings::new(&mut problems);
            for (b, brand) in section.brands.iter().enumerate() {
                names.check(&format!("{at}/brands/{b}"), "brand", &brand.name);
            }
        }

        for (b, brand) in section.brands.iter().enumerate() {
            {
                let mut names = Siblings::new(&mut problems);
                for (l, line) in brand.lines.iter().enumerate() {
                    names.check(&format!("{at}/brands/{b}/lines/{l}"), "line", &line.name);
                }
            }

            for (l, line) in brand.lines.iter().enumerate() {
                let mut names = Siblings::new(&mut problems);
                for (p, product) in line.products.iter().enumerate() {
                    names.check(
                        &format!("{at}/brands/{b}/lines/{l}/products/{p}"),
                        "product",
                        &product.name,
                    );
                }
            }
        }
    }

    problems
}

/// Read and parse a catalog file.
///
/// # Errors
///
/// Returns `Io` or `Parse` with the file path.
pub async fn read_catalog(path: &Path) -> Result<Catalog, CatalogCommandError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CatalogCommandError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    serde_json::from_str(&raw).map_err(|source| CatalogCommandError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Read a file and refuse it if it breaks any catalog rule.
async fn read_valid(path: &Path) -> Result<Catalog, CatalogCommandError> {
    let catalog = read_catalog(path).await?;
    let problems = validate(&catalog);
    for problem in &problems {
        tracing::error!("{problem}");
    }
    if problems.is_empty() {
        Ok(catalog)
    } else {
        Err(CatalogCommandError::Invalid {
            path: path.to_path_buf(),
            count: problems.len(),
        })
    }
}

/// `catalog validate <file>`
///
/// # Errors
///
/// Returns an error if the file cannot be read or has problems.
pub async fn validate_file(path: &Path) -> Result<(), CatalogCommandError> {
    let catalog = read_valid(path).await?;
    tracing::info!(
        sections = catalog.sections.len(),
        brands = catalog.brand_count(),
        lines = catalog.line_count(),
        products = catalog.product_count(),
        "{} is valid",
        path.display()
    );
    Ok(())
}

/// `catalog import <file>`: replace the whole `catalog` node.
///
/// The file is validated first; nothing is written when it has problems.
///
/// # Errors
///
/// Returns an error if the file is invalid or the write fails.
pub async fn import(db: &RealtimeDatabase, path: &Path) -> Result<(), CatalogCommandError> {
    let catalog = read_valid(path).await?;
    db.set(&paths::catalog(), &catalog).await?;
    tracing::info!(
        sections = catalog.sections.len(),
        products = catalog.product_count(),
        "Catalog imported from {}",
        path.display()
    );
    Ok(())
}

/// `catalog export <file>`: write the live catalog as pretty JSON.
///
/// An empty database exports as an empty catalog.
///
/// # Errors
///
/// Returns an error if the read or the file write fails.
pub async fn export(db: &RealtimeDatabase, path: &Path) -> Result<(), CatalogCommandError> {
    let catalog: Catalog = db.get(&paths::catalog()).await?.unwrap_or_default();
    let mut json = serde_json::to_string_pretty(&catalog).map_err(CatalogCommandError::Serialize)?;
    json.push('\n');
    tokio::fs::write(path, json)
        .await
        .map_err(|source| CatalogCommandError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    tracing::info!(
        sections = catalog.sections.len(),
        products = catalog.product_count(),
        "Catalog exported to {}",
        path.display()
    );
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    use axum::extract::State;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::{Value, json};
    use vapeshop_firebase::DatabaseConfig;

    use super::*;

    fn catalog(value: Value) -> Catalog {
        serde_json::from_value(value).unwrap()
    }

    fn file_with(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    /// In-process stand-in for the `catalog` node.
    async fn fake_database(initial: Value) -> (RealtimeDatabase, Arc<Mutex<Value>>) {
        let store = Arc::new(Mutex::new(initial));
        let app = Router::new()
            .route(
                "/catalog.json",
                get(|State(store): State<Arc<Mutex<Value>>>| async move {
                    Json(store.lock().unwrap().clone())
                })
                .put(
                    |State(store): State<Arc<Mutex<Value>>>, Json(body): Json<Value>| async move {
                        *store.lock().unwrap() = body;
                    },
                ),
            )
            .with_state(store.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        let db = RealtimeDatabase::new(&DatabaseConfig {
            url: format!("http://{addr}"),
            secret: None,
        })
        .unwrap();
        (db, store)
    }

    #[test]
    fn test_validate_accepts_clean_catalog() {
        let clean = catalog(json!({
            "sections": {
                "liquids": {
                    "name": "Liquids",
                    "brands": [
                        { "name": "Nasty", "lines": [{ "name": "Ice", "products": [{ "name": "Mint" }, { "name": "Mango" }] }] },
                        { "name": "Drip Lab" }
                    ]
                }
            }
        }));
        assert!(validate(&clean).is_empty());
    }

    #[test]
    fn test_validate_reports_duplicates_ignoring_case() {
        let dup = catalog(json!({
            "sections": {
                "liquids": {
                    "name": "Liquids",
                    "brands": [
                        { "name": "Nasty", "lines": [{ "name": "Ice", "products": [{ "name": "Mint" }, { "name": " MINT " }] }] },
                        { "name": "nasty" }
                    ]
                }
            }
        }));

        let problems = validate(&dup);
        assert_eq!(problems.len(), 2);
        assert_eq!(problems[0].location, "sections/liquids/brands/1");
        assert_eq!(problems[0].message, "duplicate brand name 'nasty'");
        assert_eq!(problems[1].location, "sections/liquids/brands/0/lines/0/products/1");
    }

    #[test]
    fn test_validate_reports_blank_names_and_bad_ids() {
        let bad = catalog(json!({
            "sections": {
                "pods.kits": { "name": "  ", "brands": [{ "name": "" }] }
            }
        }));

        let messages: Vec<String> = validate(&bad).iter().map(ToString::to_string).collect();
        assert_eq!(
            messages,
            [
                "sections/pods.kits: invalid section id: key contains forbidden character '.'",
                "sections/pods.kits: section name is empty",
                "sections/pods.kits/brands/0: brand name is empty",
            ]
        );
    }

    #[tokio::test]
    async fn test_read_catalog_reports_parse_errors_with_path() {
        let file = file_with("{ not json");
        let err = read_catalog(file.path()).await.unwrap_err();
        assert!(matches!(err, CatalogCommandError::Parse { .. }));
        assert!(err.to_string().contains("invalid catalog JSON"));
    }

    #[tokio::test]
    async fn test_import_writes_whole_catalog() {
        let (db, store) = fake_database(Value::Null).await;
        let file = file_with(
            r#"{ "sections": { "devices": { "name": "Devices", "order": 2, "brands": [{ "name": "Vaporesso" }] } } }"#,
        );

        import(&db, file.path()).await.unwrap();

        let stored = store.lock().unwrap().clone();
        assert_eq!(stored["sections"]["devices"]["name"], "Devices");
        assert_eq!(stored["sections"]["devices"]["brands"][0]["name"], "Vaporesso");
    }

    #[tokio::test]
    async fn test_import_refuses_invalid_file() {
        let (db, store) = fake_database(json!({ "sections": {} })).await;
        let file = file_with(
            r#"{ "sections": { "devices": { "name": "Devices", "brands": [{ "name": "A" }, { "name": "a" }] } } }"#,
        );

        let err = import(&db, file.path()).await.unwrap_err();
        assert!(matches!(err, CatalogCommandError::Invalid { count: 1, .. }));
        assert_eq!(*store.lock().unwrap(), json!({ "sections": {} }));
    }

    #[tokio::test]
    async fn test_export_writes_readable_file() {
        let (db, _store) = fake_database(json!({
            "sections": { "liquids": { "name": "Liquids", "order": 1, "brands": [{ "name": "Nasty" }] } }
        }))
        .await;
        let out = tempfile::NamedTempFile::new().unwrap();

        export(&db, out.path()).await.unwrap();

        let exported = read_catalog(out.path()).await.unwrap();
        assert_eq!(exported.brand_count(), 1);
        assert_eq!(exported.sections["liquids"].name, "Liquids");
    }

    #[tokio::test]
    async fn test_export_of_empty_database_is_empty_catalog() {
        let (db, _store) = fake_database(Value::Null).await;
        let out = tempfile::NamedTempFile::new().unwrap();

        export(&db, out.path()).await.unwrap();

        assert!(read_catalog(out.path()).await.unwrap().sections.is_empty());
    }
}
