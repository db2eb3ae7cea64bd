//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use vapeshop_firebase::{FirebaseError, IdentityClient, IdentityError, RealtimeDatabase};

use crate::catalog::CatalogService;
use crate::config::StorefrontConfig;

/// How long a loaded catalog is served before the database is asked again.
pub const CATALOG_CACHE_TTL: Duration = Duration::from_secs(300);

/// Error building the Firebase clients.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("database client: {0}")]
    Database(#[from] FirebaseError),
    #[error("identity client: {0}")]
    Identity(#[from] IdentityError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// Firebase clients, the catalog cache and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    database: RealtimeDatabase,
    identity: IdentityClient,
    catalog: CatalogService,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if a Firebase client cannot be built from the config.
    pub fn new(config: StorefrontConfig) -> Result<Self, StateError> {
        let database = RealtimeDatabase::new(&config.firebase.database)?;
        let identity = IdentityClient::new(&config.firebase.identity)?;
        let catalog = CatalogService::new(
            database.clone(),
            config.catalog_fallback_path.clone(),
            CATALOG_CACHE_TTL,
        );

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                database,
                identity,
                catalog,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the Realtime Database client.
    #[must_use]
    pub fn database(&self) -> &RealtimeDatabase {
        &self.inner.database
    }

    /// Get a reference to the Firebase Authentication client.
    #[must_use]
    pub fn identity(&self) -> &IdentityClient {
        &self.inner.identity
    }

    /// Get a reference to the cached catalog reader.
    #[must_use]
    pub fn catalog(&self) -> &CatalogService {
        &self.inner.catalog
    }
}
