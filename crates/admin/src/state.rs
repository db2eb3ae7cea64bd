//! Application state shared across handlers.

use std::sync::Arc;

use vapeshop_firebase::{FirebaseError, IdentityClient, IdentityError, RealtimeDatabase};

use crate::cloudinary::{CloudinaryClient, CloudinaryError};
use crate::config::AdminConfig;
use crate::sumup::{SumUpClient, SumUpError};

/// Error building the external service clients.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("database client: {0}")]
    Database(#[from] FirebaseError),
    #[error("identity client: {0}")]
    Identity(#[from] IdentityError),
    #[error("cloudinary client: {0}")]
    Cloudinary(#[from] CloudinaryError),
    #[error("sumup client: {0}")]
    SumUp(#[from] SumUpError),
}

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    database: RealtimeDatabase,
    identity: IdentityClient,
    cloudinary: Option<CloudinaryClient>,
    sumup: SumUpClient,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if a client cannot be built from the config.
    pub fn new(config: AdminConfig) -> Result<Self, StateError> {
        let database = RealtimeDatabase::new(&config.firebase.database)?;
        let identity = IdentityClient::new(&config.firebase.identity)?;
        let cloudinary = config
            .cloudinary
            .as_ref()
            .map(CloudinaryClient::new)
            .transpose()?;
        let sumup = SumUpClient::new(&config.sumup)?;

        if cloudinary.is_none() {
            tracing::info!("Cloudinary not configured, image uploads disabled");
        }
        if !sumup.is_configured() {
            tracing::warn!("SUMUP_BEARER_TOKEN not set, payment proxy will answer 500");
        }

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                database,
                identity,
                cloudinary,
                sumup,
            }),
        })
    }

    /// Get a reference to the admin configuration.
    #[must_use]
    pub fn config(&self) -> &AdminConfig {
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

    /// Get the Cloudinary client, if uploads are enabled.
    #[must_use]
    pub fn cloudinary(&self) -> Option<&CloudinaryClient> {
        self.inner.cloudinary.as_ref()
    }

    /// Get a reference to the SumUp client.
    #[must_use]
    pub fn sumup(&self) -> &SumUpClient {
        &self.inner.sumup
    }
}
