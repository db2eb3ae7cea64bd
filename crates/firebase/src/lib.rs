//! Firebase REST clients.
//!
//! # Architecture
//!
//! - [`RealtimeDatabase`] talks to the Realtime Database REST API
//!   (`<database>/<path>.json`). The database is the source of truth; there is
//!   no local sync, every read and write is a direct call.
//! - [`IdentityClient`] talks to the Identity Toolkit REST API for
//!   email/password sign-up and sign-in.
//!
//! Both clients are cheap to clone (`Arc` inside) and safe to share across
//! handlers.
//!
//! # Example
//!
//! ```rust,ignore
//! use vapeshop_firebase::{DatabaseConfig, RealtimeDatabase, paths};
//!
//! let db = RealtimeDatabase::new(&config)?;
//! let catalog: Option<Catalog> = db.get(&paths::catalog()).await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

mod database;
mod error;
mod identity;
pub mod paths;

pub use database::RealtimeDatabase;
pub use error::{FirebaseError, IdentityError};
pub use identity::{AuthSession, IdentityClient};
pub use paths::DbPath;

use secrecy::SecretString;

/// Default Identity Toolkit endpoint.
pub const DEFAULT_IDENTITY_URL: &str = "https://identitytoolkit.googleapis.com";

/// Realtime Database connection settings.
///
/// Implements `Debug` manually to redact the secret.
#[derive(Clone)]
pub struct DatabaseConfig {
    /// Database root URL (e.g., `https://<project>-default-rtdb.firebaseio.com`)
    pub url: String,
    /// Legacy database secret or service token, sent as the `auth` parameter
    pub secret: Option<SecretString>,
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &self.url)
            .field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Identity Toolkit settings.
#[derive(Clone)]
pub struct IdentityConfig {
    /// Web API key of the Firebase project
    pub api_key: SecretString,
    /// Identity Toolkit base URL, overridable for emulators and tests
    pub base_url: String,
}

impl std::fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .finish()
    }
}
