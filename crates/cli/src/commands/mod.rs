//! CLI command implementations.

pub mod catalog;

use secrecy::SecretString;
use thiserror::Error;
use vapeshop_firebase::{DatabaseConfig, FirebaseError, RealtimeDatabase};

/// Errors while setting up a command.
#[derive(Debug, Error)]
pub enum SetupError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// The database client could not be built.
    #[error("Database client error: {0}")]
    Database(#[from] FirebaseError),
}

/// Build a database client from `FIREBASE_DATABASE_URL` and the optional
/// `FIREBASE_DATABASE_SECRET`, loading `.env` first.
///
/// # Errors
///
/// Returns an error if the URL is missing or invalid.
pub fn database_from_env() -> Result<RealtimeDatabase, SetupError> {
    dotenvy::dotenv().ok();

    let url = std::env::var("FIREBASE_DATABASE_URL")
        .map_err(|_| SetupError::MissingEnvVar("FIREBASE_DATABASE_URL"))?;
    let secret = std::env::var("FIREBASE_DATABASE_SECRET")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(SecretString::from);

    tracing::info!("Using Realtime Database at {url}");
    Ok(RealtimeDatabase::new(&DatabaseConfig { url, secret })?)
}
