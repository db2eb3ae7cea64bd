//! Back-office access to the Realtime Database.
//!
//! # Layout
//!
//! - `catalog/sections/<sectionId>` - Sections, each owning a `brands` array
//! - `users/<id>` - Customer profiles
//! - `users/<id>/orders/<key>` - Orders
//! - `users/<id>/services/<kind>/<key>` - Service requests
//! - `stats/totalVisits`, `dailyStats/<YYYY-MM-DD>` - Visit counters
//!
//! Repositories borrow the shared [`RealtimeDatabase`] client. Catalog edits
//! read the section, apply the change in memory and write the whole `brands`
//! array back, so concurrent edits to one section are last-write-wins.

pub mod catalog;
pub mod stats;
pub mod users;

use thiserror::Error;
use vapeshop_core::{CatalogError, KeyError};
use vapeshop_firebase::FirebaseError;

pub use catalog::CatalogRepository;
pub use stats::StatsRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Realtime Database call failed.
    #[error("database error: {0}")]
    Database(#[from] FirebaseError),

    /// A catalog rule was violated (duplicate, missing or blank name).
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// A key from the request cannot be used as a database path segment.
    #[error("invalid key: {0}")]
    InvalidKey(#[from] KeyError),

    /// Requested record was not found.
    #[error("not found: {0}")]
    NotFound(String),
}
