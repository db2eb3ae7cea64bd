//! Catalog repository.
//!
//! Sections are created and removed as whole nodes. Everything below a
//! section goes through [`CatalogRepository::edit_section`], which rewrites
//! only that section's `brands` array; sibling sections are never written.

use tracing::{info, instrument};
use vapeshop_core::{Catalog, CatalogError, EntityKind, Section, SectionId};
use vapeshop_firebase::{RealtimeDatabase, paths};

use super::RepositoryError;

/// Repository for catalog reads and writes.
pub struct CatalogRepository<'a> {
    db: &'a RealtimeDatabase,
}

impl<'a> CatalogRepository<'a> {
    /// Create a new catalog repository.
    #[must_use]
    pub const fn new(db: &'a RealtimeDatabase) -> Self {
        Self { db }
    }

    /// Load the whole catalog. A missing node is an empty catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the database call fails.
    #[instrument(skip(self))]
    pub async fn catalog(&self) -> Result<Catalog, RepositoryError> {
        Ok(self.db.get(&paths::catalog()).await?.unwrap_or_default())
    }

    /// Load one section.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the section does not exist.
    #[instrument(skip(self), fields(section = %id))]
    pub async fn section(&self, id: &SectionId) -> Result<Section, RepositoryError> {
        self.db
            .get::<Section>(&paths::section(id))
            .await?
            .ok_or_else(|| {
                RepositoryError::Catalog(CatalogError::NotFound {
                    kind: EntityKind::Section,
                    name: id.to_string(),
                })
            })
    }

    /// Create an empty section placed after the existing ones.
    ///
    /// # Errors
    ///
    /// Returns a catalog error for a blank name or an id already in use.
    #[instrument(skip(self), fields(section = %id))]
    pub async fn create_section(&self, id: &SectionId, name: &str) -> Result<(), RepositoryError> {
        let mut catalog = self.catalog().await?;
        catalog.add_section(id, name)?;
        let section = catalog.require_section_mut(id.as_str())?;
        self.db.set(&paths::section(id), section).await?;
        info!("section created");
        Ok(())
    }

    /// Remove a section and everything under it.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the section does not exist.
    #[instrument(skip(self), fields(section = %id))]
    pub async fn delete_section(&self, id: &SectionId) -> Result<(), RepositoryError> {
        self.section(id).await?;
        self.db.remove(&paths::section(id)).await?;
        info!("section deleted");
        Ok(())
    }

    /// Apply `edit` to a section and write its `brands` array back.
    ///
    /// Nothing is written when `edit` fails.
    ///
    /// # Errors
    ///
    /// Returns the error from `edit`, `NotFound` for a missing section, or a
    /// database error.
    #[instrument(skip(self, edit), fields(section = %id))]
    pub async fn edit_section<T, F>(&self, id: &SectionId, edit: F) -> Result<T, RepositoryError>
    where
        F: FnOnce(&mut Section) -> Result<T, CatalogError> + Send,
        T: Send,
    {
        let mut section = self.section(id).await?;
        let out = edit(&mut section)?;
        self.db
            .set(&paths::section_brands(id), &section.brands)
            .await?;
        Ok(out)
    }
}
