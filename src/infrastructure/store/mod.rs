// ============================================================
// CATALOG STORE
// ============================================================
// Persistence seam between the import pipeline and the catalog.
// Name and slug lookups are case-insensitive.

use crate::domain::catalog::{Category, Manufacturer, NewCatalogEntity};
use crate::domain::error::Result;
use async_trait::async_trait;

pub mod memory;
pub mod sqlite;

#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Entity id for a natural key, when one exists.
    async fn find_entity_by_natural_key(&self, reference_code: &str) -> Result<Option<String>>;

    async fn find_manufacturer_by_name(&self, name: &str) -> Result<Option<Manufacturer>>;

    async fn find_category_by_slug(&self, slug: &str) -> Result<Option<Category>>;

    /// Canonical manufacturer names, for validation membership checks.
    async fn list_manufacturer_names(&self) -> Result<Vec<String>>;

    /// Create the entity with its translations and media in one unit; fails
    /// when the natural key is already taken.
    async fn create_entity_with_translations_and_media(
        &self,
        entity: NewCatalogEntity,
    ) -> Result<String>;
}
