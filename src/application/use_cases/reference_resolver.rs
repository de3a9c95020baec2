// ============================================================
// REFERENCE RESOLVER
// ============================================================
// Turns the manufacturer name and category slug of a validated
// record into store identifiers

use crate::domain::record::{Field, FieldMap};
use crate::infrastructure::store::CatalogStore;
use std::sync::Arc;

/// Identifiers a record needs before it can be persisted.
#[derive(Debug, Clone)]
pub struct ResolvedReferences {
    pub manufacturer_id: String,
    pub category_id: String,
    /// Set when the record resolved, but the manufacturer spelling drifted
    /// from the stored canonical name.
    pub warning: Option<String>,
}

/// A record-level resolution failure. Store errors are folded in here as
/// well: from the batch loop's point of view the record simply could not be
/// resolved, whatever the cause.
#[derive(Debug)]
pub struct ResolveFailure {
    pub message: String,
}

pub struct ReferenceResolver<S: CatalogStore + ?Sized> {
    store: Arc<S>,
}

impl<S: CatalogStore + ?Sized> ReferenceResolver<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn resolve(
        &self,
        map: &FieldMap,
    ) -> std::result::Result<ResolvedReferences, ResolveFailure> {
        let raw_manufacturer = map.get(Field::Manufacturer);
        let manufacturer = self
            .store
            .find_manufacturer_by_name(raw_manufacturer)
            .await
            .map_err(|e| ResolveFailure {
                message: format!("manufacturer lookup failed: {}", e),
            })?
            .ok_or_else(|| ResolveFailure {
                message: format!("manufacturer not found: '{}'", raw_manufacturer),
            })?;

        let category_slug = map.get(Field::CategoryId);
        let category = self
            .store
            .find_category_by_slug(category_slug)
            .await
            .map_err(|e| ResolveFailure {
                message: format!("category lookup failed: {}", e),
            })?
            .ok_or_else(|| ResolveFailure {
                message: format!("category not found: '{}'", category_slug),
            })?;

        // Same brand, different spelling: resolve anyway, but surface it
        let warning = if manufacturer.name != raw_manufacturer
            && fold(&manufacturer.name) == fold(raw_manufacturer)
        {
            Some(format!(
                "manufacturer '{}' matched stored name '{}'",
                raw_manufacturer, manufacturer.name
            ))
        } else {
            None
        };

        Ok(ResolvedReferences {
            manufacturer_id: manufacturer.id,
            category_id: category.id,
            warning,
        })
    }
}

/// Case- and punctuation-insensitive comparison key.
fn fold(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}
