// ============================================================
// IN-MEMORY STORE
// ============================================================
// Mutex-guarded maps, used when no database is configured and
// by the pipeline tests

use crate::domain::catalog::{Category, Manufacturer, NewCatalogEntity};
use crate::domain::error::{AppError, Result};
use crate::infrastructure::store::CatalogStore;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
struct Inner {
    manufacturers: Vec<Manufacturer>,
    categories: Vec<Category>,
    /// Keyed by lowercased reference code.
    entities: HashMap<String, NewCatalogEntity>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_manufacturer(&self, id: &str, name: &str) {
        self.lock().manufacturers.push(Manufacturer {
            id: id.to_string(),
            name: name.to_string(),
        });
    }

    pub fn add_category(&self, id: &str, slug: &str) {
        self.lock().categories.push(Category {
            id: id.to_string(),
            slug: slug.to_string(),
        });
    }

    pub fn entity_count(&self) -> usize {
        self.lock().entities.len()
    }

    pub fn entity(&self, reference_code: &str) -> Option<NewCatalogEntity> {
        self.lock()
            .entities
            .get(&reference_code.to_lowercase())
            .cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn find_entity_by_natural_key(&self, reference_code: &str) -> Result<Option<String>> {
        Ok(self
            .lock()
            .entities
            .get(&reference_code.to_lowercase())
            .map(|e| e.id.clone()))
    }

    async fn find_manufacturer_by_name(&self, name: &str) -> Result<Option<Manufacturer>> {
        let wanted = name.to_lowercase();
        Ok(self
            .lock()
            .manufacturers
            .iter()
            .find(|m| m.name.to_lowercase() == wanted)
            .cloned())
    }

    async fn find_category_by_slug(&self, slug: &str) -> Result<Option<Category>> {
        let wanted = slug.to_lowercase();
        Ok(self
            .lock()
            .categories
            .iter()
            .find(|c| c.slug.to_lowercase() == wanted)
            .cloned())
    }

    async fn list_manufacturer_names(&self) -> Result<Vec<String>> {
        Ok(self
            .lock()
            .manufacturers
            .iter()
            .map(|m| m.name.clone())
            .collect())
    }

    async fn create_entity_with_translations_and_media(
        &self,
        entity: NewCatalogEntity,
    ) -> Result<String> {
        let mut inner = self.lock();
        let key = entity.reference_code.to_lowercase();
        if inner.entities.contains_key(&key) {
            return Err(AppError::StoreError(format!(
                "entity already exists: {}",
                entity.reference_code
            )));
        }
        let id = entity.id.clone();
        inner.entities.insert(key, entity);
        Ok(id)
    }
}
