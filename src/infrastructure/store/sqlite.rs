// ============================================================
// SQLITE STORE
// ============================================================
// Catalog persistence on sqlx. Entity creation is transactional
// so a failed media insert never leaves a half-created entity.

use crate::domain::catalog::{Category, Manufacturer, NewCatalogEntity};
use crate::domain::error::{AppError, Result};
use crate::infrastructure::store::CatalogStore;
use async_trait::async_trait;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePool},
    Pool, Sqlite,
};
use std::str::FromStr;

pub struct SqliteCatalogStore {
    pool: Pool<Sqlite>,
}

impl SqliteCatalogStore {
    pub async fn init(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| {
                AppError::StoreError(format!("Failed to parse connection string: {}", e))
            })?
            .create_if_missing(true);

        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(|e| AppError::StoreError(format!("Failed to connect: {}", e)))?;

        for statement in [
            "CREATE TABLE IF NOT EXISTS manufacturers (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL
            )",
            "CREATE TABLE IF NOT EXISTS categories (
                id TEXT PRIMARY KEY,
                slug TEXT NOT NULL
            )",
            "CREATE TABLE IF NOT EXISTS entities (
                id TEXT PRIMARY KEY,
                reference_code TEXT NOT NULL UNIQUE,
                manufacturer_id TEXT NOT NULL,
                category_id TEXT NOT NULL,
                slug TEXT NOT NULL,
                status TEXT NOT NULL,
                featured INTEGER NOT NULL DEFAULT 0,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
            "CREATE TABLE IF NOT EXISTS entity_translations (
                entity_id TEXT NOT NULL,
                language TEXT NOT NULL,
                name TEXT NOT NULL,
                description TEXT,
                tech_sheet TEXT,
                PRIMARY KEY (entity_id, language)
            )",
            "CREATE TABLE IF NOT EXISTS entity_media (
                id TEXT PRIMARY KEY,
                entity_id TEXT NOT NULL,
                role TEXT NOT NULL,
                location TEXT NOT NULL,
                source_url TEXT NOT NULL,
                sort_order INTEGER NOT NULL,
                alt_text TEXT
            )",
        ] {
            sqlx::query(statement)
                .execute(&pool)
                .await
                .map_err(|e| AppError::StoreError(format!("Failed to create table: {}", e)))?;
        }

        Ok(Self { pool })
    }

    /// Seed helpers for reference data; imports assume manufacturers and
    /// categories already exist.
    pub async fn add_manufacturer(&self, id: &str, name: &str) -> Result<()> {
        sqlx::query("INSERT INTO manufacturers (id, name) VALUES (?, ?)")
            .bind(id)
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::StoreError(format!("Failed to insert manufacturer: {}", e)))?;
        Ok(())
    }

    pub async fn add_category(&self, id: &str, slug: &str) -> Result<()> {
        sqlx::query("INSERT INTO categories (id, slug) VALUES (?, ?)")
            .bind(id)
            .bind(slug)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::StoreError(format!("Failed to insert category: {}", e)))?;
        Ok(())
    }
}

// Internal entities for database mapping
#[derive(sqlx::FromRow)]
struct ManufacturerRow {
    id: String,
    name: String,
}

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: String,
    slug: String,
}

#[async_trait]
impl CatalogStore for SqliteCatalogStore {
    async fn find_entity_by_natural_key(&self, reference_code: &str) -> Result<Option<String>> {
        sqlx::query_scalar::<_, String>(
            "SELECT id FROM entities WHERE LOWER(reference_code) = LOWER(?)",
        )
        .bind(reference_code)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::StoreError(format!("Failed to look up entity: {}", e)))
    }

    async fn find_manufacturer_by_name(&self, name: &str) -> Result<Option<Manufacturer>> {
        sqlx::query_as::<_, ManufacturerRow>(
            "SELECT id, name FROM manufacturers WHERE LOWER(name) = LOWER(?)",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::StoreError(format!("Failed to look up manufacturer: {}", e)))
        .map(|row| {
            row.map(|r| Manufacturer {
                id: r.id,
                name: r.name,
            })
        })
    }

    async fn find_category_by_slug(&self, slug: &str) -> Result<Option<Category>> {
        sqlx::query_as::<_, CategoryRow>(
            "SELECT id, slug FROM categories WHERE LOWER(slug) = LOWER(?)",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::StoreError(format!("Failed to look up category: {}", e)))
        .map(|row| {
            row.map(|r| Category {
                id: r.id,
                slug: r.slug,
            })
        })
    }

    async fn list_manufacturer_names(&self) -> Result<Vec<String>> {
        sqlx::query_scalar::<_, String>("SELECT name FROM manufacturers ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::StoreError(format!("Failed to list manufacturers: {}", e)))
    }

    async fn create_entity_with_translations_and_media(
        &self,
        entity: NewCatalogEntity,
    ) -> Result<String> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::StoreError(format!("Failed to begin transaction: {}", e)))?;

        sqlx::query(
            "INSERT INTO entities (id, reference_code, manufacturer_id, category_id, slug, status, featured, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&entity.id)
        .bind(&entity.reference_code)
        .bind(&entity.manufacturer_id)
        .bind(&entity.category_id)
        .bind(&entity.slug)
        .bind(&entity.status)
        .bind(entity.featured)
        .bind(chrono::Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::StoreError(format!("Failed to insert entity: {}", e)))?;

        for t in &entity.translations {
            sqlx::query(
                "INSERT INTO entity_translations (entity_id, language, name, description, tech_sheet)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(&entity.id)
            .bind(&t.language)
            .bind(&t.name)
            .bind(&t.description)
            .bind(&t.tech_sheet)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::StoreError(format!("Failed to insert translation: {}", e)))?;
        }

        for m in &entity.media {
            sqlx::query(
                "INSERT INTO entity_media (id, entity_id, role, location, source_url, sort_order, alt_text)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&m.id)
            .bind(&entity.id)
            .bind(m.role.as_str())
            .bind(&m.location)
            .bind(&m.source_url)
            .bind(m.sort_order)
            .bind(&m.alt_text)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::StoreError(format!("Failed to insert media: {}", e)))?;
        }

        tx.commit()
            .await
            .map_err(|e| AppError::StoreError(format!("Failed to commit: {}", e)))?;
        Ok(entity.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::TranslationRecord;
    use crate::domain::media::MediaRole;
    use crate::domain::catalog::MediaRecord;

    // In-memory sqlite gives each pooled connection its own database, so
    // tests go through a temp file instead.
    async fn temp_store() -> (tempfile::TempDir, SqliteCatalogStore) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("catalog.db").display());
        let store = SqliteCatalogStore::init(&url).await.unwrap();
        (dir, store)
    }

    fn entity(reference: &str) -> NewCatalogEntity {
        NewCatalogEntity {
            id: format!("id-{}", reference),
            reference_code: reference.to_string(),
            manufacturer_id: "m-1".to_string(),
            category_id: "c-1".to_string(),
            slug: reference.to_lowercase(),
            status: "active".to_string(),
            featured: true,
            translations: vec![TranslationRecord {
                language: "en".to_string(),
                name: "Forceps".to_string(),
                description: None,
                tech_sheet: None,
            }],
            media: vec![MediaRecord {
                id: "media-1".to_string(),
                role: MediaRole::Primary,
                location: "/media/abc-1-primary.jpg".to_string(),
                source_url: "https://h/x.jpg".to_string(),
                sort_order: 0,
                alt_text: Some("Forceps".to_string()),
            }],
        }
    }

    #[tokio::test]
    async fn test_create_and_find_by_natural_key() {
        let (_dir, store) = temp_store().await;
        let id = store
            .create_entity_with_translations_and_media(entity("ABC-1"))
            .await
            .unwrap();
        assert_eq!(id, "id-ABC-1");
        assert_eq!(
            store.find_entity_by_natural_key("abc-1").await.unwrap(),
            Some("id-ABC-1".to_string())
        );
        assert_eq!(store.find_entity_by_natural_key("other").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_duplicate_natural_key_rejected_by_unique_index() {
        let (_dir, store) = temp_store().await;
        store
            .create_entity_with_translations_and_media(entity("ABC-1"))
            .await
            .unwrap();
        let mut second = entity("ABC-1");
        second.id = "id-other".to_string();
        assert!(store
            .create_entity_with_translations_and_media(second)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_reference_lookups() {
        let (_dir, store) = temp_store().await;
        store.add_manufacturer("m-1", "ACME Surgical").await.unwrap();
        store
            .add_category("c-1", "ophthalmology-surgical")
            .await
            .unwrap();
        let m = store
            .find_manufacturer_by_name("acme surgical")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(m.name, "ACME Surgical");
        assert!(store
            .find_category_by_slug("Ophthalmology-Surgical")
            .await
            .unwrap()
            .is_some());
        assert_eq!(
            store.list_manufacturer_names().await.unwrap(),
            vec!["ACME Surgical".to_string()]
        );
    }
}
