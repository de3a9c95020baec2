// ============================================================
// CATALOG ENTITIES
// ============================================================
// Store-facing records; the external store owns persistence

use crate::domain::media::MediaRole;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manufacturer {
    pub id: String,
    /// Canonical display name.
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub slug: String,
}

/// One per-language translation row attached to an entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationRecord {
    pub language: String,
    pub name: String,
    pub description: Option<String>,
    pub tech_sheet: Option<String>,
}

/// One media row attached to an entity. `location` is a local reference when
/// acquisition succeeded, or the original remote URL as a fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaRecord {
    pub id: String,
    pub role: MediaRole,
    pub location: String,
    pub source_url: String,
    pub sort_order: i32,
    pub alt_text: Option<String>,
}

/// A catalog entity ready for creation, with its translations and media.
/// The natural key is `reference_code`; the store is asked to create an
/// entity at most once per key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCatalogEntity {
    pub id: String,
    pub reference_code: String,
    pub manufacturer_id: String,
    pub category_id: String,
    pub slug: String,
    pub status: String,
    pub featured: bool,
    pub translations: Vec<TranslationRecord>,
    pub media: Vec<MediaRecord>,
}

/// Derive a URL-safe slug from the English name and reference code:
/// lowercase, non-alphanumeric runs collapsed to `-`, capped at 50 chars.
pub fn generate_slug(name_en: &str, reference_code: &str) -> String {
    let joined = format!("{}-{}", name_en, reference_code).to_lowercase();
    let mut slug = String::with_capacity(joined.len());
    let mut last_dash = true;
    for c in joined.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    let trimmed = slug.trim_matches('-');
    trimmed.chars().take(50).collect::<String>().trim_end_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_slug() {
        assert_eq!(
            generate_slug("Micro Forceps, Curved", "2414-P-5032"),
            "micro-forceps-curved-2414-p-5032"
        );
    }

    #[test]
    fn test_generate_slug_caps_length() {
        let slug = generate_slug(&"very long product name ".repeat(5), "REF-1");
        assert!(slug.len() <= 50);
        assert!(!slug.ends_with('-'));
    }

    #[test]
    fn test_generate_slug_trims_edges() {
        assert_eq!(generate_slug("  Lamp  ", "A1"), "lamp-a1");
    }
}
