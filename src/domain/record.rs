// ============================================================
// RECORD TYPES
// ============================================================
// One input line, tokenized and mapped to logical fields

use serde::{Deserialize, Serialize};

/// Logical fields of one catalog record, in source-column order.
///
/// Declaration order is load-bearing: validation errors are reported in this
/// order, and `FieldMap` indexes by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Field {
    ReferenceCode,
    Manufacturer,
    Slug,
    CategoryId,
    Status,
    Featured,
    NameFr,
    NameEn,
    DescriptionFr,
    DescriptionEn,
    TechSheetFr,
    TechSheetEn,
    ImageUrls,
}

impl Field {
    pub const COLUMN_ORDER: [Field; 13] = [
        Field::ReferenceCode,
        Field::Manufacturer,
        Field::Slug,
        Field::CategoryId,
        Field::Status,
        Field::Featured,
        Field::NameFr,
        Field::NameEn,
        Field::DescriptionFr,
        Field::DescriptionEn,
        Field::TechSheetFr,
        Field::TechSheetEn,
        Field::ImageUrls,
    ];

    pub const EXPECTED_COUNT: usize = Self::COLUMN_ORDER.len();

    /// Name used in error messages and reports.
    pub fn name(&self) -> &'static str {
        match self {
            Field::ReferenceCode => "referenceCode",
            Field::Manufacturer => "manufacturer",
            Field::Slug => "slug",
            Field::CategoryId => "categoryId",
            Field::Status => "status",
            Field::Featured => "featured",
            Field::NameFr => "nameFr",
            Field::NameEn => "nameEn",
            Field::DescriptionFr => "descriptionFr",
            Field::DescriptionEn => "descriptionEn",
            Field::TechSheetFr => "techSheetFr",
            Field::TechSheetEn => "techSheetEn",
            Field::ImageUrls => "imageUrls",
        }
    }
}

/// One tokenized input line, before any semantic typing.
#[derive(Debug, Clone)]
pub struct RawRecord {
    /// Physical line number in the source file (header is line 1).
    pub line_number: usize,
    /// Field values in source-column order, already trimmed.
    pub fields: Vec<String>,
}

impl RawRecord {
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }
}

/// Mapping from logical field to string value, built once per accepted line.
///
/// Invariant: always holds exactly `Field::EXPECTED_COUNT` values; a line with
/// fewer fields is rejected before a map is built. Extra trailing fields are
/// ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldMap {
    values: Vec<String>,
}

impl FieldMap {
    /// Build from a raw record. Returns `None` when the record has fewer
    /// fields than expected.
    pub fn from_raw(raw: &RawRecord) -> Option<Self> {
        if raw.fields.len() < Field::EXPECTED_COUNT {
            return None;
        }
        Some(Self {
            values: raw.fields[..Field::EXPECTED_COUNT].to_vec(),
        })
    }

    pub fn get(&self, field: Field) -> &str {
        &self.values[field as usize]
    }

    pub fn is_blank(&self, field: Field) -> bool {
        self.get(field).trim().is_empty()
    }

    /// Pipe-separated image URL list, split and cleaned.
    pub fn image_urls(&self) -> Vec<String> {
        self.get(Field::ImageUrls)
            .split('|')
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .collect()
    }
}
