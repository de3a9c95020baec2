// ============================================================
// MEDIA TYPES
// ============================================================
// Descriptors for remote assets attached to a record

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaRole {
    Primary,
    Gallery,
    Document,
}

impl MediaRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaRole::Primary => "primary",
            MediaRole::Gallery => "gallery",
            MediaRole::Document => "document",
        }
    }

    /// Filename suffix for this role. `index` is 1-based within the role and
    /// ignored for the primary asset.
    pub fn filename_suffix(&self, index: usize) -> String {
        match self {
            MediaRole::Primary => "primary".to_string(),
            MediaRole::Gallery => format!("gallery-{}", index),
            MediaRole::Document => format!("document-{}", index),
        }
    }
}

/// How one acquisition attempt chain ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaOutcome {
    Downloaded,
    ReusedExisting,
    Failed,
}

/// Lifecycle record for one remote asset, produced by the acquirer.
/// `local_path` is the public reference when the outcome is `Downloaded` or
/// `ReusedExisting`; a failed asset keeps only its source URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaDescriptor {
    pub source_url: String,
    pub role: MediaRole,
    /// 1-based within the role; 0 for the primary asset.
    pub index: usize,
    pub local_path: Option<String>,
    pub outcome: MediaOutcome,
    pub size_bytes: Option<u64>,
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filename_suffix() {
        assert_eq!(MediaRole::Primary.filename_suffix(7), "primary");
        assert_eq!(MediaRole::Gallery.filename_suffix(2), "gallery-2");
        assert_eq!(MediaRole::Document.filename_suffix(1), "document-1");
    }
}
