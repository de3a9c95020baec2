// ============================================================
// LOCAL STORAGE HELPERS
// ============================================================
// Filesystem plumbing for the media root

use crate::domain::error::{AppError, Result};
use std::path::{Path, PathBuf};

pub fn ensure_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path)
        .map_err(|e| AppError::IoError(format!("cannot create {}: {}", path.display(), e)))
}

/// In-progress download path next to the final one; a crash leaves a `.part`
/// file behind instead of a truncated final file.
pub fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_os_string();
    name.push(".part");
    PathBuf::from(name)
}

/// Size of an existing non-empty regular file, `None` otherwise.
pub fn non_empty_file_size(path: &Path) -> Option<u64> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() && meta.len() > 0 => Some(meta.len()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_part_path_appends_suffix() {
        assert_eq!(
            part_path(Path::new("media/x.jpg")),
            PathBuf::from("media/x.jpg.part")
        );
    }

    #[test]
    fn test_non_empty_file_size() {
        let dir = tempfile::tempdir().unwrap();
        let empty = dir.path().join("empty");
        let full = dir.path().join("full");
        std::fs::write(&empty, b"").unwrap();
        std::fs::write(&full, b"data").unwrap();
        assert_eq!(non_empty_file_size(&empty), None);
        assert_eq!(non_empty_file_size(&full), Some(4));
        assert_eq!(non_empty_file_size(&dir.path().join("missing")), None);
    }
}
