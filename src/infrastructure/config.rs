// ============================================================
// CONFIGURATION
// ============================================================
// Layered config: compiled defaults, optional TOML file, then
// INGEST_-prefixed environment variables

use crate::domain::error::{AppError, Result};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Directory downloaded media lands in.
    pub media_root: String,
    /// Prefix of the public reference stored for local media.
    pub public_prefix: String,
    /// Retries after the first attempt of each download.
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    pub timeout_secs: u64,
    pub max_file_size: u64,
    pub max_redirects: u32,
    pub download_delay_ms: u64,
    pub record_pause_ms: u64,
    pub user_agent: String,
    pub allowed_extensions: Vec<String>,
    pub blocked_domains: Vec<String>,
    /// Empty means any https host is acceptable.
    pub allowed_image_hosts: Vec<String>,
    /// Manufacturer allow-list used when the store has none.
    pub fallback_manufacturers: Vec<String>,
    pub progress_interval: usize,
    pub max_media_per_record: usize,
    pub delimiter: char,
    /// Sqlite connection string; a missing value selects the in-memory store.
    pub database_url: Option<String>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            media_root: "media".to_string(),
            public_prefix: "/media".to_string(),
            max_retries: 3,
            backoff_base_ms: 1000,
            timeout_secs: 30,
            max_file_size: 10 * 1024 * 1024,
            max_redirects: 5,
            download_delay_ms: 500,
            record_pause_ms: 1000,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
            allowed_extensions: [".jpg", ".jpeg", ".png", ".gif", ".webp", ".pdf"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            blocked_domains: Vec::new(),
            allowed_image_hosts: Vec::new(),
            fallback_manufacturers: Vec::new(),
            progress_interval: 25,
            max_media_per_record: 5,
            delimiter: ',',
            database_url: None,
        }
    }
}

impl IngestConfig {
    /// Load config, later layers overriding earlier ones.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(IngestConfig::default()));
        if let Some(path) = file {
            figment = figment.merge(Toml::file(path));
        }
        figment
            .merge(Env::prefixed("INGEST_"))
            .extract()
            .map_err(|e| AppError::ConfigError(format!("invalid configuration: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_load_without_file() {
        let config = IngestConfig::load(None).unwrap();
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.max_file_size, 10 * 1024 * 1024);
        assert!(config.allowed_extensions.contains(&".webp".to_string()));
    }

    #[test]
    fn test_toml_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ingest.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "max_retries = 1").unwrap();
        writeln!(f, "blocked_domains = [\"bad.example\"]").unwrap();
        let config = IngestConfig::load(Some(&path)).unwrap();
        assert_eq!(config.max_retries, 1);
        assert_eq!(config.blocked_domains, vec!["bad.example".to_string()]);
        assert_eq!(config.download_delay_ms, 500);
    }
}
