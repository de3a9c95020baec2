// ============================================================
// MEDIA ACQUIRER
// ============================================================
// Downloads remote media into the local media root with retry,
// backoff, a size cap and polite pacing. The HTTP transport sits
// behind the MediaFetcher trait so the retry logic is testable
// without a network.

use crate::domain::error::{AppError, Result};
use crate::domain::media::{MediaDescriptor, MediaOutcome, MediaRole};
use crate::infrastructure::config::IngestConfig;
use crate::infrastructure::storage;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use url::Url;

/// Transport failure classification. Retryable errors go through the
/// backoff loop; terminal ones abort the download immediately.
#[derive(Debug)]
pub enum FetchError {
    Retryable(String),
    Terminal(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Retryable(msg) => write!(f, "{}", msg),
            FetchError::Terminal(msg) => write!(f, "{}", msg),
        }
    }
}

/// One streaming download to a destination path, honoring a byte cap.
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    async fn fetch(
        &self,
        url: &str,
        dest: &Path,
        max_bytes: u64,
    ) -> std::result::Result<u64, FetchError>;
}

/// Production transport on top of reqwest, with a bounded redirect policy
/// and a browser-style user agent.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &IngestConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(
                config.max_redirects as usize,
            ))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl MediaFetcher for HttpFetcher {
    async fn fetch(
        &self,
        url: &str,
        dest: &Path,
        max_bytes: u64,
    ) -> std::result::Result<u64, FetchError> {
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Retryable(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Retryable(format!("HTTP {}", status)));
        }
        if let Some(len) = response.content_length() {
            if len > max_bytes {
                return Err(FetchError::Terminal(format!(
                    "file too large: {} bytes (cap {})",
                    len, max_bytes
                )));
            }
        }

        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| FetchError::Retryable(format!("cannot create file: {}", e)))?;
        let mut written: u64 = 0;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| FetchError::Retryable(format!("read failed: {}", e)))?
        {
            written += chunk.len() as u64;
            if written > max_bytes {
                return Err(FetchError::Terminal(format!(
                    "download exceeded size cap ({} bytes)",
                    max_bytes
                )));
            }
            file.write_all(&chunk)
                .await
                .map_err(|e| FetchError::Retryable(format!("write failed: {}", e)))?;
        }
        file.flush()
            .await
            .map_err(|e| FetchError::Retryable(format!("flush failed: {}", e)))?;
        Ok(written)
    }
}

pub struct MediaAcquirer<F: MediaFetcher> {
    fetcher: F,
    media_root: PathBuf,
    public_prefix: String,
    max_retries: u32,
    backoff_base: Duration,
    max_file_size: u64,
    download_delay: Duration,
    record_pause: Duration,
    allowed_extensions: Vec<String>,
    blocked_domains: Vec<String>,
}

impl<F: MediaFetcher> MediaAcquirer<F> {
    pub fn from_config(fetcher: F, config: &IngestConfig) -> Self {
        Self {
            fetcher,
            media_root: PathBuf::from(&config.media_root),
            public_prefix: config.public_prefix.clone(),
            max_retries: config.max_retries,
            backoff_base: Duration::from_millis(config.backoff_base_ms),
            max_file_size: config.max_file_size,
            download_delay: Duration::from_millis(config.download_delay_ms),
            record_pause: Duration::from_millis(config.record_pause_ms),
            allowed_extensions: config.allowed_extensions.clone(),
            blocked_domains: config.blocked_domains.clone(),
        }
    }

    /// Acquire one asset of an entity into the media root. An existing
    /// non-empty file short-circuits the network entirely, which is what
    /// makes reruns of the same batch cheap.
    pub async fn acquire(
        &self,
        url: &str,
        natural_key: &str,
        role: MediaRole,
        index: usize,
    ) -> MediaDescriptor {
        let failed = |error: String| MediaDescriptor {
            source_url: url.to_string(),
            role,
            index,
            local_path: None,
            outcome: MediaOutcome::Failed,
            size_bytes: None,
            error: Some(error),
        };

        if url.trim().is_empty() {
            return failed("empty URL".to_string());
        }
        let parsed = match Url::parse(url) {
            Ok(u) => u,
            Err(e) => return failed(format!("invalid URL ({}): {}", e, url)),
        };
        let host = parsed.host_str().unwrap_or("");
        if self.blocked_domains.iter().any(|d| host.contains(d.as_str())) {
            return failed(format!("blocked domain: {}", host));
        }

        let filename = self.derive_filename(natural_key, role, index, url);
        let dest = self.media_root.join(&filename);
        if let Err(e) = storage::ensure_dir(&self.media_root) {
            return failed(format!("cannot create media root: {}", e));
        }

        if let Some(size) = storage::non_empty_file_size(&dest) {
            debug!(file = %filename, "media already present, reusing");
            return MediaDescriptor {
                source_url: url.to_string(),
                role,
                index,
                local_path: Some(self.public_ref(&filename)),
                outcome: MediaOutcome::ReusedExisting,
                size_bytes: Some(size),
                error: None,
            };
        }

        let part = storage::part_path(&dest);
        let attempts = self.max_retries + 1;
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            if attempt > 1 {
                let wait = self.backoff_base * (attempt - 1);
                debug!(
                    file = %filename,
                    attempt, "retrying after {} ms", wait.as_millis()
                );
                tokio::time::sleep(wait).await;
            }

            match self.fetcher.fetch(url, &part, self.max_file_size).await {
                Ok(0) => {
                    let _ = std::fs::remove_file(&part);
                    return failed(format!("empty file from {}", url));
                }
                Ok(size) => {
                    if let Err(e) = std::fs::rename(&part, &dest) {
                        let _ = std::fs::remove_file(&part);
                        return failed(format!("cannot finalize file: {}", e));
                    }
                    debug!(file = %filename, size, "downloaded {} asset", role.as_str());
                    return MediaDescriptor {
                        source_url: url.to_string(),
                        role,
                        index,
                        local_path: Some(self.public_ref(&filename)),
                        outcome: MediaOutcome::Downloaded,
                        size_bytes: Some(size),
                        error: None,
                    };
                }
                Err(FetchError::Terminal(msg)) => {
                    let _ = std::fs::remove_file(&part);
                    return failed(msg);
                }
                Err(FetchError::Retryable(msg)) => {
                    let _ = std::fs::remove_file(&part);
                    warn!(file = %filename, attempt, "download failed: {}", msg);
                    last_error = msg;
                }
            }
        }

        failed(format!("{} (after {} attempts)", last_error, attempts))
    }

    /// Stable on-disk name for one media item of an entity.
    pub fn derive_filename(&self, natural_key: &str, role: MediaRole, index: usize, url: &str) -> String {
        let sanitized: String = natural_key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_lowercase()
                } else {
                    '-'
                }
            })
            .collect();
        let stem = if sanitized.trim_matches('-').is_empty() {
            let digest = Sha256::digest(url.as_bytes());
            hex::encode(digest)[..12].to_string()
        } else {
            sanitized
        };
        format!(
            "{}-{}{}",
            stem,
            role.filename_suffix(index),
            self.infer_extension(url)
        )
    }

    /// Extension from the URL path when allow-listed, with a PDF heuristic
    /// for document links that hide the extension behind a query.
    pub fn infer_extension(&self, url: &str) -> String {
        let (path, query) = match Url::parse(url) {
            Ok(u) => (
                u.path().to_ascii_lowercase(),
                u.query().unwrap_or("").to_ascii_lowercase(),
            ),
            Err(_) => (url.to_ascii_lowercase(), String::new()),
        };
        if let Some(idx) = path.rfind('.') {
            let ext = &path[idx..];
            if self.allowed_extensions.iter().any(|a| a == ext) {
                return ext.to_string();
            }
        }
        if path.contains("pdf") || query.contains("format=pdf") {
            return ".pdf".to_string();
        }
        ".jpg".to_string()
    }

    pub async fn pause_between_downloads(&self) {
        tokio::time::sleep(self.download_delay).await;
    }

    pub async fn pause_between_records(&self) {
        tokio::time::sleep(self.record_pause).await;
    }

    fn public_ref(&self, filename: &str) -> String {
        format!("{}/{}", self.public_prefix.trim_end_matches('/'), filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    enum Behavior {
        Succeed(Vec<u8>),
        RetryableAlways,
        TerminalAlways,
        RetryableThenSucceed(u32, Vec<u8>),
    }

    struct FakeFetcher {
        behavior: Behavior,
        calls: AtomicU32,
    }

    impl FakeFetcher {
        fn new(behavior: Behavior) -> Self {
            Self {
                behavior,
                calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MediaFetcher for FakeFetcher {
        async fn fetch(
            &self,
            _url: &str,
            dest: &Path,
            _max_bytes: u64,
        ) -> std::result::Result<u64, FetchError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            match &self.behavior {
                Behavior::Succeed(bytes) => {
                    std::fs::write(dest, bytes).unwrap();
                    Ok(bytes.len() as u64)
                }
                Behavior::RetryableAlways => {
                    Err(FetchError::Retryable("HTTP 503".to_string()))
                }
                Behavior::TerminalAlways => {
                    Err(FetchError::Terminal("file too large".to_string()))
                }
                Behavior::RetryableThenSucceed(failures, bytes) => {
                    if call <= *failures {
                        Err(FetchError::Retryable("HTTP 503".to_string()))
                    } else {
                        std::fs::write(dest, bytes).unwrap();
                        Ok(bytes.len() as u64)
                    }
                }
            }
        }
    }

    fn acquirer(dir: &Path, behavior: Behavior) -> MediaAcquirer<FakeFetcher> {
        let mut config = IngestConfig::default();
        config.media_root = dir.to_string_lossy().to_string();
        config.backoff_base_ms = 1;
        config.download_delay_ms = 0;
        config.record_pause_ms = 0;
        MediaAcquirer::from_config(FakeFetcher::new(behavior), &config)
    }

    #[tokio::test]
    async fn test_successful_download_lands_at_final_path() {
        let dir = tempfile::tempdir().unwrap();
        let a = acquirer(dir.path(), Behavior::Succeed(b"img".to_vec()));
        let d = a
            .acquire("https://h.example/x.jpg", "ABC-1", MediaRole::Primary, 0)
            .await;
        assert!(matches!(d.outcome, MediaOutcome::Downloaded));
        assert_eq!(d.local_path.as_deref(), Some("/media/abc-1-primary.jpg"));
        assert_eq!(d.size_bytes, Some(3));
        assert_eq!(
            std::fs::read(dir.path().join("abc-1-primary.jpg")).unwrap(),
            b"img"
        );
        assert!(!dir.path().join("abc-1-primary.jpg.part").exists());
    }

    #[tokio::test]
    async fn test_existing_file_reused_without_fetching() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("abc-1-primary.jpg"), b"old").unwrap();
        let a = acquirer(dir.path(), Behavior::Succeed(b"new".to_vec()));
        let d = a
            .acquire("https://h.example/x.jpg", "ABC-1", MediaRole::Primary, 0)
            .await;
        assert!(matches!(d.outcome, MediaOutcome::ReusedExisting));
        assert_eq!(a.fetcher.calls(), 0);
        assert_eq!(
            std::fs::read(dir.path().join("abc-1-primary.jpg")).unwrap(),
            b"old"
        );
    }

    #[tokio::test]
    async fn test_retryable_failures_exhaust_all_attempts() {
        let dir = tempfile::tempdir().unwrap();
        let a = acquirer(dir.path(), Behavior::RetryableAlways);
        let d = a
            .acquire("https://h.example/x.jpg", "ABC-1", MediaRole::Primary, 0)
            .await;
        assert!(matches!(d.outcome, MediaOutcome::Failed));
        assert_eq!(a.fetcher.calls(), 4); // initial attempt plus three retries
        assert!(d.error.unwrap().contains("after 4 attempts"));
    }

    #[tokio::test]
    async fn test_terminal_failure_stops_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let a = acquirer(dir.path(), Behavior::TerminalAlways);
        let d = a
            .acquire("https://h.example/x.jpg", "ABC-1", MediaRole::Primary, 0)
            .await;
        assert!(matches!(d.outcome, MediaOutcome::Failed));
        assert_eq!(a.fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failures() {
        let dir = tempfile::tempdir().unwrap();
        let a = acquirer(
            dir.path(),
            Behavior::RetryableThenSucceed(2, b"img".to_vec()),
        );
        let d = a
            .acquire("https://h.example/x.jpg", "ABC-1", MediaRole::Gallery, 1)
            .await;
        assert!(matches!(d.outcome, MediaOutcome::Downloaded));
        assert_eq!(d.local_path.as_deref(), Some("/media/abc-1-gallery-1.jpg"));
        assert_eq!(a.fetcher.calls(), 3);
    }

    #[tokio::test]
    async fn test_blocked_domain_rejected_before_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = IngestConfig::default();
        config.media_root = dir.path().to_string_lossy().to_string();
        config.blocked_domains = vec!["bad.example".to_string()];
        let a = MediaAcquirer::from_config(
            FakeFetcher::new(Behavior::Succeed(b"img".to_vec())),
            &config,
        );
        let d = a
            .acquire("https://cdn.bad.example/x.jpg", "ABC-1", MediaRole::Primary, 0)
            .await;
        assert!(matches!(d.outcome, MediaOutcome::Failed));
        assert_eq!(a.fetcher.calls(), 0);
    }

    #[test]
    fn test_filename_derivation_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let a = acquirer(dir.path(), Behavior::RetryableAlways);
        assert_eq!(
            a.derive_filename("ABC/1 é", MediaRole::Primary, 0, "https://h/x.png"),
            "abc-1---primary.png"
        );
        assert_eq!(
            a.derive_filename("REF-9", MediaRole::Gallery, 2, "https://h/x"),
            "ref-9-gallery-2.jpg"
        );
    }

    #[test]
    fn test_filename_falls_back_to_url_digest() {
        let dir = tempfile::tempdir().unwrap();
        let a = acquirer(dir.path(), Behavior::RetryableAlways);
        let name = a.derive_filename("---", MediaRole::Primary, 0, "https://h/x.jpg");
        let again = a.derive_filename("---", MediaRole::Primary, 0, "https://h/x.jpg");
        assert_eq!(name, again);
        assert!(name.ends_with("-primary.jpg"));
        assert_eq!(name.len(), "-primary.jpg".len() + 12);
    }

    #[test]
    fn test_extension_inference() {
        let dir = tempfile::tempdir().unwrap();
        let a = acquirer(dir.path(), Behavior::RetryableAlways);
        assert_eq!(a.infer_extension("https://h/p/img.WEBP"), ".webp");
        assert_eq!(a.infer_extension("https://h/p/sheet.pdf"), ".pdf");
        assert_eq!(a.infer_extension("https://h/pdf/view?id=3"), ".pdf");
        assert_eq!(a.infer_extension("https://h/render?format=pdf"), ".pdf");
        assert_eq!(a.infer_extension("https://h/p/file.exe"), ".jpg");
        assert_eq!(a.infer_extension("https://h/p/noext"), ".jpg");
    }
}
