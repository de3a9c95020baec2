use serde::{Deserialize, Serialize};
use std::fmt;

/// Run-level errors. Per-record failures never surface here; they are
/// collected into the `RunSummary` so a single bad row cannot abort a batch.
#[derive(Debug, Serialize, Deserialize)]
pub enum AppError {
    Internal(String),
    ConfigError(String),
    ParseError(String),
    StoreError(String),
    IoError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
            AppError::ConfigError(msg) => write!(f, "Config error: {}", msg),
            AppError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            AppError::StoreError(msg) => write!(f, "Store error: {}", msg),
            AppError::IoError(msg) => write!(f, "IO error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
