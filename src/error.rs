use std::path::PathBuf;

/// Result type for scheduling and transcript operations
pub type Result<T> = std::result::Result<T, SchedulerError>;

/// Error types for scheduling and transcript operations
#[derive(thiserror::Error, Debug)]
pub enum SchedulerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("Transcript cache unreadable at {path}: {reason}")]
    CacheRead { path: PathBuf, reason: String },

    #[error("Source probe failed: {0}")]
    Probe(String),

    #[error("Invalid duration: {0}")]
    InvalidDuration(String),

    #[error("Configuration error: {0}")]
    Config(String),
}
