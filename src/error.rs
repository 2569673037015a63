/// Error types for chapter detection
use std::path::PathBuf;

/// Result type for chapter detection operations
pub type Result<T> = std::result::Result<T, ChapterError>;

#[derive(thiserror::Error, Debug)]
pub enum ChapterError {
    /// A required external tool could not be executed at all
    #[error("{tool} not found: {reason}")]
    ToolMissing { tool: String, reason: String },

    #[error("Failed to get video duration: {0}")]
    MediaProbe(String),

    #[error("{tool} failed: {message}")]
    ToolFailed { tool: String, message: String },

    #[error("{tool} timed out after {seconds}s")]
    Timeout { tool: String, seconds: u64 },

    #[error("Video file not found: {0}")]
    InputNotFound(PathBuf),

    #[error("Parsing error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl ChapterError {
    /// Whether this error must abort the whole run
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ChapterError::ToolMissing { .. }
                | ChapterError::MediaProbe(_)
                | ChapterError::InputNotFound(_)
                | ChapterError::Config(_)
        )
    }
}
