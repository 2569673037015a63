use crate::error::{ChapterError, Result};
use async_trait::async_trait;
use std::path::Path;

/// Source of a video's total duration
#[async_trait]
pub trait DurationProber: Send + Sync {
    /// Fail fast when the tools behind this prober cannot run at all
    async fn ensure_tools(&self) -> Result<()> {
        Ok(())
    }

    /// Total duration in seconds
    async fn probe_duration(&self, video_path: &Path) -> Result<f64>;
}

/// Parse the single numeric line ffprobe prints for `format=duration`
pub fn parse_duration(output: &str) -> Result<f64> {
    let text = output.trim();
    let duration: f64 = text
        .parse()
        .map_err(|_| ChapterError::MediaProbe(format!("unparsable duration {:?}", text)))?;

    if !duration.is_finite() || duration < 0.0 {
        return Err(ChapterError::MediaProbe(format!("invalid duration {}", duration)));
    }

    Ok(duration)
}
