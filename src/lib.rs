/// Chaptermark - automatic chapter markers for videos
///
/// Combines ffmpeg scene-change and silence signals into a small,
/// well-distributed set of chapter timestamps.

pub mod audio;
pub mod chapters;
pub mod config;
pub mod error;
pub mod media;
pub mod processing;
pub mod video;

// Re-export main types for easy access
pub use crate::audio::AudioAnalyzer;
pub use crate::chapters::{
    CandidateOrigin, ChapterDetector, ChapterInfo, ChapterOutcome, PipelineStage, SceneCandidate,
};
pub use crate::config::{Config, ConfigBuilder, DetectionConfig};
pub use crate::error::{ChapterError, Result};
pub use crate::media::ToolRunner;
pub use crate::processing::{ChapterProcessor, ChapterReport};
pub use crate::video::VideoAnalyzer;
