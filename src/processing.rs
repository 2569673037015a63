use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::chapters::detector::{FallbackReason, PipelineStage};
use crate::chapters::{format_description, write_chapters_json, ChapterDetector, ChapterInfo};
use crate::config::{Config, ExportFormat};
use crate::error::ChapterError;

/// Processing result for a single video
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChapterReport {
    pub video: PathBuf,
    pub duration: f64,
    pub generated_at: DateTime<Utc>,
    pub processing_time: Duration,
    pub stages_completed: Vec<PipelineStage>,
    pub fallback: Option<FallbackReason>,
    pub chapters: Vec<ChapterInfo>,
    pub json_path: Option<PathBuf>,
    pub description_path: Option<PathBuf>,
}

/// Detects chapters for a video and writes the configured exports
pub struct ChapterProcessor {
    config: Config,
    detector: ChapterDetector,
}

impl ChapterProcessor {
    pub fn new(config: Config) -> Result<Self> {
        let detector = ChapterDetector::new(&config)?;
        Ok(Self::with_detector(config, detector))
    }

    pub fn with_detector(config: Config, detector: ChapterDetector) -> Self {
        Self { config, detector }
    }

    pub async fn process_video(&self, video_path: &Path) -> Result<ChapterReport> {
        if !video_path.exists() {
            return Err(ChapterError::InputNotFound(video_path.to_path_buf()).into());
        }

        info!("📹 Processing video: {}", video_path.display());
        let outcome = self.detector.detect_chapters(video_path).await?;

        if let Some(reason) = outcome.fallback {
            warn!("⚠️ Chapters for {} are synthetic ({:?})", video_path.display(), reason);
        }

        let chapters = outcome.chapter_infos();
        let mut report = ChapterReport {
            video: video_path.to_path_buf(),
            duration: outcome.duration,
            generated_at: Utc::now(),
            processing_time: outcome.processing_time,
            stages_completed: outcome.stages_completed,
            fallback: outcome.fallback,
            chapters,
            json_path: None,
            description_path: None,
        };

        let output_path = &self.config.output.chapters_file;
        if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        for format in &self.config.output.export_formats {
            match format {
                ExportFormat::JSON => {
                    write_chapters_json(output_path, &report.chapters).await?;
                    report.json_path = Some(output_path.clone());
                }
                ExportFormat::Description => {
                    let path = output_path.with_extension("txt");
                    tokio::fs::write(&path, format_description(&report.chapters)).await?;
                    info!("📝 Description saved to: {}", path.display());
                    report.description_path = Some(path);
                }
            }
        }

        Ok(report)
    }
}
