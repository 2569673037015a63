/// Chapter detection coordinator that sequences every detection stage
use super::audio::{AudioDetector, AudioSceneSource};
use super::export::ChapterInfo;
use super::fallback::FallbackGenerator;
use super::merge::merge_candidates;
use super::probe::DurationProber;
use super::selection::{filter_and_select, select_representative};
use super::visual::{VisualDetector, VisualSceneSource};
use super::SceneCandidate;
use crate::audio::AudioAnalyzer;
use crate::config::{Config, DetectionConfig};
use crate::error::{ChapterError, Result};
use crate::media::ToolRunner;
use crate::video::VideoAnalyzer;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Videos longer than this always get at least `MIN_CHAPTERS` chapters
const MIN_CHAPTERS_AFTER_SECS: f64 = 180.0;
const MIN_CHAPTERS: usize = 3;

/// Stages of one detection run, in order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PipelineStage {
    Preflight,
    Probe,
    Detect,
    Merge,
    FilterSelect,
    ZeroChapterCheck,
    CountCeiling,
    MinimumCountEnforcement,
    Done,
}

/// Why synthetic chapters replaced the detected ones
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FallbackReason {
    /// Detection produced no usable candidates
    NoCandidates,
    /// Fewer than three chapters on a video longer than three minutes
    TooFewChapters,
}

/// Result of one detection run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChapterOutcome {
    /// Video duration in seconds
    pub duration: f64,
    /// Final chapters, ascending by timestamp
    pub chapters: Vec<SceneCandidate>,
    pub stages_completed: Vec<PipelineStage>,
    pub fallback: Option<FallbackReason>,
    /// Jitter seed of the fallback generator, when it was used
    pub fallback_seed: Option<u64>,
    pub processing_time: Duration,
}

impl ChapterOutcome {
    pub fn chapter_infos(&self) -> Vec<ChapterInfo> {
        ChapterInfo::from_candidates(&self.chapters)
    }
}

/// Runs probe, detection, merge, selection and fallback for one video at a time
#[derive(Clone)]
pub struct ChapterDetector {
    detection: DetectionConfig,
    prober: Arc<dyn DurationProber>,
    visual: VisualDetector,
    audio: Option<AudioDetector>,
    jitter_seed: Option<u64>,
}

impl ChapterDetector {
    /// Detector wired to ffmpeg/ffprobe as configured
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;

        let runner = ToolRunner::new(&config.tools);
        let video = Arc::new(VideoAnalyzer::new(runner.clone()));
        let audio = Arc::new(AudioAnalyzer::new(runner));

        let detector = Self::with_sources(config, video.clone(), video, audio)?;
        Ok(if config.audio.enable_audio {
            detector
        } else {
            detector.without_audio()
        })
    }

    /// Detector over arbitrary signal sources
    pub fn with_sources(
        config: &Config,
        prober: Arc<dyn DurationProber>,
        visual: Arc<dyn VisualSceneSource>,
        audio: Arc<dyn AudioSceneSource>,
    ) -> Result<Self> {
        config.detection.validate()?;

        Ok(Self {
            detection: config.detection,
            prober,
            visual: VisualDetector::new(visual),
            audio: Some(AudioDetector::new(audio, config.audio.clone())),
            jitter_seed: config.fallback.jitter_seed,
        })
    }

    /// Skip audio analysis entirely
    pub fn without_audio(mut self) -> Self {
        self.audio = None;
        self
    }

    /// Detect chapters for a video file.
    ///
    /// Only a missing tool or a failed duration probe is an error; detector
    /// failures shrink the candidate pool instead. Dropping the returned
    /// future kills any ffmpeg process still running.
    pub async fn detect_chapters(&self, video_path: &Path) -> Result<ChapterOutcome> {
        let start_time = Instant::now();
        let mut stages_completed = Vec::new();
        let config = &self.detection;

        info!(
            "🔍 Starting chapter detection with threshold: {}, min gap: {}, min duration: {}",
            config.threshold, config.min_gap, config.min_duration
        );

        self.prober.ensure_tools().await?;
        stages_completed.push(PipelineStage::Preflight);

        let duration = self.probe(video_path).await?;
        stages_completed.push(PipelineStage::Probe);
        info!("⏱️ Video duration: {:.2} seconds", duration);

        let (visual, audio) = tokio::join!(
            self.visual.detect(video_path, config.threshold, duration),
            self.detect_audio(video_path, duration),
        );
        stages_completed.push(PipelineStage::Detect);

        let merged = merge_candidates(visual, audio, config.min_gap);
        stages_completed.push(PipelineStage::Merge);

        let mut chapters = filter_and_select(merged, config.min_duration, duration);
        stages_completed.push(PipelineStage::FilterSelect);

        let limit = config.scene_limit();
        let mut fallback = None;
        let mut generator: Option<FallbackGenerator> = None;

        if chapters.is_empty() {
            info!("Using fallback chapter generation method");
            chapters = self.fallback_generator(&mut generator).generate(duration, limit);
            fallback = Some(FallbackReason::NoCandidates);
        }

        if !chapters.is_empty() && !chapters.iter().any(SceneCandidate::is_zero_chapter) {
            chapters.insert(0, SceneCandidate::zero_chapter());
        }
        stages_completed.push(PipelineStage::ZeroChapterCheck);

        if let Some(limit) = limit {
            if chapters.len() > limit {
                chapters = select_representative(chapters, limit, duration);
            }
        }
        stages_completed.push(PipelineStage::CountCeiling);

        info!("Detected {} logical chapter points", chapters.len());

        if chapters.len() < MIN_CHAPTERS && duration > MIN_CHAPTERS_AFTER_SECS {
            info!("Enforcing minimum chapter count using fallback method");
            chapters = self.fallback_generator(&mut generator).generate(duration, limit);
            fallback = Some(FallbackReason::TooFewChapters);
        }
        stages_completed.push(PipelineStage::MinimumCountEnforcement);
        stages_completed.push(PipelineStage::Done);

        let processing_time = start_time.elapsed();
        info!(
            "✅ {} chapters for {} in {:.2}s",
            chapters.len(),
            video_path.display(),
            processing_time.as_secs_f64()
        );

        Ok(ChapterOutcome {
            duration,
            chapters,
            stages_completed,
            fallback,
            fallback_seed: generator.map(|g| g.seed()),
            processing_time,
        })
    }

    async fn probe(&self, video_path: &Path) -> Result<f64> {
        let duration = self
            .prober
            .probe_duration(video_path)
            .await
            .map_err(|e| {
                if e.is_fatal() {
                    e
                } else {
                    ChapterError::MediaProbe(e.to_string())
                }
            })?;

        if duration <= 0.0 {
            return Err(ChapterError::MediaProbe(format!(
                "{} has no playable duration",
                video_path.display()
            )));
        }

        Ok(duration)
    }

    async fn detect_audio(&self, video_path: &Path, duration: f64) -> Vec<SceneCandidate> {
        let Some(audio) = &self.audio else {
            return Vec::new();
        };

        match audio.detect(video_path, duration).await {
            Ok(scenes) => scenes,
            Err(e) => {
                warn!("Could not detect audio scenes: {}", e);
                Vec::new()
            }
        }
    }

    fn fallback_generator<'a>(&self, slot: &'a mut Option<FallbackGenerator>) -> &'a mut FallbackGenerator {
        slot.get_or_insert_with(|| match self.jitter_seed {
            Some(seed) => FallbackGenerator::new(seed),
            None => FallbackGenerator::from_entropy(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chapters::audio::{SilenceEvent, VolumeStats};
    use crate::chapters::visual::FrameEvent;
    use crate::config::{ConfigBuilder, SilencePass};
    use async_trait::async_trait;

    struct FixedDuration(Result<f64>);

    #[async_trait]
    impl DurationProber for FixedDuration {
        async fn probe_duration(&self, _: &Path) -> Result<f64> {
            match &self.0 {
                Ok(d) => Ok(*d),
                Err(e) => Err(ChapterError::MediaProbe(e.to_string())),
            }
        }
    }

    struct FailingProbe(fn() -> ChapterError);

    #[async_trait]
    impl DurationProber for FailingProbe {
        async fn probe_duration(&self, _: &Path) -> Result<f64> {
            Err((self.0)())
        }
    }

    struct NoTools;

    #[async_trait]
    impl DurationProber for NoTools {
        async fn ensure_tools(&self) -> Result<()> {
            Err(ChapterError::ToolMissing {
                tool: "ffmpeg".to_string(),
                reason: "not on PATH".to_string(),
            })
        }

        async fn probe_duration(&self, _: &Path) -> Result<f64> {
            panic!("probe must not run without tools");
        }
    }

    struct Frames(Vec<FrameEvent>);

    #[async_trait]
    impl VisualSceneSource for Frames {
        async fn scene_events(&self, _: &Path, _: f64) -> Result<Vec<FrameEvent>> {
            Ok(self.0.clone())
        }

        async fn interval_events(&self, _: &Path, _: f64) -> Result<Vec<f64>> {
            Ok(Vec::new())
        }
    }

    struct BrokenAudio;

    #[async_trait]
    impl AudioSceneSource for BrokenAudio {
        async fn silence_events(&self, _: &Path, _: &SilencePass) -> Result<Vec<SilenceEvent>> {
            Err(ChapterError::ToolFailed {
                tool: "ffmpeg".to_string(),
                message: "Output file #0 does not contain any stream".to_string(),
            })
        }

        async fn volume_scan(&self, _: &Path) -> Result<VolumeStats> {
            Ok(VolumeStats::default())
        }
    }

    fn detector(config: &Config, prober: impl DurationProber + 'static, frames: Vec<FrameEvent>) -> ChapterDetector {
        ChapterDetector::with_sources(
            config,
            Arc::new(prober),
            Arc::new(Frames(frames)),
            Arc::new(BrokenAudio),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_missing_tools_abort() {
        let config = Config::default();
        let err = detector(&config, NoTools, vec![])
            .detect_chapters(Path::new("v.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, ChapterError::ToolMissing { .. }));
    }

    #[tokio::test]
    async fn test_probe_failure_aborts() {
        let config = Config::default();
        let prober = FixedDuration(Err(ChapterError::Parse("N/A".to_string())));
        let err = detector(&config, prober, vec![])
            .detect_chapters(Path::new("v.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, ChapterError::MediaProbe(_)));

        let err = detector(&config, FixedDuration(Ok(0.0)), vec![])
            .detect_chapters(Path::new("v.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, ChapterError::MediaProbe(_)));
    }

    #[tokio::test]
    async fn test_probe_errors_classified() {
        let config = Config::default();

        let timeout = FailingProbe(|| ChapterError::Timeout {
            tool: "ffprobe".to_string(),
            seconds: 30,
        });
        let err = detector(&config, timeout, vec![])
            .detect_chapters(Path::new("v.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, ChapterError::MediaProbe(ref m) if m.contains("timed out")));

        let missing = FailingProbe(|| ChapterError::InputNotFound("v.mp4".into()));
        let err = detector(&config, missing, vec![])
            .detect_chapters(Path::new("v.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, ChapterError::InputNotFound(_)));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_audio_failure_tolerated() {
        let config = ConfigBuilder::new().with_min_gap(10.0).build();
        let frames = vec![
            FrameEvent::new(45.2, 0.6),
            FrameEvent::new(130.0, 0.5),
            FrameEvent::new(310.5, 0.7),
        ];
        let outcome = detector(&config, FixedDuration(Ok(650.0)), frames)
            .detect_chapters(Path::new("v.mp4"))
            .await
            .unwrap();

        let times: Vec<f64> = outcome.chapters.iter().map(|c| c.timestamp()).collect();
        assert_eq!(times, vec![0.0, 45.2, 130.0, 310.5]);
        assert!(outcome.fallback.is_none());
        assert!(outcome.fallback_seed.is_none());
        assert_eq!(outcome.stages_completed.last(), Some(&PipelineStage::Done));
    }

    #[tokio::test]
    async fn test_no_candidates_uses_fallback() {
        let config = ConfigBuilder::new().with_jitter_seed(11).build();
        let outcome = detector(&config, FixedDuration(Ok(1200.0)), vec![])
            .detect_chapters(Path::new("v.mp4"))
            .await
            .unwrap();

        assert_eq!(outcome.chapters.len(), 8);
        assert_eq!(outcome.chapters[0].timestamp(), 0.0);
        assert_eq!(outcome.fallback, Some(FallbackReason::NoCandidates));
        assert_eq!(outcome.fallback_seed, Some(11));
    }

    #[tokio::test]
    async fn test_too_few_chapters_replaced() {
        let config = ConfigBuilder::new().with_jitter_seed(3).build();
        let outcome = detector(&config, FixedDuration(Ok(400.0)), vec![FrameEvent::new(120.0, 0.8)])
            .detect_chapters(Path::new("v.mp4"))
            .await
            .unwrap();

        assert_eq!(outcome.fallback, Some(FallbackReason::TooFewChapters));
        assert_eq!(outcome.chapters.len(), 5);
        assert!(outcome
            .chapters
            .iter()
            .all(|c| c.origin() == crate::chapters::CandidateOrigin::Fallback));
    }

    #[tokio::test]
    async fn test_short_video_keeps_small_list() {
        let config = Config::default();
        let outcome = detector(&config, FixedDuration(Ok(150.0)), vec![FrameEvent::new(60.0, 0.8)])
            .detect_chapters(Path::new("v.mp4"))
            .await
            .unwrap();

        let times: Vec<f64> = outcome.chapters.iter().map(|c| c.timestamp()).collect();
        assert_eq!(times, vec![0.0, 60.0]);
        assert!(outcome.fallback.is_none());
    }
}
