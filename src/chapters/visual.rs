/// Visual scene-change candidates
use super::{CandidateOrigin, SceneCandidate};
use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Frames this close to the end never become chapters
const END_MARGIN_SECS: f64 = 5.0;

/// Fewer primary events than this on a long video triggers interval sampling
const SPARSE_EVENT_COUNT: usize = 5;
const SPARSE_MIN_DURATION_SECS: f64 = 300.0;

/// Interval sampling spacing, also used as the start/end exclusion zone
pub const SAMPLE_INTERVAL_SECS: f64 = 30.0;
const SAMPLE_SCORE: f64 = 0.5;

/// One frame reported by the scene-difference filter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameEvent {
    pub timestamp: f64,
    pub score: f64,
}

impl FrameEvent {
    pub fn new(timestamp: f64, score: f64) -> Self {
        Self { timestamp, score }
    }
}

/// Raw frame-level signals from a video
#[async_trait]
pub trait VisualSceneSource: Send + Sync {
    /// Frames whose scene-difference score exceeds `threshold`
    async fn scene_events(&self, video_path: &Path, threshold: f64) -> Result<Vec<FrameEvent>>;

    /// Timestamps of frames sampled every `interval` seconds
    async fn interval_events(&self, video_path: &Path, interval: f64) -> Result<Vec<f64>>;
}

/// Turns frame events into `Visual` candidates
#[derive(Clone)]
pub struct VisualDetector {
    source: Arc<dyn VisualSceneSource>,
}

impl VisualDetector {
    pub fn new(source: Arc<dyn VisualSceneSource>) -> Self {
        Self { source }
    }

    /// Detect scene changes. Tool failures are logged and yield fewer (or no)
    /// candidates rather than an error.
    pub async fn detect(
        &self,
        video_path: &Path,
        threshold: f64,
        duration: f64,
    ) -> Vec<SceneCandidate> {
        info!("🎬 Analyzing visual scene changes...");

        let mut scenes = match self.source.scene_events(video_path, threshold).await {
            Ok(events) => scene_candidates(&events, duration),
            Err(e) => {
                warn!("Threshold-based scene detection had an issue: {}", e);
                Vec::new()
            }
        };

        if scenes.len() < SPARSE_EVENT_COUNT && duration > SPARSE_MIN_DURATION_SECS {
            info!("Few scenes detected ({}), trying interval sampling...", scenes.len());
            match self.source.interval_events(video_path, SAMPLE_INTERVAL_SECS).await {
                Ok(samples) => {
                    let sampled = interval_candidates(&samples, duration);
                    if sampled.len() > scenes.len() {
                        scenes = sampled;
                    }
                }
                Err(e) => warn!("Interval-based scene detection failed: {}", e),
            }
        }

        if scenes.is_empty() {
            warn!("No visual scenes detected");
        } else {
            info!("✅ Visual scene detection completed, found {} scenes", scenes.len());
        }

        scenes
    }
}

/// Keep events strictly inside `(0, duration - 5s)`
pub fn scene_candidates(events: &[FrameEvent], duration: f64) -> Vec<SceneCandidate> {
    events
        .iter()
        .filter(|e| e.timestamp > 0.0 && e.timestamp < duration - END_MARGIN_SECS)
        .map(|e| SceneCandidate::new(e.timestamp, e.score, CandidateOrigin::Visual))
        .collect()
}

/// Keep samples strictly inside `(30s, duration - 30s)`
pub fn interval_candidates(samples: &[f64], duration: f64) -> Vec<SceneCandidate> {
    samples
        .iter()
        .filter(|&&t| t > SAMPLE_INTERVAL_SECS && t < duration - SAMPLE_INTERVAL_SECS)
        .map(|&t| SceneCandidate::new(t, SAMPLE_SCORE, CandidateOrigin::Visual))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChapterError;

    struct CannedVisual {
        events: Option<Vec<FrameEvent>>,
        samples: Option<Vec<f64>>,
    }

    #[async_trait]
    impl VisualSceneSource for CannedVisual {
        async fn scene_events(&self, _: &Path, _: f64) -> Result<Vec<FrameEvent>> {
            self.events.clone().ok_or_else(|| ChapterError::ToolFailed {
                tool: "ffmpeg".to_string(),
                message: "exit status: 1".to_string(),
            })
        }

        async fn interval_events(&self, _: &Path, interval: f64) -> Result<Vec<f64>> {
            assert_eq!(interval, SAMPLE_INTERVAL_SECS);
            self.samples.clone().ok_or_else(|| ChapterError::Parse("no frames".to_string()))
        }
    }

    fn detector(events: Option<Vec<FrameEvent>>, samples: Option<Vec<f64>>) -> VisualDetector {
        VisualDetector::new(Arc::new(CannedVisual { events, samples }))
    }

    fn every_30s(duration: f64) -> Vec<f64> {
        (0..)
            .map(|i| i as f64 * 30.0)
            .take_while(|&t| t < duration)
            .collect()
    }

    #[tokio::test]
    async fn test_events_filtered_to_open_range() {
        let events = vec![
            FrameEvent::new(0.0, 0.9),
            FrameEvent::new(12.5, 0.4),
            FrameEvent::new(94.0, 0.6),
            FrameEvent::new(96.0, 0.8),
        ];
        let scenes = detector(Some(events), None)
            .detect(Path::new("v.mp4"), 0.3, 100.0)
            .await;

        let times: Vec<f64> = scenes.iter().map(|s| s.timestamp()).collect();
        assert_eq!(times, vec![12.5, 94.0]);
        assert!(scenes.iter().all(|s| s.origin() == CandidateOrigin::Visual));
    }

    #[tokio::test]
    async fn test_sparse_long_video_uses_interval_sampling() {
        let events = vec![FrameEvent::new(100.0, 0.7), FrameEvent::new(200.0, 0.6)];
        let scenes = detector(Some(events), Some(every_30s(400.0)))
            .detect(Path::new("v.mp4"), 0.3, 400.0)
            .await;

        // 60, 90, ... 360 survive the 30s exclusion zones
        assert_eq!(scenes.len(), 11);
        assert_eq!(scenes[0].timestamp(), 60.0);
        assert!(scenes.iter().all(|s| s.score() == 0.5));
    }

    #[tokio::test]
    async fn test_interval_sampling_needs_strictly_more() {
        let events: Vec<FrameEvent> = [50.0, 150.0, 250.0]
            .iter()
            .map(|&t| FrameEvent::new(t, 0.8))
            .collect();
        let scenes = detector(Some(events), Some(vec![60.0, 90.0, 120.0]))
            .detect(Path::new("v.mp4"), 0.3, 400.0)
            .await;

        assert_eq!(scenes.len(), 3);
        assert_eq!(scenes[0].score(), 0.8);
    }

    #[tokio::test]
    async fn test_short_video_skips_interval_sampling() {
        let scenes = detector(Some(vec![]), Some(every_30s(250.0)))
            .detect(Path::new("v.mp4"), 0.3, 250.0)
            .await;
        assert!(scenes.is_empty());
    }

    #[tokio::test]
    async fn test_tool_failure_is_soft() {
        let scenes = detector(None, None)
            .detect(Path::new("v.mp4"), 0.3, 900.0)
            .await;
        assert!(scenes.is_empty());

        let scenes = detector(None, Some(every_30s(900.0)))
            .detect(Path::new("v.mp4"), 0.3, 900.0)
            .await;
        assert_eq!(scenes.len(), 27);
    }
}
