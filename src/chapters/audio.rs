/// Audio-based candidates: silence ends and estimated speech pauses
use super::{sort_by_timestamp, CandidateOrigin, SceneCandidate};
use crate::config::{AudioConfig, SilencePass};
use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

const SILENCE_SCORE_CAP: f64 = 0.9;
/// Seconds of silence that add 1.0 to a pass's base score
const SILENCE_SCORE_SCALE: f64 = 5.0;

const SPEECH_EDGE_SECS: f64 = 30.0;
const SPEECH_SCORE: f64 = 0.4;

/// End of one detected silence interval
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SilenceEvent {
    pub end: f64,
    pub duration: Option<f64>,
}

impl SilenceEvent {
    pub fn new(end: f64, duration: Option<f64>) -> Self {
        Self { end, duration }
    }
}

/// Whole-file loudness summary from a volume scan
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VolumeStats {
    pub mean_volume_db: Option<f64>,
    pub max_volume_db: Option<f64>,
}

/// Raw audio signals from a video
#[async_trait]
pub trait AudioSceneSource: Send + Sync {
    async fn silence_events(&self, video_path: &Path, pass: &SilencePass) -> Result<Vec<SilenceEvent>>;

    async fn volume_scan(&self, video_path: &Path) -> Result<VolumeStats>;
}

/// Turns audio signals into `Silence` and `Speech` candidates
#[derive(Clone)]
pub struct AudioDetector {
    source: Arc<dyn AudioSceneSource>,
    config: AudioConfig,
}

impl AudioDetector {
    pub fn new(source: Arc<dyn AudioSceneSource>, config: AudioConfig) -> Self {
        Self { source, config }
    }

    /// Run every silence pass and the speech pause estimate.
    ///
    /// Fails only when the first silence pass fails; later passes and the
    /// speech estimate contribute nothing on failure.
    pub async fn detect(&self, video_path: &Path, duration: f64) -> Result<Vec<SceneCandidate>> {
        info!("🔇 Analyzing audio for potential chapter points...");

        let mut scenes = Vec::new();
        for (index, pass) in self.config.silence_passes.iter().enumerate() {
            match self.source.silence_events(video_path, pass).await {
                Ok(events) => {
                    debug!("Silence pass {} found {} silences", pass.noise_floor, events.len());
                    scenes.extend(silence_candidates(&events, pass.base_score, duration));
                }
                Err(e) if index == 0 => return Err(e),
                Err(e) => warn!("Silence pass {} failed: {}", pass.noise_floor, e),
            }
        }

        if self.config.enable_speech_estimate {
            match self.detect_speech_pauses(video_path, duration).await {
                Ok(pauses) => scenes.extend(pauses),
                Err(e) => warn!("Speech pause detection failed: {}", e),
            }
        }

        sort_by_timestamp(&mut scenes);

        info!("✅ Audio analysis completed, found {} potential points", scenes.len());
        Ok(scenes)
    }

    /// Coarse speech pause estimate.
    ///
    /// The volume scan only yields whole-file statistics, so the pauses are
    /// placed on a fixed grid once the scan succeeds. The scan result is not
    /// used to position them.
    async fn detect_speech_pauses(&self, video_path: &Path, duration: f64) -> Result<Vec<SceneCandidate>> {
        let stats = self.source.volume_scan(video_path).await?;
        debug!(
            "Volume scan: mean {:?} dB, max {:?} dB",
            stats.mean_volume_db, stats.max_volume_db
        );
        Ok(speech_pause_grid(duration, self.config.speech_pause_interval))
    }
}

/// Score each silence end; longer silences score higher when the length is known
pub fn silence_candidates(events: &[SilenceEvent], base_score: f64, duration: f64) -> Vec<SceneCandidate> {
    events
        .iter()
        .filter(|e| e.end >= 0.0 && e.end < duration)
        .map(|e| {
            let score = match e.duration {
                Some(length) => (base_score + length / SILENCE_SCORE_SCALE).min(SILENCE_SCORE_CAP),
                None => base_score,
            };
            SceneCandidate::new(e.end, score, CandidateOrigin::Silence)
        })
        .collect()
}

/// Points every `interval` seconds, skipping the first and last 30 seconds
pub fn speech_pause_grid(duration: f64, interval: f64) -> Vec<SceneCandidate> {
    if interval <= 0.0 || duration <= 0.0 {
        return Vec::new();
    }

    let point_count = (duration / interval) as usize;
    (1..=point_count)
        .map(|i| i as f64 * interval)
        .filter(|&t| t > SPEECH_EDGE_SECS && t < duration - SPEECH_EDGE_SECS)
        .map(|t| SceneCandidate::new(t, SPEECH_SCORE, CandidateOrigin::Speech))
        .collect()
}
