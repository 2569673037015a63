/// Chapter detection and selection
///
/// Detectors turn raw visual and audio signals into scored candidates, which
/// are merged, thinned to a duration-appropriate count and padded with
/// synthetic chapters when detection comes up short.

pub mod audio;
pub mod detector;
pub mod export;
pub mod fallback;
pub mod merge;
pub mod probe;
pub mod selection;
pub mod visual;

// Re-export main types
pub use audio::{AudioDetector, AudioSceneSource, SilenceEvent, VolumeStats};
pub use detector::{ChapterDetector, ChapterOutcome, PipelineStage};
pub use export::{format_description, write_chapters_json, ChapterInfo};
pub use fallback::FallbackGenerator;
pub use merge::merge_candidates;
pub use probe::DurationProber;
pub use selection::{filter_and_select, ideal_chapter_count, select_representative};
pub use visual::{FrameEvent, VisualDetector, VisualSceneSource};

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Anything earlier than this counts as the zero-chapter
pub const ZERO_CHAPTER_WINDOW: f64 = 1.0;

/// Which signal produced a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CandidateOrigin {
    Visual,
    Silence,
    Speech,
    Fallback,
}

/// A proposed chapter boundary with a confidence score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SceneCandidate {
    timestamp: f64,
    score: f64,
    origin: CandidateOrigin,
}

impl SceneCandidate {
    pub fn new(timestamp: f64, score: f64, origin: CandidateOrigin) -> Self {
        Self {
            timestamp: timestamp.max(0.0),
            score: score.clamp(0.0, 1.0),
            origin,
        }
    }

    /// The synthesized chapter at 0:00
    pub fn zero_chapter() -> Self {
        Self::new(0.0, 1.0, CandidateOrigin::Fallback)
    }

    /// Seconds from the start of the video
    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn origin(&self) -> CandidateOrigin {
        self.origin
    }

    pub fn is_zero_chapter(&self) -> bool {
        self.timestamp < ZERO_CHAPTER_WINDOW
    }
}

/// Ascending by timestamp; the sort is stable so equal timestamps keep their
/// input order.
pub(crate) fn sort_by_timestamp(candidates: &mut [SceneCandidate]) {
    candidates.sort_by(|a, b| {
        a.timestamp
            .partial_cmp(&b.timestamp)
            .unwrap_or(Ordering::Equal)
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_clamps_values() {
        let candidate = SceneCandidate::new(-3.0, 1.7, CandidateOrigin::Visual);
        assert_eq!(candidate.timestamp(), 0.0);
        assert_eq!(candidate.score(), 1.0);
        assert!(candidate.is_zero_chapter());
    }

    #[test]
    fn test_zero_chapter() {
        let zero = SceneCandidate::zero_chapter();
        assert_eq!(zero.timestamp(), 0.0);
        assert_eq!(zero.score(), 1.0);
        assert_eq!(zero.origin(), CandidateOrigin::Fallback);
    }

    #[test]
    fn test_sort_by_timestamp_is_stable() {
        let mut candidates = vec![
            SceneCandidate::new(20.0, 0.1, CandidateOrigin::Visual),
            SceneCandidate::new(10.0, 0.2, CandidateOrigin::Silence),
            SceneCandidate::new(10.0, 0.3, CandidateOrigin::Speech),
        ];
        sort_by_timestamp(&mut candidates);
        assert_eq!(candidates[0].origin(), CandidateOrigin::Silence);
        assert_eq!(candidates[1].origin(), CandidateOrigin::Speech);
        assert_eq!(candidates[2].timestamp(), 20.0);
    }
}
