/// Synthetic, evenly spaced chapters for videos where detection comes up short
use super::selection::ideal_chapter_count;
use super::{CandidateOrigin, SceneCandidate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Jitter as a fraction of the chapter spacing, applied in both directions
const JITTER_FRACTION: f64 = 0.1;
/// Synthetic chapters stay at least this far from the end
const END_MARGIN_SECS: f64 = 10.0;
const FALLBACK_SCORE: f64 = 0.5;

pub struct FallbackGenerator {
    seed: u64,
    rng: StdRng,
}

impl FallbackGenerator {
    /// Generator with a fixed seed, for reproducible output
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Generator with a fresh random seed
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy().gen())
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Evenly spaced chapters for `duration`, at most `cap` entries when set.
    ///
    /// The first entry is always 0:00 with score 1.0. Every later boundary is
    /// shifted by up to 10% of the spacing; a shifted value outside
    /// `(0, duration - 10s)` reverts to the exact boundary, and is dropped when
    /// that boundary is outside the range too.
    pub fn generate(&mut self, duration: f64, cap: Option<usize>) -> Vec<SceneCandidate> {
        let mut count = ideal_chapter_count(duration);
        if let Some(cap) = cap {
            count = count.min(cap);
        }
        if count == 0 {
            return Vec::new();
        }

        let spacing = duration / count as f64;
        let upper = duration - END_MARGIN_SECS;

        let mut chapters = Vec::with_capacity(count);
        chapters.push(SceneCandidate::new(0.0, 1.0, CandidateOrigin::Fallback));

        for i in 1..count {
            let boundary = i as f64 * spacing;
            let jitter = spacing * JITTER_FRACTION * self.rng.gen_range(-1.0..=1.0);
            let mut timestamp = boundary + jitter;
            if timestamp <= 0.0 || timestamp >= upper {
                timestamp = boundary;
            }

            // Boundaries past the end margin only occur on very short videos
            let previous = chapters.last().map_or(0.0, SceneCandidate::timestamp);
            if timestamp > previous && timestamp < upper {
                chapters.push(SceneCandidate::new(timestamp, FALLBACK_SCORE, CandidateOrigin::Fallback));
            }
        }

        chapters
    }
}
