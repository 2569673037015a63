/// Chapter-count targeting and representative selection
use super::{sort_by_timestamp, SceneCandidate};
use tracing::debug;

/// Duration-appropriate chapter count
///
/// - under 5 minutes: 3
/// - 5 to 15 minutes: 5
/// - 15 to 30 minutes: 8
/// - longer: 10, plus one per 30 minutes
pub fn ideal_chapter_count(duration: f64) -> usize {
    if duration < 300.0 {
        3
    } else if duration < 900.0 {
        5
    } else if duration < 1800.0 {
        8
    } else {
        10 + (duration / 1800.0) as usize
    }
}

/// Drop candidates earlier than `min_duration`, then thin the list to the
/// ideal count when it holds more than twice that many.
pub fn filter_and_select(
    candidates: Vec<SceneCandidate>,
    min_duration: f64,
    duration: f64,
) -> Vec<SceneCandidate> {
    if candidates.is_empty() {
        return candidates;
    }

    let filtered: Vec<SceneCandidate> = candidates
        .into_iter()
        .filter(|c| c.timestamp() >= min_duration)
        .collect();

    let ideal = ideal_chapter_count(duration);
    if filtered.len() > ideal * 2 {
        debug!(
            "{} candidates exceed twice the ideal count {}, selecting representatives",
            filtered.len(),
            ideal
        );
        return select_representative(filtered, ideal, duration);
    }

    filtered
}

/// Choose `desired` candidates spread across the timeline.
///
/// A leading zero-chapter is kept and counts towards `desired`. The video is
/// split into equal segments, one per remaining slot, and each non-empty
/// segment contributes the candidate with the best score weighted by its
/// closeness to the segment midpoint.
pub fn select_representative(
    mut candidates: Vec<SceneCandidate>,
    desired: usize,
    duration: f64,
) -> Vec<SceneCandidate> {
    if candidates.len() <= desired {
        return candidates;
    }

    let mut result = Vec::with_capacity(desired);
    let mut remaining = desired;

    if candidates.first().is_some_and(SceneCandidate::is_zero_chapter) {
        result.push(candidates.remove(0));
        remaining = remaining.saturating_sub(1);
    }

    if remaining == 0 || duration <= 0.0 {
        result.truncate(desired);
        return result;
    }

    let segment_width = duration / remaining as f64;
    let mut segments: Vec<Vec<SceneCandidate>> = vec![Vec::new(); remaining];
    for candidate in candidates {
        let index = ((candidate.timestamp() / segment_width) as usize).min(remaining - 1);
        segments[index].push(candidate);
    }

    for (i, segment) in segments.iter().enumerate() {
        let midpoint = i as f64 * segment_width + segment_width / 2.0;
        let mut best: Option<(f64, SceneCandidate)> = None;

        for &candidate in segment {
            let weighted = weighted_score(&candidate, midpoint, segment_width);
            if best.map_or(true, |(best_score, _)| weighted > best_score) {
                best = Some((weighted, candidate));
            }
        }

        if let Some((_, candidate)) = best {
            result.push(candidate);
        }
    }

    sort_by_timestamp(&mut result);
    result
}

/// `score * (1 - distance_from_midpoint / width / 2)`
fn weighted_score(candidate: &SceneCandidate, midpoint: f64, segment_width: f64) -> f64 {
    let normalized_distance = (candidate.timestamp() - midpoint).abs() / segment_width;
    candidate.score() * (1.0 - normalized_distance / 2.0)
}
