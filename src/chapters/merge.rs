use super::{sort_by_timestamp, SceneCandidate};

/// Merge visual and audio candidates into one ascending list in which no two
/// entries are closer than `min_gap` seconds.
///
/// Within a crowded window the higher score wins; on equal scores the
/// candidate accepted first is kept. The spacing applies even when there are
/// no audio candidates. Candidates sharing a timestamp are never both kept,
/// even with a `min_gap` of zero.
pub fn merge_candidates(
    visual: Vec<SceneCandidate>,
    audio: Vec<SceneCandidate>,
    min_gap: f64,
) -> Vec<SceneCandidate> {
    let mut all = visual;
    all.extend(audio);
    sort_by_timestamp(&mut all);

    let mut merged: Vec<SceneCandidate> = Vec::with_capacity(all.len());
    // Far enough below zero that the first candidate always clears the gap
    let mut last_timestamp = -100.0 - min_gap;

    for candidate in all {
        let gap = candidate.timestamp() - last_timestamp;
        if gap >= min_gap && gap > 0.0 {
            merged.push(candidate);
            last_timestamp = candidate.timestamp();
        } else if let Some(last) = merged.last_mut() {
            if candidate.score() > last.score() {
                *last = candidate;
                last_timestamp = candidate.timestamp();
            }
        }
    }

    merged
}
