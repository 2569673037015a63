/// Titled chapters and their on-disk / text renderings
use super::SceneCandidate;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::Path;
use tracing::info;

/// Represents a single chapter in a video
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChapterInfo {
    /// Timestamp in seconds from start of video
    pub timestamp: f64,
    /// Chapter title
    pub title: String,
}

impl ChapterInfo {
    /// Title every candidate "Chapter N", dropping scores
    pub fn from_candidates(candidates: &[SceneCandidate]) -> Vec<ChapterInfo> {
        candidates
            .iter()
            .enumerate()
            .map(|(i, c)| ChapterInfo {
                timestamp: c.timestamp(),
                title: format!("Chapter {}", i + 1),
            })
            .collect()
    }
}

/// Write chapters as indented JSON
pub async fn write_chapters_json(path: &Path, chapters: &[ChapterInfo]) -> Result<()> {
    let json_data = serde_json::to_string_pretty(chapters)?;
    tokio::fs::write(path, json_data).await?;
    info!("💾 Chapters saved to: {}", path.display());
    Ok(())
}

/// `M:SS` below an hour, `H:MM:SS` above
pub fn format_timestamp(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

/// Chapter block for a video description. Video platforms require the list to
/// start at 0:00, so an "Introduction" line is added when no chapter does.
pub fn format_description(chapters: &[ChapterInfo]) -> String {
    if chapters.is_empty() {
        return String::new();
    }

    let mut text = String::from("Chapters:\n");
    if !chapters.iter().any(|c| c.timestamp < 1.0) {
        text.push_str("0:00 Introduction\n");
    }

    for chapter in chapters {
        let _ = writeln!(text, "{} {}", format_timestamp(chapter.timestamp), chapter.title);
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chapters::CandidateOrigin;
    use tempfile::TempDir;

    fn chapter(timestamp: f64, title: &str) -> ChapterInfo {
        ChapterInfo {
            timestamp,
            title: title.to_string(),
        }
    }

    #[test]
    fn test_from_candidates_titles() {
        let candidates = vec![
            SceneCandidate::zero_chapter(),
            SceneCandidate::new(45.2, 0.6, CandidateOrigin::Visual),
        ];
        let chapters = ChapterInfo::from_candidates(&candidates);
        assert_eq!(chapters[0], chapter(0.0, "Chapter 1"));
        assert_eq!(chapters[1], chapter(45.2, "Chapter 2"));
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0.0), "0:00");
        assert_eq!(format_timestamp(45.9), "0:45");
        assert_eq!(format_timestamp(610.0), "10:10");
        assert_eq!(format_timestamp(3725.0), "1:02:05");
    }

    #[test]
    fn test_description_adds_introduction() {
        let text = format_description(&[chapter(65.0, "Guard passing")]);
        assert_eq!(text, "Chapters:\n0:00 Introduction\n1:05 Guard passing\n");

        let text = format_description(&[chapter(0.0, "Chapter 1"), chapter(90.0, "Chapter 2")]);
        assert_eq!(text, "Chapters:\n0:00 Chapter 1\n1:30 Chapter 2\n");

        assert!(format_description(&[]).is_empty());
    }

    #[tokio::test]
    async fn test_write_chapters_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("chapters.json");
        let chapters = vec![chapter(0.0, "Chapter 1"), chapter(131.0, "Chapter 2")];

        write_chapters_json(&path, &chapters).await.unwrap();

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        let parsed: Vec<ChapterInfo> = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed, chapters);
        assert!(content.contains("\"title\": \"Chapter 2\""));
    }
}
