use crate::chapters::probe::{parse_duration, DurationProber};
use crate::chapters::visual::{FrameEvent, VisualSceneSource};
use crate::error::{ChapterError, Result};
use crate::media::ToolRunner;
use async_trait::async_trait;
use regex::Regex;
use std::ffi::OsString;
use std::path::Path;
use std::sync::OnceLock;
use tracing::{debug, info};

fn pts_time_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"pts_time:\s*(-?\d+(?:\.\d+)?)").unwrap())
}

fn scene_score_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:lavfi\.scene_score=|\bscore:\s*)(\d*\.?\d+)").unwrap())
}

/// Video-side analysis through ffprobe and ffmpeg's scene filter
#[derive(Debug, Clone)]
pub struct VideoAnalyzer {
    runner: ToolRunner,
}

impl VideoAnalyzer {
    pub fn new(runner: ToolRunner) -> Self {
        Self { runner }
    }

    /// `ffmpeg -i <video> -vf <filter> -an -f null -`
    fn filter_args(video_path: &Path, filter: String) -> Vec<OsString> {
        vec![
            "-hide_banner".into(),
            "-nostats".into(),
            "-i".into(),
            video_path.as_os_str().to_os_string(),
            "-vf".into(),
            filter.into(),
            "-an".into(),
            "-f".into(),
            "null".into(),
            "-".into(),
        ]
    }
}

impl Default for VideoAnalyzer {
    fn default() -> Self {
        Self::new(ToolRunner::default())
    }
}

#[async_trait]
impl DurationProber for VideoAnalyzer {
    async fn ensure_tools(&self) -> Result<()> {
        self.runner.ensure_available().await
    }

    async fn probe_duration(&self, video_path: &Path) -> Result<f64> {
        if !video_path.is_file() {
            return Err(ChapterError::MediaProbe(format!(
                "{} is not a readable file",
                video_path.display()
            )));
        }

        let args: Vec<OsString> = vec![
            "-v".into(),
            "error".into(),
            "-show_entries".into(),
            "format=duration".into(),
            "-of".into(),
            "default=noprint_wrappers=1:nokey=1".into(),
            video_path.as_os_str().to_os_string(),
        ];

        let output = self
            .runner
            .run_ffprobe(args)
            .await
            .map_err(|e| ChapterError::MediaProbe(e.to_string()))?;

        parse_duration(&output.stdout)
    }
}

#[async_trait]
impl VisualSceneSource for VideoAnalyzer {
    async fn scene_events(&self, video_path: &Path, threshold: f64) -> Result<Vec<FrameEvent>> {
        let filter = format!("select='gt(scene,{})',metadata=print:file=-", threshold);
        let output = self.runner.run_ffmpeg(Self::filter_args(video_path, filter)).await?;

        let events = parse_scene_events(&output.combined());
        info!("🎬 Scene filter reported {} frames above {}", events.len(), threshold);
        Ok(events)
    }

    async fn interval_events(&self, video_path: &Path, interval: f64) -> Result<Vec<f64>> {
        let filter = format!(
            "select='isnan(prev_selected_t)+gte(t-prev_selected_t,{})',metadata=print:file=-",
            interval
        );
        let output = self.runner.run_ffmpeg(Self::filter_args(video_path, filter)).await?;

        let samples = parse_frame_times(&output.combined());
        debug!("Interval sampling returned {} frames", samples.len());
        Ok(samples)
    }
}

/// Pair every `pts_time:` with the next scene score, on the same line or a
/// following one. Unpaired or malformed entries are skipped.
pub fn parse_scene_events(output: &str) -> Vec<FrameEvent> {
    let mut events = Vec::new();
    let mut pending: Option<f64> = None;

    for line in output.lines() {
        if let Some(t) = capture_f64(pts_time_regex(), line) {
            pending = Some(t);
        }

        if let Some(score) = capture_f64(scene_score_regex(), line) {
            if let Some(timestamp) = pending.take() {
                events.push(FrameEvent::new(timestamp, score));
            }
        }
    }

    events
}

/// Every `pts_time:` value in the output
pub fn parse_frame_times(output: &str) -> Vec<f64> {
    output
        .lines()
        .filter_map(|line| capture_f64(pts_time_regex(), line))
        .collect()
}

fn capture_f64(re: &Regex, line: &str) -> Option<f64> {
    re.captures(line)?.get(1)?.as_str().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chapters::visual::VisualDetector;
    use crate::config::ToolConfig;
    use std::sync::Arc;

    #[cfg(unix)]
    #[tokio::test]
    async fn test_hung_ffmpeg_fails_soft() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = tempfile::TempDir::new().unwrap();
        let script = temp_dir.path().join("ffmpeg");
        std::fs::write(&script, "#!/bin/sh\nexec sleep 30\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let runner = ToolRunner::new(&ToolConfig {
            ffmpeg_path: script,
            timeout_seconds: 1,
            ..ToolConfig::default()
        });
        let analyzer = VideoAnalyzer::new(runner);

        let err = analyzer.scene_events(Path::new("talk.mp4"), 0.3).await.unwrap_err();
        assert!(matches!(err, ChapterError::Timeout { .. }));

        // Both the threshold pass and interval sampling time out
        let detector = VisualDetector::new(Arc::new(analyzer));
        let scenes = detector.detect(Path::new("talk.mp4"), 0.3, 600.0).await;
        assert!(scenes.is_empty());
    }

    #[test]
    fn test_parse_metadata_print_output() {
        let output = "\
frame:0    pts:5005    pts_time:5.005
lavfi.scene_score=0.412345
frame:1    pts:130130  pts_time:130.13
lavfi.scene_score=0.873000
";
        let events = parse_scene_events(output);
        assert_eq!(events, vec![FrameEvent::new(5.005, 0.412345), FrameEvent::new(130.13, 0.873)]);
    }

    #[test]
    fn test_parse_single_line_events() {
        let output = "[Parsed_metadata_1 @ 0x55] frame:3 pts:900 pts_time:45.2 score:0.6\n\
                      noise line\n\
                      [Parsed_metadata_1 @ 0x55] frame:4 pts:901 pts_time:131 score:0.9\n";
        let events = parse_scene_events(output);
        assert_eq!(events, vec![FrameEvent::new(45.2, 0.6), FrameEvent::new(131.0, 0.9)]);
    }

    #[test]
    fn test_parse_skips_unpaired_entries() {
        let output = "lavfi.scene_score=0.5\nframe:0 pts:1 pts_time:10.0\nframe:1 pts:2 pts_time:12.0\nlavfi.scene_score=0.7\n";
        let events = parse_scene_events(output);
        assert_eq!(events, vec![FrameEvent::new(12.0, 0.7)]);
    }

    #[test]
    fn test_parse_frame_times() {
        let output = "frame:0 pts:0 pts_time:0\nframe:1 pts:30 pts_time:30.03\ngarbage pts_time:abc\n";
        assert_eq!(parse_frame_times(output), vec![0.0, 30.03]);
    }

    #[tokio::test]
    async fn test_probe_missing_file() {
        let analyzer = VideoAnalyzer::default();
        let err = analyzer
            .probe_duration(Path::new("/nonexistent/video.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, ChapterError::MediaProbe(_)));
    }

    #[tokio::test]
    async fn test_probe_real_video() {
        // Requires ffprobe and a sample video
        if let Ok(video) = std::env::var("TEST_VIDEO_FILE") {
            let analyzer = VideoAnalyzer::default();
            let duration = analyzer.probe_duration(Path::new(&video)).await.unwrap();
            assert!(duration > 0.0);
        }
    }
}
