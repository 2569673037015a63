use crate::chapters::audio::{AudioSceneSource, SilenceEvent, VolumeStats};
use crate::config::SilencePass;
use crate::error::{ChapterError, Result};
use crate::media::ToolRunner;
use async_trait::async_trait;
use regex::Regex;
use std::ffi::OsString;
use std::path::Path;
use std::sync::OnceLock;
use tracing::info;

fn silence_end_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"silence_end:\s*(-?\d+(?:\.\d+)?)").unwrap())
}

fn silence_duration_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"silence_duration:\s*(\d+(?:\.\d+)?)").unwrap())
}

fn volume_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(mean|max)_volume:\s*(-?\d+(?:\.\d+)?) dB").unwrap())
}

/// Audio-side analysis through ffmpeg's silencedetect and volumedetect filters
#[derive(Debug, Clone)]
pub struct AudioAnalyzer {
    runner: ToolRunner,
}

impl AudioAnalyzer {
    pub fn new(runner: ToolRunner) -> Self {
        Self { runner }
    }

    /// `ffmpeg -i <video> -vn -af <filter> -f null -`
    fn filter_args(video_path: &Path, filter: String) -> Vec<OsString> {
        vec![
            "-hide_banner".into(),
            "-nostats".into(),
            "-i".into(),
            video_path.as_os_str().to_os_string(),
            "-vn".into(),
            "-af".into(),
            filter.into(),
            "-f".into(),
            "null".into(),
            "-".into(),
        ]
    }
}

impl Default for AudioAnalyzer {
    fn default() -> Self {
        Self::new(ToolRunner::default())
    }
}

#[async_trait]
impl AudioSceneSource for AudioAnalyzer {
    async fn silence_events(&self, video_path: &Path, pass: &SilencePass) -> Result<Vec<SilenceEvent>> {
        let output = self
            .runner
            .run_ffmpeg(Self::filter_args(video_path, pass.filter()))
            .await?;

        let events = parse_silence_events(&output.stderr);
        info!("🔇 Detected {} silence periods below {}", events.len(), pass.noise_floor);
        Ok(events)
    }

    async fn volume_scan(&self, video_path: &Path) -> Result<VolumeStats> {
        let output = self
            .runner
            .run_ffmpeg(Self::filter_args(video_path, "volumedetect".to_string()))
            .await?;

        let stats = parse_volume_stats(&output.stderr);
        if stats.mean_volume_db.is_none() && stats.max_volume_db.is_none() {
            return Err(ChapterError::Parse("volumedetect printed no volume levels".to_string()));
        }
        Ok(stats)
    }
}

/// One event per `silence_end:` line, with the silence length when printed
pub fn parse_silence_events(output: &str) -> Vec<SilenceEvent> {
    output
        .lines()
        .filter_map(|line| {
            let end = silence_end_regex()
                .captures(line)?
                .get(1)?
                .as_str()
                .parse::<f64>()
                .ok()?;
            let duration = silence_duration_regex()
                .captures(line)
                .and_then(|c| c.get(1))
                .and_then(|m| m.as_str().parse::<f64>().ok());
            Some(SilenceEvent::new(end, duration))
        })
        .collect()
}

pub fn parse_volume_stats(output: &str) -> VolumeStats {
    let mut stats = VolumeStats::default();

    for caps in output.lines().filter_map(|line| volume_regex().captures(line)) {
        let value = caps[2].parse::<f64>().ok();
        match &caps[1] {
            "mean" => stats.mean_volume_db = value,
            _ => stats.max_volume_db = value,
        }
    }

    stats
}
