use crate::error::{ChapterError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for the chapter marker generator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Scene detection tuning
    pub detection: DetectionConfig,

    /// External tool settings
    pub tools: ToolConfig,

    /// Audio analysis settings
    pub audio: AudioConfig,

    /// Fallback chapter generation
    pub fallback: FallbackConfig,

    /// Output and export settings
    pub output: OutputConfig,
}

/// Detection parameters supplied once per run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Scene-difference threshold (0.1 to 1.0)
    pub threshold: f64,

    /// Minimum gap between chapters in seconds
    pub min_gap: f64,

    /// Candidates earlier than this many seconds are dropped
    pub min_duration: f64,

    /// Maximum number of chapters (0 = unlimited)
    pub max_scenes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolConfig {
    /// ffmpeg executable
    pub ffmpeg_path: PathBuf,

    /// ffprobe executable
    pub ffprobe_path: PathBuf,

    /// Per-invocation timeout in seconds (0 = no timeout)
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Enable audio-based candidates
    pub enable_audio: bool,

    /// Silence detection passes, run in order
    pub silence_passes: Vec<SilencePass>,

    /// Enable the fixed-interval speech pause estimate
    pub enable_speech_estimate: bool,

    /// Spacing of speech pause estimates in seconds
    pub speech_pause_interval: f64,
}

/// One silencedetect pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SilencePass {
    /// Noise floor passed to silencedetect, e.g. "-30dB"
    pub noise_floor: String,

    /// Minimum silence length in seconds
    pub min_silence: f64,

    /// Score given to candidates from this pass
    pub base_score: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FallbackConfig {
    /// Fixed jitter seed; a fresh seed is drawn per run when unset
    pub jitter_seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Chapter JSON output file
    pub chapters_file: PathBuf,

    /// Export formats
    pub export_formats: Vec<ExportFormat>,

    /// Log level
    pub log_level: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExportFormat {
    JSON,
    Description,
}

impl DetectionConfig {
    pub fn new(threshold: f64, min_gap: f64, min_duration: f64, max_scenes: usize) -> Result<Self> {
        let config = Self {
            threshold,
            min_gap,
            min_duration,
            max_scenes,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.1..=1.0).contains(&self.threshold) {
            return Err(ChapterError::Config(format!(
                "threshold must be between 0.1 and 1.0, got {}",
                self.threshold
            )));
        }
        if !self.min_gap.is_finite() || self.min_gap < 0.0 {
            return Err(ChapterError::Config("min_gap must be a non-negative number".to_string()));
        }
        if !self.min_duration.is_finite() || self.min_duration < 0.0 {
            return Err(ChapterError::Config(
                "min_duration must be a non-negative number".to_string(),
            ));
        }
        Ok(())
    }

    /// Chapter ceiling, if one is set
    pub fn scene_limit(&self) -> Option<usize> {
        (self.max_scenes > 0).then_some(self.max_scenes)
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            threshold: 0.3,
            min_gap: 5.0,
            min_duration: 0.0,
            max_scenes: 0,
        }
    }
}

impl SilencePass {
    pub fn new(noise_floor: &str, min_silence: f64, base_score: f64) -> Self {
        Self {
            noise_floor: noise_floor.to_string(),
            min_silence,
            base_score,
        }
    }

    /// silencedetect filter expression for this pass
    pub fn filter(&self) -> String {
        format!("silencedetect=noise={}:d={}", self.noise_floor, self.min_silence)
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            enable_audio: true,
            silence_passes: vec![
                SilencePass::new("-30dB", 0.5, 0.5),
                SilencePass::new("-20dB", 0.5, 0.75),
            ],
            enable_speech_estimate: true,
            speech_pause_interval: 90.0,
        }
    }
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: PathBuf::from("ffmpeg"),
            ffprobe_path: PathBuf::from("ffprobe"),
            timeout_seconds: 1800,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            chapters_file: PathBuf::from("chapters.json"),
            export_formats: vec![ExportFormat::JSON],
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        let config_paths = ["chaptermark.toml", "config/chaptermark.toml"];

        for path in &config_paths {
            if let Ok(config_str) = std::fs::read_to_string(path) {
                match toml::from_str::<Config>(&config_str) {
                    Ok(config) => {
                        tracing::info!("📄 Loaded configuration from: {}", path);
                        return Ok(config.with_env_overrides());
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config file {}: {}", path, e);
                    }
                }
            }
        }

        Self::from_env()
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&config_str)?;
        tracing::info!("📄 Loaded configuration from: {}", path.display());
        Ok(config.with_env_overrides())
    }

    /// Defaults with environment variable overrides
    pub fn from_env() -> Result<Self> {
        Ok(Self::default().with_env_overrides())
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(threshold) = std::env::var("CHAPTERMARK_THRESHOLD") {
            self.detection.threshold = threshold.parse().unwrap_or(self.detection.threshold);
        }

        if let Ok(min_gap) = std::env::var("CHAPTERMARK_MIN_GAP") {
            self.detection.min_gap = min_gap.parse().unwrap_or(self.detection.min_gap);
        }

        if let Ok(max_scenes) = std::env::var("CHAPTERMARK_MAX_SCENES") {
            self.detection.max_scenes = max_scenes.parse().unwrap_or(self.detection.max_scenes);
        }

        if let Ok(ffmpeg) = std::env::var("CHAPTERMARK_FFMPEG") {
            self.tools.ffmpeg_path = PathBuf::from(ffmpeg);
        }

        if let Ok(ffprobe) = std::env::var("CHAPTERMARK_FFPROBE") {
            self.tools.ffprobe_path = PathBuf::from(ffprobe);
        }

        if let Ok(log_level) = std::env::var("CHAPTERMARK_LOG_LEVEL") {
            self.output.log_level = log_level;
        }

        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.detection.validate()?;

        if self.audio.enable_audio && self.audio.silence_passes.is_empty() {
            return Err(ChapterError::Config(
                "at least one silence pass is required when audio analysis is enabled".to_string(),
            ));
        }

        for pass in &self.audio.silence_passes {
            if !(0.0..=1.0).contains(&pass.base_score) {
                return Err(ChapterError::Config(format!(
                    "silence pass {} has base_score outside 0..1",
                    pass.noise_floor
                )));
            }
        }

        if self.audio.speech_pause_interval <= 0.0 {
            return Err(ChapterError::Config(
                "speech_pause_interval must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Get runtime configuration summary
    pub fn summary(&self) -> String {
        format!(
            "Chaptermark Configuration:\n\
            - Threshold: {}\n\
            - Min Gap: {}s\n\
            - Min Duration: {}s\n\
            - Max Scenes: {}\n\
            - Silence Passes: {}\n\
            - Tool Timeout: {}s",
            self.detection.threshold,
            self.detection.min_gap,
            self.detection.min_duration,
            self.detection.max_scenes,
            self.audio
                .silence_passes
                .iter()
                .map(|p| p.noise_floor.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            self.tools.timeout_seconds
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            detection: DetectionConfig::default(),
            tools: ToolConfig::default(),
            audio: AudioConfig::default(),
            fallback: FallbackConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

/// Configuration builder for programmatic config creation
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.config.detection.threshold = threshold;
        self
    }

    pub fn with_min_gap(mut self, min_gap: f64) -> Self {
        self.config.detection.min_gap = min_gap;
        self
    }

    pub fn with_min_duration(mut self, min_duration: f64) -> Self {
        self.config.detection.min_duration = min_duration;
        self
    }

    pub fn with_max_scenes(mut self, max_scenes: usize) -> Self {
        self.config.detection.max_scenes = max_scenes;
        self
    }

    pub fn with_jitter_seed(mut self, seed: u64) -> Self {
        self.config.fallback.jitter_seed = Some(seed);
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
