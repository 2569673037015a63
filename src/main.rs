use anyhow::Result;
use clap::{Arg, ArgAction, Command};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use chaptermark::chapters::format_description;
use chaptermark::config::{Config, ExportFormat};
use chaptermark::ChapterProcessor;

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("chaptermark")
        .version("0.1.0")
        .author("TigreRoll")
        .about("Detect chapter markers in a video from scene changes and silences")
        .arg(
            Arg::new("video")
                .value_name("VIDEO")
                .help("Video file to analyze")
                .required(true)
        )
        .arg(
            Arg::new("threshold")
                .short('t')
                .long("threshold")
                .value_name("FLOAT")
                .help("Scene detection threshold (0.1 to 1.0)")
                .value_parser(clap::value_parser!(f64))
        )
        .arg(
            Arg::new("min-gap")
                .short('g')
                .long("min-gap")
                .value_name("SECONDS")
                .help("Minimum gap between chapters in seconds")
                .value_parser(clap::value_parser!(f64))
        )
        .arg(
            Arg::new("min-duration")
                .short('d')
                .long("min-duration")
                .value_name("SECONDS")
                .help("Ignore chapter candidates earlier than this")
                .value_parser(clap::value_parser!(f64))
        )
        .arg(
            Arg::new("max-scenes")
                .short('m')
                .long("max-scenes")
                .value_name("NUM")
                .help("Maximum number of chapters (0 for unlimited)")
                .value_parser(clap::value_parser!(usize))
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("Chapter JSON output file")
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file (TOML)")
        )
        .arg(
            Arg::new("description")
                .long("description")
                .help("Also write a description-ready chapter list and print it")
                .action(ArgAction::SetTrue)
        )
        .arg(
            Arg::new("no-audio")
                .long("no-audio")
                .help("Skip silence and speech pause analysis")
                .action(ArgAction::SetTrue)
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .value_name("NUM")
                .help("Seed for fallback chapter jitter")
                .value_parser(clap::value_parser!(u64))
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(ArgAction::SetTrue)
        )
        .get_matches();

    let mut config = match matches.get_one::<String>("config") {
        Some(path) => Config::from_file(&PathBuf::from(path))?,
        None => Config::load().unwrap_or_else(|e| {
            eprintln!("Failed to load config, using defaults: {}", e);
            Config::default()
        }),
    };

    let verbose = matches.get_flag("verbose");
    let filter = if verbose {
        "chaptermark=debug,warn".to_string()
    } else {
        format!("chaptermark={},warn", config.output.log_level)
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    if let Some(threshold) = matches.get_one::<f64>("threshold") {
        config.detection.threshold = *threshold;
    }
    if let Some(min_gap) = matches.get_one::<f64>("min-gap") {
        config.detection.min_gap = *min_gap;
    }
    if let Some(min_duration) = matches.get_one::<f64>("min-duration") {
        config.detection.min_duration = *min_duration;
    }
    if let Some(max_scenes) = matches.get_one::<usize>("max-scenes") {
        config.detection.max_scenes = *max_scenes;
    }
    if let Some(output) = matches.get_one::<String>("output") {
        config.output.chapters_file = PathBuf::from(output);
    }
    if let Some(seed) = matches.get_one::<u64>("seed") {
        config.fallback.jitter_seed = Some(*seed);
    }
    if matches.get_flag("no-audio") {
        config.audio.enable_audio = false;
    }
    let print_description = matches.get_flag("description");
    if print_description && !config.output.export_formats.contains(&ExportFormat::Description) {
        config.output.export_formats.push(ExportFormat::Description);
    }

    config.validate()?;

    let video_path = PathBuf::from(
        matches
            .get_one::<String>("video")
            .ok_or_else(|| anyhow::anyhow!("missing video path"))?,
    );

    info!("🚀 Chaptermark starting...");
    info!("{}", config.summary());

    let processor = ChapterProcessor::new(config)?;
    let report = processor.process_video(&video_path).await?;

    if report.fallback.is_some() {
        warn!("Scene detection was insufficient; chapters are evenly spaced");
    }

    info!(
        "🎉 Detected {} chapters in {:.2}s",
        report.chapters.len(),
        report.processing_time.as_secs_f64()
    );
    if let Some(path) = &report.json_path {
        info!("📂 Chapters written to {}", path.display());
    }

    if print_description {
        print!("{}", format_description(&report.chapters));
    }

    Ok(())
}
