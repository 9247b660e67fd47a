use anyhow::{anyhow, Result};
use clap::{ArgGroup, Parser, ValueEnum};
use std::path::PathBuf;
use tracing::{info, warn};

use shorts_clip_scheduler::scheduler::{ClipPacker, ClipScheduler};
use shorts_clip_scheduler::timeline::{parse_track, VoiceTimeline};
use shorts_clip_scheduler::transcription::{TranscriptCache, TranscriptProvider, WhisperLoader};
use shorts_clip_scheduler::{video, Config, ScriptTemplate, ScriptText};

const LOG_TARGETS: &[&str] = &["shorts_clip_scheduler", "clip_scheduler"];

#[derive(Parser)]
#[command(name = "clip-scheduler")]
#[command(version, about = "Schedule source-video cuts for a vertical short")]
#[command(group(ArgGroup::new("target").required(true).args(["duration", "voice"])))]
struct Cli {
    /// Source video to cut from
    #[arg(short = 'i', long)]
    video: PathBuf,

    /// Script JSON file
    #[arg(short, long)]
    script: PathBuf,

    /// Script template the JSON follows
    #[arg(long, value_enum, default_value_t = TemplateArg::Fact)]
    template: TemplateArg,

    /// Title field name (custom template)
    #[arg(long, requires = "body_field")]
    title_field: Option<String>,

    /// Body field name (custom template)
    #[arg(long, requires = "title_field")]
    body_field: Option<String>,

    /// Target duration in seconds
    #[arg(short, long)]
    duration: Option<f64>,

    /// Voice track as name=seconds; repeat in playback order
    #[arg(long = "voice", value_name = "NAME=SECONDS")]
    voice: Vec<String>,

    /// Outro length appended after the voice tracks
    #[arg(long)]
    outro: Option<f64>,

    /// Seed for reproducible clip lengths
    #[arg(long)]
    seed: Option<u64>,

    /// Write the schedule here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Transcript cache directory
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Whisper model name
    #[arg(long)]
    model: Option<String>,

    /// Measure the source and report cuts that run past its end
    #[arg(long)]
    check_source: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TemplateArg {
    Fact,
    Tip,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => Ok(Config::from_file(path)?),
        None => Config::load(),
    };
    let mut config = loaded.as_ref().cloned().unwrap_or_default();
    if let Some(dir) = &cli.cache_dir {
        config.cache.dir = dir.clone();
    }
    if let Some(model) = &cli.model {
        config.transcription.model = model.clone();
    }
    if let Some(outro) = cli.outro {
        config.timeline.outro_seconds = outro;
    }
    config.validate()?;

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(config.output.log_filter(cli.verbose, LOG_TARGETS))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = &loaded {
        warn!("Failed to load config, using defaults: {}", e);
    }

    if !cli.video.is_file() {
        return Err(anyhow!("Source video not found: {}", cli.video.display()));
    }

    let template = match (&cli.title_field, &cli.body_field) {
        (Some(title_field), Some(body_field)) => ScriptTemplate::Custom {
            title_field: title_field.clone(),
            body_field: body_field.clone(),
        },
        _ => match cli.template {
            TemplateArg::Fact => ScriptTemplate::Fact,
            TemplateArg::Tip => ScriptTemplate::Tip,
        },
    };
    let script = ScriptText::load(&cli.script, &template).await?;

    let total_duration = match cli.duration {
        Some(duration) => duration,
        None => {
            let tracks = cli
                .voice
                .iter()
                .map(|pair| parse_track(pair))
                .collect::<shorts_clip_scheduler::Result<Vec<_>>>()?;
            let timeline = VoiceTimeline::from_tracks(&tracks, config.timeline.outro_seconds)?;
            info!("🎤 Voice timeline: {} tracks, outro at {:.2}s",
                  timeline.cues.len(), timeline.outro_start);
            timeline.total_duration()
        }
    };

    info!("🚀 Clip scheduler starting...");
    info!("📁 Source: {}", cli.video.display());
    info!("⏱️  Target duration: {:.2}s", total_duration);

    let cache = TranscriptCache::new(config.cache.dir.clone());
    let provider = TranscriptProvider::new(cache, WhisperLoader::new(config.transcription.clone()))
        .await?
        .with_corrupt_policy(config.cache.corrupt_policy);
    let packer = match cli.seed {
        Some(seed) => ClipPacker::seeded(config.scheduler.clone(), seed)?,
        None => ClipPacker::new(config.scheduler.clone())?,
    };
    let mut scheduler = ClipScheduler::new(provider, packer);

    let schedule = scheduler.schedule(&cli.video, total_duration, &script).await?;

    if cli.check_source {
        match video::probe_duration(&cli.video).await {
            Ok(source_duration) => {
                for index in video::find_overruns(&schedule, source_duration) {
                    warn!("   cut {} ends at {:.2}s", index, schedule[index].end());
                }
            }
            Err(e) => warn!("⚠️ Could not check cuts against the source: {}", e),
        }
    }

    let json = serde_json::to_string_pretty(&schedule)?;
    match &cli.output {
        Some(path) => {
            tokio::fs::write(path, json).await?;
            info!("💾 Schedule written to: {}", path.display());
        }
        None => println!("{}", json),
    }

    info!("🎉 {} cuts scheduled", schedule.len());
    Ok(())
}
