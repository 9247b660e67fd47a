use anyhow::Result;
use clap::{Parser, Subcommand};
use shorts_clip_scheduler::transcription::TranscriptCache;
use shorts_clip_scheduler::Config;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "transcript-cache")]
#[command(about = "Transcript cache management utility")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Cache directory (defaults to the configured one)
    #[arg(long)]
    cache_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List all cached transcripts
    List,
    /// Get cache statistics
    Stats,
    /// Show the cache file a video maps to
    Path {
        /// Source video path
        video_path: PathBuf,
    },
    /// Drop the cached transcript for a video so it is transcribed again
    Invalidate {
        /// Source video path
        video_path: PathBuf,
    },
    /// Clear all cache entries
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load().unwrap_or_default();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(config.output.log_filter(false, &["shorts_clip_scheduler", "transcript_cache"]))
        .init();

    let cache_dir = cli.cache_dir.unwrap_or(config.cache.dir);
    let cache = TranscriptCache::new(cache_dir);
    cache.initialize().await?;

    match cli.command {
        Commands::List => {
            let listing = cache.list().await?;

            if listing.is_empty() {
                info!("📭 No cached transcripts found");
                return Ok(());
            }

            info!("📚 Found {} cached transcripts:", listing.len());
            for entry in listing {
                info!("  {} - {} segments, model {}, cached {}",
                     entry.video_file,
                     entry.segment_count,
                     entry.model,
                     entry.created_at.format("%Y-%m-%d %H:%M:%S UTC"));
            }
        }

        Commands::Stats => {
            let stats = cache.stats().await?;
            info!("📊 Cache Statistics:");
            info!("  Directory: {}", cache.cache_dir().display());
            info!("  Total files: {}", stats.total_files);
            info!("  Readable files: {}", stats.readable_files);
            info!("  Corrupt files: {}", stats.corrupt_files);
            info!("  Total segments: {}", stats.total_segments);
        }

        Commands::Path { video_path } => {
            println!("{}", cache.cache_path(&video_path).display());
        }

        Commands::Invalidate { video_path } => {
            if cache.invalidate(&video_path).await? {
                info!("✅ Invalidated transcript for: {}", video_path.display());
            } else {
                warn!("⚠️ No cached transcript for: {}", video_path.display());
            }
        }

        Commands::Clear => {
            let count = cache.clear().await?;
            info!("🧹 Cleared {} cache files", count);
        }
    }

    Ok(())
}
