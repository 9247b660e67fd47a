use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::SchedulerError;

/// Configuration for the clip scheduler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Clip packing and keyword matching settings
    pub scheduler: SchedulerConfig,

    /// Transcription backend settings
    pub transcription: TranscriptionConfig,

    /// Transcript cache settings
    pub cache: CacheConfig,

    /// Voice timeline settings
    pub timeline: TimelineConfig,

    /// Output and logging settings
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Shortest clip drawn per iteration (seconds)
    pub clip_min_seconds: f64,

    /// Longest clip drawn per iteration (seconds)
    pub clip_max_seconds: f64,

    /// Forward jump used when no keyword matches (seconds)
    pub fallback_jump_seconds: f64,

    /// Script tokens must be longer than this to become keywords
    pub min_keyword_chars: usize,

    /// Keywords must be longer than this to be searched in the transcript
    pub min_match_chars: usize,

    /// Tokens never used as keywords
    pub stop_words: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionConfig {
    /// Whisper model name (tiny, base, small, ...)
    pub model: String,

    /// Language hint for transcription
    pub language: Option<String>,

    /// Worker threads handed to whisper.cpp
    pub threads: usize,

    /// Enable GPU acceleration for the Python backend
    pub use_gpu: bool,

    /// Kill the backend after this many seconds (None = wait indefinitely)
    pub timeout_seconds: Option<u64>,

    /// Directories searched for ggml model files
    pub model_dirs: Vec<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Directory holding one transcript file per source video
    pub dir: PathBuf,

    /// What to do with a cache file that cannot be read
    pub corrupt_policy: CorruptCachePolicy,
}

/// Handling of unreadable transcript cache files
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CorruptCachePolicy {
    /// Treat as a miss and overwrite with a fresh transcript
    Retranscribe,
    /// Surface `SchedulerError::CacheRead`
    Fail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineConfig {
    /// Fixed outro appended after the last voice track (seconds)
    pub outro_seconds: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Log level
    pub log_level: String,
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

impl OutputConfig {
    /// `EnvFilter` directive giving `targets` the configured level (debug when
    /// `verbose`) and everything else `warn`
    pub fn log_filter(&self, verbose: bool, targets: &[&str]) -> String {
        let level = if verbose { "debug".to_string() } else { self.log_level.to_lowercase() };
        let mut directives: Vec<String> = targets
            .iter()
            .map(|target| format!("{}={}", target, level))
            .collect();
        directives.push("warn".to_string());
        directives.join(",")
    }
}

impl SchedulerConfig {
    /// Check the packing constants
    pub fn validate(&self) -> crate::error::Result<()> {
        if !(self.clip_min_seconds > 0.0) || !self.clip_min_seconds.is_finite() {
            return Err(SchedulerError::Config(
                "clip_min_seconds must be a positive number".to_string(),
            ));
        }
        if !(self.clip_max_seconds >= self.clip_min_seconds) || !self.clip_max_seconds.is_finite() {
            return Err(SchedulerError::Config(
                "clip_max_seconds must be finite and not below clip_min_seconds".to_string(),
            ));
        }
        if !(self.fallback_jump_seconds > 0.0) || !self.fallback_jump_seconds.is_finite() {
            return Err(SchedulerError::Config(
                "fallback_jump_seconds must be a positive number".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            clip_min_seconds: 2.0,
            clip_max_seconds: 3.5,
            fallback_jump_seconds: 4.0,
            min_keyword_chars: 4,
            min_match_chars: 3,
            stop_words: ["the", "a", "is", "of", "to", "in", "and", "for", "did", "you", "know"]
                .iter()
                .map(|w| w.to_string())
                .collect(),
        }
    }
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            model: "tiny".to_string(),
            language: None,
            threads: num_cpus::get().min(8),
            use_gpu: false,
            timeout_seconds: None,
            model_dirs: vec![
                PathBuf::from("models"),
                PathBuf::from("/usr/local/share/whisper-cpp"),
                PathBuf::from("/opt/homebrew/share/whisper-cpp"),
            ],
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("temp"),
            corrupt_policy: CorruptCachePolicy::Retranscribe,
        }
    }
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self { outro_seconds: 4.0 }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        let config_paths = ["clip-scheduler.toml", "config/clip-scheduler.toml"];

        for path in &config_paths {
            if let Ok(config_str) = std::fs::read_to_string(path) {
                match toml::from_str(&config_str) {
                    Ok(config) => {
                        tracing::info!("📄 Loaded configuration from: {}", path);
                        return Ok(config);
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
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("Cannot read config {}: {}", path.display(), e))?;
        let config = toml::from_str(&config_str)
            .map_err(|e| anyhow!("Cannot parse config {}: {}", path.display(), e))?;
        tracing::info!("📄 Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Defaults overridden by environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var("CLIP_SCHEDULER_CACHE_DIR") {
            config.cache.dir = PathBuf::from(dir);
        }

        if let Ok(model) = std::env::var("CLIP_SCHEDULER_MODEL") {
            config.transcription.model = model;
        }

        if let Ok(log_level) = std::env::var("CLIP_SCHEDULER_LOG_LEVEL") {
            config.output.log_level = log_level;
        }

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &str) -> Result<()> {
        let config_str = toml::to_string_pretty(self)?;
        std::fs::write(path, config_str)?;
        tracing::info!("💾 Configuration saved to: {}", path);
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.scheduler.validate()?;

        if self.transcription.threads == 0 {
            return Err(anyhow!("transcription.threads must be greater than 0"));
        }

        if !(self.timeline.outro_seconds >= 0.0) || !self.timeline.outro_seconds.is_finite() {
            return Err(anyhow!("timeline.outro_seconds must be a non-negative number"));
        }

        if !LOG_LEVELS.contains(&self.output.log_level.to_lowercase().as_str()) {
            return Err(anyhow!(
                "output.log_level must be one of {}, got {:?}",
                LOG_LEVELS.join(", "),
                self.output.log_level
            ));
        }

        tracing::debug!("✅ Configuration validation passed");
        Ok(())
    }

    /// Get runtime configuration summary
    pub fn summary(&self) -> String {
        format!(
            "Clip Scheduler Configuration:\n\
            - Clip Range: {:.1}s - {:.1}s\n\
            - Fallback Jump: {:.1}s\n\
            - Whisper Model: {}\n\
            - Cache Directory: {}\n\
            - Corrupt Cache Policy: {:?}\n\
            - Outro: {:.1}s",
            self.scheduler.clip_min_seconds,
            self.scheduler.clip_max_seconds,
            self.scheduler.fallback_jump_seconds,
            self.transcription.model,
            self.cache.dir.display(),
            self.cache.corrupt_policy,
            self.timeline.outro_seconds
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scheduler: SchedulerConfig::default(),
            transcription: TranscriptionConfig::default(),
            cache: CacheConfig::default(),
            timeline: TimelineConfig::default(),
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

    pub fn with_clip_range(mut self, min_seconds: f64, max_seconds: f64) -> Self {
        self.config.scheduler.clip_min_seconds = min_seconds;
        self.config.scheduler.clip_max_seconds = max_seconds;
        self
    }

    pub fn with_fallback_jump(mut self, seconds: f64) -> Self {
        self.config.scheduler.fallback_jump_seconds = seconds;
        self
    }

    pub fn with_stop_words(mut self, words: Vec<String>) -> Self {
        self.config.scheduler.stop_words = words;
        self
    }

    pub fn with_cache_dir(mut self, dir: PathBuf) -> Self {
        self.config.cache.dir = dir;
        self
    }

    pub fn with_corrupt_policy(mut self, policy: CorruptCachePolicy) -> Self {
        self.config.cache.corrupt_policy = policy;
        self
    }

    pub fn with_model(mut self, model: String) -> Self {
        self.config.transcription.model = model;
        self
    }

    pub fn with_outro(mut self, seconds: f64) -> Self {
        self.config.timeline.outro_seconds = seconds;
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.scheduler.clip_min_seconds, 2.0);
        assert_eq!(config.scheduler.clip_max_seconds, 3.5);
        assert_eq!(config.scheduler.fallback_jump_seconds, 4.0);
        assert_eq!(config.transcription.model, "tiny");
        assert_eq!(config.cache.corrupt_policy, CorruptCachePolicy::Retranscribe);
        assert!(config.transcription.timeout_seconds.is_none());
    }

    #[test]
    fn test_config_builder() {
        let config = ConfigBuilder::new()
            .with_clip_range(1.0, 1.5)
            .with_fallback_jump(2.5)
            .with_outro(0.0)
            .build();

        assert_eq!(config.scheduler.clip_min_seconds, 1.0);
        assert_eq!(config.scheduler.clip_max_seconds, 1.5);
        assert_eq!(config.scheduler.fallback_jump_seconds, 2.5);
        assert_eq!(config.timeline.outro_seconds, 0.0);
    }

    #[test]
    fn test_config_validation() {
        assert!(Config::default().validate().is_ok());

        let inverted = ConfigBuilder::new().with_clip_range(3.0, 2.0).build();
        assert!(inverted.validate().is_err());

        let stalled = ConfigBuilder::new().with_fallback_jump(0.0).build();
        assert!(stalled.validate().is_err());
    }

    #[test]
    fn test_log_filter_follows_configured_level() {
        let mut config = Config::default();
        config.output.log_level = "error".to_string();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();

        assert_eq!(
            parsed.output.log_filter(false, &["shorts_clip_scheduler", "clip_scheduler"]),
            "shorts_clip_scheduler=error,clip_scheduler=error,warn"
        );
        assert_eq!(
            parsed.output.log_filter(true, &["shorts_clip_scheduler"]),
            "shorts_clip_scheduler=debug,warn"
        );
    }

    #[test]
    fn test_unknown_log_level_rejected() {
        let mut config = Config::default();
        config.output.log_level = "loud".to_string();
        assert!(config.validate().is_err());

        config.output.log_level = "DEBUG".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = ConfigBuilder::new()
            .with_corrupt_policy(CorruptCachePolicy::Fail)
            .build();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();

        assert_eq!(parsed.cache.corrupt_policy, CorruptCachePolicy::Fail);
        assert_eq!(parsed.scheduler.stop_words, config.scheduler.stop_words);
    }
}
