use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, error, info, warn};

use super::{ModelLoader, TranscriptSegment, TranscriptionModel};
use crate::config::TranscriptionConfig;
use crate::error::{Result, SchedulerError};

/// Whisper command-line backends in order of preference
const BACKENDS: [(&str, BackendKind); 3] = [
    ("whisper-cli", BackendKind::Cpp),
    ("whisper-cpp", BackendKind::Cpp),
    ("whisper", BackendKind::Python),
];

/// Sample rate whisper.cpp expects
const WHISPER_SAMPLE_RATE: u32 = 16000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BackendKind {
    /// whisper.cpp (needs 16kHz WAV input)
    Cpp,
    /// OpenAI Whisper (decodes the video itself)
    Python,
}

/// Resolves a Whisper backend and model file on demand
#[derive(Debug, Clone)]
pub struct WhisperLoader {
    config: TranscriptionConfig,
}

impl WhisperLoader {
    pub fn new(config: TranscriptionConfig) -> Self {
        Self { config }
    }

    /// Check if a command is available
    async fn check_command_available(cmd_name: &str) -> bool {
        Command::new(cmd_name)
            .arg("--help")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|status| status.success())
            .unwrap_or(false)
    }

    /// Locate the ggml model file for whisper.cpp
    fn find_model_file(&self) -> Option<PathBuf> {
        let filename = format!("ggml-{}.bin", self.config.model);
        self.config
            .model_dirs
            .iter()
            .map(|dir| dir.join(&filename))
            .find(|path| {
                debug!("Checking for Whisper model: {}", path.display());
                path.exists()
            })
    }
}

#[async_trait]
impl ModelLoader for WhisperLoader {
    async fn load(&self) -> Result<Box<dyn TranscriptionModel>> {
        info!("⏳ Loading Whisper model ({})...", self.config.model);

        for (cmd_name, kind) in BACKENDS {
            if !Self::check_command_available(cmd_name).await {
                debug!("{} not available", cmd_name);
                continue;
            }

            let model_path = match kind {
                BackendKind::Cpp => match self.find_model_file() {
                    Some(path) => Some(path),
                    None => {
                        warn!("⚠️  {} found but no ggml-{}.bin model, trying next backend",
                              cmd_name, self.config.model);
                        continue;
                    }
                },
                BackendKind::Python => None,
            };

            info!("✅ Using {} backend", cmd_name);
            return Ok(Box::new(WhisperModel {
                command: cmd_name.to_string(),
                kind,
                model_path,
                config: self.config.clone(),
            }));
        }

        error!("❌ No Whisper backend found!");
        Err(SchedulerError::Transcription(
            "No Whisper backend found. Please install whisper.cpp or openai-whisper".to_string(),
        ))
    }
}

/// A resolved Whisper backend, valid for one transcription call
#[derive(Debug)]
pub struct WhisperModel {
    command: String,
    kind: BackendKind,
    model_path: Option<PathBuf>,
    config: TranscriptionConfig,
}

impl WhisperModel {
    /// Extract a mono 16kHz WAV track for whisper.cpp
    async fn extract_audio(&self, video_path: &Path, work_dir: &Path) -> Result<PathBuf> {
        let audio_path = work_dir.join("audio.wav");
        info!("🎵 Extracting audio for transcription: {}", video_path.display());

        let status = Command::new("ffmpeg")
            .arg("-i").arg(video_path)
            .args(["-vn", "-acodec", "pcm_s16le"])
            .arg("-ar").arg(WHISPER_SAMPLE_RATE.to_string())
            .args(["-ac", "1", "-f", "wav", "-y"])
            .arg(&audio_path)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|e| SchedulerError::Transcription(format!("Failed to run ffmpeg: {}", e)))?;

        if !status.success() {
            return Err(SchedulerError::Transcription(format!(
                "Audio extraction failed for {}",
                video_path.display()
            )));
        }

        Ok(audio_path)
    }

    fn cpp_command(&self, audio_path: &Path, work_dir: &Path) -> Command {
        let mut cmd = Command::new(&self.command);
        cmd.arg("-f").arg(audio_path)
            .arg("-oj")
            .arg("-of").arg(work_dir.join("transcript"))
            .arg("-t").arg(self.config.threads.to_string());

        if let Some(model_path) = &self.model_path {
            cmd.arg("-m").arg(model_path);
        }
        if let Some(language) = &self.config.language {
            cmd.arg("-l").arg(language);
        }
        cmd
    }

    fn python_command(&self, video_path: &Path, work_dir: &Path) -> Command {
        let mut cmd = Command::new(&self.command);
        cmd.arg(video_path)
            .arg("--model").arg(&self.config.model)
            .arg("--output_dir").arg(work_dir)
            .args(["--output_format", "json", "--verbose", "False", "--fp16", "False"]);

        if let Some(language) = &self.config.language {
            cmd.arg("--language").arg(language);
        }
        if !self.config.use_gpu {
            cmd.arg("--device").arg("cpu");
        }
        cmd
    }

    /// Run the backend, streaming its progress output into the log
    async fn execute(&self, mut cmd: Command) -> Result<()> {
        let start_time = std::time::Instant::now();
        debug!("Executing command: {:?}", cmd);

        cmd.stdout(Stdio::null()).stderr(Stdio::piped()).kill_on_drop(true);
        let mut child = cmd.spawn().map_err(|e| {
            SchedulerError::Transcription(format!("Failed to spawn {}: {}", self.command, e))
        })?;

        if let Some(stderr) = child.stderr.take() {
            let backend = self.command.clone();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    if !line.trim().is_empty() {
                        debug!("{}: {}", backend, line.trim());
                    }
                }
            });
        }

        let status = match self.config.timeout_seconds {
            Some(secs) => match tokio::time::timeout(Duration::from_secs(secs), child.wait()).await {
                Ok(status) => status.map_err(|e| self.wait_error(e))?,
                Err(_) => {
                    error!("⏰ {} timed out after {}s", self.command, secs);
                    let _ = child.kill().await;
                    return Err(SchedulerError::Transcription(format!(
                        "{} timed out after {} seconds",
                        self.command, secs
                    )));
                }
            },
            None => child.wait().await.map_err(|e| self.wait_error(e))?,
        };

        if !status.success() {
            error!("❌ {} failed with exit code: {}", self.command, status);
            return Err(SchedulerError::Transcription(format!(
                "{} exited with {}",
                self.command, status
            )));
        }

        info!("✅ {} completed in {:.1}s", self.command, start_time.elapsed().as_secs_f64());
        Ok(())
    }

    fn wait_error(&self, e: std::io::Error) -> SchedulerError {
        SchedulerError::Transcription(format!("Failed waiting for {}: {}", self.command, e))
    }

    /// First JSON file the backend wrote into the work directory
    async fn find_json_output(work_dir: &Path) -> Result<PathBuf> {
        let unreadable = |e: std::io::Error| {
            SchedulerError::Transcription(format!("Cannot read {}: {}", work_dir.display(), e))
        };
        let mut entries = tokio::fs::read_dir(work_dir).await.map_err(unreadable)?;
        while let Some(entry) = entries.next_entry().await.map_err(unreadable)? {
            let path = entry.path();
            if path.extension().map_or(false, |ext| ext == "json") {
                return Ok(path);
            }
        }
        Err(SchedulerError::Transcription(format!(
            "No JSON output found in {}",
            work_dir.display()
        )))
    }
}

#[async_trait]
impl TranscriptionModel for WhisperModel {
    async fn transcribe(&mut self, video_path: &Path) -> Result<Vec<TranscriptSegment>> {
        if !video_path.is_file() {
            return Err(SchedulerError::Transcription(format!(
                "Source video not found: {}",
                video_path.display()
            )));
        }

        info!("🎙️ Transcribing: {}", video_path.display());
        let work_dir = tempfile::TempDir::new().map_err(|e| {
            SchedulerError::Transcription(format!("Cannot create work directory: {}", e))
        })?;

        let cmd = match self.kind {
            BackendKind::Cpp => {
                let audio_path = self.extract_audio(video_path, work_dir.path()).await?;
                self.cpp_command(&audio_path, work_dir.path())
            }
            BackendKind::Python => self.python_command(video_path, work_dir.path()),
        };
        self.execute(cmd).await?;

        let json_path = Self::find_json_output(work_dir.path()).await?;
        let content = tokio::fs::read_to_string(&json_path).await.map_err(|e| {
            SchedulerError::Transcription(format!("Cannot read {}: {}", json_path.display(), e))
        })?;
        let segments = parse_output(&content)?;

        info!("🎉 Transcribed {} segments from {}", segments.len(), video_path.display());
        Ok(segments)
    }

    fn name(&self) -> &str {
        &self.config.model
    }
}

/// Convert any supported Whisper JSON output into transcript segments
pub fn parse_output(json: &str) -> Result<Vec<TranscriptSegment>> {
    let output: WhisperOutput = serde_json::from_str(json).map_err(|e| {
        SchedulerError::Transcription(format!("Failed to parse Whisper output: {}", e))
    })?;

    let segments = if !output.transcription.is_empty() {
        output
            .transcription
            .into_iter()
            .map(|seg| TranscriptSegment {
                start: seg.offsets.from as f64 / 1000.0,
                end: seg.offsets.to as f64 / 1000.0,
                text: seg.text.trim().to_string(),
            })
            .collect()
    } else {
        let raw = match output.result {
            Some(result) if !result.segments.is_empty() => result.segments,
            _ => output.segments,
        };
        raw.into_iter()
            .map(|seg| TranscriptSegment {
                start: seg.start,
                end: seg.end,
                text: seg.text.trim().to_string(),
            })
            .collect()
    };

    Ok(segments)
}

/// Whisper JSON output (whisper.cpp and OpenAI layouts)
#[derive(Debug, Clone, Deserialize)]
struct WhisperOutput {
    #[serde(default)]
    segments: Vec<WhisperSegment>,
    #[serde(default)]
    transcription: Vec<WhisperCppSegment>,
    #[serde(default)]
    result: Option<WhisperResult>,
}

#[derive(Debug, Clone, Deserialize)]
struct WhisperResult {
    #[serde(default)]
    segments: Vec<WhisperSegment>,
}

#[derive(Debug, Clone, Deserialize)]
struct WhisperCppSegment {
    offsets: WhisperOffsets,
    text: String,
}

#[derive(Debug, Clone, Deserialize)]
struct WhisperOffsets {
    from: u64,
    to: u64,
}

#[derive(Debug, Clone, Deserialize)]
struct WhisperSegment {
    start: f64,
    end: f64,
    text: String,
}
