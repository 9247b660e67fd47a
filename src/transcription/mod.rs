/// Transcript acquisition: the model seam, the Whisper backend and the on-disk cache.
pub mod whisper;
pub mod cache;
pub mod provider;

pub use whisper::{WhisperLoader, WhisperModel};
pub use cache::{CachedTranscript, TranscriptCache, CacheStats, CachedTranscriptInfo};
pub use provider::TranscriptProvider;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;

/// A time-stamped span of recognized speech in the source video
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranscriptSegment {
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
    /// Recognized text
    pub text: String,
}

impl TranscriptSegment {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }
}

/// A loaded speech-to-text model. Dropping it releases whatever it holds.
#[async_trait]
pub trait TranscriptionModel: Send {
    /// Transcribe the whole source video into ordered segments
    async fn transcribe(&mut self, video_path: &Path) -> Result<Vec<TranscriptSegment>>;

    /// Model identifier recorded in the cache file
    fn name(&self) -> &str;
}

/// Acquires a transcription model for the duration of a single transcription call
#[async_trait]
pub trait ModelLoader: Send + Sync {
    async fn load(&self) -> Result<Box<dyn TranscriptionModel>>;
}
