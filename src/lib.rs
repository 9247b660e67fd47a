/// Shorts Clip Scheduler
///
/// Decides which time ranges of a long source video to cut, and in what order,
/// to fill the runtime of a vertical short. Cuts are biased toward transcript
/// passages that mention keywords from the short's script.

pub mod config;
pub mod error;
pub mod scheduler;
pub mod script;
pub mod timeline;
pub mod transcription;
pub mod video;

// Re-export main types for easy access
pub use crate::config::{Config, CorruptCachePolicy, SchedulerConfig};
pub use crate::error::{Result, SchedulerError};
pub use crate::scheduler::{ClipPacker, ClipScheduler, ExcerptInstruction, KeywordExtractor};
pub use crate::script::{ScriptTemplate, ScriptText};
pub use crate::timeline::VoiceTimeline;
pub use crate::transcription::{
    ModelLoader, TranscriptCache, TranscriptProvider, TranscriptSegment, TranscriptionModel,
    WhisperLoader,
};
