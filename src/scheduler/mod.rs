/// Clip scheduling: keyword extraction, timestamp selection and duration packing
///
/// A schedule is an ordered list of `(start, duration)` cuts from the source
/// video whose durations add up to the requested target. Each cut starts at or
/// after the end of the previous one. Start times are not bounded by the
/// source's real length; see `video::find_overruns`.

pub mod keywords;
pub mod selection;

pub use keywords::KeywordExtractor;
pub use selection::find_best_timestamp;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::Path;
use tracing::{debug, info};

use crate::config::SchedulerConfig;
use crate::error::{Result, SchedulerError};
use crate::script::ScriptText;
use crate::transcription::{ModelLoader, TranscriptProvider, TranscriptSegment};

/// One cut from the source video
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExcerptInstruction {
    /// Offset into the source video (seconds)
    pub start: f64,
    /// Length of the cut (seconds)
    pub duration: f64,
}

impl ExcerptInstruction {
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// Packs randomly sized clips into an exact target duration
#[derive(Debug, Clone)]
pub struct ClipPacker<R: Rng = StdRng> {
    config: SchedulerConfig,
    rng: R,
}

impl ClipPacker<StdRng> {
    /// Packer drawing clip lengths from an entropy-seeded generator
    pub fn new(config: SchedulerConfig) -> Result<Self> {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Reproducible packer
    pub fn seeded(config: SchedulerConfig, seed: u64) -> Result<Self> {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> ClipPacker<R> {
    pub fn with_rng(config: SchedulerConfig, rng: R) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, rng })
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Emit cuts until their durations reach `total_duration`.
    ///
    /// Keywords are popped front-to-back, one per cut, and never requeued.
    pub fn pack(
        &mut self,
        segments: &[TranscriptSegment],
        keywords: &mut VecDeque<String>,
        total_duration: f64,
    ) -> Result<Vec<ExcerptInstruction>> {
        validate_target(total_duration)?;

        let mut schedule = Vec::new();
        let mut cursor = 0.0;
        let mut generated = 0.0;

        while generated < total_duration {
            let mut clip = self
                .rng
                .gen_range(self.config.clip_min_seconds..=self.config.clip_max_seconds);

            // final clip lands exactly on the target
            let remaining = total_duration - generated;
            let is_final = remaining <= clip;
            if is_final {
                clip = remaining;
            }

            let keyword = keywords.pop_front();
            let start = find_best_timestamp(
                segments,
                keyword.as_deref(),
                cursor,
                self.config.min_match_chars,
                self.config.fallback_jump_seconds,
            );
            debug!("✂️  Clip {}: {:.2}s at {:.2}s (keyword: {:?})",
                   schedule.len(), clip, start, keyword);

            schedule.push(ExcerptInstruction { start, duration: clip });
            cursor = start + clip;
            generated += clip;

            if is_final {
                break;
            }
        }

        Ok(schedule)
    }
}

fn validate_target(total_duration: f64) -> Result<()> {
    if total_duration.is_finite() && total_duration > 0.0 {
        Ok(())
    } else {
        Err(SchedulerError::InvalidDuration(format!(
            "target duration must be a positive number of seconds, got {}",
            total_duration
        )))
    }
}

/// Turns a source video and a script into an excerpt schedule
pub struct ClipScheduler<L: ModelLoader, R: Rng = StdRng> {
    provider: TranscriptProvider<L>,
    extractor: KeywordExtractor,
    packer: ClipPacker<R>,
}

impl<L: ModelLoader, R: Rng> ClipScheduler<L, R> {
    pub fn new(provider: TranscriptProvider<L>, packer: ClipPacker<R>) -> Self {
        let extractor = KeywordExtractor::from_config(packer.config());
        Self {
            provider,
            extractor,
            packer,
        }
    }

    pub fn provider(&self) -> &TranscriptProvider<L> {
        &self.provider
    }

    /// Transcribe (or load) the source, extract keywords and pack cuts
    pub async fn schedule(
        &mut self,
        video_path: &Path,
        total_duration: f64,
        script: &ScriptText,
    ) -> Result<Vec<ExcerptInstruction>> {
        validate_target(total_duration)?;

        let segments = self.provider.get_transcript(video_path).await?;
        let mut keywords = self.extractor.extract(script);
        let keyword_count = keywords.len();

        let schedule = self.packer.pack(&segments, &mut keywords, total_duration)?;

        info!("🧠 Scheduled {} clips for {:.2}s from {} ({} keywords, {} transcript segments)",
              schedule.len(), total_duration, video_path.display(), keyword_count, segments.len());
        Ok(schedule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transcript() -> Vec<TranscriptSegment> {
        vec![
            TranscriptSegment::new(0.0, 2.0, "intro"),
            TranscriptSegment::new(2.0, 5.0, "photosynthesis happens here"),
            TranscriptSegment::new(5.0, 9.0, "outro"),
        ]
    }

    fn queue(words: &[&str]) -> VecDeque<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn total(schedule: &[ExcerptInstruction]) -> f64 {
        schedule.iter().map(|i| i.duration).sum()
    }

    #[test]
    fn test_durations_sum_to_target() {
        for seed in 0..50 {
            let mut packer = ClipPacker::seeded(SchedulerConfig::default(), seed).unwrap();
            for target in [0.5, 2.0, 6.0, 17.3, 42.0, 61.25] {
                let schedule = packer.pack(&transcript(), &mut VecDeque::new(), target).unwrap();
                assert_eq!(total(&schedule), target, "seed {} target {}", seed, target);

                let (last, rest) = schedule.split_last().unwrap();
                assert!(last.duration > 0.0);
                assert!(last.duration <= target - total(rest), "seed {} target {}", seed, target);
            }
        }
    }

    #[test]
    fn test_every_clip_positive_and_bounded() {
        let config = SchedulerConfig::default();
        let mut packer = ClipPacker::seeded(config.clone(), 7).unwrap();
        let schedule = packer.pack(&transcript(), &mut VecDeque::new(), 30.0).unwrap();

        let (last, rest) = schedule.split_last().unwrap();
        assert!(last.duration > 0.0 && last.duration <= config.clip_max_seconds);
        for clip in rest {
            assert!(clip.duration >= config.clip_min_seconds);
            assert!(clip.duration <= config.clip_max_seconds);
        }
    }

    #[test]
    fn test_cursor_is_monotonic() {
        let mut packer = ClipPacker::seeded(SchedulerConfig::default(), 3).unwrap();
        let mut keywords = queue(&["photosynthesis", "outro", "intro", "missing"]);
        let schedule = packer.pack(&transcript(), &mut keywords, 25.0).unwrap();

        for pair in schedule.windows(2) {
            assert!(pair[1].start >= pair[0].end());
        }
    }

    #[test]
    fn test_keyword_queue_drains_one_per_clip() {
        for (queued, target) in [(2usize, 30.0), (20, 6.0), (0, 10.0)] {
            let mut keywords: VecDeque<String> = (0..queued).map(|i| format!("keyword{}", i)).collect();
            let mut packer = ClipPacker::seeded(SchedulerConfig::default(), 11).unwrap();
            let schedule = packer.pack(&transcript(), &mut keywords, target).unwrap();

            assert_eq!(keywords.len(), queued.saturating_sub(schedule.len()));
        }
    }

    #[test]
    fn test_unmatched_keyword_is_not_retried() {
        let mut packer = ClipPacker::seeded(SchedulerConfig::default(), 5).unwrap();
        let mut keywords = queue(&["glucose", "photosynthesis"]);
        let schedule = packer.pack(&transcript(), &mut keywords, 6.0).unwrap();

        // "glucose" misses: fallback from 0.0. "photosynthesis" then searches
        // from 4.0 + first duration, past the only matching segment.
        assert_eq!(schedule[0].start, 4.0);
        assert_eq!(schedule[1].start, schedule[0].end() + 4.0);
    }

    #[test]
    fn test_photosynthesis_scenario() {
        let mut packer = ClipPacker::seeded(SchedulerConfig::default(), 42).unwrap();
        let mut keywords = queue(&["photosynthesis"]);
        let schedule = packer.pack(&transcript(), &mut keywords, 6.0).unwrap();

        assert!(schedule.len() >= 2);
        assert_eq!(schedule[0].start, 2.0);
        for pair in schedule.windows(2) {
            assert_eq!(pair[1].start, pair[0].end() + 4.0);
        }
        assert_eq!(total(&schedule), 6.0);
        assert!(keywords.is_empty());
    }

    #[test]
    fn test_same_seed_same_schedule() {
        let mut a = ClipPacker::seeded(SchedulerConfig::default(), 99).unwrap();
        let mut b = ClipPacker::seeded(SchedulerConfig::default(), 99).unwrap();

        let first = a.pack(&transcript(), &mut queue(&["photosynthesis"]), 20.0).unwrap();
        let second = b.pack(&transcript(), &mut queue(&["photosynthesis"]), 20.0).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_fixed_clip_length() {
        let config = SchedulerConfig {
            clip_min_seconds: 2.5,
            clip_max_seconds: 2.5,
            ..SchedulerConfig::default()
        };
        let mut packer = ClipPacker::seeded(config, 0).unwrap();
        let schedule = packer.pack(&[], &mut VecDeque::new(), 6.0).unwrap();

        let durations: Vec<f64> = schedule.iter().map(|i| i.duration).collect();
        assert_eq!(durations, vec![2.5, 2.5, 1.0]);
        let starts: Vec<f64> = schedule.iter().map(|i| i.start).collect();
        assert_eq!(starts, vec![4.0, 10.5, 17.0]);
    }

    #[test]
    fn test_invalid_targets_rejected() {
        let mut packer = ClipPacker::seeded(SchedulerConfig::default(), 1).unwrap();
        for target in [0.0, -3.0, f64::NAN, f64::INFINITY] {
            let err = packer.pack(&transcript(), &mut VecDeque::new(), target).unwrap_err();
            assert!(matches!(err, SchedulerError::InvalidDuration(_)));
        }
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = SchedulerConfig {
            clip_min_seconds: 0.0,
            ..SchedulerConfig::default()
        };
        assert!(matches!(ClipPacker::seeded(config, 1), Err(SchedulerError::Config(_))));
    }
}
