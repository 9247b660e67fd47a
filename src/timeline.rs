use serde::{Deserialize, Serialize};

use crate::error::{Result, SchedulerError};

/// A synthesized voice track placed on the output timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceCue {
    pub name: String,
    pub start: f64,
    pub duration: f64,
}

/// Back-to-back voice tracks followed by a fixed outro.
///
/// The schedule target is `total_duration()`: the end of the last voice
/// track plus the outro.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceTimeline {
    pub cues: Vec<VoiceCue>,
    pub outro_start: f64,
    pub outro_duration: f64,
}

impl VoiceTimeline {
    pub fn from_tracks<S: AsRef<str>>(tracks: &[(S, f64)], outro_duration: f64) -> Result<Self> {
        check_seconds("outro", outro_duration)?;

        let mut cues = Vec::with_capacity(tracks.len());
        let mut cursor = 0.0;
        for (name, duration) in tracks {
            check_seconds(name.as_ref(), *duration)?;
            cues.push(VoiceCue {
                name: name.as_ref().to_string(),
                start: cursor,
                duration: *duration,
            });
            cursor += duration;
        }

        Ok(Self {
            cues,
            outro_start: cursor,
            outro_duration,
        })
    }

    pub fn total_duration(&self) -> f64 {
        self.outro_start + self.outro_duration
    }

    pub fn cue(&self, name: &str) -> Option<&VoiceCue> {
        self.cues.iter().find(|cue| cue.name == name)
    }
}

fn check_seconds(name: &str, seconds: f64) -> Result<()> {
    if seconds.is_finite() && seconds >= 0.0 {
        Ok(())
    } else {
        Err(SchedulerError::InvalidDuration(format!("{}: {}", name, seconds)))
    }
}

/// Parse `name=seconds` pairs
pub fn parse_track(pair: &str) -> Result<(String, f64)> {
    let (name, seconds) = pair
        .split_once('=')
        .ok_or_else(|| SchedulerError::InvalidDuration(format!("expected name=seconds, got {:?}", pair)))?;
    let seconds: f64 = seconds
        .trim()
        .parse()
        .map_err(|_| SchedulerError::InvalidDuration(format!("{}: not a number", pair)))?;
    Ok((name.trim().to_string(), seconds))
}
