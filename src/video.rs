use std::path::Path;
use tracing::{info, warn};

use crate::error::{Result, SchedulerError};
use crate::scheduler::ExcerptInstruction;

/// Source video duration in seconds, measured with ffprobe
pub async fn probe_duration(video_path: &Path) -> Result<f64> {
    let output = tokio::process::Command::new("ffprobe")
        .args(["-v", "quiet", "-print_format", "json", "-show_format"])
        .arg(video_path)
        .output()
        .await
        .map_err(|e| SchedulerError::Probe(format!("Failed to run ffprobe: {}", e)))?;

    if !output.status.success() {
        return Err(SchedulerError::Probe(format!(
            "ffprobe failed for {}",
            video_path.display()
        )));
    }

    let json_str = String::from_utf8_lossy(&output.stdout);
    let duration = parse_probe_duration(&json_str)?;

    info!("📹 Source video: {} ({:.1}s)", video_path.display(), duration);
    Ok(duration)
}

fn parse_probe_duration(json: &str) -> Result<f64> {
    let ffprobe_data: serde_json::Value = serde_json::from_str(json)
        .map_err(|e| SchedulerError::Probe(format!("Unreadable ffprobe output: {}", e)))?;

    ffprobe_data["format"]["duration"]
        .as_str()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| SchedulerError::Probe("ffprobe reported no duration".to_string()))
}

/// Indices of cuts that end past the source video's end.
///
/// The schedule itself is left untouched; how to treat these cuts (clamp,
/// loop, reject) is up to whoever executes them.
pub fn find_overruns(schedule: &[ExcerptInstruction], source_duration: f64) -> Vec<usize> {
    let overruns: Vec<usize> = schedule
        .iter()
        .enumerate()
        .filter(|(_, cut)| cut.end() > source_duration)
        .map(|(index, _)| index)
        .collect();

    if !overruns.is_empty() {
        warn!("⚠️  {} of {} cuts run past the {:.1}s source",
              overruns.len(), schedule.len(), source_duration);
    }
    overruns
}
