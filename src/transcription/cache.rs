/// On-disk transcript cache, one JSON file per source video
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::TranscriptSegment;
use crate::error::{Result, SchedulerError};

/// Cached transcript for a source video
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedTranscript {
    /// Base file name of the source video
    pub video_file: String,
    /// Model that produced the transcript
    pub model: String,
    /// When the transcript was written
    pub created_at: DateTime<Utc>,
    /// Number of segments
    pub segment_count: usize,
    /// Ordered transcript segments
    pub segments: Vec<TranscriptSegment>,
}

/// Manages transcript cache files
#[derive(Debug, Clone)]
pub struct TranscriptCache {
    /// Cache directory path
    cache_dir: PathBuf,
}

impl TranscriptCache {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Initialize cache directory
    pub async fn initialize(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.cache_dir).await?;
        debug!("📁 Transcript cache directory ready: {}", self.cache_dir.display());
        Ok(())
    }

    /// Cache key: the video's base file name
    pub fn cache_key(video_path: &Path) -> String {
        video_path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| video_path.to_string_lossy().to_string())
    }

    /// Cache file location for a video
    pub fn cache_path(&self, video_path: &Path) -> PathBuf {
        self.cache_dir.join(format!("{}.json", Self::cache_key(video_path)))
    }

    /// Load the cached transcript for a video.
    ///
    /// `Ok(None)` is a plain miss; an existing file that cannot be read or
    /// parsed is reported as `SchedulerError::CacheRead`.
    pub async fn load(&self, video_path: &Path) -> Result<Option<CachedTranscript>> {
        let cache_path = self.cache_path(video_path);

        let content = match tokio::fs::read_to_string(&cache_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Cache miss: no file found at {}", cache_path.display());
                return Ok(None);
            }
            Err(e) => {
                return Err(SchedulerError::CacheRead {
                    path: cache_path,
                    reason: e.to_string(),
                })
            }
        };

        match serde_json::from_str::<CachedTranscript>(&content) {
            Ok(cached) => {
                info!("⚡ Using cached transcript: {} ({} segments)",
                      cached.video_file, cached.segments.len());
                Ok(Some(cached))
            }
            Err(e) => Err(SchedulerError::CacheRead {
                path: cache_path,
                reason: e.to_string(),
            }),
        }
    }

    /// Persist a transcript. The file appears atomically or not at all.
    pub async fn save(
        &self,
        video_path: &Path,
        model: &str,
        segments: &[TranscriptSegment],
    ) -> Result<PathBuf> {
        self.initialize().await?;

        let cached = CachedTranscript {
            video_file: Self::cache_key(video_path),
            model: model.to_string(),
            created_at: Utc::now(),
            segment_count: segments.len(),
            segments: segments.to_vec(),
        };
        let json_content = serde_json::to_string_pretty(&cached)?;

        let cache_dir = self.cache_dir.clone();
        let cache_path = self.cache_path(video_path);
        let target = cache_path.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let mut tmp = tempfile::NamedTempFile::new_in(&cache_dir)?;
            tmp.write_all(json_content.as_bytes())?;
            tmp.flush()?;
            tmp.persist(&target).map_err(|e| SchedulerError::Io(e.error))?;
            Ok(())
        })
        .await
        .map_err(|e| SchedulerError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))??;

        info!("💾 Saved {} segments to cache: {}", cached.segment_count, cache_path.display());
        Ok(cache_path)
    }

    /// Remove the cache entry for a video
    pub async fn invalidate(&self, video_path: &Path) -> Result<bool> {
        let cache_path = self.cache_path(video_path);

        match tokio::fs::remove_file(&cache_path).await {
            Ok(()) => {
                info!("🗑️ Invalidated cached transcript: {}", cache_path.display());
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Cache file not found: {}", cache_path.display());
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Remove every cached transcript
    pub async fn clear(&self) -> Result<usize> {
        let mut cleared_count = 0;

        for path in self.cache_files().await? {
            if tokio::fs::remove_file(&path).await.is_ok() {
                cleared_count += 1;
                debug!("🗑️ Removed cache file: {}", path.display());
            }
        }

        if cleared_count > 0 {
            info!("🧹 Cleared {} cache files", cleared_count);
        }
        Ok(cleared_count)
    }

    /// List cached transcripts, newest first
    pub async fn list(&self) -> Result<Vec<CachedTranscriptInfo>> {
        let mut listing = Vec::new();

        for path in self.cache_files().await? {
            match Self::read_file(&path).await {
                Some(cached) => listing.push(CachedTranscriptInfo {
                    video_file: cached.video_file,
                    model: cached.model,
                    segment_count: cached.segments.len(),
                    created_at: cached.created_at,
                    path,
                }),
                None => warn!("Unreadable cache file: {}", path.display()),
            }
        }

        listing.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(listing)
    }

    /// Get cache statistics
    pub async fn stats(&self) -> Result<CacheStats> {
        let mut stats = CacheStats::default();

        for path in self.cache_files().await? {
            stats.total_files += 1;
            match Self::read_file(&path).await {
                Some(cached) => {
                    stats.readable_files += 1;
                    stats.total_segments += cached.segments.len();
                }
                None => stats.corrupt_files += 1,
            }
        }

        Ok(stats)
    }

    async fn read_file(path: &Path) -> Option<CachedTranscript> {
        let content = tokio::fs::read_to_string(path).await.ok()?;
        serde_json::from_str(&content).ok()
    }

    async fn cache_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let mut entries = match tokio::fs::read_dir(&self.cache_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(files),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().map_or(false, |ext| ext == "json") {
                files.push(path);
            }
        }
        Ok(files)
    }
}

/// Cache statistics
#[derive(Debug, Default)]
pub struct CacheStats {
    pub total_files: usize,
    pub readable_files: usize,
    pub corrupt_files: usize,
    pub total_segments: usize,
}

/// Information about a cached transcript
#[derive(Debug, Clone)]
pub struct CachedTranscriptInfo {
    pub video_file: String,
    pub model: String,
    pub segment_count: usize,
    pub created_at: DateTime<Utc>,
    pub path: PathBuf,
}
