use std::path::Path;
use tracing::{debug, info, warn};

use super::{ModelLoader, TranscriptCache, TranscriptSegment};
use crate::config::CorruptCachePolicy;
use crate::error::{Result, SchedulerError};

/// Returns transcripts for source videos, transcribing each distinct file at
/// most once and reusing the cached result across runs.
///
/// Concurrent cache misses for the same video are not serialized here: both
/// callers transcribe and the last atomic write wins.
pub struct TranscriptProvider<L: ModelLoader> {
    cache: TranscriptCache,
    loader: L,
    corrupt_policy: CorruptCachePolicy,
}

impl<L: ModelLoader> TranscriptProvider<L> {
    /// Create a provider, creating the cache directory if absent
    pub async fn new(cache: TranscriptCache, loader: L) -> Result<Self> {
        cache.initialize().await?;
        Ok(Self {
            cache,
            loader,
            corrupt_policy: CorruptCachePolicy::Retranscribe,
        })
    }

    pub fn with_corrupt_policy(mut self, policy: CorruptCachePolicy) -> Self {
        self.corrupt_policy = policy;
        self
    }

    pub fn cache(&self) -> &TranscriptCache {
        &self.cache
    }

    /// Cached transcript on hit, fresh transcription on miss
    pub async fn get_transcript(&self, video_path: &Path) -> Result<Vec<TranscriptSegment>> {
        match self.cache.load(video_path).await {
            Ok(Some(cached)) => return Ok(cached.segments),
            Ok(None) => {}
            Err(SchedulerError::CacheRead { path, reason })
                if self.corrupt_policy == CorruptCachePolicy::Retranscribe =>
            {
                warn!("⚠️  Discarding unreadable cache {}: {}", path.display(), reason);
            }
            Err(e) => return Err(e),
        }

        let (model_name, segments) = self.transcribe(video_path).await?;
        self.cache.save(video_path, &model_name, &segments).await?;
        Ok(segments)
    }

    /// Acquire a model, run it once, release it
    async fn transcribe(&self, video_path: &Path) -> Result<(String, Vec<TranscriptSegment>)> {
        let mut model = self.loader.load().await?;
        let model_name = model.name().to_string();

        let result = model.transcribe(video_path).await;
        drop(model);
        debug!("Released transcription model {}", model_name);

        let segments = result?;
        info!("🎙️ Fresh transcript for {}: {} segments", video_path.display(), segments.len());
        Ok((model_name, segments))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcription::TranscriptionModel;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    #[derive(Clone, Default)]
    struct Counters {
        loads: Arc<AtomicUsize>,
        runs: Arc<AtomicUsize>,
        releases: Arc<AtomicUsize>,
    }

    struct MockLoader {
        counters: Counters,
        fail: bool,
    }

    struct MockModel {
        counters: Counters,
        fail: bool,
    }

    impl Drop for MockModel {
        fn drop(&mut self) {
            self.counters.releases.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl TranscriptionModel for MockModel {
        async fn transcribe(&mut self, _video_path: &Path) -> Result<Vec<TranscriptSegment>> {
            self.counters.runs.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(SchedulerError::Transcription("corrupt stream".to_string()));
            }
            Ok(vec![
                TranscriptSegment::new(0.0, 2.0, "intro"),
                TranscriptSegment::new(2.0, 5.0, "photosynthesis happens here"),
            ])
        }

        fn name(&self) -> &str {
            "mock"
        }
    }

    #[async_trait]
    impl ModelLoader for MockLoader {
        async fn load(&self) -> Result<Box<dyn TranscriptionModel>> {
            self.counters.loads.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(MockModel {
                counters: self.counters.clone(),
                fail: self.fail,
            }))
        }
    }

    async fn provider(dir: &Path, fail: bool) -> (TranscriptProvider<MockLoader>, Counters) {
        let counters = Counters::default();
        let loader = MockLoader { counters: counters.clone(), fail };
        let provider = TranscriptProvider::new(TranscriptCache::new(dir.join("cache")), loader)
            .await
            .unwrap();
        (provider, counters)
    }

    #[tokio::test]
    async fn test_creates_cache_dir() {
        let temp_dir = TempDir::new().unwrap();
        let _ = provider(temp_dir.path(), false).await;
        assert!(temp_dir.path().join("cache").is_dir());
    }

    #[tokio::test]
    async fn test_second_call_hits_cache() {
        let temp_dir = TempDir::new().unwrap();
        let (provider, counters) = provider(temp_dir.path(), false).await;
        let video = Path::new("/videos/biology.mp4");

        let first = provider.get_transcript(video).await.unwrap();
        let second = provider.get_transcript(video).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(counters.loads.load(Ordering::SeqCst), 1);
        assert_eq!(counters.runs.load(Ordering::SeqCst), 1);
        assert_eq!(counters.releases.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failure_writes_nothing_and_can_retry() {
        let temp_dir = TempDir::new().unwrap();
        let (failing, counters) = provider(temp_dir.path(), true).await;
        let video = Path::new("corrupt.mp4");

        let err = failing.get_transcript(video).await.unwrap_err();
        assert!(matches!(err, SchedulerError::Transcription(_)));
        assert!(!failing.cache().cache_path(video).exists());
        assert_eq!(counters.releases.load(Ordering::SeqCst), 1);

        let (working, _) = provider(temp_dir.path(), false).await;
        assert_eq!(working.get_transcript(video).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_corrupt_cache_retranscribes_by_default() {
        let temp_dir = TempDir::new().unwrap();
        let (provider, counters) = provider(temp_dir.path(), false).await;
        let video = Path::new("garbled.mp4");
        tokio::fs::write(provider.cache().cache_path(video), "[{").await.unwrap();

        let segments = provider.get_transcript(video).await.unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(counters.runs.load(Ordering::SeqCst), 1);
        assert!(provider.cache().load(video).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_corrupt_cache_fails_under_fail_policy() {
        let temp_dir = TempDir::new().unwrap();
        let (provider, counters) = provider(temp_dir.path(), false).await;
        let provider = provider.with_corrupt_policy(CorruptCachePolicy::Fail);
        let video = Path::new("garbled.mp4");
        tokio::fs::write(provider.cache().cache_path(video), "[{").await.unwrap();

        let err = provider.get_transcript(video).await.unwrap_err();
        assert!(matches!(err, SchedulerError::CacheRead { .. }));
        assert_eq!(counters.loads.load(Ordering::SeqCst), 0);
    }
}
