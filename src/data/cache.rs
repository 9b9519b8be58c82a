//! Deduplicating document cache.
//!
//! Each URL gets one `OnceCell`. Concurrent callers for the same URL await
//! the same initialization instead of issuing duplicate fetches; once a value
//! is stored it stays until `invalidate` or `clear`. Failed fetches leave the
//! cell empty so the next caller tries again.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::{debug, trace};

use crate::data::source::DataSource;
use crate::error::DataLoadError;

type Slot = Arc<OnceCell<Arc<Value>>>;

#[derive(Default)]
pub struct FetchCache {
    slots: Mutex<HashMap<String, Slot>>,
}

impl FetchCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, url: &str) -> Slot {
        let mut slots = self.slots.lock();
        Arc::clone(slots.entry(url.to_string()).or_default())
    }

    /// Fetches and parses `url`, sharing in-flight and completed requests.
    pub async fn get_json<S: DataSource>(
        &self,
        source: &S,
        url: &str,
    ) -> Result<Arc<Value>, DataLoadError> {
        let slot = self.slot(url);
        if let Some(value) = slot.get() {
            trace!(url, "Document cache hit");
            return Ok(Arc::clone(value));
        }

        let value = slot
            .get_or_try_init(|| async {
                debug!(url, "Fetching document");
                let bytes = source.fetch(url).await?;
                let value: Value =
                    serde_json::from_slice(&bytes).map_err(|e| DataLoadError::Parse {
                        url: url.to_string(),
                        source: e,
                    })?;
                Ok::<_, DataLoadError>(Arc::new(value))
            })
            .await?;
        Ok(Arc::clone(value))
    }

    pub fn is_cached(&self, url: &str) -> bool {
        self.slots
            .lock()
            .get(url)
            .is_some_and(|slot| slot.initialized())
    }

    pub fn invalidate(&self, url: &str) -> bool {
        self.slots.lock().remove(url).is_some()
    }

    pub fn clear(&self) {
        let mut slots = self.slots.lock();
        debug!(entries = slots.len(), "Clearing document cache");
        slots.clear();
    }

    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .values()
            .filter(|slot| slot.initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingSource {
        body: &'static str,
        fetches: AtomicUsize,
        fail_first: bool,
    }

    impl CountingSource {
        fn new(body: &'static str) -> Self {
            Self {
                body,
                fetches: AtomicUsize::new(0),
                fail_first: false,
            }
        }

        fn count(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    impl DataSource for CountingSource {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>, DataLoadError> {
            let n = self.fetches.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(100)).await;
            if self.fail_first && n == 0 {
                return Err(DataLoadError::Status {
                    url: url.to_string(),
                    status: 503,
                });
            }
            Ok(self.body.as_bytes().to_vec())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_share_one_fetch() {
        let cache = FetchCache::new();
        let source = CountingSource::new(r#"{"a": 1}"#);

        let (a, b, c) = tokio::join!(
            cache.get_json(&source, "g.json"),
            cache.get_json(&source, "g.json"),
            cache.get_json(&source, "g.json"),
        );
        assert_eq!(source.count(), 1);
        assert!(Arc::ptr_eq(&a.unwrap(), &b.unwrap()));
        assert_eq!(c.unwrap()["a"], 1);

        // Resolved values stay cached.
        cache.get_json(&source, "g.json").await.unwrap();
        assert_eq!(source.count(), 1);
        assert!(cache.is_cached("g.json"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_forces_refetch() {
        let cache = FetchCache::new();
        let source = CountingSource::new("[]");
        cache.get_json(&source, "m.json").await.unwrap();
        assert!(cache.invalidate("m.json"));
        cache.get_json(&source, "m.json").await.unwrap();
        assert_eq!(source.count(), 2);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_are_not_cached() {
        let cache = FetchCache::new();
        let mut source = CountingSource::new("{}");
        source.fail_first = true;

        let err = cache.get_json(&source, "g.json").await.unwrap_err();
        assert!(matches!(err, DataLoadError::Status { status: 503, .. }));
        assert!(!cache.is_cached("g.json"));

        cache.get_json(&source, "g.json").await.unwrap();
        assert_eq!(source.count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_parse_errors_surface() {
        let cache = FetchCache::new();
        let source = CountingSource::new("{not json");
        let err = cache.get_json(&source, "g.json").await.unwrap_err();
        assert!(matches!(err, DataLoadError::Parse { .. }));
    }
}
