//! Get-or-create identity caches.
//!
//! The dispatcher keeps one cache per natural identity (file path, host
//! name, task uuid) so each entity is created against the record service at
//! most once per run. Caches never evict; they are bounded by the run's
//! lifetime and dropped with the dispatcher.

use std::collections::HashMap;
use std::future::Future;

use crate::domain::errors::RecordResult;

/// A string-keyed read-through cache over an idempotent remote upsert.
///
/// Creation is only ever invoked from the dispatch path, never from pooled
/// workers, so a plain map is enough; there is no create-time race to
/// guard against.
#[derive(Debug, Default)]
pub struct IdentityCache<V> {
    entries: HashMap<String, V>,
}

impl<V: Clone> IdentityCache<V> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Look up a cached record without creating one.
    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.get(key)
    }

    /// Mutable access to a cached record, for in-place status updates.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        self.entries.get_mut(key)
    }

    /// Return the cached record for `key`, or run `build` once, cache its
    /// result and return it. Builder failures propagate and nothing is
    /// cached, so the next reference retries the upsert.
    pub async fn get_or_create<F, Fut>(&mut self, key: &str, build: F) -> RecordResult<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = RecordResult<V>>,
    {
        if let Some(value) = self.entries.get(key) {
            return Ok(value.clone());
        }
        let value = build().await?;
        self.entries.insert(key.to_string(), value.clone());
        Ok(value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over cached records.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::RecordError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn builder_runs_at_most_once_per_key() {
        let mut cache: IdentityCache<String> = IdentityCache::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value = cache
                .get_or_create("hosts/web1", || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok("record".to_string())
                })
                .await
                .unwrap();
            assert_eq!(value, "record");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn builder_failure_is_not_cached() {
        let mut cache: IdentityCache<String> = IdentityCache::new();

        let failed = cache
            .get_or_create("files/site.yml", || async {
                Err(RecordError::Http("connection refused".to_string()))
            })
            .await;
        assert!(failed.is_err());
        assert!(cache.is_empty());

        let value = cache
            .get_or_create("files/site.yml", || async { Ok("record".to_string()) })
            .await
            .unwrap();
        assert_eq!(value, "record");
    }
}
