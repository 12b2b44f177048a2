//! In-memory completion cache.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

use super::{completion_key, CompletionCache, COMPLETED_VALUE};
use crate::errors::BridgeError;

/// Completion cache backed by a concurrent map.
///
/// Clones share the same storage, so one instance can back many sessions.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCompletionCache {
    entries: Arc<DashMap<String, String>>,
}

impl InMemoryCompletionCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored flags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the raw stored value for a storage key.
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|v| v.value().clone())
    }
}

#[async_trait]
impl CompletionCache for InMemoryCompletionCache {
    async fn has(&self, token_address: &str) -> Result<bool, BridgeError> {
        Ok(self
            .entries
            .get(&completion_key(token_address))
            .is_some_and(|v| v.value() == COMPLETED_VALUE))
    }

    async fn mark_complete(&self, token_address: &str) -> Result<(), BridgeError> {
        self.entries
            .insert(completion_key(token_address), COMPLETED_VALUE.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::join_all;

    #[tokio::test]
    async fn test_unknown_address_not_complete() {
        let cache = InMemoryCompletionCache::new();
        assert!(!cache.has("0xabc").await.unwrap());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_mark_complete_is_idempotent() {
        let cache = InMemoryCompletionCache::new();
        cache.mark_complete("0xabc").await.unwrap();
        let once = cache.raw("bridge-0xabc-completed");

        for _ in 0..4 {
            cache.mark_complete("0xabc").await.unwrap();
        }

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.raw("bridge-0xabc-completed"), once);
        assert_eq!(once.as_deref(), Some("true"));
        assert!(cache.has("0xabc").await.unwrap());
    }

    #[tokio::test]
    async fn test_concurrent_writes_across_clones() {
        let cache = InMemoryCompletionCache::new();
        let writes = (0..16).map(|_| {
            let cache = cache.clone();
            tokio::spawn(async move { cache.mark_complete("0xabc").await })
        });

        for result in join_all(writes).await {
            result.unwrap().unwrap();
        }
        assert_eq!(cache.len(), 1);
        assert!(cache.has("0xabc").await.unwrap());
    }
}
