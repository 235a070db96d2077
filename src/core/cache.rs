//! Caching abstractions used by the dataset loader

use async_trait::async_trait;
use std::time::Duration;

/// How long cached entries stay valid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CachePolicy {
    /// `None` keeps entries until they are invalidated.
    pub ttl: Option<Duration>,
}

impl CachePolicy {
    pub fn with_ttl_secs(secs: Option<u64>) -> Self {
        CachePolicy {
            ttl: secs.map(Duration::from_secs),
        }
    }
}

#[async_trait]
pub trait Cache<K, V>: Send + Sync {
    async fn get(&self, key: &K) -> Option<V>;

    /// Stores a value under the cache's policy.
    async fn put(&self, key: K, value: V);

    async fn invalidate(&self, key: &K);

    async fn invalidate_all(&self);
}
