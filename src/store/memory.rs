use crate::core::cache::{Cache, CachePolicy};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::debug;

struct Entry<V> {
    value: V,
    expires_at: Option<Instant>,
}

impl<V> Entry<V> {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| at <= Instant::now())
    }
}

/// Process-local cache whose entries expire according to a [`CachePolicy`].
pub struct MemoryCache<K, V> {
    policy: CachePolicy,
    inner: Arc<Mutex<HashMap<K, Entry<V>>>>,
}

impl<K, V> MemoryCache<K, V>
where
    K: Eq + Hash,
{
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            policy,
            inner: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<K, V> Default for MemoryCache<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new(CachePolicy::default())
    }
}

#[async_trait]
impl<K, V> Cache<K, V> for MemoryCache<K, V>
where
    K: Eq + Hash + Send + Sync + Debug + 'static,
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.inner.lock().await;
        if entries.get(key).is_some_and(Entry::is_expired) {
            debug!("Cache entry expired for key: {:?}", key);
            entries.remove(key);
            return None;
        }

        let value = entries.get(key).map(|entry| entry.value.clone());
        if value.is_some() {
            debug!("Cache HIT for key: {:?}", key);
        } else {
            debug!("Cache MISS for key: {:?}", key);
        }
        value
    }

    async fn put(&self, key: K, value: V) {
        let expires_at = self.policy.ttl.map(|ttl| Instant::now() + ttl);
        debug!("Cache PUT for key: {:?}", key);
        self.inner
            .lock()
            .await
            .insert(key, Entry { value, expires_at });
    }

    async fn invalidate(&self, key: &K) {
        debug!("Cache INVALIDATE for key: {:?}", key);
        self.inner.lock().await.remove(key);
    }

    async fn invalidate_all(&self) {
        debug!("Cache INVALIDATE ALL");
        self.inner.lock().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::sleep;

    #[tokio::test]
    async fn test_get_put_without_ttl() {
        let cache = MemoryCache::<String, i32>::default();

        assert!(cache.get(&"actuals".to_string()).await.is_none());

        cache.put("actuals".to_string(), 7).await;
        assert_eq!(cache.get(&"actuals".to_string()).await, Some(7));
        assert!(cache.get(&"budget".to_string()).await.is_none());
    }

    #[tokio::test]
    async fn test_entries_expire_after_ttl() {
        let cache = MemoryCache::<String, i32>::new(CachePolicy {
            ttl: Some(Duration::from_millis(10)),
        });

        cache.put("fx".to_string(), 1).await;
        assert_eq!(cache.get(&"fx".to_string()).await, Some(1));

        sleep(Duration::from_millis(25)).await;
        assert!(cache.get(&"fx".to_string()).await.is_none());
    }

    #[tokio::test]
    async fn test_invalidate() {
        let cache = MemoryCache::<String, i32>::default();
        cache.put("a".to_string(), 1).await;
        cache.put("b".to_string(), 2).await;

        cache.invalidate(&"a".to_string()).await;
        assert!(cache.get(&"a".to_string()).await.is_none());
        assert_eq!(cache.get(&"b".to_string()).await, Some(2));

        cache.invalidate_all().await;
        assert!(cache.get(&"b".to_string()).await.is_none());
    }
}
