//! Dataset loading with memoization.

use super::tables::{parse_cash, parse_fx, parse_ledger};
use crate::core::cache::Cache;
use crate::core::model::Dataset;
use crate::core::source::{Table, TableSource};
use anyhow::Result;
use std::sync::Arc;
use tracing::debug;

/// Fetches all four tables concurrently and parses them into a [`Dataset`].
///
/// `on_table` is called once per table as it finishes downloading.
pub async fn load_dataset(
    source: &dyn TableSource,
    on_table: &(dyn Fn(Table) + Sync),
) -> Result<Dataset> {
    let fetch = |table: Table| async move {
        let body = source.fetch_table(table).await;
        on_table(table);
        body
    };
    let (actuals, budget, cash, fx) = futures::join!(
        fetch(Table::Actuals),
        fetch(Table::Budget),
        fetch(Table::Cash),
        fetch(Table::Fx)
    );

    let actuals = parse_ledger(Table::Actuals, &actuals?)?;
    let budget = parse_ledger(Table::Budget, &budget?)?;
    let cash = parse_cash(&cash?)?;
    let fx = parse_fx(&fx?)?;

    debug!(
        "Loaded {} actuals, {} budget, {} cash and {} fx rows from {}",
        actuals.len(),
        budget.len(),
        cash.len(),
        fx.len(),
        source.location()
    );

    Ok(Dataset {
        actuals,
        budget,
        cash,
        fx,
    })
}

/// Memoizes datasets per source location. Expiry is decided by the injected cache;
/// [`CachingLoader::invalidate`] forces the next load to hit the source.
pub struct CachingLoader<S: TableSource> {
    source: S,
    cache: Arc<dyn Cache<String, Arc<Dataset>>>,
}

impl<S: TableSource> CachingLoader<S> {
    pub fn new(source: S, cache: Arc<dyn Cache<String, Arc<Dataset>>>) -> Self {
        Self { source, cache }
    }

    pub async fn load(&self) -> Result<Arc<Dataset>> {
        self.load_with_progress(&|_| ()).await
    }

    pub async fn load_with_progress(
        &self,
        on_table: &(dyn Fn(Table) + Sync),
    ) -> Result<Arc<Dataset>> {
        let key = self.source.location();
        if let Some(cached) = self.cache.get(&key).await {
            debug!("Using cached dataset for {}", key);
            return Ok(cached);
        }

        let dataset = Arc::new(load_dataset(&self.source, on_table).await?);
        self.cache.put(key, Arc::clone(&dataset)).await;
        Ok(dataset)
    }

    pub async fn invalidate(&self) {
        self.cache.invalidate(&self.source.location()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cache::CachePolicy;
    use crate::store::memory::MemoryCache;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockSource {
        tables: HashMap<Table, String>,
        calls: AtomicUsize,
    }

    impl MockSource {
        fn new() -> Self {
            let tables = HashMap::from([
                (
                    Table::Actuals,
                    "month,entity,account,currency,amount\n2025-06-01,A,Revenue,EUR,100\n"
                        .to_string(),
                ),
                (
                    Table::Budget,
                    "month,entity,account,currency,amount\n2025-06,A,Revenue,USD,90\n".to_string(),
                ),
                (Table::Cash, "month,cash_usd\n2025-06,1000\n".to_string()),
                (
                    Table::Fx,
                    "month,currency,rate_to_usd\n2025-06,EUR,1.1\n".to_string(),
                ),
            ]);
            Self {
                tables,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl TableSource for &MockSource {
        async fn fetch_table(&self, table: Table) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.tables
                .get(&table)
                .cloned()
                .ok_or_else(|| anyhow!("no {table} table"))
        }

        fn location(&self) -> String {
            "mock".to_string()
        }
    }

    #[tokio::test]
    async fn test_load_dataset_parses_all_tables() {
        let source = MockSource::new();
        let seen = Mutex::new(Vec::new());

        let dataset = load_dataset(&&source, &|t| seen.lock().unwrap().push(t))
            .await
            .unwrap();

        assert_eq!(dataset.actuals.len(), 1);
        assert_eq!(dataset.actuals[0].month, "2025-06");
        assert_eq!(dataset.budget[0].amount, 90.0);
        assert_eq!(dataset.cash[0].cash_usd, 1000.0);
        assert_eq!(dataset.fx[0].rate_to_usd, 1.1);
        assert_eq!(seen.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_missing_table_fails_load() {
        let mut source = MockSource::new();
        source.tables.remove(&Table::Cash);

        let err = load_dataset(&&source, &|_| ()).await.unwrap_err();
        assert_eq!(err.to_string(), "no cash table");
    }

    #[tokio::test]
    async fn test_loader_memoizes_until_invalidated() {
        let source = MockSource::new();
        let cache = Arc::new(MemoryCache::<String, Arc<Dataset>>::new(
            CachePolicy::default(),
        ));
        let loader = CachingLoader::new(&source, cache);

        let first = loader.load().await.unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 4);

        let second = loader.load().await.unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 4);
        assert!(Arc::ptr_eq(&first, &second));

        loader.invalidate().await;
        let third = loader.load().await.unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 8);
        assert_eq!(*first, *third);
    }

    #[tokio::test]
    async fn test_failed_load_is_not_cached() {
        let mut source = MockSource::new();
        source.tables.remove(&Table::Fx);
        let cache = Arc::new(MemoryCache::<String, Arc<Dataset>>::new(
            CachePolicy::default(),
        ));
        let loader = CachingLoader::new(&source, cache);

        assert!(loader.load().await.is_err());
        assert!(loader.load().await.is_err());
        assert_eq!(source.calls.load(Ordering::SeqCst), 8);
    }
}
