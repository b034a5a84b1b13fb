use std::sync::Arc;

use chrono::{DateTime, Utc};
use contracts::shared::cache::CacheInfo;
use tokio::sync::{Mutex, RwLock};

use super::loader::TransactionLoader;
use super::source::{LoadError, TableSource};
use crate::domain::transaction::Transaction;

/// Сколько секунд загруженная таблица считается свежей
pub const CACHE_DURATION_SECS: i64 = 5 * 60;

struct CacheEntry {
    transactions: Arc<Vec<Transaction>>,
    loaded_at: DateTime<Utc>,
}

/// How the returned table was obtained. The caller inspects this instead of
/// relying on suppressed errors.
#[derive(Debug)]
pub enum RefreshStatus {
    /// Held data was still within the freshness window
    ServedFresh,
    /// A reload ran and replaced the held table
    Reloaded,
    /// A reload was due but failed; the previous table is served unchanged
    ReloadFailedServingStale(LoadError),
}

/// Result of a cache lookup: shared table snapshot + cache metadata
#[derive(Debug)]
pub struct CacheHit {
    pub transactions: Arc<Vec<Transaction>>,
    pub info: CacheInfo,
    pub status: RefreshStatus,
}

/// In-process cache over the loaded transaction table.
///
/// Owned by `main` and injected through axum state — no module-level
/// singleton, so tests can drive it with a controlled clock. Readers always
/// observe a complete table: the swap replaces an `Arc` snapshot under a
/// write lock, and the reload mutex keeps concurrent stale requests from
/// issuing duplicate loads (waiters re-check freshness after acquiring it).
pub struct DataCache {
    loader: TransactionLoader,
    ttl_seconds: i64,
    entry: RwLock<Option<CacheEntry>>,
    reload_guard: Mutex<()>,
}

impl DataCache {
    pub fn new(source: Arc<dyn TableSource>) -> Self {
        Self::with_ttl(source, CACHE_DURATION_SECS)
    }

    pub fn with_ttl(source: Arc<dyn TableSource>, ttl_seconds: i64) -> Self {
        Self {
            loader: TransactionLoader::new(source),
            ttl_seconds,
            entry: RwLock::new(None),
            reload_guard: Mutex::new(()),
        }
    }

    /// Serve the held table when fresh, otherwise reload.
    ///
    /// EMPTY -> load or fail; FRESH -> serve; STALE -> reload, and on reload
    /// failure fall back to the held table (never raises once data exists).
    pub async fn get_or_refresh(&self, now: DateTime<Utc>) -> Result<CacheHit, LoadError> {
        if let Some(hit) = self.fresh_hit(now).await {
            return Ok(hit);
        }

        let _guard = self.reload_guard.lock().await;

        // другой запрос мог перезагрузить таблицу, пока мы ждали мьютекс
        if let Some(hit) = self.fresh_hit(now).await {
            return Ok(hit);
        }

        match self.loader.load().await {
            Ok(transactions) => {
                let transactions = Arc::new(transactions);
                let records_count = transactions.len();
                *self.entry.write().await = Some(CacheEntry {
                    transactions: transactions.clone(),
                    loaded_at: now,
                });
                Ok(CacheHit {
                    transactions,
                    info: CacheInfo {
                        cached: false,
                        cache_timestamp: Some(now.to_rfc3339()),
                        records_count,
                        cache_age_seconds: Some(0.0),
                    },
                    status: RefreshStatus::Reloaded,
                })
            }
            Err(err) => {
                let entry = self.entry.read().await;
                match entry.as_ref() {
                    Some(held) => {
                        tracing::warn!(
                            "Failed to refresh data, serving cached table: {}",
                            err
                        );
                        Ok(CacheHit {
                            transactions: held.transactions.clone(),
                            info: entry_info(held, now, true),
                            status: RefreshStatus::ReloadFailedServingStale(err),
                        })
                    }
                    // первый запрос: отдать нечего
                    None => Err(err),
                }
            }
        }
    }

    /// Cache metadata without triggering a load (health endpoint)
    pub async fn info(&self, now: DateTime<Utc>) -> CacheInfo {
        let entry = self.entry.read().await;
        match entry.as_ref() {
            Some(held) => entry_info(held, now, true),
            None => CacheInfo::empty(),
        }
    }

    async fn fresh_hit(&self, now: DateTime<Utc>) -> Option<CacheHit> {
        let entry = self.entry.read().await;
        let held = entry.as_ref()?;
        if age_seconds(held.loaded_at, now) >= self.ttl_seconds as f64 {
            return None;
        }
        Some(CacheHit {
            transactions: held.transactions.clone(),
            info: entry_info(held, now, true),
            status: RefreshStatus::ServedFresh,
        })
    }
}

fn age_seconds(loaded_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    (now - loaded_at).num_milliseconds() as f64 / 1000.0
}

fn entry_info(entry: &CacheEntry, now: DateTime<Utc>, cached: bool) -> CacheInfo {
    CacheInfo {
        cached,
        cache_timestamp: Some(entry.loaded_at.to_rfc3339()),
        records_count: entry.transactions.len(),
        cache_age_seconds: Some(age_seconds(entry.loaded_at, now)),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::Duration;

    use super::super::loader::{ORDERS_SHEET, ORDER_ITEMS_SHEET, PRODUCTS_SHEET};
    use super::super::source::SheetTable;
    use super::*;

    /// Source double: one order with one line item, failure switchable
    struct FixtureSource {
        failing: AtomicBool,
        fetch_calls: AtomicUsize,
        delay_ms: AtomicU64,
    }

    impl FixtureSource {
        fn new() -> Self {
            Self {
                failing: AtomicBool::new(false),
                fetch_calls: AtomicUsize::new(0),
                delay_ms: AtomicU64::new(0),
            }
        }

        fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        fn set_delay_ms(&self, delay_ms: u64) {
            self.delay_ms.store(delay_ms, Ordering::SeqCst);
        }

        fn calls(&self) -> usize {
            self.fetch_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TableSource for FixtureSource {
        async fn fetch_table(&self, name: &str) -> Result<SheetTable, LoadError> {
            self.fetch_calls.fetch_add(1, Ordering::SeqCst);
            let delay_ms = self.delay_ms.load(Ordering::SeqCst);
            if delay_ms > 0 {
                tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;
            }
            if self.failing.load(Ordering::SeqCst) {
                return Err(LoadError::SourceUnavailable("fixture offline".to_string()));
            }

            let to_rows = |rows: Vec<Vec<&str>>| {
                rows.into_iter()
                    .map(|r| r.into_iter().map(|s| s.to_string()).collect())
                    .collect()
            };
            let table = match name {
                ORDERS_SHEET => SheetTable::new(
                    ["Order_ID", "Order_Date", "Channel", "Customer_Name", "Instagram", "Phone"]
                        .iter()
                        .map(|s| s.to_string())
                        .collect(),
                    to_rows(vec![vec!["O1", "2025-11-07", "Instagram", "A", "", ""]]),
                ),
                ORDER_ITEMS_SHEET => SheetTable::new(
                    [
                        "Order_ID",
                        "SKU",
                        "Shirt_Color",
                        "Size",
                        "Qty",
                        "Unit_Price_THB",
                        "Line_Subtotal",
                        "COGS_THB",
                        "Line_Profit",
                    ]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
                    to_rows(vec![vec![
                        "O1",
                        "WUUF-005-BK-M",
                        "Black",
                        "M",
                        "2",
                        "690",
                        "1380",
                        "690",
                        "690",
                    ]]),
                ),
                PRODUCTS_SHEET => SheetTable::new(
                    ["SKU", "Product_Name", "Dog_Breed"]
                        .iter()
                        .map(|s| s.to_string())
                        .collect(),
                    to_rows(vec![vec!["WUUF-005-BK-M", "Tee", "Dachshund"]]),
                ),
                other => {
                    return Err(LoadError::SourceUnavailable(format!(
                        "unknown worksheet '{other}'"
                    )))
                }
            };
            Ok(table)
        }
    }

    fn t0() -> DateTime<Utc> {
        "2025-11-10T10:00:00Z".parse().unwrap()
    }

    #[tokio::test]
    async fn test_empty_cache_loads_synchronously() {
        let source = Arc::new(FixtureSource::new());
        let cache = DataCache::new(source.clone());

        let hit = cache.get_or_refresh(t0()).await.unwrap();
        assert!(matches!(hit.status, RefreshStatus::Reloaded));
        assert!(!hit.info.cached);
        assert_eq!(hit.info.records_count, 1);
        assert_eq!(hit.transactions.len(), 1);
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test]
    async fn test_fresh_cache_serves_without_reload() {
        let source = Arc::new(FixtureSource::new());
        let cache = DataCache::new(source.clone());

        cache.get_or_refresh(t0()).await.unwrap();
        let hit = cache
            .get_or_refresh(t0() + Duration::seconds(120))
            .await
            .unwrap();

        assert!(matches!(hit.status, RefreshStatus::ServedFresh));
        assert!(hit.info.cached);
        assert_eq!(hit.info.cache_age_seconds, Some(120.0));
        // no second round of fetches
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test]
    async fn test_stale_cache_reloads() {
        let source = Arc::new(FixtureSource::new());
        let cache = DataCache::new(source.clone());

        cache.get_or_refresh(t0()).await.unwrap();
        let later = t0() + Duration::seconds(CACHE_DURATION_SECS + 1);
        let hit = cache.get_or_refresh(later).await.unwrap();

        assert!(matches!(hit.status, RefreshStatus::Reloaded));
        assert!(!hit.info.cached);
        assert_eq!(hit.info.cache_age_seconds, Some(0.0));
        assert_eq!(source.calls(), 6);
    }

    #[tokio::test]
    async fn test_concurrent_stale_requests_reload_once() {
        let source = Arc::new(FixtureSource::new());
        let cache = Arc::new(DataCache::new(source.clone()));

        cache.get_or_refresh(t0()).await.unwrap();
        assert_eq!(source.calls(), 3);

        // slow source so the overlapping requests pile up on the reload mutex
        source.set_delay_ms(50);
        let later = t0() + Duration::seconds(CACHE_DURATION_SECS + 1);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move { cache.get_or_refresh(later).await }));
        }

        let mut reloaded = 0;
        for handle in handles {
            let hit = handle.await.unwrap().unwrap();
            if matches!(hit.status, RefreshStatus::Reloaded) {
                reloaded += 1;
            }
            assert_eq!(hit.transactions.len(), 1);
        }

        // один запрос перезагружает таблицу, остальные ждут и получают её свежей
        assert_eq!(reloaded, 1);
        assert_eq!(source.calls(), 6);
    }

    #[tokio::test]
    async fn test_stale_fallback_on_reload_failure() {
        let source = Arc::new(FixtureSource::new());
        let cache = DataCache::new(source.clone());

        cache.get_or_refresh(t0()).await.unwrap();
        source.set_failing(true);

        let later = t0() + Duration::seconds(CACHE_DURATION_SECS + 60);
        let hit = cache.get_or_refresh(later).await.unwrap();

        assert!(matches!(
            hit.status,
            RefreshStatus::ReloadFailedServingStale(LoadError::SourceUnavailable(_))
        ));
        assert!(hit.info.cached);
        assert_eq!(hit.transactions.len(), 1);
        // held timestamp is kept, so the reported age reflects staleness
        assert!(hit.info.cache_age_seconds.unwrap() >= CACHE_DURATION_SECS as f64);
    }

    #[tokio::test]
    async fn test_empty_cache_propagates_failure() {
        let source = Arc::new(FixtureSource::new());
        source.set_failing(true);
        let cache = DataCache::new(source);

        let err = cache.get_or_refresh(t0()).await.unwrap_err();
        assert!(matches!(err, LoadError::SourceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_info_does_not_trigger_load() {
        let source = Arc::new(FixtureSource::new());
        let cache = DataCache::new(source.clone());

        let info = cache.info(t0()).await;
        assert!(!info.cached);
        assert_eq!(info.records_count, 0);
        assert_eq!(source.calls(), 0);

        cache.get_or_refresh(t0()).await.unwrap();
        let info = cache.info(t0() + Duration::seconds(30)).await;
        assert!(info.cached);
        assert_eq!(info.records_count, 1);
        assert_eq!(info.cache_age_seconds, Some(30.0));
    }
}
