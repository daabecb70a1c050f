// tests/cache_ttl.rs
//
// DataSource + TtlCache behavior with a manual clock.
//
// Covered:
// - two loads within the TTL hit the network once
// - a load after expiry goes back to the network
// - file-backed entries survive a new DataSource (process restart)
// - a failing store never fails a load

use std::io;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use market_intel_dashboard::cache::{CacheStore, FileStore, MemoryStore, TtlCache};
use market_intel_dashboard::client::MarketDataProvider;
use market_intel_dashboard::error::FetchError;
use market_intel_dashboard::source::{Clock, DataSource, RetryPolicy, CACHE_KEY};
use market_intel_dashboard::types::MarketIntelligenceData;

const TTL: Duration = Duration::from_secs(300);
const T0_MS: i64 = 1_705_312_800_000; // 2024-01-15T10:00:00Z

#[derive(Default)]
struct Counting {
    calls: AtomicUsize,
}

#[async_trait]
impl MarketDataProvider for Counting {
    async fn fetch(&self) -> Result<MarketIntelligenceData, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(MarketIntelligenceData::fallback())
    }
    fn name(&self) -> &'static str {
        "counting"
    }
}

/// Store whose every operation fails (disk full, read-only mount).
struct Broken;

impl CacheStore for Broken {
    fn get(&self, _key: &str) -> io::Result<Option<String>> {
        Err(io::Error::other("storage disabled"))
    }
    fn set(&self, _key: &str, _value: &str) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::OutOfMemory, "quota exceeded"))
    }
    fn remove(&self, _key: &str) -> io::Result<()> {
        Err(io::Error::other("storage disabled"))
    }
}

fn manual_clock() -> (Arc<AtomicI64>, Clock) {
    let now = Arc::new(AtomicI64::new(T0_MS));
    let n = now.clone();
    let clock: Clock = Arc::new(move || {
        Utc.timestamp_millis_opt(n.load(Ordering::SeqCst))
            .single()
            .expect("valid test timestamp")
    });
    (now, clock)
}

fn source_with(store: Arc<dyn CacheStore>, p: Arc<Counting>, clock: Clock) -> DataSource {
    DataSource::new(p)
        .with_cache(TtlCache::new(store, TTL))
        .with_clock(clock)
        .with_retry(RetryPolicy {
            max_retries: 0,
            delay: Duration::from_millis(1),
        })
}

#[tokio::test]
async fn second_load_within_ttl_is_served_from_cache() {
    let p = Arc::new(Counting::default());
    let (now, clock) = manual_clock();
    let src = source_with(Arc::new(MemoryStore::new()), p.clone(), clock);

    src.load(false).await.unwrap();
    now.fetch_add(299_000, Ordering::SeqCst);
    src.load(false).await.unwrap();

    assert_eq!(p.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn load_after_expiry_refetches() {
    let p = Arc::new(Counting::default());
    let (now, clock) = manual_clock();
    let src = source_with(Arc::new(MemoryStore::new()), p.clone(), clock);

    src.load(false).await.unwrap();
    now.fetch_add(TTL.as_millis() as i64, Ordering::SeqCst);
    src.load(false).await.unwrap();
    assert_eq!(p.calls.load(Ordering::SeqCst), 2);

    // The refetch rewrote the entry, so we are fresh again.
    now.fetch_add(1_000, Ordering::SeqCst);
    src.load(false).await.unwrap();
    assert_eq!(p.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn file_entries_survive_a_new_source() {
    let tmp = tempfile::tempdir().unwrap();
    let (now, clock) = manual_clock();

    let first = Arc::new(Counting::default());
    source_with(Arc::new(FileStore::new(tmp.path())), first.clone(), clock.clone())
        .load(false)
        .await
        .unwrap();

    now.fetch_add(60_000, Ordering::SeqCst);
    let second = Arc::new(Counting::default());
    let src = source_with(Arc::new(FileStore::new(tmp.path())), second.clone(), clock);
    src.load(false).await.unwrap();

    assert_eq!(first.calls.load(Ordering::SeqCst), 1);
    assert_eq!(second.calls.load(Ordering::SeqCst), 0, "served from disk");
}

#[tokio::test]
async fn expired_entry_is_still_available_as_last_known_good() {
    let store: Arc<dyn CacheStore> = Arc::new(MemoryStore::new());
    let cache: TtlCache<MarketIntelligenceData> = TtlCache::new(store.clone(), TTL);
    let old = Utc.timestamp_millis_opt(T0_MS - 3_600_000).single().unwrap();
    assert!(cache.put(CACHE_KEY, &MarketIntelligenceData::fallback(), old));

    let (_now, clock) = manual_clock();
    let src = source_with(store, Arc::new(Counting::default()), clock);
    assert!(cache
        .get_fresh(CACHE_KEY, Utc.timestamp_millis_opt(T0_MS).single().unwrap())
        .is_none());
    assert!(src.stale().is_some());
}

#[tokio::test]
async fn broken_store_never_fails_a_load() {
    let p = Arc::new(Counting::default());
    let (_now, clock) = manual_clock();
    let src = source_with(Arc::new(Broken), p.clone(), clock);

    assert!(src.load(false).await.is_ok());
    assert!(src.load(false).await.is_ok());
    assert_eq!(p.calls.load(Ordering::SeqCst), 2, "every load misses");
    assert!(src.stale().is_none());
}
