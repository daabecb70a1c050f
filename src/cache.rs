//! TTL cache over a pluggable key-value store.
//!
//! Entries are stored as `{"data": …, "timestamp": <unix ms>}`. Storage
//! failures never propagate: reads degrade to a miss, writes are dropped with
//! a warning. Last writer wins per key.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use metrics::counter;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Raw string key-value store.
pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str) -> io::Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> io::Result<()>;
    fn remove(&self, key: &str) -> io::Result<()>;
}

/// In-process store with an optional byte quota.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<HashMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
            quota_bytes: Some(quota_bytes),
        }
    }

    fn lock(&self) -> io::Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.inner
            .lock()
            .map_err(|_| io::Error::other("memory store mutex poisoned"))
    }
}

impl CacheStore for MemoryStore {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> io::Result<()> {
        let mut map = self.lock()?;
        if let Some(quota) = self.quota_bytes {
            let others: usize = map
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            if others + key.len() + value.len() > quota {
                return Err(io::Error::new(
                    io::ErrorKind::OutOfMemory,
                    "cache quota exceeded",
                ));
            }
        }
        map.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

/// One JSON file per key under `dir`; filenames are SHA-256 of the key.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let _ = fs::create_dir_all(&dir); // best-effort; set() retries
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let digest = Sha256::digest(key.as_bytes());
        let name: String = digest.iter().map(|b| format!("{b:02x}")).collect();
        self.dir.join(format!("{name}.json"))
    }
}

impl CacheStore for FileStore {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn set(&self, key: &str, value: &str) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        let mut f = fs::File::create(&tmp)?;
        f.write_all(value.as_bytes())?;
        f.sync_all()?;
        fs::rename(tmp, path)
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry<T> {
    data: T,
    /// Write time, unix milliseconds.
    timestamp: i64,
}

/// Typed TTL view over a `CacheStore`. Absolute TTL, no sliding refresh.
pub struct TtlCache<T> {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for TtlCache<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            ttl: self.ttl,
            _marker: PhantomData,
        }
    }
}

impl<T: Serialize + DeserializeOwned> TtlCache<T> {
    pub fn new(store: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self {
            store,
            ttl,
            _marker: PhantomData,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Entry younger than the TTL at `now`, if any.
    pub fn get_fresh(&self, key: &str, now: DateTime<Utc>) -> Option<T> {
        let entry = self.read_entry(key)?;
        let age_ms = now.timestamp_millis().saturating_sub(entry.timestamp);
        if age_ms >= 0 && (age_ms as u128) < self.ttl.as_millis() {
            Some(entry.data)
        } else {
            None
        }
    }

    /// Entry regardless of age (last-known-good).
    pub fn get_any(&self, key: &str) -> Option<T> {
        self.read_entry(key).map(|e| e.data)
    }

    /// Best-effort write; returns whether it was stored.
    pub fn put(&self, key: &str, data: &T, now: DateTime<Utc>) -> bool {
        let entry = CacheEntry {
            data,
            timestamp: now.timestamp_millis(),
        };
        let json = match serde_json::to_string(&entry) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, key, "cache serialize failed");
                counter!("market_cache_errors_total").increment(1);
                return false;
            }
        };
        match self.store.set(key, &json) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, key, "error writing to cache");
                counter!("market_cache_errors_total").increment(1);
                false
            }
        }
    }

    pub fn invalidate(&self, key: &str) {
        if let Err(e) = self.store.remove(key) {
            tracing::warn!(error = %e, key, "cache invalidate failed");
        }
    }

    fn read_entry(&self, key: &str) -> Option<CacheEntry<T>> {
        let raw = match self.store.get(key) {
            Ok(v) => v?,
            Err(e) => {
                tracing::warn!(error = %e, key, "error reading from cache");
                counter!("market_cache_errors_total").increment(1);
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(error = %e, key, "discarding corrupt cache entry");
                counter!("market_cache_errors_total").increment(1);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    fn cache(store: Arc<dyn CacheStore>) -> TtlCache<Vec<u32>> {
        TtlCache::new(store, Duration::from_secs(300))
    }

    #[test]
    fn fresh_until_ttl_then_only_stale() {
        let c = cache(Arc::new(MemoryStore::new()));
        let t0 = Utc::now();
        assert!(c.put("k", &vec![1, 2, 3], t0));

        assert_eq!(c.get_fresh("k", t0 + ChronoDuration::seconds(299)), Some(vec![1, 2, 3]));
        assert_eq!(c.get_fresh("k", t0 + ChronoDuration::seconds(300)), None);
        assert_eq!(c.get_any("k"), Some(vec![1, 2, 3]));
    }

    #[test]
    fn quota_exceeded_is_not_fatal() {
        let c = cache(Arc::new(MemoryStore::with_quota(16)));
        assert!(!c.put("k", &vec![1; 64], Utc::now()));
        assert_eq!(c.get_any("k"), None);
    }

    #[test]
    fn corrupt_entry_reads_as_miss() {
        let store = Arc::new(MemoryStore::new());
        store.set("k", "{not json").unwrap();
        let c = cache(store);
        assert_eq!(c.get_fresh("k", Utc::now()), None);
    }

    #[test]
    fn file_store_roundtrip_and_remove() {
        let tmp = tempfile::tempdir().unwrap();
        let store = Arc::new(FileStore::new(tmp.path().join("nested")));
        let c = cache(store.clone());
        let now = Utc::now();
        assert!(c.put("market-intelligence", &vec![7], now));
        assert_eq!(c.get_fresh("market-intelligence", now), Some(vec![7]));

        let files: Vec<_> = fs::read_dir(store.dir()).unwrap().collect();
        assert_eq!(files.len(), 1, "tmp file must be renamed away");

        c.invalidate("market-intelligence");
        assert_eq!(c.get_any("market-intelligence"), None);
        c.invalidate("market-intelligence");
    }
}
