//! # Data source
//!
//! Framework-agnostic loading: cache consult, fetch with bounded fixed-delay
//! retry, cache write. Knows nothing about view state; `live` binds it.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use metrics::{counter, gauge};

use crate::cache::TtlCache;
use crate::client::MarketDataProvider;
use crate::config::RetrySettings;
use crate::error::FetchError;
use crate::types::MarketIntelligenceData;

/// Logical request identity used as the cache key.
pub const CACHE_KEY: &str = "market-intelligence";

pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delay: Duration::from_millis(1_000),
        }
    }
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(s: &RetrySettings) -> Self {
        Self {
            max_retries: s.max_retries,
            delay: Duration::from_millis(s.delay_ms),
        }
    }
}

pub struct DataSource {
    provider: Arc<dyn MarketDataProvider>,
    cache: Option<TtlCache<MarketIntelligenceData>>,
    retry: RetryPolicy,
    clock: Clock,
}

impl DataSource {
    pub fn new(provider: Arc<dyn MarketDataProvider>) -> Self {
        Self {
            provider,
            cache: None,
            retry: RetryPolicy::default(),
            clock: Arc::new(Utc::now),
        }
    }

    pub fn with_cache(mut self, cache: TtlCache<MarketIntelligenceData>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Load a snapshot. Unless `force`, a fresh cache entry short-circuits the
    /// network. Only `FetchError::RetriesExhausted` is returned.
    pub async fn load(&self, force: bool) -> Result<Arc<MarketIntelligenceData>, FetchError> {
        if !force {
            if let Some(cache) = &self.cache {
                if let Some(hit) = cache.get_fresh(CACHE_KEY, (self.clock)()) {
                    counter!("market_cache_hits_total").increment(1);
                    tracing::debug!(key = CACHE_KEY, "market data served from cache");
                    return Ok(Arc::new(hit));
                }
                counter!("market_cache_misses_total").increment(1);
            }
        }

        let data = self.fetch_with_retry().await?;

        let now = (self.clock)();
        if let Some(cache) = &self.cache {
            cache.put(CACHE_KEY, &data, now);
        }
        gauge!("market_last_success_ts").set(now.timestamp() as f64);
        Ok(Arc::new(data))
    }

    /// Last-known-good snapshot from the cache, ignoring TTL.
    pub fn stale(&self) -> Option<Arc<MarketIntelligenceData>> {
        let hit = self.cache.as_ref()?.get_any(CACHE_KEY)?;
        counter!("market_stale_responses_total").increment(1);
        Some(Arc::new(hit))
    }

    async fn fetch_with_retry(&self) -> Result<MarketIntelligenceData, FetchError> {
        let mut attempt: u32 = 0;
        loop {
            match self.provider.fetch().await {
                Ok(data) => return Ok(data),
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        provider = self.provider.name(),
                        attempt,
                        "market data fetch failed"
                    );
                    if attempt >= self.retry.max_retries {
                        return Err(FetchError::RetriesExhausted {
                            retries: self.retry.max_retries,
                            last: e.to_string(),
                        });
                    }
                    attempt += 1;
                    counter!("market_retry_attempts_total").increment(1);
                    tokio::time::sleep(self.retry.delay).await;
                }
            }
        }
    }
}
