use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, describe_histogram, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder (once per process) and publish the cache TTL.
    pub fn init(ttl_ms: u64) -> anyhow::Result<Self> {
        let handle = HANDLE
            .get_or_try_init(|| {
                // Default buckets keep us clear of API differences across exporter versions.
                PrometheusBuilder::new().install_recorder()
            })?
            .clone();

        ensure_described();
        gauge!("market_cache_ttl_ms").set(ttl_ms as f64);

        Ok(Self { handle })
    }

    /// Router exposing `/metrics` in the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

/// One-time registration so series show up on /metrics before first use.
pub fn ensure_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("market_fetch_total", "Upstream fetch attempts.");
        describe_counter!("market_fetch_errors_total", "Upstream fetch attempts that failed.");
        describe_counter!(
            "market_fallback_total",
            "Fallback payloads served instead of live data."
        );
        describe_counter!("market_retry_attempts_total", "Retries issued after a failed fetch.");
        describe_counter!("market_cache_hits_total", "Loads served from a fresh cache entry.");
        describe_counter!("market_cache_misses_total", "Loads that had to go to the network.");
        describe_counter!(
            "market_cache_errors_total",
            "Cache read/write failures (treated as misses)."
        );
        describe_counter!(
            "market_stale_responses_total",
            "Expired cache entries served as last-known-good."
        );
        describe_histogram!("market_fetch_duration_ms", "Upstream fetch latency in milliseconds.");
        describe_gauge!("market_last_success_ts", "Unix ts of the last successful load.");
        describe_gauge!("market_cache_ttl_ms", "Configured cache TTL in milliseconds.");
    });
}
