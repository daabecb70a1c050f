// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod cache;
pub mod charts;
pub mod client;
pub mod config;
pub mod error;
pub mod live;
pub mod metrics;
pub mod source;
pub mod time_ago;
pub mod types;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::client::{HttpMarketClient, MarketDataProvider};
pub use crate::error::FetchError;
pub use crate::live::{LiveData, LiveOptions, LoadState, Snapshot};
pub use crate::source::{DataSource, RetryPolicy};
pub use crate::types::MarketIntelligenceData;

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use crate::cache::{FileStore, TtlCache};
use crate::config::DashboardConfig;
use crate::metrics::Metrics;

/// Wire provider, cache and retry policy from config.
pub fn build_source(cfg: &DashboardConfig) -> anyhow::Result<DataSource> {
    let client = HttpMarketClient::new(&cfg.backend_url, cfg.request_timeout())
        .context("building upstream HTTP client")?;
    let mut source = DataSource::new(Arc::new(client)).with_retry(RetryPolicy::from(&cfg.retry));
    if cfg.cache.enabled {
        let store = Arc::new(FileStore::new(&cfg.cache.dir));
        let ttl = std::time::Duration::from_secs(cfg.cache.ttl_secs);
        source = source.with_cache(TtlCache::new(store, ttl));
    }
    Ok(source)
}

fn debug_routes_enabled() -> bool {
    std::env::var("DEBUG_ROUTES").is_ok_and(|v| v == "1")
}

/// Full in-process app: live data (initial load + polling) and routes.
/// `/metrics` is mounted only with `DEBUG_ROUTES=1`.
pub async fn app_with_config(cfg: DashboardConfig) -> anyhow::Result<axum::Router> {
    let metrics = Metrics::init(cfg.cache.ttl_secs.saturating_mul(1_000))?;
    let source = build_source(&cfg)?;

    info!(
        backend = %cfg.backend_url,
        cache = cfg.cache.enabled,
        ttl_secs = cfg.cache.ttl_secs,
        poll_secs = cfg.poll_secs,
        "market data source configured"
    );

    let live = LiveData::spawn(
        source,
        LiveOptions {
            poll_interval: cfg.poll_interval(),
        },
    );
    let mut app = router(AppState {
        live: Arc::new(live),
    });
    if debug_routes_enabled() {
        app = app.merge(metrics.router());
    }
    Ok(app)
}

/// `app_with_config` with config resolved from file + environment.
pub async fn app() -> anyhow::Result<axum::Router> {
    let cfg = DashboardConfig::load()?;
    app_with_config(cfg).await
}
