//! Market Intelligence Dashboard — Binary Entrypoint
//! Boots the Axum HTTP server with the live market-data snapshot and chart routes.

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Structured logs; `DASHBOARD_LOG_JSON=1` switches to JSON lines.
/// `try_init` leaves an already-installed subscriber (the runtime's) alone.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("market_intel_dashboard=info,warn"));

    let json = std::env::var("DASHBOARD_LOG_JSON").is_ok_and(|v| v == "1");
    let res = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .try_init()
    };
    if res.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    init_tracing();

    let router = market_intel_dashboard::app().await?;
    Ok(router.into())
}
