use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::charts::{render_bar_series, render_line_series, render_sparkline, BarSeries, LineSeries};
use crate::live::{LiveData, LoadState, Snapshot};
use crate::time_ago::time_ago;
use crate::types::MarketIntelligenceData;

/// Cards shown per chart section.
const CHART_LIMIT: usize = 3;
/// Benchmarks plot the first four weeks of history.
const BENCHMARK_WEEKS: usize = 4;

#[derive(Clone)]
pub struct AppState {
    pub live: Arc<LiveData>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/api/dashboard", get(dashboard))
        .route("/api/dashboard/refresh", post(refresh))
        .route("/api/charts/search-trends", get(search_trend_charts))
        .route("/api/charts/benchmarks", get(benchmark_charts))
        .route("/api/charts/sparkline/{metric}", get(sparkline_svg))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Snapshot data, or the fallback payload so pages never render blank.
fn data_or_fallback(s: &Snapshot) -> Arc<MarketIntelligenceData> {
    s.data
        .clone()
        .unwrap_or_else(|| Arc::new(MarketIntelligenceData::fallback()))
}

#[derive(Serialize)]
struct DashboardView<'a> {
    status: &'static str,
    loading: bool,
    error: Option<&'a str>,
    generated_at: DateTime<Utc>,
    generated_ago: String,
    data: &'a MarketIntelligenceData,
}

fn status_label(state: LoadState) -> &'static str {
    match state {
        LoadState::Idle => "idle",
        LoadState::Loading => "loading",
        LoadState::Success => "ok",
        LoadState::Failure => "error",
    }
}

async fn dashboard(State(state): State<AppState>) -> Response {
    let snap = state.live.snapshot();
    let data = data_or_fallback(&snap);
    let view = DashboardView {
        status: status_label(snap.state),
        loading: snap.loading(),
        error: snap.error.as_deref(),
        generated_at: data.generated_at,
        generated_ago: time_ago(data.generated_at, Utc::now()),
        data: &data,
    };
    Json(view).into_response()
}

async fn refresh(State(state): State<AppState>) -> (StatusCode, &'static str) {
    let _ = state.live.refetch();
    (StatusCode::ACCEPTED, "refresh scheduled")
}

#[derive(Serialize)]
struct SearchTrendChart {
    term: String,
    growth: f64,
    industry: String,
    series: BarSeries,
}

async fn search_trend_charts(State(state): State<AppState>) -> Json<Vec<SearchTrendChart>> {
    let data = data_or_fallback(&state.live.snapshot());
    let out = data
        .search_trends
        .iter()
        .take(CHART_LIMIT)
        .map(|t| SearchTrendChart {
            term: t.term.clone(),
            growth: t.growth,
            industry: t.industry.clone(),
            series: render_bar_series(&t.term, t.growth),
        })
        .collect();
    Json(out)
}

#[derive(Serialize)]
struct BenchmarkChart {
    name: String,
    value: f64,
    change: f64,
    week_labels: Vec<String>,
    series: LineSeries,
}

async fn benchmark_charts(State(state): State<AppState>) -> Json<Vec<BenchmarkChart>> {
    let data = data_or_fallback(&state.live.snapshot());
    let out = data
        .metrics
        .iter()
        .take(CHART_LIMIT)
        .map(|m| {
            let weeks = &m.trend_data[..m.trend_data.len().min(BENCHMARK_WEEKS)];
            BenchmarkChart {
                name: m.name.clone(),
                value: m.value,
                change: m.change,
                week_labels: (1..=weeks.len()).map(|w| format!("Week {w}")).collect(),
                series: render_line_series(weeks),
            }
        })
        .collect();
    Json(out)
}

#[derive(Deserialize)]
struct SparklineQuery {
    hover: Option<usize>,
}

async fn sparkline_svg(
    State(state): State<AppState>,
    Path(metric): Path<String>,
    Query(q): Query<SparklineQuery>,
) -> Response {
    let data = data_or_fallback(&state.live.snapshot());
    let Some(m) = data.metric(&metric) else {
        return (StatusCode::NOT_FOUND, format!("unknown metric '{metric}'")).into_response();
    };

    let mut spark = render_sparkline(&m.trend_data);
    if let Some(i) = q.hover {
        spark.hover(i);
    }
    (
        [(header::CONTENT_TYPE, "image/svg+xml")],
        spark.to_svg(Some(&m.name)),
    )
        .into_response()
}
