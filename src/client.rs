//! Upstream market-intelligence client.
//!
//! `MarketDataProvider` is the seam the data source retries against; it reports
//! every failure. `HttpMarketClient::fetch_market_intelligence` is the total
//! variant for callers that just need something renderable.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use metrics::{counter, histogram};
use serde_json::Value;

use crate::error::FetchError;
use crate::types::MarketIntelligenceData;

pub const MARKET_INTELLIGENCE_PATH: &str = "/api/market-intelligence";

/// Arrays a body must carry to be accepted.
const REQUIRED_ARRAYS: [&str; 3] = ["trends", "metrics", "search_trends"];

#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn fetch(&self) -> Result<MarketIntelligenceData, FetchError>;
    fn name(&self) -> &'static str;
}

pub struct HttpMarketClient {
    http: reqwest::Client,
    url: String,
}

impl HttpMarketClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("market-intel-dashboard/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(timeout.min(Duration::from_secs(4)))
            .timeout(timeout)
            .build()?;
        Ok(Self::with_client(http, base_url))
    }

    pub fn with_client(http: reqwest::Client, base_url: &str) -> Self {
        let url = format!(
            "{}{}",
            base_url.trim().trim_end_matches('/'),
            MARKET_INTELLIGENCE_PATH
        );
        Self { http, url }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn fetch_once(&self) -> Result<MarketIntelligenceData, FetchError> {
        let resp = self
            .http
            .get(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        let body = resp.bytes().await?;
        parse_payload(&body)
    }

    /// Never fails: any transport, status, or schema problem yields
    /// `MarketIntelligenceData::fallback()`.
    pub async fn fetch_market_intelligence(&self) -> MarketIntelligenceData {
        match self.fetch().await {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(error = %e, kind = e.kind(), url = %self.url, "serving fallback market data");
                counter!("market_fallback_total").increment(1);
                MarketIntelligenceData::fallback()
            }
        }
    }
}

#[async_trait]
impl MarketDataProvider for HttpMarketClient {
    async fn fetch(&self) -> Result<MarketIntelligenceData, FetchError> {
        let t0 = Instant::now();
        counter!("market_fetch_total").increment(1);

        let res = self.fetch_once().await;

        histogram!("market_fetch_duration_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        if let Err(e) = &res {
            tracing::debug!(error = %e, url = %self.url, "market fetch failed");
            counter!("market_fetch_errors_total").increment(1);
        }
        res
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// Minimal structural check, then typed decode.
pub fn parse_payload(body: &[u8]) -> Result<MarketIntelligenceData, FetchError> {
    let v: Value =
        serde_json::from_slice(body).map_err(|e| FetchError::Schema(format!("not JSON: {e}")))?;
    let obj = v
        .as_object()
        .ok_or_else(|| FetchError::Schema("body is not a JSON object".into()))?;
    if let Some(missing) = REQUIRED_ARRAYS
        .iter()
        .find(|k| !obj.get(**k).is_some_and(Value::is_array))
    {
        return Err(FetchError::Schema(format!("missing '{missing}' array")));
    }
    serde_json::from_value(v).map_err(|e| FetchError::Schema(e.to_string()))
}
