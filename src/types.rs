//! # Market intelligence payload
//!
//! Shape of the JSON document served by `GET /api/market-intelligence`.
//!
//! - Every collection defaults to an empty vector, so partial payloads still
//!   deserialize (the structural check lives in the client).
//! - Timestamps accept RFC 3339 as well as the naive forms the upstream
//!   service emits (`2024-01-15T10:00:00.123456`, `2024-01-15 10:00:00`);
//!   naive values are read as UTC.
//! - Snapshots are immutable once received; refreshes replace them wholesale.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Top-level payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarketIntelligenceData {
    #[serde(default)]
    pub trends: Vec<Trend>,
    #[serde(default)]
    pub news: Vec<NewsArticle>,
    #[serde(default)]
    pub tools: Vec<Tool>,
    #[serde(default)]
    pub case_studies: Vec<CaseStudy>,
    #[serde(default)]
    pub search_trends: Vec<SearchTrend>,
    #[serde(default)]
    pub metrics: Vec<Metric>,
    #[serde(default = "Utc::now", with = "flexible_ts")]
    pub generated_at: DateTime<Utc>,
}

impl MarketIntelligenceData {
    /// The empty-but-well-formed payload substituted whenever a live fetch
    /// cannot produce a valid result. `generated_at` is stamped at call time.
    pub fn fallback() -> Self {
        Self {
            trends: Vec::new(),
            news: Vec::new(),
            tools: Vec::new(),
            case_studies: Vec::new(),
            search_trends: Vec::new(),
            metrics: Vec::new(),
            generated_at: Utc::now(),
        }
    }

    /// True when every collection is empty (fallback or an idle backend).
    pub fn is_empty(&self) -> bool {
        self.trends.is_empty()
            && self.news.is_empty()
            && self.tools.is_empty()
            && self.case_studies.is_empty()
            && self.search_trends.is_empty()
            && self.metrics.is_empty()
    }

    pub fn metric(&self, name: &str) -> Option<&Metric> {
        self.metrics
            .iter()
            .find(|m| m.name.eq_ignore_ascii_case(name))
    }
}

/// A qualitative market trend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Trend {
    pub title: String,
    pub description: String,
    /// 0.0 – 5.0
    pub impact_score: f64,
    pub category: String,
    #[serde(with = "flexible_ts")]
    pub first_seen: DateTime<Utc>,
    #[serde(with = "flexible_ts")]
    pub last_updated: DateTime<Utc>,
    pub insight: String,
    #[serde(default)]
    pub sources: Vec<String>,
}

/// A quantitative performance indicator with a short history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Metric {
    pub name: String,
    /// Percentage.
    pub value: f64,
    /// Signed percentage; the only numeric field allowed to go negative.
    pub change: f64,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub trend_data: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forecast: Option<Vec<f64>>,
    #[serde(
        default,
        with = "flexible_ts::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_interval: Option<(f64, f64)>,
    #[serde(default)]
    pub sources: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

/// Search-interest growth for a single term.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchTrend {
    pub term: String,
    /// Percentage growth.
    pub growth: f64,
    pub date: String,
    pub industry: String,
    #[serde(default)]
    pub region: Vec<String>,
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<Sentiment>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewsArticle {
    pub headline: String,
    pub source: String,
    #[serde(default)]
    pub url: Option<String>,
    pub summary: String,
    pub business_impact: String,
    #[serde(with = "flexible_ts")]
    pub published_date: DateTime<Utc>,
    pub category: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tool {
    pub name: String,
    pub company: String,
    pub description: String,
    pub category: String,
    #[serde(default)]
    pub key_features: Vec<String>,
    #[serde(default)]
    pub pricing_info: Option<String>,
    pub target_audience: String,
    #[serde(
        default,
        with = "flexible_ts::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub launch_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub website_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaseStudy {
    pub title: String,
    pub company: String,
    pub industry: String,
    pub challenge: String,
    pub solution: String,
    pub results: String,
    #[serde(default)]
    pub metrics: Vec<String>,
    pub source: String,
}

/// Lenient timestamp (de)serialization.
pub mod flexible_ts {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

    pub fn parse(s: &str) -> Option<DateTime<Utc>> {
        let s = s.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.with_timezone(&Utc));
        }
        NAIVE_FORMATS
            .iter()
            .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
            .map(|n| n.and_utc())
    }

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&dt.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{raw}'")))
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            dt: &Option<DateTime<Utc>>,
            s: S,
        ) -> Result<S::Ok, S::Error> {
            match dt {
                Some(dt) => s.serialize_str(&dt.to_rfc3339()),
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            d: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            // Upstream sends `null` or "" for unknown launch dates.
            let raw: Option<String> = Option::deserialize(d)?;
            match raw.as_deref().map(str::trim) {
                None | Some("") => Ok(None),
                Some(s) => super::parse(s)
                    .map(Some)
                    .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{s}'"))),
            }
        }
    }
}
