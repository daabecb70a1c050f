// src/config/dashboard.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs};

pub const ENV_CONFIG_PATH: &str = "DASHBOARD_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/dashboard.toml";
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

fn default_backend_url() -> String {
    DEFAULT_BACKEND_URL.to_string()
}
fn default_request_timeout_secs() -> u64 {
    10
}
fn default_poll_secs() -> u64 {
    60
}
fn default_true() -> bool {
    true
}
fn default_cache_dir() -> PathBuf {
    PathBuf::from("cache/market")
}
fn default_ttl_secs() -> u64 {
    300
}
fn default_max_retries() -> u32 {
    3
}
fn default_retry_delay_ms() -> u64 {
    1_000
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DashboardConfig {
    /// Upstream base URL; `/api/market-intelligence` is appended.
    #[serde(default = "default_backend_url")]
    pub backend_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// 0 disables polling.
    #[serde(default = "default_poll_secs")]
    pub poll_secs: u64,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub retry: RetrySettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_cache_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrySettings {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub delay_ms: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            request_timeout_secs: default_request_timeout_secs(),
            poll_secs: default_poll_secs(),
            cache: CacheSettings::default(),
            retry: RetrySettings::default(),
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: default_cache_dir(),
            ttl_secs: default_ttl_secs(),
        }
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            delay_ms: default_retry_delay_ms(),
        }
    }
}

impl DashboardConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading dashboard config from {}", path.display()))?;
        let cfg: DashboardConfig = toml::from_str(&data)
            .with_context(|| format!("parsing dashboard config {}", path.display()))?;
        Ok(cfg)
    }

    /// Resolve config the usual way:
    /// 1) $DASHBOARD_CONFIG_PATH (must exist)
    /// 2) config/dashboard.toml
    /// 3) built-in defaults
    ///
    /// Environment overrides are applied on top in every case.
    pub fn load() -> Result<Self> {
        let mut cfg = if let Ok(p) = env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            Self::load_from_file(&pb)?
        } else if Path::new(DEFAULT_CONFIG_PATH).exists() {
            Self::load_from_file(DEFAULT_CONFIG_PATH)?
        } else {
            Self::default()
        };
        cfg.apply_env();
        Ok(cfg)
    }

    pub fn apply_env(&mut self) {
        if let Ok(url) = env::var("BACKEND_URL") {
            let url = url.trim();
            if !url.is_empty() {
                self.backend_url = url.to_string();
            }
        }
        if let Some(v) = env_parse("DASHBOARD_REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = v;
        }
        if let Some(v) = env_parse("DASHBOARD_POLL_SECS") {
            self.poll_secs = v;
        }
        if let Some(v) = env_flag("DASHBOARD_CACHE_ENABLED") {
            self.cache.enabled = v;
        }
        if let Ok(dir) = env::var("DASHBOARD_CACHE_DIR") {
            if !dir.trim().is_empty() {
                self.cache.dir = PathBuf::from(dir.trim());
            }
        }
        if let Some(v) = env_parse("DASHBOARD_CACHE_TTL_SECS") {
            self.cache.ttl_secs = v;
        }
        if let Some(v) = env_parse("DASHBOARD_MAX_RETRIES") {
            self.retry.max_retries = v;
        }
        if let Some(v) = env_parse("DASHBOARD_RETRY_DELAY_MS") {
            self.retry.delay_ms = v;
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn poll_interval(&self) -> Option<Duration> {
        (self.poll_secs > 0).then(|| Duration::from_secs(self.poll_secs))
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = env::var(key).ok()?;
    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparseable env override");
            None
        }
    }
}

fn env_flag(key: &str) -> Option<bool> {
    let raw = env::var(key).ok()?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => {
            tracing::warn!(key, value = %raw, "ignoring unparseable env flag");
            None
        }
    }
}
