use thiserror::Error;

/// Why a market-intelligence fetch did not produce a payload.
#[derive(Debug, Error)]
pub enum FetchError {
    /// DNS, connect, timeout, or body read failure.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Upstream answered with a non-2xx status.
    #[error("HTTP error! status: {0}")]
    Status(u16),

    /// Body was not a usable payload.
    #[error("invalid API response format: {0}")]
    Schema(String),

    /// Retry budget spent; the only variant shown to users.
    #[error("Failed after {retries} retries: {last}")]
    RetriesExhausted { retries: u32, last: String },
}

impl FetchError {
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Transport(_) => "transport",
            FetchError::Status(_) => "status",
            FetchError::Schema(_) => "schema",
            FetchError::RetriesExhausted { .. } => "exhausted",
        }
    }
}
