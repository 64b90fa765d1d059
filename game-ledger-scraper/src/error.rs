use game_ledger_core::DataSource;

/// Errors that can occur while talking to an external source.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The source answered with a status that means "stop everything",
    /// e.g. a revoked key or an IP ban. Never retried.
    #[error("{site} refused {url} with HTTP {status}; stopping this source")]
    ImmediateStop {
        site: DataSource,
        status: u16,
        url: String,
    },

    #[error("Gave up on {url} after {attempts} attempts (last failure: {last})")]
    ExhaustedRetries {
        url: String,
        attempts: u32,
        last: String,
    },

    #[error("Request cancelled")]
    Cancelled,

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unexpected response shape: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScrapeError {
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// True for errors that end the whole source run rather than one row.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ImmediateStop { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
