use thiserror::Error;

/// Errors from the X (Twitter) v2 API client.
#[derive(Debug, Error)]
pub enum TwitterError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("OAuth error: {0}")]
    OAuth(String),

    /// Non-2xx response, or a 2xx response that carried no `data`.
    #[error("Twitter API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited, retry after {retry_after} seconds")]
    RateLimited { retry_after: u64 },

    #[error("{0}")]
    NotConfigured(String),
}

/// Errors from the memory.lol username history lookup.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HistoryError {
    #[error("upstream status {0}")]
    Status(u16),

    #[error("network error: {0}")]
    Network(String),
}

/// Errors from the Serper search proxy.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("request failed: {0}")]
    Network(String),

    #[error("upstream status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("{0}")]
    NotConfigured(String),
}

/// Startup configuration problems.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing environment variables: {}", .0.join(", "))]
    MissingEnv(Vec<&'static str>),

    #[error("Invalid MODE: {0}. Must be 'server' or 'stdio'")]
    InvalidMode(String),

    #[error("Invalid PORT: {0}. Must be a number between 1 and 65535")]
    InvalidPort(String),

    #[error("PORT cannot be 0")]
    ZeroPort,
}
