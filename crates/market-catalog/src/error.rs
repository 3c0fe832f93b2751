//! Error types for market-catalog

/// Result type for market-catalog operations
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Errors raised while fetching or validating the catalog
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The request never produced a response (DNS, connect, timeout, read)
    #[error("request to {url} failed: {reason}")]
    Request { url: String, reason: String },

    /// The server answered with a non-2xx status
    #[error("request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// The payload is not a structurally valid catalog
    #[error("invalid catalog format: {reason}")]
    InvalidFormat { reason: String },

    /// The fetch failed and there is nothing cached to fall back on
    #[error("failed to fetch catalog and no cache available: {reason}")]
    Unavailable { reason: String },

    /// Could not build the HTTP client
    #[error("HTTP client setup failed: {0}")]
    ClientSetup(String),

    /// On-disk cache error from market-fs
    #[error(transparent)]
    Fs(#[from] market_fs::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl CatalogError {
    pub fn request(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Request {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid_format(reason: impl Into<String>) -> Self {
        Self::InvalidFormat {
            reason: reason.into(),
        }
    }
}
