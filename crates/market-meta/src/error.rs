//! Error types for market-meta

/// Result type for market-meta operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Unknown extension kind string
    #[error("unknown extension kind '{0}' (expected agent, voice-agent, prompt, skill, or mcp-server)")]
    UnknownKind(String),

    /// Tracking document parsed but is inconsistent
    #[error("invalid tracking data: {reason}")]
    InvalidTracking { reason: String },
}
