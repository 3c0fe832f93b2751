//! Error types for market-core

use market_meta::ErrorKind;

/// Result type for market-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while managing installed extensions
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("extension '{id}' is already installed; use update instead")]
    AlreadyInstalled { id: String },

    #[error("extension '{id}' is not installed")]
    NotInstalled { id: String },

    #[error("missing dependency: {id}")]
    MissingDependency { id: String },

    /// `chain` reads `a -> b -> a`
    #[error("circular dependency detected: {chain}")]
    CircularDependency { chain: String },

    #[error("dependency chain exceeds {limit} levels")]
    DependencyTooDeep { limit: usize },

    #[error("cannot uninstall {id}: required by {}", dependents.join(", "))]
    RequiredBy { id: String, dependents: Vec<String> },

    #[error("manifest '{found}' does not match extension '{expected}'")]
    ManifestMismatch { expected: String, found: String },

    #[error("unsafe target location '{path}': {reason}")]
    UnsafeTarget { path: String, reason: String },

    #[error("download failed for {url}: {reason}")]
    Download { url: String, reason: String },

    #[error("path exists as a folder, not a file: {path}")]
    FolderCollision { path: String },

    #[error("installation cancelled by user")]
    Cancelled,

    #[error("no free path for '{path}' after {attempts} rename attempts")]
    RenameExhausted { path: String, attempts: usize },

    #[error("tracking store error at {path}: {message}")]
    Tracking { path: String, message: String },

    /// Content store error from market-fs
    #[error(transparent)]
    Fs(#[from] market_fs::Error),

    /// Transport error from market-catalog
    #[error(transparent)]
    Catalog(#[from] market_catalog::CatalogError),

    /// Schema error from market-meta
    #[error(transparent)]
    Meta(#[from] market_meta::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Failure class reported in [`InstallationOutcome`](market_meta::InstallationOutcome).
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::AlreadyInstalled { .. }
            | Error::NotInstalled { .. }
            | Error::MissingDependency { .. }
            | Error::CircularDependency { .. }
            | Error::DependencyTooDeep { .. }
            | Error::RequiredBy { .. }
            | Error::ManifestMismatch { .. }
            | Error::UnsafeTarget { .. }
            | Error::Meta(_) => ErrorKind::Validation,

            Error::Download { .. } | Error::Catalog(_) => ErrorKind::Transport,

            Error::FolderCollision { .. } | Error::Cancelled | Error::RenameExhausted { .. } => {
                ErrorKind::FilesystemConflict
            }
            Error::Fs(market_fs::Error::NotAFile { .. }) => ErrorKind::FilesystemConflict,
            Error::Fs(market_fs::Error::InvalidPath { .. }) => ErrorKind::Validation,

            Error::Tracking { .. } | Error::Fs(_) | Error::Json(_) => ErrorKind::Persistence,
        }
    }

    pub fn tracking(path: impl std::fmt::Display, message: impl ToString) -> Self {
        Self::Tracking {
            path: path.to_string(),
            message: message.to_string(),
        }
    }
}
