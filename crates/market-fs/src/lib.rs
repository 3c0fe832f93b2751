//! Content store abstraction for the extension marketplace client
//!
//! Provides store-relative path handling, atomic I/O, format-agnostic
//! config loading, and the [`ContentStore`] boundary the installer writes
//! through.

pub mod config;
pub mod error;
pub mod io;
pub mod path;
pub mod store;

pub use config::ConfigStore;
pub use error::{Error, Result};
pub use path::NormalizedPath;
pub use store::{ContentStore, EntryKind, FsContentStore};
