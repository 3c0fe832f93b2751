//! Shared data types for the extension marketplace client.
//!
//! This crate holds the wire shapes of the remote catalog, the persisted
//! install ledger, and the result types returned by the extension manager.
//! Field names serialize in camelCase to match the catalog and tracking
//! document formats.

pub mod catalog;
pub mod error;
pub mod extension;
pub mod outcome;
pub mod tracking;
pub mod version;

pub use catalog::CatalogManifest;
pub use error::{Error, Result};
pub use extension::{ExtensionKind, MarketplaceExtension, PackageContent};
pub use outcome::{ErrorKind, InstallationOutcome, UpdateNotification};
pub use tracking::{LocalExtensionRecord, TRACKING_FORMAT_VERSION, TrackingFileData};
pub use version::{ExtensionVersion, is_newer_version};
