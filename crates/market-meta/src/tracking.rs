//! The persisted install ledger.
//!
//! A [`LocalExtensionRecord`] exists iff its extension is installed. The
//! [`TrackingFileData`] document is the single source of truth for that.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Ledger format version written by this client.
pub const TRACKING_FORMAT_VERSION: &str = "1.0";

/// What is known about one installed extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalExtensionRecord {
    pub extension_id: String,
    pub installed_version: String,
    pub installation_timestamp: DateTime<Utc>,
    /// Paths actually written, which differ from the package's target
    /// locations when a conflict was resolved by renaming.
    pub installed_file_paths: Vec<String>,
    /// Dependency ids declared at install time.
    #[serde(default)]
    pub linked_dependencies: Vec<String>,
}

/// The tracking document: format version plus `id -> record`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingFileData {
    pub format_version: String,
    #[serde(default)]
    pub installed_extensions: BTreeMap<String, LocalExtensionRecord>,
}

impl Default for TrackingFileData {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackingFileData {
    pub fn new() -> Self {
        Self {
            format_version: TRACKING_FORMAT_VERSION.to_string(),
            installed_extensions: BTreeMap::new(),
        }
    }

    pub fn from_records(records: impl IntoIterator<Item = LocalExtensionRecord>) -> Self {
        let mut data = Self::new();
        for record in records {
            data.installed_extensions
                .insert(record.extension_id.clone(), record);
        }
        data
    }

    /// Checks serde cannot express: a non-empty format version and keys that
    /// match their record ids.
    pub fn validate(&self) -> Result<()> {
        if self.format_version.trim().is_empty() {
            return Err(Error::InvalidTracking {
                reason: "formatVersion is empty".to_string(),
            });
        }
        for (key, record) in &self.installed_extensions {
            if key != &record.extension_id {
                return Err(Error::InvalidTracking {
                    reason: format!(
                        "entry '{}' holds a record for '{}'",
                        key, record.extension_id
                    ),
                });
            }
        }
        Ok(())
    }
}
