//! Result shapes returned by the extension manager.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Failure classes reported alongside `error_details`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    /// Already installed, not installed, missing or circular dependency,
    /// dependents exist, unsafe target path.
    Validation,
    /// Catalog or file download failed.
    Transport,
    /// Target path is a folder, or the user cancelled a conflict.
    FilesystemConflict,
    /// Tracking store could not be read or written.
    Persistence,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Transport => "transport",
            ErrorKind::FilesystemConflict => "filesystem-conflict",
            ErrorKind::Persistence => "persistence",
        };
        f.write_str(s)
    }
}

/// Universal result of install, uninstall, and update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallationOutcome {
    pub operation_succeeded: bool,
    pub affected_extension_id: String,
    #[serde(default)]
    pub modified_file_paths: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl InstallationOutcome {
    pub fn success(id: impl Into<String>, modified_file_paths: Vec<String>) -> Self {
        Self {
            operation_succeeded: true,
            affected_extension_id: id.into(),
            modified_file_paths,
            error_details: None,
            error_kind: None,
        }
    }

    pub fn failure(id: impl Into<String>, kind: ErrorKind, details: impl Into<String>) -> Self {
        Self {
            operation_succeeded: false,
            affected_extension_id: id.into(),
            modified_file_paths: Vec::new(),
            error_details: Some(details.into()),
            error_kind: Some(kind),
        }
    }

    pub fn is_success(&self) -> bool {
        self.operation_succeeded
    }
}

/// An installed extension whose catalog entry is strictly newer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNotification {
    pub extension_id: String,
    pub currently_installed_version: String,
    pub available_newer_version: String,
}
