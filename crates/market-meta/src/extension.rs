//! Catalog entries: one installable extension and its package files.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// The closed set of extension kinds the catalog publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtensionKind {
    Agent,
    VoiceAgent,
    Prompt,
    Skill,
    McpServer,
}

impl ExtensionKind {
    pub const ALL: [ExtensionKind; 5] = [
        ExtensionKind::Agent,
        ExtensionKind::VoiceAgent,
        ExtensionKind::Prompt,
        ExtensionKind::Skill,
        ExtensionKind::McpServer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExtensionKind::Agent => "agent",
            ExtensionKind::VoiceAgent => "voice-agent",
            ExtensionKind::Prompt => "prompt",
            ExtensionKind::Skill => "skill",
            ExtensionKind::McpServer => "mcp-server",
        }
    }
}

impl fmt::Display for ExtensionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExtensionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase().replace('_', "-");
        ExtensionKind::ALL
            .into_iter()
            .find(|k| k.as_str() == needle)
            .ok_or_else(|| Error::UnknownKind(s.to_string()))
    }
}

/// One file shipped by an extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageContent {
    /// Path of the file inside the published package.
    pub relative_path: String,
    /// URL the file is fetched from.
    pub download_source: String,
    /// Store-relative path the file is installed to.
    pub target_location: String,
}

/// A published extension as listed in the catalog.
///
/// Immutable from the client's point of view: the whole entry is replaced
/// when the catalog is refetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketplaceExtension {
    pub unique_id: String,
    pub kind: ExtensionKind,
    pub semantic_version: String,
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Free-form keywords.
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_count: Option<u64>,
    /// Files to install, in install order.
    pub package_contents: Vec<PackageContent>,
    /// Ids that must already be installed.
    #[serde(default)]
    pub depends_on_extensions: Vec<String>,
}

impl MarketplaceExtension {
    pub fn new(
        unique_id: impl Into<String>,
        kind: ExtensionKind,
        semantic_version: impl Into<String>,
    ) -> Self {
        let unique_id = unique_id.into();
        Self {
            title: unique_id.clone(),
            unique_id,
            kind,
            semantic_version: semantic_version.into(),
            summary: String::new(),
            author: None,
            tags: Vec::new(),
            categories: Vec::new(),
            rating: None,
            rating_count: None,
            download_count: None,
            package_contents: Vec::new(),
            depends_on_extensions: Vec::new(),
        }
    }

    pub fn with_file(
        mut self,
        relative_path: impl Into<String>,
        download_source: impl Into<String>,
        target_location: impl Into<String>,
    ) -> Self {
        self.package_contents.push(PackageContent {
            relative_path: relative_path.into(),
            download_source: download_source.into(),
            target_location: target_location.into(),
        });
        self
    }

    pub fn with_dependency(mut self, id: impl Into<String>) -> Self {
        self.depends_on_extensions.push(id.into());
        self
    }
}
