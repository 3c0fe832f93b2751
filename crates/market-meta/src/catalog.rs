//! The remote catalog document.

use serde::{Deserialize, Serialize};

use crate::extension::MarketplaceExtension;

/// Versioned descriptor of every published extension.
///
/// Ids in `highlighted_extensions` are expected to exist in
/// `available_extensions`, but this is not enforced; unknown ids are simply
/// skipped by [`CatalogManifest::featured`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogManifest {
    pub schema_version: String,
    pub build_timestamp: String,
    pub available_extensions: Vec<MarketplaceExtension>,
    #[serde(default)]
    pub known_categories: Vec<String>,
    #[serde(default)]
    pub highlighted_extensions: Vec<String>,
}

impl CatalogManifest {
    pub fn find(&self, id: &str) -> Option<&MarketplaceExtension> {
        self.available_extensions.iter().find(|e| e.unique_id == id)
    }

    /// Highlighted extensions in catalog order.
    pub fn featured(&self) -> Vec<&MarketplaceExtension> {
        self.available_extensions
            .iter()
            .filter(|e| self.highlighted_extensions.contains(&e.unique_id))
            .collect()
    }

    /// Highlighted ids with no matching catalog entry.
    pub fn dangling_highlights(&self) -> Vec<&str> {
        self.highlighted_extensions
            .iter()
            .filter(|id| self.find(id).is_none())
            .map(String::as_str)
            .collect()
    }
}
