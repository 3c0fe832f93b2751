//! Extension and catalog builders.

use std::path::Path;

use market_meta::{CatalogManifest, ExtensionKind, MarketplaceExtension, PackageContent};
use url::Url;

/// Host used for fake download sources.
pub const CDN: &str = "https://cdn.example.test";

/// Catalog endpoint used by fake-backed tests.
pub const CATALOG_URL: &str = "https://market.example.test/catalog.json";

/// An agent extension with a single file `<id>.md` installed at `<id>.md`.
pub fn extension(id: &str, version: &str) -> MarketplaceExtension {
    MarketplaceExtension::new(id, ExtensionKind::Agent, version).with_file(
        format!("{id}.md"),
        download_url(id, version, &format!("{id}.md")),
        format!("{id}.md"),
    )
}

pub fn download_url(id: &str, version: &str, relative_path: &str) -> String {
    format!("{CDN}/{id}/{version}/{relative_path}")
}

/// Deterministic body served for a package file.
pub fn file_body(extension: &MarketplaceExtension, content: &PackageContent) -> String {
    format!(
        "# {} v{}\n\n{}\n",
        extension.unique_id, extension.semantic_version, content.relative_path
    )
}

pub fn catalog(extensions: Vec<MarketplaceExtension>) -> CatalogManifest {
    CatalogManifest {
        schema_version: "1.0".to_string(),
        build_timestamp: "2026-01-01T00:00:00Z".to_string(),
        available_extensions: extensions,
        known_categories: Vec::new(),
        highlighted_extensions: Vec::new(),
    }
}

pub fn catalog_json(manifest: &CatalogManifest) -> Vec<u8> {
    serde_json::to_vec_pretty(manifest).unwrap()
}

/// Percent-escaped `file://` URL for an absolute local path.
pub fn file_url(path: &Path) -> String {
    Url::from_file_path(path)
        .expect("file URLs need an absolute path")
        .to_string()
}
