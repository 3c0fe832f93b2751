//! Wired-up test environments.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use market_core::{
    ConflictPolicy, ExtensionManager, JsonTrackingStore, MarketConfig, RollbackPolicy,
};
use market_fs::{ConfigStore, FsContentStore};
use market_meta::{CatalogManifest, MarketplaceExtension};
use tempfile::TempDir;

use crate::fakes::{
    FakeHttpClient, MemoryContentStore, MemoryTrackingStore, RecordingNotifier, ScriptedResolver,
};
use crate::fixtures::{catalog_json, file_body, file_url};

/// Every collaborator faked in memory.
///
/// ```rust,no_run
/// use market_test_utils::{TestMarket, extension};
///
/// # async fn demo() {
/// let market = TestMarket::new();
/// let writer = extension("writer", "1.0.0");
/// market.publish(&writer);
///
/// let mut manager = market.manager();
/// assert!(manager.install(&writer).await.is_success());
/// # }
/// ```
pub struct TestMarket {
    pub content: Arc<MemoryContentStore>,
    pub http: Arc<FakeHttpClient>,
    pub tracking: Arc<MemoryTrackingStore>,
    pub resolver: Arc<ScriptedResolver>,
    pub notifier: Arc<RecordingNotifier>,
}

impl Default for TestMarket {
    fn default() -> Self {
        Self::new()
    }
}

impl TestMarket {
    pub fn new() -> Self {
        Self::with_tracking(MemoryTrackingStore::new())
    }

    pub fn with_tracking(tracking: MemoryTrackingStore) -> Self {
        Self {
            content: Arc::new(MemoryContentStore::new()),
            http: Arc::new(FakeHttpClient::new()),
            tracking: Arc::new(tracking),
            resolver: Arc::new(ScriptedResolver::new()),
            notifier: Arc::new(RecordingNotifier::new()),
        }
    }

    /// A fresh manager over the shared fakes. Each call starts from whatever
    /// the tracking store last saved.
    pub fn manager(&self) -> ExtensionManager {
        ExtensionManager::new(
            self.content.clone(),
            self.http.clone(),
            self.tracking.clone(),
            self.resolver.clone(),
        )
        .with_notifier(self.notifier.clone())
    }

    /// Serve every package file of `extension` from the fake HTTP client.
    pub fn publish(&self, extension: &MarketplaceExtension) {
        for content in &extension.package_contents {
            self.http
                .ok(&content.download_source, file_body(extension, content));
        }
    }

    /// `id@version` for every record the tracking store last saved.
    pub fn installed_versions(&self) -> Vec<String> {
        self.tracking
            .saved()
            .map(|data| {
                data.installed_extensions
                    .values()
                    .map(|r| format!("{}@{}", r.extension_id, r.installed_version))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Real files in a temporary directory, served over `file://` URLs.
///
/// Layout under the temp root:
///
/// - `content/`: the content store
/// - `installed.json`: the tracking file
/// - `packages/<id>/<version>/`: published package files
/// - `catalog.json`: the published catalog
pub struct TempMarket {
    dir: TempDir,
}

impl Default for TempMarket {
    fn default() -> Self {
        Self::new()
    }
}

impl TempMarket {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    /// A market whose temp root name starts with `prefix`.
    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            dir: tempfile::Builder::new().prefix(prefix).tempdir().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn content_root(&self) -> PathBuf {
        self.root().join("content")
    }

    pub fn tracking_file(&self) -> PathBuf {
        self.root().join("installed.json")
    }

    pub fn catalog_file(&self) -> PathBuf {
        self.root().join("catalog.json")
    }

    pub fn catalog_url(&self) -> String {
        file_url(&self.catalog_file())
    }

    pub fn cache_file(&self) -> PathBuf {
        self.root().join("cache").join("catalog.json")
    }

    pub fn config_file(&self) -> PathBuf {
        self.root().join("config.toml")
    }

    pub fn content_store(&self) -> FsContentStore {
        FsContentStore::new(self.content_root())
    }

    pub fn tracking_store(&self) -> JsonTrackingStore {
        JsonTrackingStore::new(self.tracking_file())
    }

    /// Write the package files of `extension` to disk and return a copy
    /// whose download sources point at them.
    pub fn publish(&self, extension: &MarketplaceExtension) -> MarketplaceExtension {
        let mut published = extension.clone();
        let package_dir = self
            .root()
            .join("packages")
            .join(&extension.unique_id)
            .join(&extension.semantic_version);

        for content in &mut published.package_contents {
            let path = package_dir.join(&content.relative_path);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(&path, file_body(extension, content)).unwrap();
            content.download_source = file_url(&path);
        }
        published
    }

    pub fn write_catalog(&self, manifest: &CatalogManifest) {
        std::fs::write(self.catalog_file(), catalog_json(manifest)).unwrap();
    }

    /// Write `config.toml` pointing every path at this directory.
    pub fn write_config(&self, policy: ConflictPolicy, rollback: RollbackPolicy) -> PathBuf {
        let config = MarketConfig {
            catalog_url: self.catalog_url(),
            content_root: self.content_root(),
            tracking_file: self.tracking_file(),
            catalog_cache_file: Some(self.cache_file()),
            conflict_policy: policy,
            rollback,
            ..MarketConfig::default()
        };
        let path = self.config_file();
        ConfigStore::new().save(&path, &config).unwrap();
        path
    }

    pub fn read_content(&self, relative: &str) -> Option<String> {
        std::fs::read_to_string(self.content_root().join(relative)).ok()
    }
}
