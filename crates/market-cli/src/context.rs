//! Command context
//!
//! Resolves configuration and command-line overrides once, then builds the
//! catalog cache and extension manager every command works through.

use std::path::PathBuf;
use std::sync::Arc;

use market_catalog::{CatalogCache, HttpClient, ReqwestClient};
use market_core::{
    ConflictPolicy, ConflictResolver, ExtensionManager, JsonTrackingStore, MarketConfig,
    headless_resolver,
};
use market_fs::FsContentStore;

use crate::error::{CliError, Result};
use crate::interactive::PromptResolver;
use crate::notify::ConsoleNotifier;

/// Command-line values that take precedence over the config file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub config: Option<PathBuf>,
    pub catalog_url: Option<String>,
    pub conflict_policy: Option<ConflictPolicy>,
}

pub struct AppContext {
    config: MarketConfig,
    config_path: PathBuf,
    http: Arc<dyn HttpClient>,
}

impl AppContext {
    pub fn load(overrides: Overrides) -> Result<Self> {
        let config_path = overrides.config.unwrap_or_else(MarketConfig::default_path);
        let mut config = MarketConfig::load(&config_path)?;

        if let Some(url) = overrides.catalog_url {
            config.catalog_url = url;
        }
        if let Some(policy) = overrides.conflict_policy {
            config.conflict_policy = policy;
        }

        let http = ReqwestClient::new(config.request_timeout())?;
        tracing::debug!(
            config = %config_path.display(),
            catalog = %config.catalog_url,
            content_root = %config.content_root.display(),
            "Context ready"
        );

        Ok(Self {
            config,
            config_path,
            http: Arc::new(http),
        })
    }

    /// Catalog cache for the configured endpoint.
    pub fn catalog(&self) -> Result<CatalogCache> {
        if self.config.catalog_url.trim().is_empty() {
            return Err(CliError::user(format!(
                "No catalog URL configured. Set catalog_url in {} or pass --catalog-url.",
                self.config_path.display()
            )));
        }

        Ok(self.catalog_state())
    }

    /// Catalog cache without the endpoint check, for commands that only
    /// inspect or discard cached state.
    pub fn catalog_state(&self) -> CatalogCache {
        let cache = CatalogCache::new(
            self.http.clone(),
            self.config.catalog_url.clone(),
            self.config.cache_ttl(),
        );
        match &self.config.catalog_cache_file {
            Some(path) => cache.with_disk_cache(path),
            None => cache,
        }
    }

    /// Extension manager over the configured content root and tracking file.
    pub fn manager(&self) -> ExtensionManager {
        let resolver: Arc<dyn ConflictResolver> = headless_resolver(self.config.conflict_policy)
            .unwrap_or_else(|| Arc::new(PromptResolver));

        let mut manager = ExtensionManager::new(
            Arc::new(FsContentStore::new(&self.config.content_root)),
            self.http.clone(),
            Arc::new(JsonTrackingStore::new(&self.config.tracking_file)),
            resolver,
        )
        .with_config(&self.config)
        .with_notifier(Arc::new(ConsoleNotifier));
        manager.initialize();
        manager
    }
}
