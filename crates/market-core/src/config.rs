//! Runtime configuration
//!
//! Loaded through [`ConfigStore`], so TOML, JSON, and YAML files all work.
//! Every field has a default and a missing file yields [`MarketConfig::default`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use market_fs::ConfigStore;
use serde::{Deserialize, Serialize};

use crate::Result;

const APP_DIR: &str = "extension-market";

/// How install-time path collisions are resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictPolicy {
    /// Ask the user.
    #[default]
    Prompt,
    Override,
    Rename,
    Cancel,
}

/// What a failed update puts back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RollbackPolicy {
    /// Restore the ledger entry only; files deleted by the uninstall step
    /// stay deleted.
    #[default]
    #[serde(alias = "metadata-only")]
    Metadata,
    /// Also rewrite the files captured before the uninstall step.
    #[serde(alias = "restore-files")]
    Files,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    pub catalog_url: String,
    pub cache_ttl_secs: u64,
    pub request_timeout_secs: u64,
    /// Root of the content store extensions are installed into.
    pub content_root: PathBuf,
    pub tracking_file: PathBuf,
    /// Mirror of the last good catalog. Unset disables the disk cache.
    pub catalog_cache_file: Option<PathBuf>,
    pub conflict_policy: ConflictPolicy,
    pub rollback: RollbackPolicy,
    pub max_dependency_depth: usize,
}

impl Default for MarketConfig {
    fn default() -> Self {
        let config_dir = config_dir();
        let data_dir = dirs::data_dir()
            .map(|d| d.join(APP_DIR))
            .unwrap_or_else(|| PathBuf::from(".").join(APP_DIR));

        Self {
            catalog_url: String::new(),
            cache_ttl_secs: 3600,
            request_timeout_secs: 30,
            content_root: data_dir.join("content"),
            tracking_file: config_dir.join("installed.json"),
            catalog_cache_file: None,
            conflict_policy: ConflictPolicy::default(),
            rollback: RollbackPolicy::default(),
            max_dependency_depth: 32,
        }
    }
}

impl MarketConfig {
    /// Platform config file location, e.g. `~/.config/extension-market/config.toml`.
    pub fn default_path() -> PathBuf {
        config_dir().join("config.toml")
    }

    /// Load `path`, or defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        let config = ConfigStore::new().load_or_default(path)?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from(".").join(APP_DIR))
}
