//! TTL catalog cache with stale-on-failure fallback
//!
//! A fresh copy (younger than the TTL) is served without touching the
//! network. Once it expires the catalog is refetched; if that fails for any
//! reason, including a payload that does not validate, the last good copy is
//! served instead and the failure is only logged. An error surfaces only when
//! there is nothing cached at all.
//!
//! When a disk path is configured the last good copy is also written there,
//! so a new process can fall back on it.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use market_meta::{CatalogManifest, MarketplaceExtension};
use serde::{Deserialize, Serialize};

use crate::filter::SearchFilter;
use crate::http::HttpClient;
use crate::validate::parse_catalog;
use crate::{CatalogError, Result};

/// Default catalog time-to-live.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

/// Snapshot reported by [`CatalogCache::cache_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatus {
    pub last_fetched: Option<DateTime<Utc>>,
    /// `age > ttl`. Always false when nothing is cached.
    pub is_stale: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CachedCatalog {
    fetched_at: DateTime<Utc>,
    manifest: CatalogManifest,
}

impl CachedCatalog {
    fn age(&self) -> Duration {
        // A timestamp in the future (clock change) counts as brand new.
        (Utc::now() - self.fetched_at).to_std().unwrap_or(Duration::ZERO)
    }
}

/// Fetches and caches the remote catalog.
pub struct CatalogCache {
    http: Arc<dyn HttpClient>,
    endpoint: String,
    ttl: Duration,
    cached: Option<CachedCatalog>,
    disk_path: Option<PathBuf>,
}

impl CatalogCache {
    pub fn new(http: Arc<dyn HttpClient>, endpoint: impl Into<String>, ttl: Duration) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            ttl,
            cached: None,
            disk_path: None,
        }
    }

    /// Mirror the cache to `path`, seeding from it if it already holds a
    /// readable copy.
    pub fn with_disk_cache(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        self.cached = load_disk(&path);
        if let Some(cached) = &self.cached {
            tracing::debug!(
                path = %path.display(),
                fetched_at = %cached.fetched_at,
                "Seeded catalog cache from disk"
            );
        }
        self.disk_path = Some(path);
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The cached manifest, regardless of age, without any network access.
    pub fn cached_manifest(&self) -> Option<&CatalogManifest> {
        self.cached.as_ref().map(|c| &c.manifest)
    }

    /// Return the catalog, refetching it once the cached copy has expired.
    pub async fn fetch_catalog(&mut self) -> Result<CatalogManifest> {
        if let Some(cached) = &self.cached {
            if cached.age() < self.ttl {
                tracing::debug!("Serving catalog from cache");
                return Ok(cached.manifest.clone());
            }
        }

        match self.fetch_remote().await {
            Ok(manifest) => {
                tracing::info!(
                    extensions = manifest.available_extensions.len(),
                    "Fetched catalog"
                );
                let entry = CachedCatalog {
                    fetched_at: Utc::now(),
                    manifest,
                };
                self.persist(&entry);
                let manifest = entry.manifest.clone();
                self.cached = Some(entry);
                Ok(manifest)
            }
            Err(err) => match &self.cached {
                Some(cached) => {
                    tracing::warn!(
                        error = %err,
                        fetched_at = %cached.fetched_at,
                        "Catalog fetch failed, using stale cache"
                    );
                    Ok(cached.manifest.clone())
                }
                None => Err(match err {
                    CatalogError::InvalidFormat { .. } => err,
                    other => CatalogError::Unavailable {
                        reason: other.to_string(),
                    },
                }),
            },
        }
    }

    /// Extensions matching every criterion in `filter`, in catalog order.
    pub async fn search_extensions(
        &mut self,
        filter: &SearchFilter,
    ) -> Result<Vec<MarketplaceExtension>> {
        let manifest = self.fetch_catalog().await?;
        Ok(manifest
            .available_extensions
            .into_iter()
            .filter(|ext| filter.matches(ext))
            .collect())
    }

    /// Highlighted extensions, in catalog order.
    pub async fn get_featured(&mut self) -> Result<Vec<MarketplaceExtension>> {
        let manifest = self.fetch_catalog().await?;
        Ok(manifest.featured().into_iter().cloned().collect())
    }

    pub async fn get_categories(&mut self) -> Result<Vec<String>> {
        Ok(self.fetch_catalog().await?.known_categories)
    }

    /// Drop everything cached so the next fetch goes to the network.
    pub fn clear_cache(&mut self) {
        self.cached = None;
        if let Some(path) = &self.disk_path {
            match std::fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to remove catalog cache file");
                }
            }
        }
        tracing::debug!("Catalog cache cleared");
    }

    pub fn cache_status(&self) -> CacheStatus {
        match &self.cached {
            Some(cached) => CacheStatus {
                last_fetched: Some(cached.fetched_at),
                is_stale: cached.age() > self.ttl,
            },
            None => CacheStatus {
                last_fetched: None,
                is_stale: false,
            },
        }
    }

    async fn fetch_remote(&self) -> Result<CatalogManifest> {
        let response = self.http.get(&self.endpoint).await?;
        let body = response.into_success(&self.endpoint)?;
        parse_catalog(&body)
    }

    fn persist(&self, entry: &CachedCatalog) {
        let Some(path) = &self.disk_path else {
            return;
        };
        let result = serde_json::to_vec_pretty(entry)
            .map_err(CatalogError::from)
            .and_then(|bytes| market_fs::io::write_atomic(path, &bytes).map_err(CatalogError::from));
        if let Err(e) = result {
            tracing::warn!(path = %path.display(), error = %e, "Failed to persist catalog cache");
        }
    }
}

fn load_disk(path: &Path) -> Option<CachedCatalog> {
    if !path.exists() {
        return None;
    }
    let result = market_fs::io::read_bytes(path)
        .map_err(CatalogError::from)
        .and_then(|bytes| serde_json::from_slice(&bytes).map_err(CatalogError::from));
    match result {
        Ok(cached) => Some(cached),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable catalog cache");
            None
        }
    }
}
