//! Tracking store: persistence for the install ledger
//!
//! The ledger document is read once when the manager starts and rewritten
//! after every mutation. [`JsonTrackingStore`] keeps it as pretty-printed
//! JSON, read under a shared lock and replaced atomically on save.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use market_meta::TrackingFileData;

use crate::{Error, Result};

/// Load and save the install ledger.
pub trait TrackingStore: Send + Sync {
    /// The persisted ledger, or `None` when nothing has been saved yet.
    ///
    /// Unparseable or structurally invalid content is an error; the manager
    /// decides how to recover.
    fn load(&self) -> Result<Option<TrackingFileData>>;

    fn save(&self, data: &TrackingFileData) -> Result<()>;
}

/// Ledger stored as a JSON file.
#[derive(Debug, Clone)]
pub struct JsonTrackingStore {
    path: PathBuf,
}

impl JsonTrackingStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TrackingStore for JsonTrackingStore {
    fn load(&self) -> Result<Option<TrackingFileData>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let file = File::open(&self.path).map_err(|e| Error::tracking(self.path.display(), e))?;
        file.lock_shared()
            .map_err(|e| Error::tracking(self.path.display(), e))?;

        // Read through the locked handle
        let mut content = String::new();
        (&file)
            .read_to_string(&mut content)
            .map_err(|e| Error::tracking(self.path.display(), e))?;

        if content.trim().is_empty() {
            return Ok(None);
        }

        let data: TrackingFileData = serde_json::from_str(&content)
            .map_err(|e| Error::tracking(self.path.display(), format!("unparseable: {e}")))?;
        data.validate()
            .map_err(|e| Error::tracking(self.path.display(), e))?;
        Ok(Some(data))
    }

    fn save(&self, data: &TrackingFileData) -> Result<()> {
        let content = serde_json::to_vec_pretty(data)?;
        market_fs::io::write_atomic(&self.path, &content)
            .map_err(|e| Error::tracking(self.path.display(), e))?;
        tracing::debug!(
            path = %self.path.display(),
            installed = data.installed_extensions.len(),
            "Saved tracking file"
        );
        Ok(())
    }
}
