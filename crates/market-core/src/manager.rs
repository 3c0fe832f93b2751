//! Extension manager: install, uninstall, update, and update checks
//!
//! The manager owns the in-memory ledger (`id -> LocalExtensionRecord`). It
//! is loaded from the [`TrackingStore`] once and written back after every
//! mutation. Public operations never return `Err`; every failure becomes an
//! [`InstallationOutcome`] carrying a message and an [`ErrorKind`].
//!
//! Operations take `&mut self`, so one manager runs one operation at a time.
//!
//! [`ErrorKind`]: market_meta::ErrorKind

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use market_catalog::HttpClient;
use market_fs::{ContentStore, EntryKind, NormalizedPath};
use market_meta::{
    InstallationOutcome, LocalExtensionRecord, MarketplaceExtension, TrackingFileData,
    UpdateNotification, is_newer_version,
};

use crate::config::{MarketConfig, RollbackPolicy};
use crate::conflict::{ConflictDecision, ConflictResolver};
use crate::dependency::DependencyGraph;
use crate::download::{DownloadedFile, download_package};
use crate::journal::{FileSnapshot, WriteJournal};
use crate::ledger::TrackingStore;
use crate::notify::{NoticeLevel, Notifier, TracingNotifier};
use crate::{Error, Result};

/// Times the resolver is consulted for one package file before giving up.
pub const MAX_CONFLICT_ROUNDS: usize = 16;

/// Default bound on dependency chain length.
pub const DEFAULT_MAX_DEPENDENCY_DEPTH: usize = 32;

pub struct ExtensionManager {
    content: Arc<dyn ContentStore>,
    http: Arc<dyn HttpClient>,
    tracking: Arc<dyn TrackingStore>,
    resolver: Arc<dyn ConflictResolver>,
    notifier: Arc<dyn Notifier>,
    rollback: RollbackPolicy,
    max_dependency_depth: usize,
    installed: BTreeMap<String, LocalExtensionRecord>,
    loaded: bool,
}

impl ExtensionManager {
    pub fn new(
        content: Arc<dyn ContentStore>,
        http: Arc<dyn HttpClient>,
        tracking: Arc<dyn TrackingStore>,
        resolver: Arc<dyn ConflictResolver>,
    ) -> Self {
        Self {
            content,
            http,
            tracking,
            resolver,
            notifier: Arc::new(TracingNotifier),
            rollback: RollbackPolicy::default(),
            max_dependency_depth: DEFAULT_MAX_DEPENDENCY_DEPTH,
            installed: BTreeMap::new(),
            loaded: false,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_rollback_policy(mut self, policy: RollbackPolicy) -> Self {
        self.rollback = policy;
        self
    }

    pub fn with_max_dependency_depth(mut self, depth: usize) -> Self {
        self.max_dependency_depth = depth;
        self
    }

    /// Apply the policy knobs from a loaded configuration.
    pub fn with_config(self, config: &MarketConfig) -> Self {
        self.with_rollback_policy(config.rollback)
            .with_max_dependency_depth(config.max_dependency_depth)
    }

    /// Load the ledger from the tracking store.
    ///
    /// Missing, unreadable, or invalid tracking data leaves the ledger empty;
    /// this never fails. `install`, `uninstall`, `update`, and
    /// `check_for_updates` call this on first use if the host has not. The
    /// read-only queries below do not, so call this before relying on them.
    pub fn initialize(&mut self) {
        self.installed = match self.tracking.load() {
            Ok(Some(data)) => data.installed_extensions,
            Ok(None) => BTreeMap::new(),
            Err(e) => {
                tracing::warn!(error = %e, "Discarding unreadable tracking data");
                self.notifier.notify(
                    NoticeLevel::Warning,
                    "Installed extension records were unreadable and have been reset",
                );
                BTreeMap::new()
            }
        };
        self.loaded = true;
        tracing::debug!(installed = self.installed.len(), "Ledger loaded");
    }

    fn ensure_loaded(&mut self) {
        if !self.loaded {
            self.initialize();
        }
    }

    /// Installed records, sorted by id. Empty until the ledger is loaded.
    pub fn list_installed(&self) -> Vec<&LocalExtensionRecord> {
        self.installed.values().collect()
    }

    pub fn get_installed(&self, id: &str) -> Option<&LocalExtensionRecord> {
        self.installed.get(id)
    }

    pub fn is_installed(&self, id: &str) -> bool {
        self.installed.contains_key(id)
    }

    /// Download and install `extension`.
    ///
    /// Steps, each of which can fail the install: duplicate check, cycle
    /// check, dependency presence, target path safety, sequential download,
    /// then the write phase. Nothing is written before every file has been
    /// downloaded. If the write phase aborts, every write it made is undone.
    pub async fn install(&mut self, extension: &MarketplaceExtension) -> InstallationOutcome {
        self.ensure_loaded();
        let id = extension.unique_id.clone();
        match self.try_install(extension).await {
            Ok(paths) => {
                self.notifier.notify(
                    NoticeLevel::Success,
                    &format!("Installed {} v{}", extension.title, extension.semantic_version),
                );
                InstallationOutcome::success(id, paths)
            }
            Err(e) => self.failure(&id, "install", e),
        }
    }

    /// Delete an extension's tracked files and its record.
    ///
    /// Refused while another installed extension depends on it. Files that
    /// are already gone are skipped.
    pub async fn uninstall(&mut self, id: &str) -> InstallationOutcome {
        self.ensure_loaded();
        match self.try_uninstall(id) {
            Ok(paths) => {
                self.notifier
                    .notify(NoticeLevel::Success, &format!("Uninstalled {id}"));
                InstallationOutcome::success(id, paths)
            }
            Err(e) => self.failure(id, "uninstall", e),
        }
    }

    /// Replace an installed extension with `extension` (same id).
    ///
    /// Runs uninstall then install. If the install step fails the previous
    /// record is put back into the ledger. Under
    /// [`RollbackPolicy::Files`] the files captured before the uninstall are
    /// rewritten too; under [`RollbackPolicy::Metadata`] they stay deleted.
    pub async fn update(&mut self, id: &str, extension: &MarketplaceExtension) -> InstallationOutcome {
        self.ensure_loaded();
        if extension.unique_id != id {
            let err = Error::ManifestMismatch {
                expected: id.to_string(),
                found: extension.unique_id.clone(),
            };
            return self.failure(id, "update", err);
        }
        let Some(previous) = self.installed.get(id).cloned() else {
            return self.failure(id, "update", Error::NotInstalled { id: id.to_string() });
        };

        let files = match self.rollback {
            RollbackPolicy::Files => Some(FileSnapshot::capture(
                self.content.as_ref(),
                &previous.installed_file_paths,
            )),
            RollbackPolicy::Metadata => None,
        };

        if let Err(e) = self.try_uninstall(id) {
            return self.failure(id, "update", e);
        }

        match self.try_install(extension).await {
            Ok(paths) => {
                self.notifier.notify(
                    NoticeLevel::Success,
                    &format!(
                        "Updated {} from v{} to v{}",
                        extension.title, previous.installed_version, extension.semantic_version
                    ),
                );
                InstallationOutcome::success(id, paths)
            }
            Err(e) => self.restore_after_failed_update(previous, files, e),
        }
    }

    fn restore_after_failed_update(
        &mut self,
        previous: LocalExtensionRecord,
        files: Option<FileSnapshot>,
        cause: Error,
    ) -> InstallationOutcome {
        let id = previous.extension_id.clone();
        let version = previous.installed_version.clone();

        let restored_files = files
            .map(|snapshot| snapshot.restore(self.content.as_ref()))
            .unwrap_or_default();

        self.installed.insert(id.clone(), previous);
        let mut details = format!("{cause}; restored previous version {version}");
        if let Err(e) = self.persist() {
            details.push_str(&format!(" (tracking not saved: {e})"));
        }

        tracing::warn!(
            extension = %id,
            %version,
            files_restored = restored_files.len(),
            "Update failed, previous record restored"
        );
        self.notifier.notify(
            NoticeLevel::Error,
            &format!("Failed to update {id}: {details}"),
        );

        let mut outcome = InstallationOutcome::failure(id, cause.kind(), details);
        outcome.modified_file_paths = restored_files;
        outcome
    }

    /// Installed extensions whose catalog entry is strictly newer, by id.
    pub fn check_for_updates(&mut self, catalog: &[MarketplaceExtension]) -> Vec<UpdateNotification> {
        self.ensure_loaded();
        self.installed
            .values()
            .filter_map(|record| {
                let entry = catalog.iter().find(|e| e.unique_id == record.extension_id)?;
                is_newer_version(&entry.semantic_version, &record.installed_version).then(|| {
                    UpdateNotification {
                        extension_id: record.extension_id.clone(),
                        currently_installed_version: record.installed_version.clone(),
                        available_newer_version: entry.semantic_version.clone(),
                    }
                })
            })
            .collect()
    }

    async fn try_install(&mut self, extension: &MarketplaceExtension) -> Result<Vec<String>> {
        let id = &extension.unique_id;
        if self.installed.contains_key(id) {
            return Err(Error::AlreadyInstalled { id: id.clone() });
        }

        DependencyGraph::from_records(self.installed.values()).check_candidate(
            id,
            &extension.depends_on_extensions,
            self.max_dependency_depth,
        )?;

        let targets = extension
            .package_contents
            .iter()
            .map(|c| safe_target(&c.target_location))
            .collect::<Result<Vec<_>>>()?;

        let files = download_package(self.http.as_ref(), extension).await?;

        let mut journal = WriteJournal::new();
        let written = match self.write_files(&files, &targets, &mut journal).await {
            Ok(written) => written,
            Err(e) => {
                let unrestored = journal.rollback(self.content.as_ref());
                if !unrestored.is_empty() {
                    tracing::warn!(
                        extension = %id,
                        ?unrestored,
                        "Some writes could not be reverted"
                    );
                }
                return Err(e);
            }
        };

        let record = LocalExtensionRecord {
            extension_id: id.clone(),
            installed_version: extension.semantic_version.clone(),
            installation_timestamp: Utc::now(),
            installed_file_paths: written.clone(),
            linked_dependencies: extension.depends_on_extensions.clone(),
        };
        self.installed.insert(id.clone(), record);
        // Files stay on disk and the record stays in memory if this fails
        self.persist()?;

        tracing::info!(
            extension = %id,
            version = %extension.semantic_version,
            files = written.len(),
            "Installed extension"
        );
        Ok(written)
    }

    async fn write_files(
        &self,
        files: &[DownloadedFile],
        targets: &[NormalizedPath],
        journal: &mut WriteJournal,
    ) -> Result<Vec<String>> {
        let mut written = Vec::with_capacity(files.len());
        for (file, target) in files.iter().zip(targets) {
            let path = self.resolve_target(target.clone()).await?;
            journal.write(self.content.as_ref(), &path, &file.bytes)?;
            tracing::debug!(path = %path, source = %file.content.download_source, "Wrote package file");
            written.push(path.to_string());
        }
        Ok(written)
    }

    /// Settle collisions at `target` with the resolver until a writable
    /// path is agreed on.
    async fn resolve_target(&self, mut target: NormalizedPath) -> Result<NormalizedPath> {
        for _ in 0..MAX_CONFLICT_ROUNDS {
            match self.content.stat(&target)? {
                None => return Ok(target),
                Some(EntryKind::Folder) => {
                    return Err(Error::FolderCollision {
                        path: target.to_string(),
                    });
                }
                Some(EntryKind::File) => {}
            }

            let decision = self
                .resolver
                .resolve_conflict(target.as_str())
                .await
                .unwrap_or(ConflictDecision::Cancel);
            tracing::debug!(path = %target, ?decision, "Conflict resolved");

            match decision {
                ConflictDecision::Override => return Ok(target),
                ConflictDecision::Rename { new_path } => target = safe_target(&new_path)?,
                ConflictDecision::Cancel => return Err(Error::Cancelled),
            }
        }

        Err(Error::RenameExhausted {
            path: target.to_string(),
            attempts: MAX_CONFLICT_ROUNDS,
        })
    }

    fn try_uninstall(&mut self, id: &str) -> Result<Vec<String>> {
        let Some(record) = self.installed.get(id) else {
            return Err(Error::NotInstalled { id: id.to_string() });
        };

        let graph = DependencyGraph::from_records(self.installed.values());
        let dependents = graph.dependents_of(id);
        if !dependents.is_empty() {
            return Err(Error::RequiredBy {
                id: id.to_string(),
                dependents: dependents.into_iter().map(str::to_string).collect(),
            });
        }

        for raw in &record.installed_file_paths {
            let Ok(path) = NormalizedPath::relative(raw) else {
                tracing::warn!(extension = %id, path = %raw, "Skipping unsafe tracked path");
                continue;
            };
            if !self.content.delete(&path)? {
                tracing::debug!(path = %path, "Tracked file already gone");
            }
        }

        let removed = record.installed_file_paths.clone();
        self.installed.remove(id);
        self.persist()?;

        tracing::info!(extension = %id, files = removed.len(), "Uninstalled extension");
        Ok(removed)
    }

    fn persist(&self) -> Result<()> {
        let data = TrackingFileData::from_records(self.installed.values().cloned());
        self.tracking.save(&data)
    }

    fn failure(&self, id: &str, operation: &str, error: Error) -> InstallationOutcome {
        tracing::warn!(extension = %id, operation, error = %error, "Operation failed");
        self.notifier.notify(
            NoticeLevel::Error,
            &format!("Failed to {operation} {id}: {error}"),
        );
        InstallationOutcome::failure(id, error.kind(), error.to_string())
    }
}

fn safe_target(raw: &str) -> Result<NormalizedPath> {
    NormalizedPath::relative(raw).map_err(|e| match e {
        market_fs::Error::InvalidPath { path, reason } => Error::UnsafeTarget { path, reason },
        other => Error::Fs(other),
    })
}
