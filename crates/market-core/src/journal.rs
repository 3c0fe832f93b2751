//! Write journal and file snapshots
//!
//! [`WriteJournal`] records what each install write replaced so an aborted
//! install can put the content store back the way it found it.
//! [`FileSnapshot`] captures an installed extension's files before an update
//! removes them.

use market_fs::{ContentStore, EntryKind, NormalizedPath};

use crate::{Error, Result};

#[derive(Debug)]
struct JournalEntry {
    path: NormalizedPath,
    /// Bytes the write replaced; `None` when the file was new.
    previous: Option<Vec<u8>>,
}

/// Every write performed by one install, in order.
#[derive(Debug, Default)]
pub struct WriteJournal {
    entries: Vec<JournalEntry>,
}

impl WriteJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write `bytes` to `path`, remembering what was there.
    pub fn write(
        &mut self,
        store: &dyn ContentStore,
        path: &NormalizedPath,
        bytes: &[u8],
    ) -> Result<()> {
        let previous = match store.stat(path)? {
            None => None,
            Some(EntryKind::File) => Some(store.read(path)?),
            Some(EntryKind::Folder) => {
                return Err(Error::FolderCollision {
                    path: path.to_string(),
                });
            }
        };

        // Journal first: a failed write is still undone
        self.entries.push(JournalEntry {
            path: path.clone(),
            previous,
        });
        store.write(path, bytes)?;
        Ok(())
    }

    /// Undo every write, newest first. Returns the paths that could not be
    /// restored.
    pub fn rollback(self, store: &dyn ContentStore) -> Vec<NormalizedPath> {
        let mut failed = Vec::new();
        for entry in self.entries.into_iter().rev() {
            let result = match &entry.previous {
                Some(bytes) => store.write(&entry.path, bytes),
                None => store.delete(&entry.path).map(|_| ()),
            };
            match result {
                Ok(()) => tracing::debug!(path = %entry.path, "Reverted write"),
                Err(e) => {
                    tracing::warn!(path = %entry.path, error = %e, "Failed to revert write");
                    failed.push(entry.path);
                }
            }
        }
        failed
    }
}

/// Bytes of a set of files at one point in time.
#[derive(Debug, Default)]
pub struct FileSnapshot {
    files: Vec<(NormalizedPath, Vec<u8>)>,
}

impl FileSnapshot {
    /// Read every existing file among `paths`. Missing or unreadable files
    /// are left out.
    pub fn capture(store: &dyn ContentStore, paths: &[String]) -> Self {
        let mut files = Vec::with_capacity(paths.len());
        for raw in paths {
            let Ok(path) = NormalizedPath::relative(raw) else {
                tracing::warn!(path = %raw, "Skipping unsafe tracked path");
                continue;
            };
            match store.read(&path) {
                Ok(bytes) => files.push((path, bytes)),
                Err(e) => tracing::debug!(path = %raw, error = %e, "Not captured"),
            }
        }
        Self { files }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Rewrite every captured file. Returns the paths restored.
    pub fn restore(&self, store: &dyn ContentStore) -> Vec<String> {
        let mut restored = Vec::with_capacity(self.files.len());
        for (path, bytes) in &self.files {
            match store.write(path, bytes) {
                Ok(()) => restored.push(path.to_string()),
                Err(e) => tracing::warn!(path = %path, error = %e, "Failed to restore file"),
            }
        }
        restored
    }
}
