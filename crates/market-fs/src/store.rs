//! The content store boundary
//!
//! Every path handed to a [`ContentStore`] is store-relative. The installer
//! never touches the host filesystem directly; it goes through this trait so
//! that hosts can back it with a vault adapter, a sandbox, or memory.

use std::fs;
use std::path::{Path, PathBuf};

use crate::{Error, NormalizedPath, Result, io};

/// What occupies a path in the content store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Folder,
}

/// File read/write/delete by store-relative path.
pub trait ContentStore: Send + Sync {
    /// Report what, if anything, exists at `path`.
    fn stat(&self, path: &NormalizedPath) -> Result<Option<EntryKind>>;

    fn exists(&self, path: &NormalizedPath) -> Result<bool> {
        Ok(self.stat(path)?.is_some())
    }

    fn read(&self, path: &NormalizedPath) -> Result<Vec<u8>>;

    /// Create or replace a file, creating parent folders as needed.
    fn write(&self, path: &NormalizedPath, content: &[u8]) -> Result<()>;

    /// Delete a file. Returns `false` when nothing was there.
    fn delete(&self, path: &NormalizedPath) -> Result<bool>;

    /// Immediate children of a folder, sorted. A missing folder has none.
    fn list_children(&self, path: &NormalizedPath) -> Result<Vec<NormalizedPath>>;
}

/// A content store rooted at a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct FsContentStore {
    root: PathBuf,
}

impl FsContentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &NormalizedPath) -> PathBuf {
        self.root.join(path.to_native())
    }
}

impl ContentStore for FsContentStore {
    fn stat(&self, path: &NormalizedPath) -> Result<Option<EntryKind>> {
        let native = self.resolve(path);
        match fs::metadata(&native) {
            Ok(meta) if meta.is_dir() => Ok(Some(EntryKind::Folder)),
            Ok(_) => Ok(Some(EntryKind::File)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::io(native, e)),
        }
    }

    fn read(&self, path: &NormalizedPath) -> Result<Vec<u8>> {
        io::read_bytes(&self.resolve(path))
    }

    fn write(&self, path: &NormalizedPath, content: &[u8]) -> Result<()> {
        if self.stat(path)? == Some(EntryKind::Folder) {
            return Err(Error::NotAFile {
                path: path.to_string(),
            });
        }
        tracing::debug!(path = %path, bytes = content.len(), "writing content file");
        io::write_atomic(&self.resolve(path), content)
    }

    fn delete(&self, path: &NormalizedPath) -> Result<bool> {
        match self.stat(path)? {
            None => Ok(false),
            Some(EntryKind::Folder) => Err(Error::NotAFile {
                path: path.to_string(),
            }),
            Some(EntryKind::File) => {
                let native = self.resolve(path);
                fs::remove_file(&native).map_err(|e| Error::io(native, e))?;
                tracing::debug!(path = %path, "deleted content file");
                Ok(true)
            }
        }
    }

    fn list_children(&self, path: &NormalizedPath) -> Result<Vec<NormalizedPath>> {
        let native = self.resolve(path);
        let entries = match fs::read_dir(&native) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::io(native, e)),
        };

        let mut children = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::io(&native, e))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            children.push(path.join(&name));
        }
        children.sort();
        Ok(children)
    }
}
