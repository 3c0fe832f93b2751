//! Store-relative path handling

use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// A path normalized to use forward slashes internally.
///
/// Content store paths are always relative to the store root. They are
/// normalized to forward slashes and converted to a platform-native path
/// only at the I/O boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizedPath {
    /// Internal representation always uses forward slashes
    inner: String,
}

impl NormalizedPath {
    /// Create a new NormalizedPath from any path-like input.
    ///
    /// Converts backslashes to forward slashes and collapses `.` and empty
    /// segments. No validation is performed; see [`NormalizedPath::relative`].
    pub fn new(path: impl AsRef<Path>) -> Self {
        let raw = path.as_ref().to_string_lossy().replace('\\', "/");
        let leading = if raw.starts_with('/') { "/" } else { "" };
        let joined = raw
            .split('/')
            .filter(|s| !s.is_empty() && *s != ".")
            .collect::<Vec<_>>()
            .join("/");
        Self {
            inner: format!("{leading}{joined}"),
        }
    }

    /// Parse a store-relative path, rejecting anything that could escape the
    /// store root.
    pub fn relative(path: &str) -> Result<Self> {
        if path.trim().is_empty() {
            return Err(Error::invalid_path(path, "path is empty"));
        }
        let normalized = Self::new(path);
        if normalized.inner.starts_with('/') || has_drive_prefix(&normalized.inner) {
            return Err(Error::invalid_path(path, "absolute paths are not allowed"));
        }
        if normalized.inner.split('/').any(|s| s == "..") {
            return Err(Error::invalid_path(path, "parent directory segments are not allowed"));
        }
        if normalized.inner.is_empty() {
            return Err(Error::invalid_path(path, "path has no file component"));
        }
        Ok(normalized)
    }

    /// Get the internal normalized string representation.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Convert to a platform-native PathBuf for I/O operations.
    pub fn to_native(&self) -> PathBuf {
        PathBuf::from(&self.inner)
    }

    /// Join this path with a segment.
    pub fn join(&self, segment: &str) -> Self {
        if self.inner.is_empty() {
            return Self::new(segment);
        }
        Self::new(format!("{}/{}", self.inner, segment))
    }

    /// Get the parent directory.
    pub fn parent(&self) -> Option<Self> {
        match self.inner.rfind('/') {
            Some(0) => Some(Self {
                inner: "/".to_string(),
            }),
            Some(idx) => Some(Self {
                inner: self.inner[..idx].to_string(),
            }),
            None => None,
        }
    }

    /// Get the file name component.
    pub fn file_name(&self) -> Option<&str> {
        self.inner.rsplit('/').next().filter(|s| !s.is_empty())
    }

    /// Get the extension if present.
    ///
    /// Dotfiles such as `.env` have no extension.
    pub fn extension(&self) -> Option<&str> {
        self.file_name().and_then(|name| {
            let idx = name.rfind('.')?;
            if idx == 0 { None } else { Some(&name[idx + 1..]) }
        })
    }

    /// Split into `(directory, stem, extension)`.
    ///
    /// The directory is empty for top-level paths and the extension is empty
    /// when the file name has none.
    pub fn split_name(&self) -> (&str, &str, &str) {
        let (dir, name) = match self.inner.rfind('/') {
            Some(idx) => (&self.inner[..idx], &self.inner[idx + 1..]),
            None => ("", self.inner.as_str()),
        };
        match name.rfind('.') {
            Some(idx) if idx > 0 => (dir, &name[..idx], &name[idx + 1..]),
            _ => (dir, name, ""),
        }
    }
}

fn has_drive_prefix(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

impl AsRef<Path> for NormalizedPath {
    fn as_ref(&self) -> &Path {
        Path::new(&self.inner)
    }
}

impl std::fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl From<&str> for NormalizedPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for NormalizedPath {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<PathBuf> for NormalizedPath {
    fn from(p: PathBuf) -> Self {
        Self::new(p)
    }
}

impl From<&Path> for NormalizedPath {
    fn from(p: &Path) -> Self {
        Self::new(p)
    }
}
