//! Install-time path conflict protocol
//!
//! When a package file would land on an existing file the install pipeline
//! awaits a [`ConflictResolver`] decision for that path. There is no timeout;
//! a resolver that returns `None` (prompt closed, channel dropped) is treated
//! as [`ConflictDecision::Cancel`].

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use market_fs::NormalizedPath;
use regex::Regex;

use crate::config::ConflictPolicy;

/// What to do about one colliding path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictDecision {
    /// Replace the existing file in place.
    Override,
    /// Write to `new_path` instead.
    Rename { new_path: String },
    /// Abort the whole install.
    Cancel,
}

#[async_trait]
pub trait ConflictResolver: Send + Sync {
    async fn resolve_conflict(&self, existing_path: &str) -> Option<ConflictDecision>;
}

/// Always overwrite.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysOverride;

#[async_trait]
impl ConflictResolver for AlwaysOverride {
    async fn resolve_conflict(&self, _existing_path: &str) -> Option<ConflictDecision> {
        Some(ConflictDecision::Override)
    }
}

/// Always abort.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysCancel;

#[async_trait]
impl ConflictResolver for AlwaysCancel {
    async fn resolve_conflict(&self, _existing_path: &str) -> Option<ConflictDecision> {
        Some(ConflictDecision::Cancel)
    }
}

/// Always rename using [`generate_unique_name`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoRename;

#[async_trait]
impl ConflictResolver for AutoRename {
    async fn resolve_conflict(&self, existing_path: &str) -> Option<ConflictDecision> {
        Some(ConflictDecision::Rename {
            new_path: generate_unique_name(existing_path),
        })
    }
}

/// Resolver for a non-interactive policy. `Prompt` has none; the host
/// supplies its own.
pub fn headless_resolver(policy: ConflictPolicy) -> Option<Arc<dyn ConflictResolver>> {
    match policy {
        ConflictPolicy::Prompt => None,
        ConflictPolicy::Override => Some(Arc::new(AlwaysOverride)),
        ConflictPolicy::Rename => Some(Arc::new(AutoRename)),
        ConflictPolicy::Cancel => Some(Arc::new(AlwaysCancel)),
    }
}

static NUMBERED_STEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+)-(\d+)$").expect("Invalid numbered stem regex"));

/// Next candidate name for a colliding path.
///
/// A stem ending in `-N` has N incremented; any other stem gets `-1`. The
/// directory and extension are kept.
///
/// ```
/// use market_core::generate_unique_name;
///
/// assert_eq!(generate_unique_name("note.md"), "note-1.md");
/// assert_eq!(generate_unique_name("notes/note-1.md"), "notes/note-2.md");
/// ```
pub fn generate_unique_name(path: &str) -> String {
    let normalized = NormalizedPath::new(path);
    let (dir, stem, ext) = normalized.split_name();

    let numbered = NUMBERED_STEM.captures(stem).and_then(|caps| {
        let base = caps.get(1)?.as_str();
        let n: u64 = caps.get(2)?.as_str().parse().ok()?;
        Some(format!("{base}-{}", n.checked_add(1)?))
    });
    let stem = numbered.unwrap_or_else(|| format!("{stem}-1"));

    let name = if ext.is_empty() {
        stem
    } else {
        format!("{stem}.{ext}")
    };
    if dir.is_empty() {
        name
    } else {
        format!("{dir}/{name}")
    }
}
