//! Lenient version comparison.
//!
//! Catalog versions are not guaranteed to be strict semver. Each version is
//! read as up to three dot-separated numeric components; missing components
//! default to 0, and each component uses its leading digits only (`"3-beta"`
//! reads as 3, `"x"` as 0). The result is normalized to a
//! [`semver::Version`] so ordering is major, then minor, then patch.
//!
//! ```
//! use market_meta::version::is_newer_version;
//!
//! assert!(is_newer_version("2.0.0", "1.9.9"));
//! assert!(!is_newer_version("1.0", "1.0.0"));
//! ```

use std::cmp::Ordering;
use std::fmt;

/// A version normalized to `major.minor.patch`.
#[derive(Debug, Clone)]
pub struct ExtensionVersion {
    inner: semver::Version,
    raw: String,
}

impl ExtensionVersion {
    /// Parse any version string. Never fails.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let body = trimmed
            .strip_prefix('v')
            .or_else(|| trimmed.strip_prefix('V'))
            .unwrap_or(trimmed);

        let mut parts = [0u64; 3];
        for (slot, component) in parts.iter_mut().zip(body.split('.')) {
            *slot = leading_number(component);
        }

        Self {
            inner: semver::Version::new(parts[0], parts[1], parts[2]),
            raw: raw.to_string(),
        }
    }

    pub fn as_semver(&self) -> &semver::Version {
        &self.inner
    }

    /// The string this version was parsed from.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl PartialEq for ExtensionVersion {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl Eq for ExtensionVersion {}

impl PartialOrd for ExtensionVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ExtensionVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.inner.cmp(&other.inner)
    }
}

impl fmt::Display for ExtensionVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn leading_number(component: &str) -> u64 {
    let digits: String = component
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().unwrap_or(0)
}

/// True when `candidate` is strictly newer than `current`. Ties are not newer.
pub fn is_newer_version(candidate: &str, current: &str) -> bool {
    ExtensionVersion::parse(candidate) > ExtensionVersion::parse(current)
}
