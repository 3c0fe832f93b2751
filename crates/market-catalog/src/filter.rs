//! Catalog search filter

use market_meta::{ExtensionKind, MarketplaceExtension};

/// Conjunctive search criteria. An empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter {
    /// Case-insensitive substring matched against title, summary, tags,
    /// and categories. An empty query is ignored.
    pub query: Option<String>,
    pub kind: Option<ExtensionKind>,
    /// Matches when the extension has any of these categories, compared exactly.
    pub categories: Vec<String>,
}

impl SearchFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_kind(mut self, kind: ExtensionKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.categories.push(category.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.normalized_query().is_none() && self.kind.is_none() && self.categories.is_empty()
    }

    pub fn matches(&self, extension: &MarketplaceExtension) -> bool {
        if self.kind.is_some_and(|kind| kind != extension.kind) {
            return false;
        }

        if !self.categories.is_empty() {
            let wanted = self
                .categories
                .iter()
                .any(|c| extension.categories.contains(c));
            if !wanted {
                return false;
            }
        }

        match self.normalized_query() {
            Some(needle) => text_matches(extension, &needle),
            None => true,
        }
    }

    fn normalized_query(&self) -> Option<String> {
        self.query
            .as_deref()
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase)
    }
}

fn text_matches(extension: &MarketplaceExtension, needle: &str) -> bool {
    let contains = |text: &str| text.to_lowercase().contains(needle);

    contains(&extension.title)
        || contains(&extension.summary)
        || extension.tags.iter().any(|t| contains(t))
        || extension.categories.iter().any(|c| contains(c))
}
