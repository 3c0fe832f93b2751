//! Core orchestration for the extension marketplace client
//!
//! The [`ExtensionManager`] owns the install ledger and performs install,
//! uninstall, update, and update checks against an injected
//! [`ContentStore`](market_fs::ContentStore), [`HttpClient`](market_catalog::HttpClient),
//! [`TrackingStore`], [`ConflictResolver`], and [`Notifier`].

pub mod config;
pub mod conflict;
pub mod dependency;
pub mod download;
pub mod error;
pub mod journal;
pub mod ledger;
pub mod manager;
pub mod notify;

pub use config::{ConflictPolicy, MarketConfig, RollbackPolicy};
pub use conflict::{
    AlwaysCancel, AlwaysOverride, AutoRename, ConflictDecision, ConflictResolver,
    generate_unique_name, headless_resolver,
};
pub use dependency::DependencyGraph;
pub use error::{Error, Result};
pub use ledger::{JsonTrackingStore, TrackingStore};
pub use manager::ExtensionManager;
pub use notify::{NoticeLevel, Notifier, NullNotifier, TracingNotifier};
