//! Shared test utilities for the extension-market workspace.
//!
//! In-memory stand-ins for every collaborator the manager and catalog cache
//! take by injection, plus fixture builders. Dev-dependency only, never
//! published.
//!
//! # Modules
//!
//! - [`fakes`]: content store, HTTP, tracking store, resolver, notifier
//! - [`fixtures`]: extension and catalog builders
//! - [`market`]: [`TestMarket`] (all fakes wired to a manager) and
//!   [`TempMarket`] (real files in a temp directory)

pub mod fakes;
pub mod fixtures;
pub mod market;

pub use fakes::{
    FakeHttpClient, MemoryContentStore, MemoryTrackingStore, RecordingNotifier, ScriptedResolver,
};
pub use fixtures::{catalog, catalog_json, extension, file_url};
pub use market::{TempMarket, TestMarket};
