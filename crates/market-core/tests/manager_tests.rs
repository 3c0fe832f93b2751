//! Extension manager behavior against in-memory collaborators.

use std::sync::Arc;

use chrono::Utc;
use market_core::{AutoRename, ConflictDecision, ExtensionManager, NoticeLevel, RollbackPolicy};
use market_meta::{
    ErrorKind, ExtensionKind, LocalExtensionRecord, MarketplaceExtension, TrackingFileData,
};
use market_test_utils::fixtures::download_url;
use market_test_utils::{MemoryTrackingStore, TestMarket, extension};
use pretty_assertions::assert_eq;

fn record(id: &str, version: &str, deps: &[&str]) -> LocalExtensionRecord {
    LocalExtensionRecord {
        extension_id: id.to_string(),
        installed_version: version.to_string(),
        installation_timestamp: Utc::now(),
        installed_file_paths: vec![format!("{id}.md")],
        linked_dependencies: deps.iter().map(|d| d.to_string()).collect(),
    }
}

/// A market whose ledger already holds `records`, with their files present.
fn market_with(records: Vec<LocalExtensionRecord>) -> TestMarket {
    let paths: Vec<String> = records
        .iter()
        .flat_map(|r| r.installed_file_paths.clone())
        .collect();
    let market = TestMarket::with_tracking(MemoryTrackingStore::with_data(
        TrackingFileData::from_records(records),
    ));
    for path in paths {
        market.content.put(&path, "existing");
    }
    market
}

fn two_file_extension(id: &str, second_target: &str) -> MarketplaceExtension {
    extension(id, "1.0.0").with_file(
        "extra.md",
        download_url(id, "1.0.0", "extra.md"),
        second_target,
    )
}

// ---------------------------------------------------------------------------
// install
// ---------------------------------------------------------------------------

#[tokio::test]
async fn install_writes_files_and_records_extension() {
    let market = TestMarket::new();
    let writer = extension("writer", "1.0.0");
    market.publish(&writer);
    let mut manager = market.manager();

    let outcome = manager.install(&writer).await;

    assert!(outcome.is_success(), "{outcome:?}");
    assert_eq!(outcome.affected_extension_id, "writer");
    assert_eq!(outcome.modified_file_paths, vec!["writer.md"]);
    assert_eq!(outcome.error_details, None);
    assert_eq!(
        market.content.get_string("writer.md").unwrap(),
        "# writer v1.0.0\n\nwriter.md\n"
    );

    let record = manager.get_installed("writer").unwrap();
    assert_eq!(record.installed_version, "1.0.0");
    assert_eq!(record.installed_file_paths, vec!["writer.md"]);
    assert_eq!(market.installed_versions(), vec!["writer@1.0.0"]);
    assert_eq!(
        market.notifier.messages_at(NoticeLevel::Success),
        vec!["Installed writer v1.0.0"]
    );
}

#[tokio::test]
async fn installing_twice_is_rejected_without_downloading() {
    let market = TestMarket::new();
    let writer = extension("writer", "1.0.0");
    market.publish(&writer);
    let mut manager = market.manager();
    assert!(manager.install(&writer).await.is_success());

    let outcome = manager.install(&writer).await;

    assert!(!outcome.is_success());
    assert_eq!(outcome.error_kind, Some(ErrorKind::Validation));
    assert_eq!(
        outcome.error_details.as_deref(),
        Some("extension 'writer' is already installed; use update instead")
    );
    assert_eq!(manager.list_installed().len(), 1);
    assert_eq!(market.http.calls().len(), 1);
}

#[tokio::test]
async fn circular_dependency_rejected_before_download() {
    let market = market_with(vec![record("b", "1.0.0", &["a"])]);
    let a = extension("a", "1.0.0").with_dependency("b");
    market.publish(&a);
    let mut manager = market.manager();

    let outcome = manager.install(&a).await;

    assert_eq!(
        outcome.error_details.as_deref(),
        Some("circular dependency detected: a -> b -> a")
    );
    assert_eq!(outcome.error_kind, Some(ErrorKind::Validation));
    assert!(market.http.calls().is_empty());
    assert!(!manager.is_installed("a"));
}

#[tokio::test]
async fn missing_dependency_is_named() {
    let market = TestMarket::new();
    let a = extension("a", "1.0.0").with_dependency("b");
    market.publish(&a);
    let mut manager = market.manager();

    let outcome = manager.install(&a).await;

    assert_eq!(outcome.error_details.as_deref(), Some("missing dependency: b"));
    assert!(market.http.calls().is_empty());
}

#[tokio::test]
async fn self_dependency_reported_as_missing() {
    let market = TestMarket::new();
    let a = extension("a", "1.0.0").with_dependency("a");
    let mut manager = market.manager();

    let outcome = manager.install(&a).await;

    assert_eq!(outcome.error_details.as_deref(), Some("missing dependency: a"));
}

#[tokio::test]
async fn installed_dependency_is_linked() {
    let market = market_with(vec![record("base", "1.0.0", &[])]);
    let top = extension("top", "1.0.0").with_dependency("base");
    market.publish(&top);
    let mut manager = market.manager();

    assert!(manager.install(&top).await.is_success());
    assert_eq!(
        manager.get_installed("top").unwrap().linked_dependencies,
        vec!["base"]
    );
}

#[tokio::test]
async fn failed_download_writes_nothing() {
    let market = TestMarket::new();
    let ext = two_file_extension("pair", "extra.md");
    // Only the first file is served
    market.http.ok(&ext.package_contents[0].download_source, "first");
    let mut manager = market.manager();

    let outcome = manager.install(&ext).await;

    assert_eq!(outcome.error_kind, Some(ErrorKind::Transport));
    assert!(outcome.error_details.unwrap().contains("HTTP 404"));
    assert!(market.content.paths().is_empty());
    assert!(market.tracking.saved().is_none());
    assert_eq!(market.http.calls().len(), 2);
}

#[tokio::test]
async fn html_error_page_counts_as_download_failure() {
    let market = TestMarket::new();
    let ext = extension("writer", "1.0.0");
    market.http.ok(
        &ext.package_contents[0].download_source,
        "<!DOCTYPE html><html><body>Sign in</body></html>",
    );
    let mut manager = market.manager();

    let outcome = manager.install(&ext).await;

    assert_eq!(outcome.error_kind, Some(ErrorKind::Transport));
    assert!(outcome.error_details.unwrap().contains("HTML page"));
    assert!(market.content.paths().is_empty());
}

#[tokio::test]
async fn transport_error_is_reported() {
    let market = TestMarket::new();
    let ext = extension("writer", "1.0.0");
    market
        .http
        .fail(&ext.package_contents[0].download_source, "connection timed out");
    let mut manager = market.manager();

    let outcome = manager.install(&ext).await;

    assert_eq!(outcome.error_kind, Some(ErrorKind::Transport));
    assert!(outcome.error_details.unwrap().contains("connection timed out"));
}

#[tokio::test]
async fn unsafe_target_rejected_before_download() {
    let market = TestMarket::new();
    let ext = MarketplaceExtension::new("escape", ExtensionKind::Skill, "1.0.0").with_file(
        "x.md",
        download_url("escape", "1.0.0", "x.md"),
        "../outside.md",
    );
    let mut manager = market.manager();

    let outcome = manager.install(&ext).await;

    assert_eq!(outcome.error_kind, Some(ErrorKind::Validation));
    assert!(outcome.error_details.unwrap().contains("../outside.md"));
    assert!(market.http.calls().is_empty());
}

// ---------------------------------------------------------------------------
// conflicts
// ---------------------------------------------------------------------------

#[tokio::test]
async fn folder_collision_fails_and_reverts_earlier_writes() {
    let market = TestMarket::new();
    let ext = two_file_extension("pair", "notes");
    market.publish(&ext);
    market.content.put("notes/keep.md", "mine");
    let mut manager = market.manager();

    let outcome = manager.install(&ext).await;

    assert_eq!(outcome.error_kind, Some(ErrorKind::FilesystemConflict));
    assert_eq!(
        outcome.error_details.as_deref(),
        Some("path exists as a folder, not a file: notes")
    );
    assert_eq!(market.content.paths(), vec!["notes/keep.md"]);
    assert!(market.resolver.prompts().is_empty());
    assert!(!manager.is_installed("pair"));
}

#[tokio::test]
async fn rename_decision_writes_alternate_path() {
    let market = TestMarket::new();
    let ext = MarketplaceExtension::new("note", ExtensionKind::Prompt, "1.0.0").with_file(
        "note.md",
        download_url("note", "1.0.0", "note.md"),
        "note.md",
    );
    market.publish(&ext);
    market.content.put("note.md", "user's own note");
    market.resolver.push(ConflictDecision::Rename {
        new_path: "note-1.md".into(),
    });
    let mut manager = market.manager();

    let outcome = manager.install(&ext).await;

    assert!(outcome.is_success(), "{outcome:?}");
    assert_eq!(outcome.modified_file_paths, vec!["note-1.md"]);
    assert_eq!(market.content.get_string("note.md").unwrap(), "user's own note");
    assert!(market.content.get("note-1.md").is_some());
    assert_eq!(
        manager.get_installed("note").unwrap().installed_file_paths,
        vec!["note-1.md"]
    );
    assert_eq!(market.resolver.prompts(), vec!["note.md"]);
}

#[tokio::test]
async fn occupied_rename_target_is_resolved_again() {
    let market = TestMarket::new();
    let ext = MarketplaceExtension::new("note", ExtensionKind::Prompt, "1.0.0").with_file(
        "note.md",
        download_url("note", "1.0.0", "note.md"),
        "note.md",
    );
    market.publish(&ext);
    market.content.put("note.md", "one");
    market.content.put("note-1.md", "two");
    let mut manager = ExtensionManager::new(
        market.content.clone(),
        market.http.clone(),
        market.tracking.clone(),
        Arc::new(AutoRename),
    );

    let outcome = manager.install(&ext).await;

    assert_eq!(outcome.modified_file_paths, vec!["note-2.md"]);
    assert_eq!(market.content.get_string("note-1.md").unwrap(), "two");
}

#[tokio::test]
async fn override_decision_replaces_file_in_place() {
    let market = TestMarket::new();
    let ext = extension("writer", "1.0.0");
    market.publish(&ext);
    market.content.put("writer.md", "old");
    market.resolver.push(ConflictDecision::Override);
    let mut manager = market.manager();

    let outcome = manager.install(&ext).await;

    assert_eq!(outcome.modified_file_paths, vec!["writer.md"]);
    assert!(market.content.get_string("writer.md").unwrap().starts_with("# writer"));
}

#[tokio::test]
async fn cancel_aborts_and_restores_store() {
    let market = TestMarket::new();
    let ext = two_file_extension("pair", "taken.md");
    market.publish(&ext);
    market.content.put("taken.md", "keep me");
    market.resolver.push(ConflictDecision::Cancel);
    let mut manager = market.manager();

    let outcome = manager.install(&ext).await;

    assert_eq!(
        outcome.error_details.as_deref(),
        Some("installation cancelled by user")
    );
    assert_eq!(outcome.error_kind, Some(ErrorKind::FilesystemConflict));
    // pair.md was written before the conflict and has been reverted
    assert_eq!(market.content.paths(), vec!["taken.md"]);
    assert_eq!(market.content.get_string("taken.md").unwrap(), "keep me");
    assert!(market.tracking.saved().is_none());
}

#[tokio::test]
async fn closed_prompt_counts_as_cancel() {
    let market = TestMarket::new();
    let ext = extension("writer", "1.0.0");
    market.publish(&ext);
    market.content.put("writer.md", "old");
    market.resolver.push_closed();
    let mut manager = market.manager();

    let outcome = manager.install(&ext).await;

    assert_eq!(
        outcome.error_details.as_deref(),
        Some("installation cancelled by user")
    );
    assert_eq!(market.content.get_string("writer.md").unwrap(), "old");
}

#[tokio::test]
async fn overridden_file_is_restored_when_later_write_fails() {
    let market = TestMarket::new();
    let ext = two_file_extension("pair", "second.md");
    market.publish(&ext);
    market.content.put("pair.md", "original");
    market.resolver.push(ConflictDecision::Override);
    market.content.fail_writes_to("second.md");
    let mut manager = market.manager();

    let outcome = manager.install(&ext).await;

    assert!(!outcome.is_success());
    assert_eq!(market.content.get_string("pair.md").unwrap(), "original");
    assert!(market.content.get("second.md").is_none());
}

// ---------------------------------------------------------------------------
// uninstall
// ---------------------------------------------------------------------------

#[tokio::test]
async fn dependents_block_uninstall_until_removed() {
    let market = market_with(vec![
        record("x", "1.0.0", &[]),
        record("y", "1.0.0", &["x"]),
    ]);
    let mut manager = market.manager();

    let blocked = manager.uninstall("x").await;
    assert_eq!(
        blocked.error_details.as_deref(),
        Some("cannot uninstall x: required by y")
    );
    assert!(market.content.get("x.md").is_some());

    assert!(manager.uninstall("y").await.is_success());
    let removed = manager.uninstall("x").await;
    assert!(removed.is_success());
    assert_eq!(removed.modified_file_paths, vec!["x.md"]);
    assert!(market.content.paths().is_empty());
    assert!(manager.list_installed().is_empty());
    assert!(market.tracking.saved().unwrap().installed_extensions.is_empty());
}

#[tokio::test]
async fn uninstall_tolerates_missing_files() {
    let market = TestMarket::with_tracking(MemoryTrackingStore::with_data(
        TrackingFileData::from_records([record("ghost", "1.0.0", &[])]),
    ));
    let mut manager = market.manager();

    let outcome = manager.uninstall("ghost").await;

    assert!(outcome.is_success());
    assert!(!manager.is_installed("ghost"));
}

#[tokio::test]
async fn uninstalling_unknown_extension_fails() {
    let market = TestMarket::new();
    let mut manager = market.manager();

    let outcome = manager.uninstall("nope").await;

    assert_eq!(
        outcome.error_details.as_deref(),
        Some("extension 'nope' is not installed")
    );
    assert_eq!(market.tracking.save_count(), 0);
}

// ---------------------------------------------------------------------------
// update
// ---------------------------------------------------------------------------

#[tokio::test]
async fn update_replaces_version_and_files() {
    let market = TestMarket::new();
    let v1 = extension("writer", "1.0.0");
    let v2 = extension("writer", "1.1.0");
    market.publish(&v1);
    market.publish(&v2);
    let mut manager = market.manager();
    assert!(manager.install(&v1).await.is_success());

    let outcome = manager.update("writer", &v2).await;

    assert!(outcome.is_success(), "{outcome:?}");
    assert_eq!(manager.get_installed("writer").unwrap().installed_version, "1.1.0");
    assert!(market.content.get_string("writer.md").unwrap().contains("v1.1.0"));
    assert_eq!(market.installed_versions(), vec!["writer@1.1.0"]);
}

#[tokio::test]
async fn failed_update_restores_record_but_not_files() {
    let market = TestMarket::new();
    let v1 = extension("writer", "1.0.0");
    let v2 = extension("writer", "2.0.0");
    market.publish(&v1);
    // v2 files are never served
    let mut manager = market.manager();
    assert!(manager.install(&v1).await.is_success());

    let outcome = manager.update("writer", &v2).await;

    assert!(!outcome.is_success());
    assert_eq!(outcome.error_kind, Some(ErrorKind::Transport));
    assert!(outcome
        .error_details
        .unwrap()
        .ends_with("restored previous version 1.0.0"));
    assert_eq!(manager.get_installed("writer").unwrap().installed_version, "1.0.0");
    assert_eq!(market.installed_versions(), vec!["writer@1.0.0"]);
    assert!(market.content.get("writer.md").is_none());
}

#[tokio::test]
async fn failed_update_restores_files_when_configured() {
    let market = TestMarket::new();
    let v1 = extension("writer", "1.0.0");
    let v2 = extension("writer", "2.0.0");
    market.publish(&v1);
    let mut manager = market.manager().with_rollback_policy(RollbackPolicy::Files);
    assert!(manager.install(&v1).await.is_success());
    let before = market.content.get("writer.md");

    let outcome = manager.update("writer", &v2).await;

    assert!(!outcome.is_success());
    assert_eq!(outcome.modified_file_paths, vec!["writer.md"]);
    assert_eq!(market.content.get("writer.md"), before);
    assert_eq!(manager.get_installed("writer").unwrap().installed_version, "1.0.0");
}

#[tokio::test]
async fn update_propagates_uninstall_failure() {
    let market = market_with(vec![
        record("x", "1.0.0", &[]),
        record("y", "1.0.0", &["x"]),
    ]);
    let mut manager = market.manager();

    let outcome = manager.update("x", &extension("x", "2.0.0")).await;

    assert_eq!(
        outcome.error_details.as_deref(),
        Some("cannot uninstall x: required by y")
    );
    assert!(market.http.calls().is_empty());
}

#[tokio::test]
async fn update_requires_installed_extension_and_matching_id() {
    let market = TestMarket::new();
    let mut manager = market.manager();

    let missing = manager.update("writer", &extension("writer", "2.0.0")).await;
    assert_eq!(
        missing.error_details.as_deref(),
        Some("extension 'writer' is not installed")
    );

    let mismatch = manager.update("writer", &extension("editor", "2.0.0")).await;
    assert_eq!(mismatch.error_kind, Some(ErrorKind::Validation));
}

// ---------------------------------------------------------------------------
// update checks, ledger loading, persistence
// ---------------------------------------------------------------------------

#[tokio::test]
async fn check_for_updates_reports_strictly_newer_versions() {
    let market = market_with(vec![
        record("alpha", "1.0.0", &[]),
        record("beta", "2.0.0", &[]),
        record("gamma", "1.0", &[]),
        record("delta", "1.0.0", &[]),
    ]);
    let mut manager = market.manager();
    manager.initialize();

    let catalog = vec![
        extension("gamma", "1.0.1"),
        extension("beta", "2.0.0"),
        extension("alpha", "1.1.0"),
        extension("omega", "9.0.0"),
    ];
    let updates = manager.check_for_updates(&catalog);

    let summary: Vec<_> = updates
        .iter()
        .map(|u| {
            (
                u.extension_id.as_str(),
                u.currently_installed_version.as_str(),
                u.available_newer_version.as_str(),
            )
        })
        .collect();
    assert_eq!(summary, vec![("alpha", "1.0.0", "1.1.0"), ("gamma", "1.0", "1.0.1")]);
}

#[tokio::test]
async fn corrupt_tracking_data_starts_empty() {
    let market = TestMarket::with_tracking(MemoryTrackingStore::corrupted());
    let mut manager = market.manager();

    manager.initialize();

    assert!(manager.list_installed().is_empty());
    assert_eq!(market.notifier.messages_at(NoticeLevel::Warning).len(), 1);
}

#[tokio::test]
async fn ledger_is_loaded_on_first_operation() {
    let market = market_with(vec![record("writer", "1.0.0", &[])]);
    let writer = extension("writer", "1.0.0");
    let mut manager = market.manager();

    let outcome = manager.install(&writer).await;

    assert!(outcome.error_details.unwrap().contains("already installed"));
}

#[tokio::test]
async fn update_check_loads_ledger() {
    let market = market_with(vec![record("writer", "1.0.0", &[])]);
    let mut manager = market.manager();
    assert!(manager.list_installed().is_empty());

    let updates = manager.check_for_updates(&[extension("writer", "1.1.0")]);

    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].currently_installed_version, "1.0.0");
    assert!(manager.is_installed("writer"));
}

#[tokio::test]
async fn tracking_save_failure_is_a_persistence_error() {
    let market = TestMarket::new();
    let writer = extension("writer", "1.0.0");
    market.publish(&writer);
    market.tracking.set_fail_saves(true);
    let mut manager = market.manager();

    let outcome = manager.install(&writer).await;

    assert_eq!(outcome.error_kind, Some(ErrorKind::Persistence));
    // Files and the in-memory record are kept; the document was not written
    assert!(market.content.get("writer.md").is_some());
    assert!(manager.is_installed("writer"));
    assert!(market.tracking.saved().is_none());
}

#[tokio::test]
async fn failures_are_announced() {
    let market = TestMarket::new();
    let mut manager = market.manager();

    manager.uninstall("nope").await;

    assert_eq!(
        market.notifier.messages_at(NoticeLevel::Error),
        vec!["Failed to uninstall nope: extension 'nope' is not installed"]
    );
}
