//! Install, update, and uninstall against a real content root, a JSON
//! tracking file, and `file://` package sources.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use market_catalog::ReqwestClient;
use market_core::{
    AlwaysCancel, AutoRename, ConflictPolicy, ConflictResolver, ExtensionManager, MarketConfig,
    NullNotifier, RollbackPolicy, TrackingStore,
};
use market_meta::{
    ErrorKind, ExtensionKind, LocalExtensionRecord, MarketplaceExtension, TrackingFileData,
};
use market_test_utils::{TempMarket, extension};
use pretty_assertions::assert_eq;

fn manager(env: &TempMarket, resolver: Arc<dyn ConflictResolver>) -> ExtensionManager {
    let http = ReqwestClient::new(Duration::from_secs(5)).unwrap();
    ExtensionManager::new(
        Arc::new(env.content_store()),
        Arc::new(http),
        Arc::new(env.tracking_store()),
        resolver,
    )
    .with_notifier(Arc::new(NullNotifier))
}

fn versions(manager: &ExtensionManager) -> Vec<String> {
    manager
        .list_installed()
        .into_iter()
        .map(|r| format!("{}@{}", r.extension_id, r.installed_version))
        .collect()
}

fn tracking_json(env: &TempMarket) -> serde_json::Value {
    serde_json::from_slice(&std::fs::read(env.tracking_file()).unwrap()).unwrap()
}

#[tokio::test]
async fn install_check_update_round_trip() {
    let env = TempMarket::new();
    let v1 = env.publish(&extension("x", "1.0.0"));
    let mut manager = manager(&env, Arc::new(AlwaysCancel));

    let outcome = manager.install(&v1).await;
    assert!(outcome.is_success(), "{:?}", outcome.error_details);
    assert_eq!(versions(&manager), vec!["x@1.0.0"]);
    assert_eq!(env.read_content("x.md").as_deref(), Some("# x v1.0.0\n\nx.md\n"));

    let doc = tracking_json(&env);
    assert_eq!(doc["formatVersion"], "1.0");
    assert_eq!(doc["installedExtensions"]["x"]["installedVersion"], "1.0.0");
    assert_eq!(
        doc["installedExtensions"]["x"]["installedFilePaths"],
        serde_json::json!(["x.md"])
    );

    let v11 = env.publish(&extension("x", "1.1.0"));
    let updates = manager.check_for_updates(std::slice::from_ref(&v11));
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].available_newer_version, "1.1.0");

    let outcome = manager.update("x", &v11).await;
    assert!(outcome.is_success(), "{:?}", outcome.error_details);
    assert_eq!(versions(&manager), vec!["x@1.1.0"]);
    assert_eq!(env.read_content("x.md").as_deref(), Some("# x v1.1.0\n\nx.md\n"));
    assert!(manager.check_for_updates(&[v11]).is_empty());
}

#[tokio::test]
async fn ledger_survives_restart() {
    let env = TempMarket::new();
    let ext = env.publish(&extension("x", "1.0.0"));
    manager(&env, Arc::new(AlwaysCancel)).install(&ext).await;

    let mut restarted = manager(&env, Arc::new(AlwaysCancel));
    assert!(restarted.install(&ext).await.error_details.unwrap().contains("already installed"));
    assert_eq!(versions(&restarted), vec!["x@1.0.0"]);

    let outcome = restarted.uninstall("x").await;
    assert!(outcome.is_success());
    assert_eq!(env.read_content("x.md"), None);
    assert_eq!(tracking_json(&env)["installedExtensions"], serde_json::json!({}));
}

#[tokio::test]
async fn cycle_through_installed_extension_is_rejected() {
    let env = TempMarket::new();
    let record = LocalExtensionRecord {
        extension_id: "b".into(),
        installed_version: "1.0.0".into(),
        installation_timestamp: Utc::now(),
        installed_file_paths: vec!["b.md".into()],
        linked_dependencies: vec!["a".into()],
    };
    env.tracking_store()
        .save(&TrackingFileData::from_records([record]))
        .unwrap();

    let a = env.publish(&extension("a", "1.0.0").with_dependency("b"));
    let mut manager = manager(&env, Arc::new(AlwaysCancel));
    let outcome = manager.install(&a).await;

    assert!(!outcome.is_success());
    assert_eq!(outcome.error_kind, Some(ErrorKind::Validation));
    assert_eq!(
        outcome.error_details.as_deref(),
        Some("circular dependency detected: a -> b -> a")
    );
    assert_eq!(env.read_content("a.md"), None);
    assert_eq!(versions(&manager), vec!["b@1.0.0"]);
}

#[tokio::test]
async fn dependents_block_uninstall_until_removed() {
    let env = TempMarket::new();
    let x = env.publish(&extension("x", "1.0.0"));
    let y = env.publish(&extension("y", "1.0.0").with_dependency("x"));
    let mut manager = manager(&env, Arc::new(AlwaysCancel));

    assert!(!manager.install(&y).await.is_success());
    assert!(manager.install(&x).await.is_success());
    assert!(manager.install(&y).await.is_success());

    let blocked = manager.uninstall("x").await;
    assert_eq!(
        blocked.error_details.as_deref(),
        Some("cannot uninstall x: required by y")
    );
    assert_eq!(env.read_content("x.md").as_deref(), Some("# x v1.0.0\n\nx.md\n"));

    assert!(manager.uninstall("y").await.is_success());
    assert!(manager.uninstall("x").await.is_success());
    assert!(manager.list_installed().is_empty());
}

#[tokio::test]
async fn repeated_renames_count_up() {
    let env = TempMarket::new();
    std::fs::create_dir_all(env.content_root()).unwrap();
    std::fs::write(env.content_root().join("note.md"), "user note").unwrap();

    let note = |id: &str| {
        env.publish(
            &MarketplaceExtension::new(id, ExtensionKind::Prompt, "1.0.0").with_file(
                "note.md",
                "unused",
                "note.md",
            ),
        )
    };
    let mut manager = manager(&env, Arc::new(AutoRename));

    let first = manager.install(&note("first")).await;
    assert_eq!(first.modified_file_paths, vec!["note-1.md"]);

    let second = manager.install(&note("second")).await;
    assert_eq!(second.modified_file_paths, vec!["note-2.md"]);

    assert_eq!(env.read_content("note.md").as_deref(), Some("user note"));
    assert_eq!(
        manager.get_installed("second").unwrap().installed_file_paths,
        vec!["note-2.md"]
    );
}

#[tokio::test]
async fn failed_update_restores_record_only() {
    let env = TempMarket::new();
    let v1 = env.publish(&extension("x", "1.0.0"));
    let mut manager = manager(&env, Arc::new(AlwaysCancel));
    manager.install(&v1).await;

    // Never published, so every source is missing.
    let mut broken = extension("x", "2.0.0");
    broken.package_contents[0].download_source = market_test_utils::file_url(
        &env.root().join("packages").join("x").join("2.0.0").join("x.md"),
    );

    let outcome = manager.update("x", &broken).await;

    assert!(!outcome.is_success());
    assert_eq!(outcome.error_kind, Some(ErrorKind::Transport));
    assert!(
        outcome
            .error_details
            .as_deref()
            .unwrap()
            .ends_with("restored previous version 1.0.0")
    );
    let mut reloaded = self::manager(&env, Arc::new(AlwaysCancel));
    reloaded.initialize();
    assert_eq!(versions(&reloaded), vec!["x@1.0.0"]);
    assert_eq!(env.read_content("x.md"), None);
}

#[tokio::test]
async fn failed_update_restores_files_when_configured() {
    let env = TempMarket::new();
    let config_path = env.write_config(ConflictPolicy::Cancel, RollbackPolicy::Files);
    let config = MarketConfig::load(&config_path).unwrap();
    assert_eq!(config.content_root, env.content_root());

    let v1 = env.publish(&extension("x", "1.0.0"));
    let mut manager = manager(&env, Arc::new(AlwaysCancel)).with_config(&config);
    manager.install(&v1).await;

    let mut broken = extension("x", "2.0.0");
    broken.package_contents[0].download_source =
        market_test_utils::file_url(&env.root().join("missing.md"));
    let outcome = manager.update("x", &broken).await;

    assert!(!outcome.is_success());
    assert_eq!(outcome.modified_file_paths, vec!["x.md"]);
    assert_eq!(env.read_content("x.md").as_deref(), Some("# x v1.0.0\n\nx.md\n"));
    assert_eq!(versions(&manager), vec!["x@1.0.0"]);
}

#[tokio::test]
async fn corrupt_tracking_file_starts_empty() {
    let env = TempMarket::new();
    std::fs::write(env.tracking_file(), "{ not json").unwrap();
    let ext = env.publish(&extension("x", "1.0.0"));

    let mut manager = manager(&env, Arc::new(AlwaysCancel));
    assert!(manager.list_installed().is_empty());
    assert!(manager.install(&ext).await.is_success());

    assert_eq!(tracking_json(&env)["installedExtensions"]["x"]["extensionId"], "x");
}

#[tokio::test]
async fn cancelled_conflict_writes_nothing() {
    let env = TempMarket::new();
    let ext = env.publish(
        &MarketplaceExtension::new("pack", ExtensionKind::Skill, "1.0.0")
            .with_file("a.md", "unused", "skills/a.md")
            .with_file("b.md", "unused", "skills/b.md"),
    );
    std::fs::create_dir_all(env.content_root().join("skills")).unwrap();
    std::fs::write(env.content_root().join("skills/b.md"), "mine").unwrap();

    let mut manager = manager(&env, Arc::new(AlwaysCancel));
    let outcome = manager.install(&ext).await;

    assert_eq!(outcome.error_kind, Some(ErrorKind::FilesystemConflict));
    assert_eq!(env.read_content("skills/a.md"), None);
    assert_eq!(env.read_content("skills/b.md").as_deref(), Some("mine"));
    assert!(!env.tracking_file().exists());
}
