//! Catalog cache over `file://` endpoints feeding the extension manager.

use std::sync::Arc;
use std::time::Duration;

use market_catalog::{CatalogCache, CatalogError, ReqwestClient, SearchFilter};
use market_core::{AlwaysCancel, ExtensionManager, NullNotifier};
use market_meta::ExtensionKind;
use market_test_utils::{TempMarket, catalog, extension};
use pretty_assertions::assert_eq;

fn http() -> Arc<ReqwestClient> {
    Arc::new(ReqwestClient::new(Duration::from_secs(5)).unwrap())
}

#[tokio::test]
async fn stale_copy_served_when_catalog_disappears() {
    let env = TempMarket::new();
    let manifest = catalog(vec![env.publish(&extension("x", "1.0.0"))]);
    env.write_catalog(&manifest);

    let mut cache = CatalogCache::new(http(), env.catalog_url(), Duration::ZERO);
    assert_eq!(cache.fetch_catalog().await.unwrap(), manifest);

    std::fs::remove_file(env.catalog_file()).unwrap();
    assert_eq!(cache.fetch_catalog().await.unwrap(), manifest);
    assert!(cache.cache_status().last_fetched.is_some());
}

#[tokio::test]
async fn disk_copy_backs_a_new_process() {
    let env = TempMarket::new();
    let manifest = catalog(vec![env.publish(&extension("x", "1.0.0"))]);
    env.write_catalog(&manifest);

    CatalogCache::new(http(), env.catalog_url(), Duration::ZERO)
        .with_disk_cache(env.cache_file())
        .fetch_catalog()
        .await
        .unwrap();
    std::fs::write(env.catalog_file(), "<html>maintenance</html>").unwrap();

    let mut restarted =
        CatalogCache::new(http(), env.catalog_url(), Duration::ZERO).with_disk_cache(env.cache_file());
    assert_eq!(restarted.fetch_catalog().await.unwrap(), manifest);

    restarted.clear_cache();
    let err = restarted.fetch_catalog().await.unwrap_err();
    assert!(matches!(err, CatalogError::InvalidFormat { .. }));
}

#[tokio::test]
async fn missing_catalog_without_cache_is_unavailable() {
    let env = TempMarket::new();
    let mut cache = CatalogCache::new(http(), env.catalog_url(), Duration::from_secs(60));

    let err = cache.fetch_catalog().await.unwrap_err();

    assert!(matches!(err, CatalogError::Unavailable { .. }));
    assert!(err.to_string().contains("HTTP 404"));
}

#[tokio::test]
async fn search_result_installs() {
    let env = TempMarket::new();
    let mut skill = extension("reviewer", "1.0.0");
    skill.kind = ExtensionKind::Skill;
    let manifest = catalog(vec![
        env.publish(&extension("writer", "1.0.0")),
        env.publish(&skill),
    ]);
    env.write_catalog(&manifest);

    let client = http();
    let mut cache = CatalogCache::new(client.clone(), env.catalog_url(), Duration::from_secs(60));
    let found = cache
        .search_extensions(&SearchFilter::new().with_kind(ExtensionKind::Skill))
        .await
        .unwrap();
    assert_eq!(found.len(), 1);

    let mut manager = ExtensionManager::new(
        Arc::new(env.content_store()),
        client,
        Arc::new(env.tracking_store()),
        Arc::new(AlwaysCancel),
    )
    .with_notifier(Arc::new(NullNotifier));
    let outcome = manager.install(&found[0]).await;

    assert!(outcome.is_success(), "{:?}", outcome.error_details);
    assert_eq!(
        env.read_content("reviewer.md").as_deref(),
        Some("# reviewer v1.0.0\n\nreviewer.md\n")
    );
    let updates = manager.check_for_updates(&cache.fetch_catalog().await.unwrap().available_extensions);
    assert!(updates.is_empty());
}

#[tokio::test]
async fn escaped_paths_fetch_and_install() {
    let env = TempMarket::with_prefix("market space ");
    let manifest = catalog(vec![env.publish(&extension("writer", "1.0.0"))]);
    env.write_catalog(&manifest);
    assert!(env.catalog_url().contains("%20"));

    let client = http();
    let mut cache = CatalogCache::new(client.clone(), env.catalog_url(), Duration::from_secs(60));
    let fetched = cache.fetch_catalog().await.unwrap();
    assert_eq!(fetched, manifest);

    let mut manager = ExtensionManager::new(
        Arc::new(env.content_store()),
        client,
        Arc::new(env.tracking_store()),
        Arc::new(AlwaysCancel),
    )
    .with_notifier(Arc::new(NullNotifier));
    let outcome = manager.install(&fetched.available_extensions[0]).await;

    assert!(outcome.is_success(), "{:?}", outcome.error_details);
    assert_eq!(
        env.read_content("writer.md").as_deref(),
        Some("# writer v1.0.0\n\nwriter.md\n")
    );
}
