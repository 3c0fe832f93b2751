//! Install, uninstall, and update commands
//!
//! Each prints the operation's `InstallationOutcome` (as JSON with `--json`)
//! and fails the process when the operation did not succeed.

use colored::Colorize;
use market_catalog::CatalogCache;
use market_meta::{InstallationOutcome, MarketplaceExtension, is_newer_version};

use super::print_json;
use crate::context::AppContext;
use crate::error::{CliError, Result};

/// Run the install command
pub async fn run_install(ctx: &AppContext, id: &str, json: bool) -> Result<()> {
    let mut catalog = ctx.catalog()?;
    let extension = find_extension(&mut catalog, id).await?;
    let mut manager = ctx.manager();

    let outcome = manager.install(&extension).await;
    report(&outcome, json)
}

/// Run the uninstall command
pub async fn run_uninstall(ctx: &AppContext, id: &str, json: bool) -> Result<()> {
    let mut manager = ctx.manager();

    let outcome = manager.uninstall(id).await;
    report(&outcome, json)
}

/// Run the update command
///
/// An extension whose installed version is not older than the catalog's is
/// left alone.
pub async fn run_update(ctx: &AppContext, id: &str, json: bool) -> Result<()> {
    let mut catalog = ctx.catalog()?;
    let extension = find_extension(&mut catalog, id).await?;
    let mut manager = ctx.manager();

    if let Some(record) = manager.get_installed(id) {
        if !is_newer_version(&extension.semantic_version, &record.installed_version) {
            if json {
                return print_json(&InstallationOutcome::success(id, Vec::new()));
            }
            println!(
                "{} {} is already up to date (v{})",
                "=>".blue().bold(),
                id.cyan(),
                record.installed_version
            );
            return Ok(());
        }
    }

    let outcome = manager.update(id, &extension).await;
    report(&outcome, json)
}

async fn find_extension(catalog: &mut CatalogCache, id: &str) -> Result<MarketplaceExtension> {
    let manifest = catalog.fetch_catalog().await?;
    manifest
        .find(id)
        .cloned()
        .ok_or_else(|| CliError::user(format!("Extension '{id}' not found in catalog")))
}

fn report(outcome: &InstallationOutcome, json: bool) -> Result<()> {
    if json {
        print_json(outcome)?;
    } else if outcome.is_success() {
        for path in &outcome.modified_file_paths {
            println!("  {} {}", "+".green(), path);
        }
    }

    if outcome.is_success() {
        Ok(())
    } else {
        Err(CliError::Failed {
            message: outcome
                .error_details
                .clone()
                .unwrap_or_else(|| format!("operation on '{}' failed", outcome.affected_extension_id)),
        })
    }
}
