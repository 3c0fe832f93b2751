//! Commands that report on installed extensions

use colored::Colorize;

use super::print_json;
use crate::context::AppContext;
use crate::error::Result;

/// Run the list command
pub fn run_list(ctx: &AppContext, json: bool) -> Result<()> {
    let manager = ctx.manager();
    let installed = manager.list_installed();

    if json {
        return print_json(&installed);
    }
    if installed.is_empty() {
        println!(
            "{} (use {} to add one)",
            "No extensions installed".dimmed(),
            "market install <id>".cyan()
        );
        return Ok(());
    }

    println!("{}", "Installed Extensions".bold());
    println!();
    for record in &installed {
        println!(
            "  {:<20} {:<10} {}",
            record.extension_id.green(),
            record.installed_version,
            record
                .installation_timestamp
                .format("%Y-%m-%d %H:%M")
                .to_string()
                .dimmed()
        );
        for path in &record.installed_file_paths {
            println!("    {}", path.dimmed());
        }
    }
    Ok(())
}

/// Run the outdated command
pub async fn run_outdated(ctx: &AppContext, json: bool) -> Result<()> {
    let mut catalog = ctx.catalog()?;
    let manifest = catalog.fetch_catalog().await?;
    let mut manager = ctx.manager();
    let updates = manager.check_for_updates(&manifest.available_extensions);

    if json {
        return print_json(&updates);
    }
    if updates.is_empty() {
        println!("{} All extensions are up to date", "=>".blue().bold());
        return Ok(());
    }
    for update in &updates {
        println!(
            "  {:<20} {} -> {}",
            update.extension_id.green(),
            update.currently_installed_version.dimmed(),
            update.available_newer_version.cyan()
        );
    }
    println!();
    println!(
        "Run {} to upgrade one.",
        "market update <id>".cyan()
    );
    Ok(())
}
