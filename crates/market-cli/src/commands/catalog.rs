//! Catalog browsing commands

use colored::Colorize;
use market_catalog::SearchFilter;
use market_meta::{ExtensionKind, MarketplaceExtension};

use super::print_json;
use crate::context::AppContext;
use crate::error::Result;

/// Run the search command
pub async fn run_search(
    ctx: &AppContext,
    query: Option<String>,
    kind: Option<ExtensionKind>,
    categories: Vec<String>,
    json: bool,
) -> Result<()> {
    let filter = SearchFilter {
        query,
        kind,
        categories,
    };
    let mut catalog = ctx.catalog()?;
    let found = catalog.search_extensions(&filter).await?;

    if json {
        return print_json(&found);
    }
    if found.is_empty() {
        println!("{}", "No matching extensions.".dimmed());
        return Ok(());
    }
    print_extensions(&found);
    println!();
    println!(
        "{} {} found. Use {} to add one.",
        "Total:".dimmed(),
        found.len(),
        "market install <id>".cyan()
    );
    Ok(())
}

/// Run the featured command
pub async fn run_featured(ctx: &AppContext, json: bool) -> Result<()> {
    let mut catalog = ctx.catalog()?;
    let featured = catalog.get_featured().await?;

    if json {
        return print_json(&featured);
    }
    println!("{}", "Featured Extensions".bold());
    println!();
    if featured.is_empty() {
        println!("  {}", "None".dimmed());
    } else {
        print_extensions(&featured);
    }
    Ok(())
}

/// Run the categories command
pub async fn run_categories(ctx: &AppContext, json: bool) -> Result<()> {
    let mut catalog = ctx.catalog()?;
    let categories = catalog.get_categories().await?;

    if json {
        return print_json(&categories);
    }
    for category in &categories {
        println!("  {}", category.green());
    }
    Ok(())
}

/// Run the cache-status command
pub fn run_cache_status(ctx: &AppContext, json: bool) -> Result<()> {
    let catalog = ctx.catalog_state();
    let status = catalog.cache_status();

    if json {
        return print_json(&status);
    }
    match status.last_fetched {
        Some(at) => {
            let freshness = if status.is_stale {
                "stale".yellow()
            } else {
                "fresh".green()
            };
            println!("{}: {}", "Last fetched".dimmed(), at.to_rfc3339());
            println!("{}: {}", "Status".dimmed(), freshness);
        }
        None => println!("{}", "Catalog has not been fetched.".dimmed()),
    }
    Ok(())
}

/// Run the clear-cache command
pub fn run_clear_cache(ctx: &AppContext) -> Result<()> {
    let mut catalog = ctx.catalog_state();
    catalog.clear_cache();
    println!("{} Catalog cache cleared", "=>".blue().bold());
    Ok(())
}

fn print_extensions(extensions: &[MarketplaceExtension]) {
    for ext in extensions {
        println!(
            "  {:<20} {:<10} {:<12} {}",
            ext.unique_id.green(),
            ext.semantic_version,
            ext.kind.to_string().dimmed(),
            ext.title
        );
        if !ext.summary.is_empty() {
            println!("  {:<20} {}", "", ext.summary.dimmed());
        }
    }
}
