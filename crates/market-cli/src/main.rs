//! Extension Market CLI
//!
//! Browse the extension catalog and manage installed extensions.

mod cli;
mod commands;
mod context;
mod error;
mod interactive;
mod logging;
mod notify;

use clap::{CommandFactory, Parser};
use colored::Colorize;

use cli::{Cli, Commands};
use context::{AppContext, Overrides};
use error::Result;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("{} logging disabled: {}", "warning:".yellow().bold(), e);
    }
    if cli.verbose {
        tracing::debug!("Verbose mode enabled");
    }

    let Some(command) = cli.command else {
        println!("{} Extension Market CLI", "market".green().bold());
        println!();
        println!("Run {} for available commands.", "market --help".cyan());
        return Ok(());
    };

    let ctx = AppContext::load(Overrides {
        config: cli.config,
        catalog_url: cli.catalog_url,
        conflict_policy: cli.on_conflict.map(Into::into),
    })?;
    execute_command(&ctx, command, cli.json).await
}

async fn execute_command(ctx: &AppContext, cmd: Commands, json: bool) -> Result<()> {
    match cmd {
        Commands::Search {
            query,
            kind,
            categories,
        } => commands::run_search(ctx, query, kind, categories, json).await,
        Commands::Featured => commands::run_featured(ctx, json).await,
        Commands::Categories => commands::run_categories(ctx, json).await,
        Commands::CacheStatus => commands::run_cache_status(ctx, json),
        Commands::ClearCache => commands::run_clear_cache(ctx),
        Commands::List => commands::run_list(ctx, json),
        Commands::Install { id } => commands::run_install(ctx, &id, json).await,
        Commands::Uninstall { id } => commands::run_uninstall(ctx, &id, json).await,
        Commands::Update { id } => commands::run_update(ctx, &id, json).await,
        Commands::Outdated => commands::run_outdated(ctx, json).await,
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "market", &mut std::io::stdout());
            Ok(())
        }
    }
}
