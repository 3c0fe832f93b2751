//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use market_core::ConflictPolicy;
use market_meta::ExtensionKind;

/// Extension Market - browse, install, and update extensions
#[derive(Parser, Debug)]
#[command(name = "market")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (TOML, JSON, or YAML)
    #[arg(long, global = true, env = "MARKET_CONFIG")]
    pub config: Option<PathBuf>,

    /// Catalog endpoint, overriding the configured one
    #[arg(long, global = true, env = "MARKET_CATALOG_URL")]
    pub catalog_url: Option<String>,

    /// How to resolve files that already exist at an install target
    #[arg(long, global = true, value_enum)]
    pub on_conflict: Option<ConflictArg>,

    /// Output as JSON for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Search the catalog
    ///
    /// All given criteria must match. The query is matched case-insensitively
    /// against title, summary, tags, and categories.
    ///
    /// Examples:
    ///   market search writer
    ///   market search --kind skill --category Writing
    Search {
        /// Text to look for
        query: Option<String>,

        /// Only extensions of this kind (agent, voice-agent, prompt, skill, mcp-server)
        #[arg(short, long)]
        kind: Option<ExtensionKind>,

        /// Only extensions in this category (repeatable)
        #[arg(short, long = "category")]
        categories: Vec<String>,
    },

    /// List highlighted extensions
    Featured,

    /// List catalog categories
    Categories,

    /// Show when the catalog was last fetched
    CacheStatus,

    /// Discard the cached catalog
    ClearCache,

    /// List installed extensions
    List,

    /// Install an extension from the catalog
    Install {
        /// Extension id
        id: String,
    },

    /// Remove an installed extension and its files
    Uninstall {
        /// Extension id
        id: String,
    },

    /// Replace an installed extension with the catalog version
    Update {
        /// Extension id
        id: String,
    },

    /// List installed extensions with newer catalog versions
    Outdated,

    /// Generate shell completions
    ///
    /// Examples:
    ///   market completions bash > ~/.local/share/bash-completion/completions/market
    ///   market completions zsh > ~/.zfunc/_market
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// `--on-conflict` values.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictArg {
    /// Ask for every colliding file
    Prompt,
    /// Overwrite existing files
    Override,
    /// Write next to existing files under a new name
    Rename,
    /// Abort the install
    Cancel,
}

impl From<ConflictArg> for ConflictPolicy {
    fn from(arg: ConflictArg) -> Self {
        match arg {
            ConflictArg::Prompt => ConflictPolicy::Prompt,
            ConflictArg::Override => ConflictPolicy::Override,
            ConflictArg::Rename => ConflictPolicy::Rename,
            ConflictArg::Cancel => ConflictPolicy::Cancel,
        }
    }
}
