//! Command implementations for market-cli

pub mod catalog;
pub mod installed;
pub mod lifecycle;

pub use catalog::{run_cache_status, run_categories, run_clear_cache, run_featured, run_search};
pub use installed::{run_list, run_outdated};
pub use lifecycle::{run_install, run_uninstall, run_update};

use serde::Serialize;

use crate::error::Result;

/// Print `value` as pretty JSON on stdout.
pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
