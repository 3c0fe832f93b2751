//! Terminal notice sink

use colored::Colorize;
use market_core::{NoticeLevel, Notifier};

/// Prints notices to stderr.
///
/// Error notices are skipped: a failed command already ends with an
/// `error:` line.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, level: NoticeLevel, message: &str) {
        match level {
            NoticeLevel::Info => eprintln!("{} {}", "=>".blue().bold(), message),
            NoticeLevel::Success => eprintln!("{} {}", "ok".green().bold(), message),
            NoticeLevel::Warning => eprintln!("{} {}", "warning:".yellow().bold(), message),
            NoticeLevel::Error => tracing::debug!(%message, "Error notice"),
        }
    }
}
