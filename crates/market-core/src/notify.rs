//! User-notification sink
//!
//! Fire-and-forget status messages for the host UI. Nothing the manager does
//! depends on whether a notice was shown.

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

pub trait Notifier: Send + Sync {
    fn notify(&self, level: NoticeLevel, message: &str);
}

/// Forwards notices to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, level: NoticeLevel, message: &str) {
        match level {
            NoticeLevel::Info | NoticeLevel::Success => {
                tracing::info!(target: "market::notice", "{message}")
            }
            NoticeLevel::Warning => tracing::warn!(target: "market::notice", "{message}"),
            NoticeLevel::Error => tracing::error!(target: "market::notice", "{message}"),
        }
    }
}

/// Discards every notice.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _level: NoticeLevel, _message: &str) {}
}
