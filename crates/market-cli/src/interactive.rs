//! Interactive conflict prompts
//!
//! Uses dialoguer for terminal-based selection. The prompt blocks, so it runs
//! on tokio's blocking pool.

use async_trait::async_trait;
use colored::Colorize;
use dialoguer::{Input, Select};
use market_core::{ConflictDecision, ConflictResolver, generate_unique_name};

const CHOICES: &[&str] = &["Override", "Rename", "Cancel install"];

/// Asks the user what to do about each colliding file.
///
/// A prompt that cannot be shown (no terminal, interrupted) answers `None`,
/// which cancels the install.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptResolver;

#[async_trait]
impl ConflictResolver for PromptResolver {
    async fn resolve_conflict(&self, existing_path: &str) -> Option<ConflictDecision> {
        let path = existing_path.to_string();
        let answer = tokio::task::spawn_blocking(move || prompt(&path)).await;
        match answer {
            Ok(Ok(decision)) => Some(decision),
            Ok(Err(e)) => {
                tracing::debug!(error = %e, "Conflict prompt unavailable");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "Conflict prompt task failed");
                None
            }
        }
    }
}

fn prompt(existing_path: &str) -> dialoguer::Result<ConflictDecision> {
    eprintln!();
    eprintln!(
        "{} {} already exists",
        "conflict:".yellow().bold(),
        existing_path.cyan()
    );

    let choice = Select::new()
        .with_prompt("What should be done with it?")
        .items(CHOICES)
        .default(0)
        .interact()?;

    let new_path = if choice == 1 {
        Input::<String>::new()
            .with_prompt("Install as")
            .default(generate_unique_name(existing_path))
            .interact_text()?
    } else {
        String::new()
    };

    Ok(decision_for(choice, new_path))
}

fn decision_for(choice: usize, new_path: String) -> ConflictDecision {
    match choice {
        0 => ConflictDecision::Override,
        1 => ConflictDecision::Rename { new_path },
        _ => ConflictDecision::Cancel,
    }
}
