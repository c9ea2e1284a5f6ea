//! Confirmation before removing build output

use super::context::UiContext;
use super::theme::{with_accent, Accent};
use crate::error::{LayerkitError, LayerkitResult};
use std::path::PathBuf;

/// Ask before deleting `targets`.
///
/// `--yes` approves without asking. Without a terminal nothing is removed,
/// so a CI job never deletes build output it was not told to.
pub async fn confirm_removal(ctx: &UiContext, targets: &[PathBuf]) -> LayerkitResult<bool> {
    if ctx.auto_yes() {
        return Ok(true);
    }
    if !ctx.is_interactive() || targets.is_empty() {
        return Ok(false);
    }

    let message = removal_message(targets);
    // cliclack blocks on stdin
    let result = tokio::task::spawn_blocking(move || {
        with_accent(Accent::Destructive, || {
            cliclack::confirm(&message).initial_value(false).interact()
        })
    })
    .await
    .map_err(|e| LayerkitError::User(format!("Prompt task failed: {}", e)))?;

    result.map_err(|e| LayerkitError::User(format!("Prompt failed: {}", e)))
}

fn removal_message(targets: &[PathBuf]) -> String {
    match targets {
        [single] => format!("Remove {}?", single.display()),
        _ => format!("Remove {} paths?", targets.len()),
    }
}
