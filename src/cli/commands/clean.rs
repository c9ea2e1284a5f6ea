//! Clean command - remove build outputs

use crate::cli::args::CleanArgs;
use crate::config::Config;
use crate::error::{LayerkitError, LayerkitResult};
use crate::layer::validate_bundle_name;
use crate::ui::{self, UiContext};
use std::path::PathBuf;
use tokio::fs;

/// Execute the clean command
pub async fn execute(args: CleanArgs, config: &Config) -> LayerkitResult<()> {
    let ctx = UiContext::detect().with_auto_yes(args.yes);

    let name = args.name.as_deref().unwrap_or(&config.layer.name);
    validate_bundle_name(name)?;
    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| config.layer.output_dir.clone());

    let targets = clean_targets(&output_dir, name, args.archive);
    if targets.is_empty() {
        ui::step_info(&ctx, "Nothing to clean");
        return Ok(());
    }

    for target in &targets {
        ui::remark(&ctx, &target.display().to_string());
    }

    let approved = ui::confirm_removal(&ctx, &targets).await?;
    if !approved {
        ui::step_warn_hint(&ctx, "Nothing removed", "Pass --yes to skip the prompt");
        return Ok(());
    }

    for target in &targets {
        remove_path(target).await?;
        ui::step_ok(&ctx, &format!("Removed {}", target.display()));
    }

    Ok(())
}

/// Existing paths the clean would delete
fn clean_targets(output_dir: &std::path::Path, name: &str, include_archive: bool) -> Vec<PathBuf> {
    let mut targets = vec![output_dir.join(name)];
    if include_archive {
        targets.push(output_dir.join(format!("{}.zip", name)));
    }
    targets.retain(|p| p.exists());
    targets
}

async fn remove_path(path: &std::path::Path) -> LayerkitResult<()> {
    let result = if path.is_dir() {
        fs::remove_dir_all(path).await
    } else {
        fs::remove_file(path).await
    };
    result.map_err(|e| LayerkitError::io(format!("removing {}", path.display()), e))
}
