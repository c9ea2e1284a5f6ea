//! History command - list recent builds

use crate::cli::args::{HistoryArgs, OutputFormat};
use crate::cli::commands::verify::format_bytes;
use crate::config::Config;
use crate::error::LayerkitResult;
use crate::history::{BuildHistory, BuildStatus, HistoryEntry};
use crate::ui::{self, UiContext};
use console::style;

/// Execute the history command
pub async fn execute(args: HistoryArgs, config: &Config) -> LayerkitResult<()> {
    let ctx = UiContext::detect();
    let history = BuildHistory::new(config);

    if args.clear {
        history.clear().await?;
        ui::step_ok(&ctx, &format!("Cleared {}", history.path().display()));
        return Ok(());
    }

    let entries = history.recent(args.limit).await?;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
        OutputFormat::Text => {
            if entries.is_empty() {
                ui::step_info(&ctx, "No builds recorded yet");
                if !history.is_enabled() {
                    ui::remark(&ctx, "History is disabled (general.history = false)");
                }
                return Ok(());
            }
            for entry in entries.iter().rev() {
                println!("{}", format_entry(entry));
            }
        }
    }

    Ok(())
}

fn format_entry(entry: &HistoryEntry) -> String {
    let when = entry.timestamp.format("%Y-%m-%d %H:%M:%S");
    match entry.status {
        BuildStatus::Success => format!(
            "{} {}  {} ({})  {} package(s)  {}",
            style("ok  ").green(),
            when,
            entry.bundle,
            entry.runtime,
            entry.packages,
            entry.size_bytes.map(format_bytes).unwrap_or_default(),
        ),
        BuildStatus::Failed => format!(
            "{} {}  {} ({})  {}",
            style("fail").red(),
            when,
            entry.bundle,
            entry.runtime,
            entry
                .error
                .as_deref()
                .and_then(|e| e.lines().next())
                .unwrap_or("unknown error"),
        ),
    }
}
