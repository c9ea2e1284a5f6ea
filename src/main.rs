//! Layerkit - serverless dependency layer builder
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use layerkit::cli::args::BuildArgs;
use layerkit::cli::{Cli, Commands};
use layerkit::config::ConfigManager;
use layerkit::error::{LayerkitError, LayerkitResult};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> LayerkitResult<()> {
    let cli = Cli::parse();
    layerkit::ui::init_theme();

    // Commands that don't need config loading
    match cli.command {
        Some(Commands::Init(args)) => {
            init_logging(cli.verbose, false);
            return layerkit::cli::commands::init(args).await;
        }
        Some(Commands::Completions(args)) => {
            return layerkit::cli::commands::completions(args);
        }
        _ => {}
    }

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };

    let local_config_path = if cli.no_local {
        None
    } else {
        let cwd = std::env::current_dir()
            .map_err(|e| LayerkitError::io("getting current directory", e))?;
        ConfigManager::find_local_config(&cwd)
    };

    let config = config_manager
        .load_merged(local_config_path.as_deref())
        .await?;

    init_logging(cli.verbose, config.general.log_format == "json");
    debug!("Global config: {}", config_manager.path().display());
    match local_config_path {
        Some(ref path) => debug!("Local config: {}", path.display()),
        None if cli.no_local => debug!("Local config discovery disabled (--no-local)"),
        None => debug!("No local config found"),
    }

    match cli.command {
        None => layerkit::cli::commands::build(BuildArgs::default(), &config).await,
        Some(Commands::Build(args)) => layerkit::cli::commands::build(args, &config).await,
        Some(Commands::Verify(args)) => layerkit::cli::commands::verify(args, &config).await,
        Some(Commands::Clean(args)) => layerkit::cli::commands::clean(args, &config).await,
        Some(Commands::Status) => layerkit::cli::commands::status(&config).await,
        Some(Commands::History(args)) => layerkit::cli::commands::history(args, &config).await,
        Some(Commands::Config(args)) => {
            layerkit::cli::commands::config(args, &config, &config_manager).await
        }
        Some(Commands::Init(_)) | Some(Commands::Completions(_)) => {
            unreachable!("handled before config loading")
        }
    }
}

/// 0 = warn (progress output only), 1 = info, 2+ = debug. Logs go to
/// stderr so stdout stays parseable with `--format json`.
fn init_logging(verbose: u8, json: bool) {
    let filter = match verbose {
        0 => EnvFilter::new("layerkit=warn"),
        1 => EnvFilter::new("layerkit=info"),
        _ => EnvFilter::new("layerkit=debug"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if json {
        builder.json().init();
    } else {
        builder.without_time().init();
    }
}
