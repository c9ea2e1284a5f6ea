//! Config command - show or edit configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::{ArchiverBackend, Config, ConfigManager, LOCAL_CONFIG_NAME};
use crate::error::{LayerkitError, LayerkitResult};
use crate::layer::{validate_bundle_name, Runtime};
use crate::ui::{self, UiContext};
use clap::ValueEnum;
use std::path::{Path, PathBuf};
use tokio::fs;

/// How a key's value is parsed and stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyKind {
    Str,
    Bool,
    /// Comma-separated list
    List,
}

const CONFIG_KEYS: &[(&str, KeyKind)] = &[
    ("general.log_format", KeyKind::Str),
    ("general.history", KeyKind::Bool),
    ("general.history_file", KeyKind::Str),
    ("layer.name", KeyKind::Str),
    ("layer.runtime", KeyKind::Str),
    ("layer.manifest", KeyKind::Str),
    ("layer.output_dir", KeyKind::Str),
    ("layer.clean", KeyKind::Bool),
    ("layer.keep_staging", KeyKind::Bool),
    ("installer.pip", KeyKind::Str),
    ("installer.npm", KeyKind::Str),
    ("installer.upgrade", KeyKind::Bool),
    ("installer.platform", KeyKind::Str),
    ("installer.extra_args", KeyKind::List),
    ("archive.backend", KeyKind::Str),
    ("archive.zip", KeyKind::Str),
    ("archive.strip_bundle_dir", KeyKind::Bool),
];

/// Execute the config command
pub async fn execute(args: ConfigArgs, config: &Config, manager: &ConfigManager) -> LayerkitResult<()> {
    match args.action {
        None | Some(ConfigAction::Show) => show_config(config)?,
        Some(ConfigAction::Path) => println!("{}", manager.path().display()),
        Some(ConfigAction::Init { force }) => init_config(manager, force).await?,
        Some(ConfigAction::Set { key, value, local }) => {
            let ctx = UiContext::detect();
            if local {
                let cwd = std::env::current_dir()
                    .map_err(|e| LayerkitError::io("getting current directory", e))?;
                let path = set_local_value(&cwd, &key, &value).await?;
                ui::step_ok(&ctx, &format!("Set {} = {} in {}", key, value, path.display()));
            } else {
                // Start from the global file alone so local overrides are not copied into it
                let mut global = manager.load().await?;
                apply_key(&mut global, &key, &value)?;
                manager.save(&global).await?;
                ui::step_ok(&ctx, &format!("Set {} = {}", key, value));
            }
        }
    }

    Ok(())
}

fn show_config(config: &Config) -> LayerkitResult<()> {
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

async fn init_config(manager: &ConfigManager, force: bool) -> LayerkitResult<()> {
    let ctx = UiContext::detect();
    let path = manager.path();

    if path.exists() && !force {
        ui::step_warn_hint(
            &ctx,
            &format!("Config already exists at {}", path.display()),
            "Use --force to overwrite",
        );
        return Ok(());
    }

    manager.save(&Config::default()).await?;
    ui::step_ok_detail(&ctx, "Configuration initialized", &path.display().to_string());

    Ok(())
}

fn key_kind(key: &str) -> LayerkitResult<KeyKind> {
    CONFIG_KEYS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, kind)| *kind)
        .ok_or_else(|| {
            let valid: Vec<&str> = CONFIG_KEYS.iter().map(|(k, _)| *k).collect();
            LayerkitError::User(format!(
                "Unknown config key: {}. Valid keys: {}",
                key,
                valid.join(", ")
            ))
        })
}

/// Validate `value` and store it under `key`
fn apply_key(config: &mut Config, key: &str, value: &str) -> LayerkitResult<()> {
    key_kind(key)?;

    match key {
        "general.log_format" => {
            if !matches!(value, "text" | "json") {
                return Err(LayerkitError::User(format!(
                    "Invalid log format: {}. Use text or json",
                    value
                )));
            }
            config.general.log_format = value.to_string();
        }
        "general.history" => config.general.history = parse_bool(value)?,
        "general.history_file" => {
            config.general.history_file = (!value.is_empty()).then(|| PathBuf::from(value));
        }

        "layer.name" => {
            validate_bundle_name(value)?;
            config.layer.name = value.to_string();
        }
        "layer.runtime" => {
            value.parse::<Runtime>()?;
            config.layer.runtime = value.to_string();
        }
        "layer.manifest" => config.layer.manifest = PathBuf::from(value),
        "layer.output_dir" => config.layer.output_dir = PathBuf::from(value),
        "layer.clean" => config.layer.clean = parse_bool(value)?,
        "layer.keep_staging" => config.layer.keep_staging = parse_bool(value)?,

        "installer.pip" => config.installer.pip = value.to_string(),
        "installer.npm" => config.installer.npm = value.to_string(),
        "installer.upgrade" => config.installer.upgrade = parse_bool(value)?,
        "installer.platform" => {
            config.installer.platform = if value.is_empty() {
                None
            } else {
                Some(value.to_string())
            };
        }
        "installer.extra_args" => config.installer.extra_args = parse_list(value),

        "archive.backend" => {
            config.archive.backend = ArchiverBackend::from_str(value, true)
                .map_err(|_| LayerkitError::User(format!(
                    "Invalid archiver backend: {}. Use zip-cli or native",
                    value
                )))?;
        }
        "archive.zip" => config.archive.zip = value.to_string(),
        "archive.strip_bundle_dir" => config.archive.strip_bundle_dir = parse_bool(value)?,

        _ => return Err(LayerkitError::Internal(format!("unhandled config key {}", key))),
    }

    Ok(())
}

/// Set one key in `<dir>/.layerkit.toml`, keeping only keys the user set
async fn set_local_value(dir: &Path, key: &str, value: &str) -> LayerkitResult<PathBuf> {
    let local_path = dir.join(LOCAL_CONFIG_NAME);

    // Validate against a scratch config before touching the file
    apply_key(&mut Config::default(), key, value)?;
    let kind = key_kind(key)?;

    let mut doc: toml::Value = if local_path.exists() {
        let content = fs::read_to_string(&local_path)
            .await
            .map_err(|e| LayerkitError::io(format!("reading {}", local_path.display()), e))?;
        content
            .parse()
            .map_err(|e: toml::de::Error| LayerkitError::ConfigInvalid {
                path: local_path.clone(),
                reason: e.to_string(),
            })?
    } else {
        toml::Value::Table(toml::map::Map::new())
    };

    set_toml_value(&mut doc, key, typed_value(kind, value)?)?;

    let content = toml::to_string_pretty(&doc)?;
    fs::write(&local_path, content)
        .await
        .map_err(|e| LayerkitError::io(format!("writing {}", local_path.display()), e))?;

    Ok(local_path)
}

fn typed_value(kind: KeyKind, value: &str) -> LayerkitResult<toml::Value> {
    Ok(match kind {
        KeyKind::Str => toml::Value::String(value.to_string()),
        KeyKind::Bool => toml::Value::Boolean(parse_bool(value)?),
        KeyKind::List => toml::Value::Array(
            parse_list(value)
                .into_iter()
                .map(toml::Value::String)
                .collect(),
        ),
    })
}

/// Set a dot-separated key in a TOML tree, creating intermediate tables
fn set_toml_value(doc: &mut toml::Value, key: &str, value: toml::Value) -> LayerkitResult<()> {
    let (parents, leaf) = match key.rsplit_once('.') {
        Some((parents, leaf)) => (parents.split('.').collect::<Vec<_>>(), leaf),
        None => (Vec::new(), key),
    };

    let mut current = doc;
    for part in parents {
        current = current
            .as_table_mut()
            .ok_or_else(|| LayerkitError::User(format!("Expected table at key: {}", part)))?
            .entry(part)
            .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
    }

    current
        .as_table_mut()
        .ok_or_else(|| LayerkitError::User(format!("Expected table for key: {}", key)))?
        .insert(leaf.to_string(), value);
    Ok(())
}

fn parse_bool(value: &str) -> LayerkitResult<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(LayerkitError::User(format!(
            "Invalid boolean value: {}. Use true/false",
            value
        ))),
    }
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
