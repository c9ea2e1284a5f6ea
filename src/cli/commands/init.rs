//! Init command - create project-local .layerkit.toml

use crate::cli::args::InitArgs;
use crate::config::LOCAL_CONFIG_NAME;
use crate::error::{LayerkitError, LayerkitResult};
use crate::layer::{Ecosystem, Runtime};
use crate::ui::{self, UiContext};
use tokio::fs;

/// Template for project-local config. `{runtime}`, `{name}` and
/// `{manifest}` are filled in by `render_template`.
const INIT_TEMPLATE: &str = r#"# Layerkit project configuration
# Settings here override your global config (~/.config/layerkit/config.toml)

[layer]
name = "{name}"
runtime = "{runtime}"
manifest = "{manifest}"
# output_dir = "."
# clean = false          # wipe the staging tree before installing
# keep_staging = true    # leave the staging tree after archiving

[installer]
# upgrade = true
# platform = "manylinux2014_x86_64"   # cross-platform wheels only
# extra_args = ["--no-compile"]

[archive]
# backend = "zip-cli"    # zip-cli or native
# strip_bundle_dir = false
"#;

/// Execute the init command
pub async fn execute(args: InitArgs) -> LayerkitResult<()> {
    let ctx = UiContext::detect();

    let target_dir = match args.path {
        Some(ref p) => p.clone(),
        None => std::env::current_dir()
            .map_err(|e| LayerkitError::io("getting current directory", e))?,
    };

    let runtime: Runtime = args.runtime.as_deref().unwrap_or("python3.12").parse()?;
    let config_path = target_dir.join(LOCAL_CONFIG_NAME);

    if config_path.exists() && !args.force {
        return Err(LayerkitError::User(format!(
            "{} already exists. Use --force to overwrite.",
            config_path.display()
        )));
    }

    fs::create_dir_all(&target_dir)
        .await
        .map_err(|e| LayerkitError::io(format!("creating directory {}", target_dir.display()), e))?;

    fs::write(&config_path, render_template(runtime))
        .await
        .map_err(|e| LayerkitError::io(format!("writing {}", config_path.display()), e))?;

    ui::step_ok_detail(
        &ctx,
        "Created project config",
        &config_path.display().to_string(),
    );

    Ok(())
}

fn render_template(runtime: Runtime) -> String {
    let (name, manifest) = match runtime.ecosystem() {
        Ecosystem::Python => ("python-dependencies", "requirements.txt"),
        Ecosystem::Node => ("node-dependencies", "package-list.txt"),
    };
    INIT_TEMPLATE
        .replace("{name}", name)
        .replace("{runtime}", &runtime.to_string())
        .replace("{manifest}", manifest)
}
