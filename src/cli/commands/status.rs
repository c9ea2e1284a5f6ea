//! Status command - check that the build tools are usable

use crate::archive::create_archiver;
use crate::config::Config;
use crate::error::LayerkitResult;
use crate::install::create_installer;
use crate::layer::{LayerLayout, Runtime};
use console::{style, Emoji};

static CHECK: Emoji<'_, '_> = Emoji("✓ ", "[OK] ");
static CROSS: Emoji<'_, '_> = Emoji("✗ ", "[FAIL] ");
static WARN: Emoji<'_, '_> = Emoji("⚠ ", "[WARN] ");

/// Execute the status command
pub async fn execute(config: &Config) -> LayerkitResult<()> {
    println!("{}", style("Layerkit Status").bold().cyan());

    let mut all_ok = true;

    println!();
    println!("{}", style("Build:").bold());
    let runtime = match config.layer.runtime.parse::<Runtime>() {
        Ok(runtime) => {
            println!("  {} Runtime: {}", CHECK, runtime);
            Some(runtime)
        }
        Err(e) => {
            println!("  {} {}", CROSS, style(e).red());
            all_ok = false;
            None
        }
    };

    if let Some(runtime) = runtime {
        match LayerLayout::new(&config.layer.output_dir, &config.layer.name, runtime) {
            Ok(layout) => {
                println!("  {} Install path: {}", CHECK, layout.install_dir().display());
                println!("  {} Archive: {}", CHECK, layout.archive_path().display());
            }
            Err(e) => {
                println!("  {} {}", CROSS, style(e).red());
                all_ok = false;
            }
        }
    }

    if config.layer.manifest.is_file() {
        println!("  {} Manifest: {}", CHECK, config.layer.manifest.display());
    } else {
        println!(
            "  {} {} - {} not found in this directory",
            WARN,
            style("Manifest").yellow(),
            config.layer.manifest.display()
        );
    }

    if let Some(runtime) = runtime {
        all_ok &= check_installer(config, runtime).await;
    }
    all_ok &= check_archiver(config).await;

    println!();
    if all_ok {
        println!("{}", style("Ready to build").green().bold());
    } else {
        println!(
            "{}",
            style("Some checks failed - see above for details").yellow().bold()
        );
    }

    Ok(())
}

async fn check_installer(config: &Config, runtime: Runtime) -> bool {
    let installer = create_installer(runtime, &config.installer);
    println!();
    println!("{}", style(format!("Installer ({}):", runtime.ecosystem())).bold());

    if !installer.is_available().await {
        println!(
            "  {} {} - {}",
            CROSS,
            style(format!("{} not found", installer.program())).red(),
            install_hint(runtime)
        );
        return false;
    }

    match installer.version().await {
        Ok(version) => println!("  {} {}", CHECK, style(version).green()),
        Err(_) => println!("  {} {}", CHECK, style(installer.program()).green()),
    }

    if let Some(ref platform) = config.installer.platform {
        println!("  {} Target platform: {} (binary wheels only)", CHECK, platform);
    }
    true
}

async fn check_archiver(config: &Config) -> bool {
    let archiver = create_archiver(&config.archive);
    println!();
    println!("{}", style(format!("Archiver ({}):", config.archive.backend)).bold());

    if archiver.is_available().await {
        println!("  {} {}", CHECK, style(archiver.name()).green());
        true
    } else {
        println!(
            "  {} {} - Install zip or set archive.backend = \"native\"",
            CROSS,
            style(format!("{} not found", config.archive.zip)).red()
        );
        false
    }
}

fn install_hint(runtime: Runtime) -> &'static str {
    match runtime.ecosystem() {
        crate::layer::Ecosystem::Python => "Install Python with pip, or set installer.pip",
        crate::layer::Ecosystem::Node => "Install Node.js with npm, or set installer.npm",
    }
}
