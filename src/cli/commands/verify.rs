//! Verify command - check a built layer archive

use crate::archive::{verify_layer, ArchiveListing, LayerLimits, VerifyReport};
use crate::cli::args::{OutputFormat, VerifyArgs};
use crate::config::Config;
use crate::error::{LayerkitError, LayerkitResult};
use crate::layer::{LayerLayout, Manifest, Runtime};
use crate::ui::{self, UiContext};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Execute the verify command
pub async fn execute(args: VerifyArgs, config: &Config) -> LayerkitResult<()> {
    let ctx = UiContext::detect().with_quiet(args.format == OutputFormat::Json);
    let runtime: Runtime = args
        .runtime
        .as_deref()
        .unwrap_or(&config.layer.runtime)
        .parse()?;

    let archive = match args.archive {
        Some(ref path) => path.clone(),
        None => LayerLayout::new(&config.layer.output_dir, &config.layer.name, runtime)?
            .archive_path(),
    };
    if !archive.is_file() {
        return Err(LayerkitError::PathNotFound(archive));
    }

    let bundle_name = args
        .name
        .clone()
        .or_else(|| bundle_name_from_archive(&archive))
        .unwrap_or_else(|| config.layer.name.clone());
    let layout = LayerLayout::new(
        archive.parent().unwrap_or(Path::new(".")),
        bundle_name,
        runtime,
    )?;

    let manifest = load_manifest(&args, config, runtime).await?;

    let listing = read_listing(&archive).await?;
    let candidates = layout.archive_root_candidates();
    let expected_root = listing
        .detect_root(&candidates)
        .map(str::to_string)
        .unwrap_or_else(|| layout.archive_root(false));
    debug!("Verifying {} against root {}", archive.display(), expected_root);

    let report = verify_layer(&listing, &expected_root, manifest.as_ref(), LayerLimits::default());

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print_report(&ctx, &report, manifest.is_some()),
    }

    if report.is_ok() {
        Ok(())
    } else {
        Err(LayerkitError::VerifyFailed(failure_summary(&report)))
    }
}

/// `python-dependencies.zip` -> `python-dependencies`
fn bundle_name_from_archive(archive: &Path) -> Option<String> {
    archive
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
}

/// An explicit manifest must exist; the configured one is optional
async fn load_manifest(
    args: &VerifyArgs,
    config: &Config,
    runtime: Runtime,
) -> LayerkitResult<Option<Manifest>> {
    if args.no_manifest {
        return Ok(None);
    }

    let (path, explicit): (PathBuf, bool) = match args.manifest {
        Some(ref path) => (path.clone(), true),
        None => (config.layer.manifest.clone(), false),
    };

    if !explicit && !path.is_file() {
        debug!("No manifest at {}, skipping package check", path.display());
        return Ok(None);
    }

    Manifest::from_file(&path, runtime.ecosystem()).await.map(Some)
}

async fn read_listing(archive: &Path) -> LayerkitResult<ArchiveListing> {
    let archive = archive.to_path_buf();
    tokio::task::spawn_blocking(move || ArchiveListing::read(&archive))
        .await
        .map_err(|e| LayerkitError::Internal(format!("archive read task failed: {}", e)))?
}

fn print_report(ctx: &UiContext, report: &VerifyReport, checked_packages: bool) {
    ui::intro(ctx, &format!("Verifying {}", report.archive.display()));

    ui::section(ctx, "Layout");
    if report.misplaced.is_empty() {
        ui::step_ok_detail(ctx, "All entries under the install path", &report.expected_root);
    } else {
        ui::step_error(
            ctx,
            &format!("{} entries outside {}", report.misplaced.len(), report.expected_root),
        );
        for name in report.misplaced.iter().take(10) {
            ui::remark(ctx, name);
        }
    }

    ui::section(ctx, "Packages");
    if !checked_packages {
        ui::remark(ctx, "No manifest, package check skipped");
    } else {
        for name in &report.present {
            ui::step_ok(ctx, name);
        }
        for name in &report.missing {
            ui::step_error(ctx, &format!("{} not found", name));
        }
    }

    ui::section(ctx, "Size");
    ui::key_value(ctx, "Zipped", &format_bytes(report.zipped_bytes));
    ui::key_value(ctx, "Unzipped", &format_bytes(report.unzipped_bytes));
    for warning in &report.warnings {
        ui::step_warn(ctx, warning);
    }

    if report.is_ok() {
        ui::outro_success(ctx, "Layer archive looks good");
    }
}

fn failure_summary(report: &VerifyReport) -> String {
    let mut problems = Vec::new();
    if !report.misplaced.is_empty() {
        problems.push(format!(
            "{} entries outside {}",
            report.misplaced.len(),
            report.expected_root
        ));
    }
    if !report.missing.is_empty() {
        problems.push(format!("missing packages: {}", report.missing.join(", ")));
    }
    problems.join("; ")
}

/// Human-readable byte count (KiB/MiB)
pub(crate) fn format_bytes(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = 1024.0 * 1024.0;
    let value = bytes as f64;
    if value >= MIB {
        format!("{:.1} MiB", value / MIB)
    } else if value >= KIB {
        format!("{:.1} KiB", value / KIB)
    } else {
        format!("{} B", bytes)
    }
}
