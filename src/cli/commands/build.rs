//! Build command - stage, install, archive

use crate::cli::args::{BuildArgs, OutputFormat};
use crate::config::Config;
use crate::error::{LayerkitError, LayerkitResult};
use crate::history::{BuildHistory, HistoryEntry};
use crate::layer::{BuildObserver, BuildReport, BuildStep, LayerBuilder, Manifest};
use crate::ui::{self, InstallProgress, TaskSpinner, UiContext};
use console::style;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Execute the build command
pub async fn execute(args: BuildArgs, config: &Config) -> LayerkitResult<()> {
    let mut config = config.clone();
    apply_overrides(&args, &mut config);

    let ctx = UiContext::detect().with_quiet(args.format == OutputFormat::Json);
    let history = BuildHistory::new(&config);

    let result = match LayerBuilder::from_config(&config) {
        Ok(builder) => run_pipeline(&ctx, &builder).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(report) => {
            history.record(&HistoryEntry::success(&report)).await;
            print_report(&report, args.format)
        }
        Err(e) => {
            history
                .record(&HistoryEntry::failure(
                    &config.layer.name,
                    &config.layer.runtime,
                    &e,
                ))
                .await;
            Err(e)
        }
    }
}

/// Command-line flags win over configuration
fn apply_overrides(args: &BuildArgs, config: &mut Config) {
    if let Some(ref name) = args.name {
        config.layer.name = name.clone();
    }
    if let Some(ref runtime) = args.runtime {
        config.layer.runtime = runtime.clone();
    }
    if let Some(ref manifest) = args.manifest {
        config.layer.manifest = manifest.clone();
    }
    if let Some(ref output_dir) = args.output_dir {
        config.layer.output_dir = output_dir.clone();
    }
    if args.clean {
        config.layer.clean = true;
    }
    if args.remove_staging {
        config.layer.keep_staging = false;
    }
    if args.strip_bundle_dir {
        config.archive.strip_bundle_dir = true;
    }
    if let Some(backend) = args.archiver {
        config.archive.backend = backend;
    }
    if let Some(ref platform) = args.platform {
        config.installer.platform = Some(platform.clone());
    }
}

async fn run_pipeline(ctx: &UiContext, builder: &LayerBuilder) -> LayerkitResult<BuildReport> {
    let layout = builder.layout();
    ui::intro(
        ctx,
        &format!("Building {} for {}", layout.bundle_name(), layout.runtime()),
    );

    let observer = BuildUi::new(ctx, builder);
    builder.build(&observer).await
}

/// Renders pipeline progress: a spinner per step, a bar while installing
struct BuildUi<'a> {
    ctx: &'a UiContext,
    tool: &'a str,
    archiver: &'static str,
    requirements: AtomicUsize,
    spinner: Mutex<TaskSpinner>,
    progress: Mutex<Option<InstallProgress>>,
}

impl<'a> BuildUi<'a> {
    fn new(ctx: &'a UiContext, builder: &'a LayerBuilder) -> Self {
        Self {
            ctx,
            tool: builder.installer().program(),
            archiver: builder.archiver().name(),
            requirements: AtomicUsize::new(0),
            spinner: Mutex::new(TaskSpinner::new(ctx)),
            progress: Mutex::new(None),
        }
    }

    fn spinner(&self) -> MutexGuard<'_, TaskSpinner> {
        self.spinner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn progress(&self) -> MutexGuard<'_, Option<InstallProgress>> {
        self.progress.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn finish_progress(&self) {
        if let Some(progress) = self.progress().take() {
            progress.finish();
        }
    }
}

impl BuildObserver for BuildUi<'_> {
    fn manifest_loaded(&self, manifest: &Manifest) {
        self.requirements
            .store(manifest.requirements.len(), Ordering::Relaxed);
    }

    fn step_started(&self, step: BuildStep) {
        match step {
            BuildStep::Stage => self.spinner().start("Preparing staging directory..."),
            BuildStep::Install => {
                let requirements = self.requirements.load(Ordering::Relaxed);
                *self.progress() = Some(InstallProgress::new(self.ctx, self.tool, requirements));
            }
            BuildStep::Archive => self
                .spinner()
                .start(&format!("Archiving with {}...", self.archiver)),
        }
    }

    fn step_finished(&self, step: BuildStep, path: &Path) {
        match step {
            BuildStep::Stage => self
                .spinner()
                .stop(&format!("Staging directory {}", path.display())),
            BuildStep::Install => {
                self.finish_progress();
                ui::step_ok(
                    self.ctx,
                    &format!(
                        "Installed {} requirement(s)",
                        self.requirements.load(Ordering::Relaxed)
                    ),
                );
            }
            BuildStep::Archive => self.spinner().stop(&format!("Archived {}", path.display())),
        }
    }

    fn step_failed(&self, step: BuildStep, _error: &LayerkitError) {
        match step {
            BuildStep::Stage => self
                .spinner()
                .stop_error("Could not prepare staging directory"),
            BuildStep::Install => {
                self.finish_progress();
                ui::step_error(self.ctx, &format!("{} install failed", self.tool));
            }
            BuildStep::Archive => self.spinner().stop_error("Archiving failed"),
        }
    }

    fn install_skipped(&self, manifest: &Manifest) {
        ui::step_warn_hint(
            self.ctx,
            &format!("{} lists no requirements", manifest.path.display()),
            "the archive will only contain the directory layout",
        );
    }

    fn output(&self, line: String) {
        debug!("{}", line);
        if let Some(ref progress) = *self.progress() {
            progress.on_line(line);
        }
    }
}

fn print_report(report: &BuildReport, format: OutputFormat) -> LayerkitResult<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(report)?);
        }
        OutputFormat::Text => {
            println!(
                "Layer archive created: {}",
                style(report.archive.display()).bold()
            );
            println!(
                "Upload it as a Lambda layer compatible with the {} runtime",
                report.runtime
            );
        }
    }
    Ok(())
}
