//! Layer build pipeline
//!
//! Stage, install, archive, report. Every step must succeed before the
//! next one starts; the first failure ends the build.

use crate::archive::{create_archiver, Archiver};
use crate::config::Config;
use crate::error::{LayerkitError, LayerkitResult};
use crate::install::{create_installer, InstallRequest, Installer};
use crate::layer::layout::LayerLayout;
use crate::layer::manifest::Manifest;
use crate::layer::runtime::Runtime;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::fs;
use tracing::{debug, info};

/// Behavior switches for one build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOptions {
    /// Remove the staging tree before installing
    pub clean: bool,
    /// Leave the staging tree on disk after archiving
    pub keep_staging: bool,
    /// Archive the bundle's contents instead of the bundle directory
    pub strip_bundle_dir: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            clean: false,
            keep_staging: true,
            strip_bundle_dir: false,
        }
    }
}

impl BuildOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            clean: config.layer.clean,
            keep_staging: config.layer.keep_staging,
            strip_bundle_dir: config.archive.strip_bundle_dir,
        }
    }
}

/// Summary of a finished build
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    pub bundle: String,
    pub runtime: String,
    pub archive: PathBuf,
    /// Hex SHA-256 of the archive
    pub sha256: String,
    pub size_bytes: u64,
    /// Number of manifest requirements
    pub packages: usize,
    /// False when the manifest was empty and the installer was skipped
    pub installed: bool,
    /// Staging tree, unless it was removed after archiving
    pub staging_dir: Option<PathBuf>,
    pub duration_ms: u64,
}

/// Pipeline steps reported to a [`BuildObserver`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStep {
    Stage,
    Install,
    Archive,
}

/// Progress hooks for [`LayerBuilder::build`].
///
/// Every hook defaults to a no-op. Any `Fn(String)` closure is an observer
/// that only receives installer output.
pub trait BuildObserver: Send + Sync {
    fn manifest_loaded(&self, _manifest: &Manifest) {}

    fn step_started(&self, _step: BuildStep) {}

    /// `path` is the install dir for staging and install, the archive for archiving
    fn step_finished(&self, _step: BuildStep, _path: &Path) {}

    fn step_failed(&self, _step: BuildStep, _error: &LayerkitError) {}

    /// The manifest lists nothing to install
    fn install_skipped(&self, _manifest: &Manifest) {}

    /// One line of installer output
    fn output(&self, _line: String) {}
}

impl<F> BuildObserver for F
where
    F: Fn(String) + Send + Sync,
{
    fn output(&self, line: String) {
        self(line)
    }
}

fn observed<T>(
    observer: &dyn BuildObserver,
    step: BuildStep,
    result: LayerkitResult<T>,
) -> LayerkitResult<T> {
    if let Err(ref e) = result {
        observer.step_failed(step, e);
    }
    result
}

/// Builds one layer archive from one manifest
pub struct LayerBuilder {
    layout: LayerLayout,
    manifest_path: PathBuf,
    options: BuildOptions,
    installer: Box<dyn Installer>,
    archiver: Box<dyn Archiver>,
}

impl LayerBuilder {
    /// Create a builder with default options
    pub fn new(
        layout: LayerLayout,
        manifest_path: impl Into<PathBuf>,
        installer: Box<dyn Installer>,
        archiver: Box<dyn Archiver>,
    ) -> Self {
        Self {
            layout,
            manifest_path: manifest_path.into(),
            options: BuildOptions::default(),
            installer,
            archiver,
        }
    }

    /// Create a builder with the installer and archiver the config selects
    pub fn from_config(config: &Config) -> LayerkitResult<Self> {
        let runtime: Runtime = config.layer.runtime.parse()?;
        let layout = LayerLayout::new(
            config.layer.output_dir.clone(),
            config.layer.name.clone(),
            runtime,
        )?;

        Ok(Self::new(
            layout,
            config.layer.manifest.clone(),
            create_installer(runtime, &config.installer),
            create_archiver(&config.archive),
        )
        .with_options(BuildOptions::from_config(config)))
    }

    pub fn with_options(mut self, options: BuildOptions) -> Self {
        self.options = options;
        self
    }

    pub fn layout(&self) -> &LayerLayout {
        &self.layout
    }

    pub fn options(&self) -> BuildOptions {
        self.options
    }

    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    pub fn installer(&self) -> &dyn Installer {
        &*self.installer
    }

    pub fn archiver(&self) -> &dyn Archiver {
        &*self.archiver
    }

    /// Run every step in order, reporting progress to `observer`
    pub async fn build(&self, observer: &dyn BuildObserver) -> LayerkitResult<BuildReport> {
        let started = Instant::now();

        // Fail before installing anything if the archive step cannot run
        self.check_archiver().await?;
        let manifest = self.load_manifest().await?;
        observer.manifest_loaded(&manifest);

        observer.step_started(BuildStep::Stage);
        let install_dir = observed(observer, BuildStep::Stage, self.prepare_staging().await)?;
        observer.step_finished(BuildStep::Stage, &install_dir);

        let installed = if manifest.is_empty() {
            observer.install_skipped(&manifest);
            false
        } else {
            observer.step_started(BuildStep::Install);
            let on_output = |line: String| observer.output(line);
            let installed = observed(
                observer,
                BuildStep::Install,
                self.install(&manifest, &on_output).await,
            )?;
            observer.step_finished(BuildStep::Install, &install_dir);
            installed
        };

        observer.step_started(BuildStep::Archive);
        let archive = observed(observer, BuildStep::Archive, self.archive().await)?;
        observer.step_finished(BuildStep::Archive, &archive);

        self.finish(&manifest, installed, started).await
    }

    /// Error out when the configured archiver cannot run here
    async fn check_archiver(&self) -> LayerkitResult<()> {
        if self.archiver.is_available().await {
            return Ok(());
        }
        Err(LayerkitError::ToolNotFound {
            name: self.archiver.name().to_string(),
            hint: "Install zip or build with --archiver native".to_string(),
        })
    }

    /// Read the requirements manifest
    pub async fn load_manifest(&self) -> LayerkitResult<Manifest> {
        let manifest =
            Manifest::from_file(&self.manifest_path, self.layout.runtime().ecosystem()).await?;
        debug!(
            "Manifest {} lists {} requirement(s)",
            manifest.path.display(),
            manifest.requirements.len()
        );
        Ok(manifest)
    }

    /// Create the install directory, wiping the staging tree first when `clean` is set
    async fn prepare_staging(&self) -> LayerkitResult<PathBuf> {
        let bundle_dir = self.layout.bundle_dir();

        if self.options.clean && bundle_dir.exists() {
            info!("Removing previous staging tree {}", bundle_dir.display());
            fs::remove_dir_all(&bundle_dir).await.map_err(|e| {
                LayerkitError::io(format!("removing {}", bundle_dir.display()), e)
            })?;
        }

        let install_dir = self.layout.install_dir();
        fs::create_dir_all(&install_dir)
            .await
            .map_err(|e| LayerkitError::io(format!("creating {}", install_dir.display()), e))?;

        debug!("Staging directory ready: {}", install_dir.display());
        Ok(install_dir)
    }

    /// Install the manifest into the staging tree.
    ///
    /// Returns false without running the installer when the manifest has
    /// no requirements.
    async fn install(
        &self,
        manifest: &Manifest,
        on_output: &(dyn Fn(String) + Send + Sync),
    ) -> LayerkitResult<bool> {
        if manifest.is_empty() {
            info!(
                "{} has no requirements, skipping {}",
                manifest.path.display(),
                self.installer.program()
            );
            return Ok(false);
        }

        let target = self.layout.install_dir();
        let request = InstallRequest {
            manifest,
            target: &target,
            runtime: self.layout.runtime(),
        };
        self.installer.install(&request, on_output).await?;
        Ok(true)
    }

    /// Compress the staging tree into the archive, replacing any previous archive
    async fn archive(&self) -> LayerkitResult<PathBuf> {
        let archive_path = self.layout.archive_path();

        // zip -r appends to an existing archive
        if archive_path.exists() {
            debug!("Replacing existing archive {}", archive_path.display());
            fs::remove_file(&archive_path).await.map_err(|e| {
                LayerkitError::io(format!("removing {}", archive_path.display()), e)
            })?;
        }

        self.archiver
            .archive(
                &self.layout.bundle_dir(),
                !self.options.strip_bundle_dir,
                &archive_path,
            )
            .await?;

        if !archive_path.is_file() {
            return Err(LayerkitError::ArchiveFailed {
                tool: self.archiver.name().to_string(),
                reason: format!("{} was not created", archive_path.display()),
            });
        }

        info!("Archive written: {}", archive_path.display());
        Ok(archive_path)
    }

    /// Digest the archive, drop the staging tree if requested, and summarize
    async fn finish(
        &self,
        manifest: &Manifest,
        installed: bool,
        started: Instant,
    ) -> LayerkitResult<BuildReport> {
        let archive_path = self.layout.archive_path();
        let (sha256, size_bytes) = digest_file(&archive_path).await?;

        let bundle_dir = self.layout.bundle_dir();
        let staging_dir = if self.options.keep_staging {
            Some(bundle_dir)
        } else {
            fs::remove_dir_all(&bundle_dir).await.map_err(|e| {
                LayerkitError::io(format!("removing {}", bundle_dir.display()), e)
            })?;
            None
        };

        Ok(BuildReport {
            bundle: self.layout.bundle_name().to_string(),
            runtime: self.layout.runtime().to_string(),
            archive: archive_path,
            sha256,
            size_bytes,
            packages: manifest.requirements.len(),
            installed,
            staging_dir,
            duration_ms: started.elapsed().as_millis() as u64,
        })
    }
}

/// SHA-256 (hex) and size of a file, streamed from disk
pub async fn digest_file(path: &Path) -> LayerkitResult<(String, u64)> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || {
        let mut file = std::fs::File::open(&path)
            .map_err(|e| LayerkitError::io(format!("opening {}", path.display()), e))?;
        let mut hasher = Sha256::new();
        let size = std::io::copy(&mut file, &mut hasher)
            .map_err(|e| LayerkitError::io(format!("reading {}", path.display()), e))?;
        Ok((hex::encode(hasher.finalize()), size))
    })
    .await
    .map_err(|e| LayerkitError::Internal(format!("digest task failed: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::{verify_layer, ArchiveListing, LayerLimits, NativeArchiver};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    /// Installer that creates a package directory and dist-info per requirement
    struct FakeInstaller {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Installer for FakeInstaller {
        async fn is_available(&self) -> bool {
            true
        }

        async fn version(&self) -> LayerkitResult<String> {
            Ok("fake 1.0".to_string())
        }

        async fn install(
            &self,
            request: &InstallRequest<'_>,
            on_output: &(dyn Fn(String) + Send + Sync),
        ) -> LayerkitResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            for req in request.manifest.named() {
                let name = req.name.as_deref().unwrap_or_default().to_lowercase();
                on_output(format!("Collecting {}", req.spec));
                std::fs::create_dir_all(request.target.join(&name)).unwrap();
                std::fs::write(request.target.join(&name).join("__init__.py"), "").unwrap();
                std::fs::create_dir_all(request.target.join(format!("{}-1.0.dist-info", name)))
                    .unwrap();
            }
            Ok(())
        }

        fn program(&self) -> &str {
            "fake-pip"
        }
    }

    struct FailingInstaller;

    #[async_trait]
    impl Installer for FailingInstaller {
        async fn is_available(&self) -> bool {
            true
        }

        async fn version(&self) -> LayerkitResult<String> {
            Ok("broken".to_string())
        }

        async fn install(
            &self,
            _request: &InstallRequest<'_>,
            _on_output: &(dyn Fn(String) + Send + Sync),
        ) -> LayerkitResult<()> {
            Err(LayerkitError::InstallFailed {
                tool: "fake-pip".to_string(),
                reason: "ERROR: No matching distribution".to_string(),
            })
        }

        fn program(&self) -> &str {
            "fake-pip"
        }
    }

    /// Archiver whose tool is not installed
    struct MissingArchiver;

    #[async_trait]
    impl Archiver for MissingArchiver {
        async fn archive(
            &self,
            _source_dir: &Path,
            _include_dir_name: bool,
            _dest: &Path,
        ) -> LayerkitResult<()> {
            panic!("archive must not run when the tool is missing");
        }

        async fn is_available(&self) -> bool {
            false
        }

        fn name(&self) -> &'static str {
            "zip"
        }
    }

    /// Records every hook as a short event string
    #[derive(Default)]
    struct RecordingObserver {
        events: Mutex<Vec<String>>,
    }

    impl RecordingObserver {
        fn push(&self, event: String) {
            self.events.lock().unwrap().push(event);
        }

        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    impl BuildObserver for RecordingObserver {
        fn manifest_loaded(&self, manifest: &Manifest) {
            self.push(format!("manifest {}", manifest.requirements.len()));
        }

        fn step_started(&self, step: BuildStep) {
            self.push(format!("start {:?}", step));
        }

        fn step_finished(&self, step: BuildStep, _path: &Path) {
            self.push(format!("done {:?}", step));
        }

        fn step_failed(&self, step: BuildStep, _error: &LayerkitError) {
            self.push(format!("failed {:?}", step));
        }

        fn install_skipped(&self, _manifest: &Manifest) {
            self.push("skipped".to_string());
        }

        fn output(&self, line: String) {
            self.push(format!("output {}", line));
        }
    }

    struct Fixture {
        temp: TempDir,
        calls: Arc<AtomicUsize>,
    }

    impl Fixture {
        fn new(manifest: &str) -> Self {
            let temp = TempDir::new().unwrap();
            std::fs::write(temp.path().join("requirements.txt"), manifest).unwrap();
            Self {
                temp,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn builder(&self, options: BuildOptions) -> LayerBuilder {
            let layout = LayerLayout::new(
                self.temp.path(),
                "python-dependencies",
                "python3.12".parse().unwrap(),
            )
            .unwrap();
            LayerBuilder::new(
                layout,
                self.temp.path().join("requirements.txt"),
                Box::new(FakeInstaller {
                    calls: Arc::clone(&self.calls),
                }),
                Box::new(NativeArchiver::new()),
            )
            .with_options(options)
        }

        fn zip_files(&self) -> Vec<String> {
            std::fs::read_dir(self.temp.path())
                .unwrap()
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .filter(|n| n.ends_with(".zip"))
                .collect()
        }
    }

    const ROOT: &str = "python-dependencies/python/lib/python3.12/site-packages";

    #[tokio::test]
    async fn builds_single_named_archive() {
        let fixture = Fixture::new("requests==2.31.0\n");
        let report = fixture
            .builder(BuildOptions::default())
            .build(&|_: String| {})
            .await
            .unwrap();

        assert_eq!(fixture.zip_files(), vec!["python-dependencies.zip"]);
        assert_eq!(report.archive, fixture.temp.path().join("python-dependencies.zip"));
        assert_eq!(report.packages, 1);
        assert!(report.installed);
        assert_eq!(report.sha256.len(), 64);
        assert!(report.size_bytes > 0);
        assert_eq!(
            report.staging_dir,
            Some(fixture.temp.path().join("python-dependencies"))
        );
    }

    #[tokio::test]
    async fn archive_contains_runtime_layout_and_packages() {
        let fixture = Fixture::new("requests==2.31.0\nboto3\n");
        let builder = fixture.builder(BuildOptions::default());
        let report = builder.build(&|_: String| {}).await.unwrap();

        let listing = ArchiveListing::read(&report.archive).unwrap();
        assert!(listing
            .names()
            .contains(&"python-dependencies/python/lib/python3.12/site-packages/requests/"));

        let manifest = builder.load_manifest().await.unwrap();
        let verify = verify_layer(&listing, ROOT, Some(&manifest), LayerLimits::default());
        assert!(verify.is_ok(), "{verify:?}");
        assert_eq!(verify.present, vec!["requests", "boto3"]);
    }

    #[tokio::test]
    async fn rerun_overwrites_archive() {
        let fixture = Fixture::new("requests\n");
        let builder = fixture.builder(BuildOptions::default());
        builder.build(&|_: String| {}).await.unwrap();

        std::fs::write(fixture.temp.path().join("requirements.txt"), "requests\nsix\n").unwrap();
        let report = builder.build(&|_: String| {}).await.unwrap();

        assert_eq!(fixture.zip_files(), vec!["python-dependencies.zip"]);
        let listing = ArchiveListing::read(&report.archive).unwrap();
        let installed = listing.installed_packages(ROOT);
        assert!(installed.contains("six"));
        // One entry per path: the archive was rewritten, not appended to
        let names = listing.names();
        let unique: std::collections::HashSet<_> = names.iter().collect();
        assert_eq!(unique.len(), names.len());
    }

    #[tokio::test]
    async fn stale_packages_survive_without_clean() {
        let fixture = Fixture::new("boto3\n");
        let builder = fixture.builder(BuildOptions::default());
        builder.build(&|_: String| {}).await.unwrap();

        std::fs::write(fixture.temp.path().join("requirements.txt"), "requests\n").unwrap();
        let report = builder.build(&|_: String| {}).await.unwrap();

        let installed = ArchiveListing::read(&report.archive)
            .unwrap()
            .installed_packages(ROOT);
        assert!(installed.contains("boto3"));
        assert!(installed.contains("requests"));
    }

    #[tokio::test]
    async fn clean_removes_stale_packages() {
        let fixture = Fixture::new("boto3\n");
        fixture
            .builder(BuildOptions::default())
            .build(&|_: String| {})
            .await
            .unwrap();

        std::fs::write(fixture.temp.path().join("requirements.txt"), "requests\n").unwrap();
        let options = BuildOptions {
            clean: true,
            ..BuildOptions::default()
        };
        let report = fixture.builder(options).build(&|_: String| {}).await.unwrap();

        let installed = ArchiveListing::read(&report.archive)
            .unwrap()
            .installed_packages(ROOT);
        assert!(!installed.contains("boto3"));
        assert!(installed.contains("requests"));
    }

    #[tokio::test]
    async fn empty_manifest_skips_install_and_still_archives() {
        let fixture = Fixture::new("# nothing yet\n");
        let report = fixture
            .builder(BuildOptions::default())
            .build(&|_: String| {})
            .await
            .unwrap();

        assert!(!report.installed);
        assert_eq!(fixture.calls.load(Ordering::SeqCst), 0);
        let listing = ArchiveListing::read(&report.archive).unwrap();
        assert!(listing.names().contains(&"python-dependencies/python/lib/python3.12/site-packages/"));
    }

    #[tokio::test]
    async fn strip_bundle_dir_puts_runtime_at_root() {
        let fixture = Fixture::new("requests\n");
        let options = BuildOptions {
            strip_bundle_dir: true,
            ..BuildOptions::default()
        };
        let report = fixture.builder(options).build(&|_: String| {}).await.unwrap();

        let listing = ArchiveListing::read(&report.archive).unwrap();
        assert!(listing.has_entries_under("python/lib/python3.12/site-packages"));
        assert!(!listing.has_entries_under("python-dependencies"));
    }

    #[tokio::test]
    async fn remove_staging_after_archive() {
        let fixture = Fixture::new("requests\n");
        let options = BuildOptions {
            keep_staging: false,
            ..BuildOptions::default()
        };
        let report = fixture.builder(options).build(&|_: String| {}).await.unwrap();

        assert!(report.staging_dir.is_none());
        assert!(!fixture.temp.path().join("python-dependencies").exists());
        assert!(report.archive.is_file());
    }

    #[tokio::test]
    async fn missing_manifest_creates_nothing() {
        let fixture = Fixture::new("");
        std::fs::remove_file(fixture.temp.path().join("requirements.txt")).unwrap();

        let err = fixture
            .builder(BuildOptions::default())
            .build(&|_: String| {})
            .await
            .unwrap_err();

        assert!(matches!(err, LayerkitError::ManifestNotFound(_)));
        assert!(!fixture.temp.path().join("python-dependencies").exists());
        assert!(fixture.zip_files().is_empty());
    }

    #[tokio::test]
    async fn install_failure_stops_before_archiving() {
        let fixture = Fixture::new("nope==9.9.9\n");
        let layout = LayerLayout::new(
            fixture.temp.path(),
            "python-dependencies",
            "python3.12".parse().unwrap(),
        )
        .unwrap();
        let builder = LayerBuilder::new(
            layout,
            fixture.temp.path().join("requirements.txt"),
            Box::new(FailingInstaller),
            Box::new(NativeArchiver::new()),
        );

        let err = builder.build(&|_: String| {}).await.unwrap_err();
        assert!(matches!(err, LayerkitError::InstallFailed { .. }));
        assert!(fixture.zip_files().is_empty());
    }

    #[tokio::test]
    async fn installer_output_is_forwarded() {
        let fixture = Fixture::new("requests\nsix\n");
        let lines = std::sync::Mutex::new(Vec::new());
        fixture
            .builder(BuildOptions::default())
            .build(&|line: String| lines.lock().unwrap().push(line))
            .await
            .unwrap();

        assert_eq!(
            lines.into_inner().unwrap(),
            vec!["Collecting requests", "Collecting six"]
        );
    }

    #[tokio::test]
    async fn observer_sees_steps_in_order() {
        let fixture = Fixture::new("requests\n");
        let observer = RecordingObserver::default();
        fixture
            .builder(BuildOptions::default())
            .build(&observer)
            .await
            .unwrap();

        assert_eq!(
            observer.events(),
            vec![
                "manifest 1",
                "start Stage",
                "done Stage",
                "start Install",
                "output Collecting requests",
                "done Install",
                "start Archive",
                "done Archive",
            ]
        );
    }

    #[tokio::test]
    async fn observer_sees_skip_and_failure() {
        let fixture = Fixture::new("");
        let observer = RecordingObserver::default();
        fixture
            .builder(BuildOptions::default())
            .build(&observer)
            .await
            .unwrap();
        assert!(observer.events().contains(&"skipped".to_string()));

        std::fs::write(fixture.temp.path().join("requirements.txt"), "nope\n").unwrap();
        let layout = LayerLayout::new(
            fixture.temp.path(),
            "python-dependencies",
            "python3.12".parse().unwrap(),
        )
        .unwrap();
        let observer = RecordingObserver::default();
        let builder = LayerBuilder::new(
            layout,
            fixture.temp.path().join("requirements.txt"),
            Box::new(FailingInstaller),
            Box::new(NativeArchiver::new()),
        );
        assert!(builder.build(&observer).await.is_err());

        let events = observer.events();
        assert_eq!(events.last().map(String::as_str), Some("failed Install"));
        assert!(!events.iter().any(|e| e.contains("Archive")));
    }

    #[tokio::test]
    async fn missing_archiver_fails_before_staging() {
        let fixture = Fixture::new("requests\n");
        let layout = LayerLayout::new(
            fixture.temp.path(),
            "python-dependencies",
            "python3.12".parse().unwrap(),
        )
        .unwrap();
        let builder = LayerBuilder::new(
            layout,
            fixture.temp.path().join("requirements.txt"),
            Box::new(FakeInstaller {
                calls: Arc::clone(&fixture.calls),
            }),
            Box::new(MissingArchiver),
        );

        let err = builder.build(&|_: String| {}).await.unwrap_err();

        assert!(matches!(err, LayerkitError::ToolNotFound { ref name, .. } if name == "zip"));
        assert_eq!(fixture.calls.load(Ordering::SeqCst), 0);
        assert!(!fixture.temp.path().join("python-dependencies").exists());
    }

    #[tokio::test]
    async fn url_only_manifest_still_runs_installer() {
        let fixture = Fixture::new(
            "https://files.pythonhosted.org/packages/requests-2.31.0-py3-none-any.whl\n",
        );
        let report = fixture
            .builder(BuildOptions::default())
            .build(&|_: String| {})
            .await
            .unwrap();

        assert!(report.installed);
        assert_eq!(report.packages, 1);
        assert_eq!(fixture.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn digest_matches_known_value() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("layer.zip");
        std::fs::write(&path, b"abc").unwrap();

        let (sha256, size) = digest_file(&path).await.unwrap();
        assert_eq!(
            sha256,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(size, 3);
    }

    #[test]
    fn from_config_rejects_unknown_runtime() {
        let mut config = Config::default();
        config.layer.runtime = "ruby3.3".to_string();
        assert!(matches!(
            LayerBuilder::from_config(&config),
            Err(LayerkitError::UnsupportedRuntime(_))
        ));
    }

    #[test]
    fn from_config_uses_configured_paths() {
        let mut config = Config::default();
        config.layer.name = "shared".to_string();
        config.layer.output_dir = PathBuf::from("dist");
        config.layer.clean = true;

        let builder = LayerBuilder::from_config(&config).unwrap();
        assert_eq!(builder.layout().archive_path(), PathBuf::from("dist/shared.zip"));
        assert_eq!(builder.manifest_path(), Path::new("requirements.txt"));
        assert!(builder.options().clean);
        assert_eq!(builder.installer().program(), "pip");
        assert_eq!(builder.archiver().name(), "zip");
    }
}
