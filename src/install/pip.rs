//! pip installer for Python runtimes

use crate::config::schema::InstallerConfig;
use crate::error::{LayerkitError, LayerkitResult};
use crate::install::{InstallRequest, Installer};
use crate::process;
use async_trait::async_trait;
use tracing::{debug, info};

/// Installs a requirements file into a site-packages directory with pip
pub struct PipInstaller {
    program: String,
    upgrade: bool,
    platform: Option<String>,
    extra_args: Vec<String>,
}

impl PipInstaller {
    /// Create a pip installer using the given executable
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            upgrade: true,
            platform: None,
            extra_args: vec![],
        }
    }

    pub fn from_config(config: &InstallerConfig) -> Self {
        Self {
            program: config.pip.clone(),
            upgrade: config.upgrade,
            platform: config.platform.clone().filter(|p| !p.trim().is_empty()),
            extra_args: config.extra_args.clone(),
        }
    }

    /// Build the `pip install` argument list for a request
    pub fn args(&self, request: &InstallRequest<'_>) -> Vec<String> {
        let mut args = vec![
            "install".to_string(),
            "-r".to_string(),
            request.manifest.path.display().to_string(),
            "-t".to_string(),
            request.target.display().to_string(),
        ];

        if self.upgrade {
            args.push("--upgrade".to_string());
        }

        // Cross-platform builds may only use prebuilt wheels
        if let Some(ref platform) = self.platform {
            args.push("--platform".to_string());
            args.push(platform.clone());
            args.push("--only-binary=:all:".to_string());
            if let Some(version) = request.runtime.python_version() {
                args.push("--python-version".to_string());
                args.push(version);
            }
            args.push("--implementation".to_string());
            args.push("cp".to_string());
        }

        args.extend(self.extra_args.iter().cloned());
        args
    }
}

#[async_trait]
impl Installer for PipInstaller {
    async fn is_available(&self) -> bool {
        process::tool_available(&self.program).await
    }

    async fn version(&self) -> LayerkitResult<String> {
        process::tool_version(&self.program).await
    }

    async fn install(
        &self,
        request: &InstallRequest<'_>,
        on_output: &(dyn Fn(String) + Send + Sync),
    ) -> LayerkitResult<()> {
        let args = self.args(request);
        info!(
            "Installing {} requirement(s) into {}",
            request.manifest.requirements.len(),
            request.target.display()
        );
        debug!("{} {}", self.program, args.join(" "));

        let output = process::run_streaming(&self.program, &args, None, on_output).await?;

        if output.status.success() {
            Ok(())
        } else {
            Err(LayerkitError::InstallFailed {
                tool: self.program.clone(),
                reason: output.tail(),
            })
        }
    }

    fn program(&self) -> &str {
        &self.program
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::manifest::Manifest;
    use crate::layer::runtime::Ecosystem;
    use std::path::Path;

    fn manifest() -> Manifest {
        Manifest::parse(
            Path::new("requirements.txt"),
            "requests==2.31.0\n",
            Ecosystem::Python,
        )
    }

    #[test]
    fn default_args_install_with_upgrade() {
        let manifest = manifest();
        let target = Path::new("python-dependencies/python/lib/python3.12/site-packages");
        let request = InstallRequest {
            manifest: &manifest,
            target,
            runtime: "python3.12".parse().unwrap(),
        };

        let args = PipInstaller::new("pip").args(&request);
        assert_eq!(
            args,
            vec![
                "install",
                "-r",
                "requirements.txt",
                "-t",
                "python-dependencies/python/lib/python3.12/site-packages",
                "--upgrade",
            ]
        );
    }

    #[test]
    fn platform_forces_binary_wheels() {
        let manifest = manifest();
        let config = InstallerConfig {
            platform: Some("manylinux2014_x86_64".to_string()),
            upgrade: false,
            extra_args: vec!["--no-cache-dir".to_string()],
            ..InstallerConfig::default()
        };
        let request = InstallRequest {
            manifest: &manifest,
            target: Path::new("site-packages"),
            runtime: "python3.11".parse().unwrap(),
        };

        let args = PipInstaller::from_config(&config).args(&request);
        assert!(!args.contains(&"--upgrade".to_string()));
        let joined = args.join(" ");
        assert!(joined.contains("--platform manylinux2014_x86_64"));
        assert!(joined.contains("--only-binary=:all:"));
        assert!(joined.contains("--python-version 3.11"));
        assert!(joined.contains("--implementation cp"));
        assert!(joined.ends_with("--no-cache-dir"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_pip_reports_output() {
        let manifest = manifest();
        let request = InstallRequest {
            manifest: &manifest,
            target: Path::new("site-packages"),
            runtime: "python3.12".parse().unwrap(),
        };

        // `false` ignores its arguments and exits 1
        let err = PipInstaller::new("false")
            .install(&request, &|_: String| {})
            .await
            .unwrap_err();
        assert!(matches!(err, LayerkitError::InstallFailed { ref tool, .. } if tool == "false"));
    }
}
