//! npm installer for Node.js runtimes

use crate::config::schema::InstallerConfig;
use crate::error::{LayerkitError, LayerkitResult};
use crate::install::{InstallRequest, Installer};
use crate::process;
use async_trait::async_trait;
use std::path::Path;
use tracing::info;

/// Installs manifest packages into `<prefix>/node_modules` with npm
pub struct NpmInstaller {
    program: String,
    extra_args: Vec<String>,
}

impl NpmInstaller {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            extra_args: vec![],
        }
    }

    pub fn from_config(config: &InstallerConfig) -> Self {
        Self {
            program: config.npm.clone(),
            extra_args: config.extra_args.clone(),
        }
    }

    /// Build the `npm install` argument list for a request.
    ///
    /// npm installs into `<prefix>/node_modules`, so the prefix is the
    /// parent of the target directory. Manifest option lines
    /// (`--registry=...`) go before the package specs.
    pub fn args(&self, request: &InstallRequest<'_>) -> Vec<String> {
        let prefix = request.target.parent().unwrap_or(Path::new("."));

        let mut args = vec![
            "install".to_string(),
            "--prefix".to_string(),
            prefix.display().to_string(),
            "--no-save".to_string(),
            "--no-package-lock".to_string(),
        ];
        args.extend(self.extra_args.iter().cloned());
        args.extend(
            request
                .manifest
                .options
                .iter()
                .flat_map(|option| option.split_whitespace())
                .map(String::from),
        );
        args.extend(request.manifest.specs().into_iter().map(String::from));
        args
    }
}

#[async_trait]
impl Installer for NpmInstaller {
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
            "Installing {} package(s) into {}",
            request.manifest.requirements.len(),
            request.target.display()
        );

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
