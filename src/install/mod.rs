//! Package installer backends
//!
//! Installation is delegated to the ecosystem's own package manager so the
//! staged packages are exactly what that tool would produce:
//! - Python runtimes: pip
//! - Node.js runtimes: npm

mod npm;
mod pip;

pub use npm::NpmInstaller;
pub use pip::PipInstaller;

use crate::config::schema::InstallerConfig;
use crate::error::LayerkitResult;
use crate::layer::manifest::Manifest;
use crate::layer::runtime::{Ecosystem, Runtime};
use async_trait::async_trait;
use std::path::Path;

/// Everything an installer needs for one run
#[derive(Debug, Clone, Copy)]
pub struct InstallRequest<'a> {
    /// Parsed requirements manifest
    pub manifest: &'a Manifest,

    /// Package directory inside the staging tree
    pub target: &'a Path,

    /// Runtime the packages are installed for
    pub runtime: Runtime,
}

/// Abstract package installer interface
#[async_trait]
pub trait Installer: Send + Sync {
    /// Check if the installer tool can be started
    async fn is_available(&self) -> bool;

    /// Installer version string for status output
    async fn version(&self) -> LayerkitResult<String>;

    /// Install every requirement of the manifest into the request target.
    ///
    /// Each line of tool output is passed to `on_output` as it arrives.
    async fn install(
        &self,
        request: &InstallRequest<'_>,
        on_output: &(dyn Fn(String) + Send + Sync),
    ) -> LayerkitResult<()>;

    /// Executable name, used in messages
    fn program(&self) -> &str;
}

/// Create the installer for a runtime's ecosystem
pub fn create_installer(runtime: Runtime, config: &InstallerConfig) -> Box<dyn Installer> {
    match runtime.ecosystem() {
        Ecosystem::Python => Box::new(PipInstaller::from_config(config)),
        Ecosystem::Node => Box::new(NpmInstaller::from_config(config)),
    }
}
