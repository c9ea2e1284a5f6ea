//! Layer archive creation and inspection
//!
//! Two interchangeable archivers produce the layer zip:
//! - `zip-cli`: shells out to `zip -r`, matching what a packaging script does
//! - `native`: writes the zip in-process, no external tool required
//!
//! Both produce the same entry names: paths relative to the staging
//! directory's parent (or to the staging directory itself when the bundle
//! directory is stripped), always with `/` separators.

pub mod inspect;
mod native;
mod zip_cli;

pub use inspect::{verify_layer, ArchiveEntry, ArchiveListing, LayerLimits, VerifyReport};
pub use native::NativeArchiver;
pub use zip_cli::ZipCliArchiver;

use crate::config::schema::{ArchiveConfig, ArchiverBackend};
use crate::error::LayerkitResult;
use async_trait::async_trait;
use std::path::Path;

/// Abstract archiver interface
#[async_trait]
pub trait Archiver: Send + Sync {
    /// Recursively compress `source_dir` into `dest`.
    ///
    /// With `include_dir_name` the entries are prefixed with the directory's
    /// own name (`bundle/python/...`); without it they start at its
    /// contents (`python/...`). `dest` must not exist yet.
    async fn archive(
        &self,
        source_dir: &Path,
        include_dir_name: bool,
        dest: &Path,
    ) -> LayerkitResult<()>;

    /// Check if the archiver can run on this system
    async fn is_available(&self) -> bool;

    /// Human-readable archiver name for display
    fn name(&self) -> &'static str;
}

/// Create the configured archiver
pub fn create_archiver(config: &ArchiveConfig) -> Box<dyn Archiver> {
    match config.backend {
        ArchiverBackend::ZipCli => Box::new(ZipCliArchiver::new(config.zip.clone())),
        ArchiverBackend::Native => Box::new(NativeArchiver::new()),
    }
}
