//! On-disk layout of a layer build
//!
//! ```text
//! <output_dir>/
//! ├── <bundle>/                      staging tree
//! │   └── python/lib/python3.12/site-packages/
//! └── <bundle>.zip                   archive
//! ```

use crate::error::{LayerkitError, LayerkitResult};
use crate::layer::runtime::Runtime;
use std::path::{Path, PathBuf};

/// Paths derived from the output directory, bundle name and runtime
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerLayout {
    output_dir: PathBuf,
    bundle_name: String,
    runtime: Runtime,
}

impl LayerLayout {
    /// Create a layout, rejecting bundle names that are not a single path component
    pub fn new(
        output_dir: impl Into<PathBuf>,
        bundle_name: impl Into<String>,
        runtime: Runtime,
    ) -> LayerkitResult<Self> {
        let bundle_name = bundle_name.into();
        validate_bundle_name(&bundle_name)?;
        Ok(Self {
            output_dir: output_dir.into(),
            bundle_name,
            runtime,
        })
    }

    pub fn bundle_name(&self) -> &str {
        &self.bundle_name
    }

    pub fn runtime(&self) -> Runtime {
        self.runtime
    }

    /// Root of the staging tree: `<output>/<bundle>`
    pub fn bundle_dir(&self) -> PathBuf {
        self.output_dir.join(&self.bundle_name)
    }

    /// Directory the package manager installs into
    pub fn install_dir(&self) -> PathBuf {
        self.bundle_dir().join(self.runtime.install_subpath())
    }

    /// Archive path: `<output>/<bundle>.zip`
    pub fn archive_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.zip", self.bundle_name))
    }

    /// Install directory as it appears inside the archive
    pub fn archive_root(&self, strip_bundle_dir: bool) -> String {
        let subpath = archive_path_string(&self.runtime.install_subpath());
        if strip_bundle_dir {
            subpath
        } else {
            format!("{}/{}", self.bundle_name, subpath)
        }
    }

    /// Both possible archive roots, bundled layout first
    pub fn archive_root_candidates(&self) -> Vec<String> {
        vec![self.archive_root(false), self.archive_root(true)]
    }
}

/// Bundle names become a directory and a file name, so they must be a
/// single plain path component.
pub fn validate_bundle_name(name: &str) -> LayerkitResult<()> {
    let invalid = |reason: &str| LayerkitError::InvalidBundleName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.trim().is_empty() {
        return Err(invalid("name is empty"));
    }
    if name == "." || name == ".." {
        return Err(invalid("name cannot be a relative directory"));
    }
    if name.contains('/') || name.contains('\\') {
        return Err(invalid("name cannot contain path separators"));
    }
    if name.chars().any(char::is_control) {
        return Err(invalid("name cannot contain control characters"));
    }
    Ok(())
}

fn archive_path_string(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
