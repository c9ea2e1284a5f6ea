//! Archive inspection and layer verification
//!
//! Reads a finished layer zip and checks it against what the target
//! runtime expects: every entry under the install path, every manifest
//! package present, sizes within the platform limits.

use crate::error::{LayerkitError, LayerkitResult};
use crate::layer::manifest::{normalize_name, Manifest, Requirement};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs::File;
use std::path::{Path, PathBuf};
use zip::ZipArchive;

/// Maximum zipped size for a direct layer upload (50 MiB)
pub const MAX_ZIPPED_BYTES: u64 = 50 * 1024 * 1024;

/// Maximum unzipped size of a layer (250 MiB)
pub const MAX_UNZIPPED_BYTES: u64 = 250 * 1024 * 1024;

/// One entry of a zip archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveEntry {
    pub name: String,
    pub size: u64,
    pub is_dir: bool,
}

/// Table of contents of a layer archive
#[derive(Debug, Clone)]
pub struct ArchiveListing {
    pub path: PathBuf,
    pub entries: Vec<ArchiveEntry>,
    /// Size of the archive file itself
    pub compressed_size: u64,
}

impl ArchiveListing {
    /// Read the table of contents of a zip file
    pub fn read(path: &Path) -> LayerkitResult<Self> {
        if !path.is_file() {
            return Err(LayerkitError::PathNotFound(path.to_path_buf()));
        }

        let file = File::open(path)
            .map_err(|e| LayerkitError::io(format!("opening archive {}", path.display()), e))?;
        let compressed_size = file
            .metadata()
            .map_err(|e| LayerkitError::io(format!("reading metadata of {}", path.display()), e))?
            .len();

        let mut archive = ZipArchive::new(file)?;
        let mut entries = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let entry = archive.by_index(i)?;
            entries.push(ArchiveEntry {
                name: entry.name().to_string(),
                size: entry.size(),
                is_dir: entry.is_dir(),
            });
        }

        Ok(Self {
            path: path.to_path_buf(),
            entries,
            compressed_size,
        })
    }

    /// Entry names in archive order
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    /// Total size of all entries once extracted
    pub fn uncompressed_size(&self) -> u64 {
        self.entries.iter().map(|e| e.size).sum()
    }

    /// True if any entry lives under `root/`
    pub fn has_entries_under(&self, root: &str) -> bool {
        let prefix = format!("{}/", root.trim_end_matches('/'));
        self.entries.iter().any(|e| e.name.starts_with(&prefix))
    }

    /// Pick the first candidate root that has entries under it
    pub fn detect_root<'a>(&self, candidates: &'a [String]) -> Option<&'a str> {
        candidates
            .iter()
            .find(|root| self.has_entries_under(root))
            .map(String::as_str)
    }

    /// Normalized names of the packages installed directly under `root`.
    ///
    /// Directories, modules and `*.dist-info` / `*.egg-info` metadata all
    /// contribute a name, so both import names and distribution names match.
    pub fn installed_packages(&self, root: &str) -> BTreeSet<String> {
        let prefix = format!("{}/", root.trim_end_matches('/'));
        let mut names = BTreeSet::new();

        for entry in &self.entries {
            let Some(rest) = entry.name.strip_prefix(&prefix) else {
                continue;
            };
            let mut parts = rest.split('/').filter(|p| !p.is_empty());
            let Some(top) = parts.next() else {
                continue;
            };

            let name = if top.starts_with('@') {
                // Scoped node package: @scope/name
                match parts.next() {
                    Some(pkg) => format!("{}/{}", top, pkg),
                    None => continue,
                }
            } else if let Some(meta) = top
                .strip_suffix(".dist-info")
                .or_else(|| top.strip_suffix(".egg-info"))
            {
                meta.split('-').next().unwrap_or(meta).to_string()
            } else if top.starts_with('.') || top.ends_with(".pth") || top == "__pycache__" {
                continue;
            } else if let Some(module) = top.strip_suffix(".py") {
                module.to_string()
            } else if !entry.is_dir && rest == top {
                // Extension modules: name.cpython-312-x86_64-linux-gnu.so
                top.split('.').next().unwrap_or(top).to_string()
            } else {
                top.to_string()
            };

            names.insert(normalize_name(&name));
        }

        names
    }
}

/// Size limits checked by `verify_layer`
#[derive(Debug, Clone, Copy)]
pub struct LayerLimits {
    pub max_zipped_bytes: u64,
    pub max_unzipped_bytes: u64,
}

impl Default for LayerLimits {
    fn default() -> Self {
        Self {
            max_zipped_bytes: MAX_ZIPPED_BYTES,
            max_unzipped_bytes: MAX_UNZIPPED_BYTES,
        }
    }
}

/// Outcome of verifying a layer archive
#[derive(Debug, Clone, Serialize)]
pub struct VerifyReport {
    pub archive: PathBuf,
    /// Install path every package must live under
    pub expected_root: String,
    /// Entries outside the expected layout
    pub misplaced: Vec<String>,
    /// Manifest packages found in the archive
    pub present: Vec<String>,
    /// Manifest packages not found in the archive
    pub missing: Vec<String>,
    pub zipped_bytes: u64,
    pub unzipped_bytes: u64,
    /// Non-fatal findings such as size limit breaches
    pub warnings: Vec<String>,
}

impl VerifyReport {
    /// True when layout and package checks passed. Warnings do not count.
    pub fn is_ok(&self) -> bool {
        self.misplaced.is_empty() && self.missing.is_empty()
    }
}

/// Verify a layer archive against its expected install root and manifest
pub fn verify_layer(
    listing: &ArchiveListing,
    expected_root: &str,
    manifest: Option<&Manifest>,
    limits: LayerLimits,
) -> VerifyReport {
    let root = expected_root.trim_end_matches('/');
    let root_prefix = format!("{}/", root);

    let misplaced = listing
        .entries
        .iter()
        .filter(|e| {
            let name = e.name.as_str();
            if name.starts_with(&root_prefix) || name.trim_end_matches('/') == root {
                return false;
            }
            // Parent directories of the install root are expected
            !(e.is_dir && root_prefix.starts_with(name))
        })
        .map(|e| e.name.clone())
        .collect();

    let installed = listing.installed_packages(root);
    // URL and path requirements carry no name to look for
    let (present, missing): (Vec<&Requirement>, Vec<&Requirement>) = match manifest {
        Some(manifest) => manifest
            .named()
            .partition(|r| r.normalized_name().is_some_and(|n| installed.contains(&n))),
        None => (Vec::new(), Vec::new()),
    };
    let names = |reqs: Vec<&Requirement>| {
        reqs.iter()
            .filter_map(|r| r.name.clone())
            .collect::<Vec<_>>()
    };

    let zipped_bytes = listing.compressed_size;
    let unzipped_bytes = listing.uncompressed_size();
    let mut warnings = Vec::new();
    if zipped_bytes > limits.max_zipped_bytes {
        warnings.push(format!(
            "archive is {} bytes, over the {} byte direct upload limit",
            zipped_bytes, limits.max_zipped_bytes
        ));
    }
    if unzipped_bytes > limits.max_unzipped_bytes {
        warnings.push(format!(
            "layer unzips to {} bytes, over the {} byte limit",
            unzipped_bytes, limits.max_unzipped_bytes
        ));
    }

    VerifyReport {
        archive: listing.path.clone(),
        expected_root: root.to_string(),
        misplaced,
        present: names(present),
        missing: names(missing),
        zipped_bytes,
        unzipped_bytes,
        warnings,
    }
}
