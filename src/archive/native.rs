//! In-process zip archiver

use crate::archive::Archiver;
use crate::error::{LayerkitError, LayerkitResult};
use async_trait::async_trait;
use std::fs::{self, File};
use std::io::{self, BufWriter, Seek, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Writes a deflated zip without any external tool.
///
/// Symlinks are followed and stored as regular files, as `zip -r` does.
pub struct NativeArchiver;

impl NativeArchiver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NativeArchiver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Archiver for NativeArchiver {
    async fn archive(
        &self,
        source_dir: &Path,
        include_dir_name: bool,
        dest: &Path,
    ) -> LayerkitResult<()> {
        let source_dir = source_dir.to_path_buf();
        let dest = dest.to_path_buf();

        tokio::task::spawn_blocking(move || write_zip(&source_dir, include_dir_name, &dest))
            .await
            .map_err(|e| LayerkitError::Internal(format!("archive task failed: {}", e)))?
    }

    async fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "native"
    }
}

fn write_zip(source_dir: &Path, include_dir_name: bool, dest: &Path) -> LayerkitResult<()> {
    if !source_dir.is_dir() {
        return Err(LayerkitError::PathNotFound(source_dir.to_path_buf()));
    }

    let prefix = if include_dir_name {
        let name = source_dir
            .file_name()
            .ok_or_else(|| LayerkitError::PathInvalid {
                path: source_dir.to_path_buf(),
                reason: "directory has no name".to_string(),
            })?;
        Some(name.to_string_lossy().into_owned())
    } else {
        None
    };

    let file = File::create(dest)
        .map_err(|e| LayerkitError::io(format!("creating archive {}", dest.display()), e))?;
    let mut writer = TreeWriter {
        zip: ZipWriter::new(BufWriter::new(file)),
        stack: Vec::new(),
        count: 0,
    };

    if let Some(ref prefix) = prefix {
        writer.zip.add_directory(prefix.as_str(), file_options(source_dir))?;
        writer.count += 1;
    }
    writer.add_tree(source_dir, prefix.as_deref())?;

    let count = writer.count;
    writer.zip.finish()?;
    debug!("Wrote {} entries to {}", count, dest.display());
    Ok(())
}

/// Recursive directory-to-zip writer
struct TreeWriter<W: Write + Seek> {
    zip: ZipWriter<W>,
    /// Canonical directories being written, to detect symlink loops
    stack: Vec<PathBuf>,
    count: usize,
}

impl<W: Write + Seek> TreeWriter<W> {
    fn add_tree(&mut self, dir: &Path, prefix: Option<&str>) -> LayerkitResult<()> {
        let canonical = dir
            .canonicalize()
            .map_err(|e| LayerkitError::io(format!("resolving {}", dir.display()), e))?;
        if self.stack.contains(&canonical) {
            return Err(LayerkitError::ArchiveFailed {
                tool: "native".to_string(),
                reason: format!("symlink loop at {}", dir.display()),
            });
        }
        self.stack.push(canonical);

        let mut paths = fs::read_dir(dir)
            .and_then(|entries| entries.map(|e| e.map(|e| e.path())).collect::<io::Result<Vec<_>>>())
            .map_err(|e| LayerkitError::io(format!("listing {}", dir.display()), e))?;
        paths.sort();

        for path in paths {
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let name = match prefix {
                Some(prefix) => format!("{}/{}", prefix, file_name),
                None => file_name,
            };
            let options = file_options(&path);

            // is_dir follows symlinks, as zip -r does
            if path.is_dir() {
                self.zip.add_directory(name.as_str(), options)?;
                self.count += 1;
                self.add_tree(&path, Some(&name))?;
            } else {
                self.zip.start_file(name.as_str(), options)?;
                let mut input = File::open(&path)
                    .map_err(|e| LayerkitError::io(format!("reading {}", path.display()), e))?;
                io::copy(&mut input, &mut self.zip).map_err(|e| {
                    LayerkitError::io(format!("compressing {}", path.display()), e)
                })?;
                self.count += 1;
            }
        }

        self.stack.pop();
        Ok(())
    }
}

fn file_options(path: &Path) -> FileOptions {
    FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(unix_mode(path))
}

#[cfg(unix)]
fn unix_mode(path: &Path) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.permissions().mode() & 0o777)
        .unwrap_or(0o644)
}

#[cfg(not(unix))]
fn unix_mode(path: &Path) -> u32 {
    if path.is_dir() {
        0o755
    } else {
        0o644
    }
}
