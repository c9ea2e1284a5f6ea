//! Archiver backed by the external `zip` tool

use crate::archive::Archiver;
use crate::error::{LayerkitError, LayerkitResult};
use crate::process;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Runs `zip -r -q <dest> <dir>` from the directory's parent
pub struct ZipCliArchiver {
    program: String,
}

impl ZipCliArchiver {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Working directory and argument list for one archive run
    fn invocation(
        &self,
        source_dir: &Path,
        include_dir_name: bool,
        dest: &Path,
    ) -> LayerkitResult<(PathBuf, Vec<String>)> {
        let dest = std::path::absolute(dest)
            .map_err(|e| LayerkitError::io(format!("resolving {}", dest.display()), e))?;

        let (cwd, target) = if include_dir_name {
            let name = source_dir.file_name().ok_or_else(|| LayerkitError::PathInvalid {
                path: source_dir.to_path_buf(),
                reason: "directory has no name".to_string(),
            })?;
            let parent = match source_dir.parent() {
                Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
                _ => PathBuf::from("."),
            };
            (parent, name.to_string_lossy().into_owned())
        } else {
            (source_dir.to_path_buf(), ".".to_string())
        };

        let args = vec![
            "-r".to_string(),
            "-q".to_string(),
            dest.display().to_string(),
            target,
        ];
        Ok((cwd, args))
    }
}

#[async_trait]
impl Archiver for ZipCliArchiver {
    async fn archive(
        &self,
        source_dir: &Path,
        include_dir_name: bool,
        dest: &Path,
    ) -> LayerkitResult<()> {
        let (cwd, args) = self.invocation(source_dir, include_dir_name, dest)?;
        debug!("Archiving in {}: {} {:?}", cwd.display(), self.program, args);

        let output = process::run_streaming(&self.program, &args, Some(&cwd), &|line: String| {
            debug!("zip: {}", line)
        })
        .await?;

        if output.status.success() {
            Ok(())
        } else {
            Err(LayerkitError::ArchiveFailed {
                tool: self.program.clone(),
                reason: output.tail(),
            })
        }
    }

    async fn is_available(&self) -> bool {
        // zip reports its version with -v, not --version
        tokio::process::Command::new(&self.program)
            .arg("-v")
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    fn name(&self) -> &'static str {
        "zip"
    }
}
