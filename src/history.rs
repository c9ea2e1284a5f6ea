//! Build history
//!
//! Appends one JSON line per build attempt to `general.history_file`,
//! by default `<state-dir>/layerkit/history.jsonl`.

use crate::config::{schema::Config, ConfigManager};
use crate::error::{LayerkitError, LayerkitResult};
use crate::layer::BuildReport;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::warn;
use uuid::Uuid;

/// Outcome of a build attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildStatus {
    Success,
    Failed,
}

/// One line of the history file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub build_id: Uuid,
    pub bundle: String,
    pub runtime: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    #[serde(default)]
    pub packages: usize,
    pub status: BuildStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HistoryEntry {
    /// Entry for a build that produced an archive
    pub fn success(report: &BuildReport) -> Self {
        Self {
            timestamp: Utc::now(),
            build_id: Uuid::new_v4(),
            bundle: report.bundle.clone(),
            runtime: report.runtime.clone(),
            archive: Some(report.archive.clone()),
            sha256: Some(report.sha256.clone()),
            size_bytes: Some(report.size_bytes),
            packages: report.packages,
            status: BuildStatus::Success,
            error: None,
        }
    }

    /// Entry for a build that stopped at a failing step
    pub fn failure(bundle: &str, runtime: &str, error: &LayerkitError) -> Self {
        Self {
            timestamp: Utc::now(),
            build_id: Uuid::new_v4(),
            bundle: bundle.to_string(),
            runtime: runtime.to_string(),
            archive: None,
            sha256: None,
            size_bytes: None,
            packages: 0,
            status: BuildStatus::Failed,
            error: Some(error.to_string()),
        }
    }
}

/// Append-only JSON-lines build log
pub struct BuildHistory {
    enabled: bool,
    path: PathBuf,
}

impl BuildHistory {
    /// Create a history log from config
    pub fn new(config: &Config) -> Self {
        Self {
            enabled: config.general.history,
            path: config
                .general
                .history_file
                .clone()
                .unwrap_or_else(ConfigManager::history_path),
        }
    }

    /// Create a history log at a specific path
    pub fn at(path: impl Into<PathBuf>, enabled: bool) -> Self {
        Self {
            enabled,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Append an entry.
    ///
    /// Write failures are logged and dropped; they never fail the build.
    pub async fn record(&self, entry: &HistoryEntry) {
        if !self.enabled {
            return;
        }

        let mut line = match serde_json::to_string(entry) {
            Ok(s) => s,
            Err(e) => {
                warn!("Failed to serialize history entry: {}", e);
                return;
            }
        };
        line.push('\n');

        if let Err(e) = self.append(&line).await {
            warn!("Failed to write build history {}: {}", self.path.display(), e);
        }
    }

    /// Read entries, newest last. Lines that do not parse are skipped.
    pub async fn entries(&self) -> LayerkitResult<Vec<HistoryEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| LayerkitError::io(format!("reading {}", self.path.display()), e))?;

        Ok(content
            .lines()
            .filter(|l| !l.trim().is_empty())
            .filter_map(|l| match serde_json::from_str(l) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Skipping malformed history line: {}", e);
                    None
                }
            })
            .collect())
    }

    /// Last `limit` entries, newest last
    pub async fn recent(&self, limit: usize) -> LayerkitResult<Vec<HistoryEntry>> {
        let mut entries = self.entries().await?;
        let skip = entries.len().saturating_sub(limit);
        Ok(entries.split_off(skip))
    }

    /// Delete the history file
    pub async fn clear(&self) -> LayerkitResult<()> {
        if self.path.exists() {
            tokio::fs::remove_file(&self.path)
                .await
                .map_err(|e| LayerkitError::io(format!("removing {}", self.path.display()), e))?;
        }
        Ok(())
    }

    async fn append(&self, line: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;

        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}
