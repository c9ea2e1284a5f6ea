//! Configuration schema for layerkit
//!
//! Global configuration is stored at `~/.config/layerkit/config.toml`.
//! A project-local `.layerkit.toml` overrides any subset of it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Layer bundle settings
    pub layer: LayerConfig,

    /// Package installer settings
    pub installer: InstallerConfig,

    /// Archive settings
    pub archive: ArchiveConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,

    /// Record every build in the history log
    pub history: bool,

    /// History log location (defaults to `<state-dir>/layerkit/history.jsonl`)
    pub history_file: Option<PathBuf>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
            history: true,
            history_file: None,
        }
    }
}

/// Layer bundle configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerConfig {
    /// Bundle name: staging directory name and archive base name
    pub name: String,

    /// Target runtime identifier (e.g. python3.12, nodejs20.x)
    pub runtime: String,

    /// Requirements manifest, relative to the working directory
    pub manifest: PathBuf,

    /// Directory that receives the staging tree and the archive
    pub output_dir: PathBuf,

    /// Remove the staging tree before installing
    pub clean: bool,

    /// Leave the staging tree on disk after archiving
    pub keep_staging: bool,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            name: "python-dependencies".to_string(),
            runtime: "python3.12".to_string(),
            manifest: PathBuf::from("requirements.txt"),
            output_dir: PathBuf::from("."),
            clean: false,
            keep_staging: true,
        }
    }
}

/// Package installer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallerConfig {
    /// pip executable for Python runtimes
    pub pip: String,

    /// npm executable for Node.js runtimes
    pub npm: String,

    /// Upgrade packages already present in the staging tree
    pub upgrade: bool,

    /// Target wheel platform (e.g. manylinux2014_x86_64); binary wheels only when set
    pub platform: Option<String>,

    /// Extra arguments appended to the install command
    pub extra_args: Vec<String>,
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            pip: "pip".to_string(),
            npm: "npm".to_string(),
            upgrade: true,
            platform: None,
            extra_args: vec![],
        }
    }
}

/// Archive configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Archiver backend
    pub backend: ArchiverBackend,

    /// zip executable used by the zip-cli backend
    pub zip: String,

    /// Put the runtime directory at the archive root instead of the bundle directory
    pub strip_bundle_dir: bool,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            backend: ArchiverBackend::ZipCli,
            zip: "zip".to_string(),
            strip_bundle_dir: false,
        }
    }
}

/// Which archiver produces the layer zip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ArchiverBackend {
    /// External `zip -r`
    ZipCli,
    /// In-process zip writer
    Native,
}

impl fmt::Display for ArchiverBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ZipCli => "zip-cli",
            Self::Native => "native",
        };
        write!(f, "{}", name)
    }
}
