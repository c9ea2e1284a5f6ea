//! Target runtime identifiers
//!
//! A runtime decides two things: where installed packages must live inside
//! the layer so the platform finds them, and which package manager fills
//! that directory.

use crate::error::{LayerkitError, LayerkitResult};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Package ecosystems a layer can target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ecosystem {
    /// Python packages installed with pip
    Python,
    /// Node.js packages installed with npm
    Node,
}

impl fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Python => "python",
            Self::Node => "nodejs",
        };
        write!(f, "{}", name)
    }
}

/// A parsed runtime identifier such as `python3.12` or `nodejs20.x`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Runtime {
    Python { major: u32, minor: u32 },
    Node { major: u32 },
}

impl Runtime {
    pub fn ecosystem(&self) -> Ecosystem {
        match self {
            Self::Python { .. } => Ecosystem::Python,
            Self::Node { .. } => Ecosystem::Node,
        }
    }

    /// Top-level directory inside the bundle (`python` or `nodejs`)
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Python { .. } => "python",
            Self::Node { .. } => "nodejs",
        }
    }

    /// Path of the package directory relative to the bundle root
    pub fn install_subpath(&self) -> PathBuf {
        match self {
            Self::Python { major, minor } => PathBuf::from(self.prefix())
                .join("lib")
                .join(format!("python{}.{}", major, minor))
                .join("site-packages"),
            Self::Node { .. } => PathBuf::from(self.prefix()).join("node_modules"),
        }
    }

    /// Interpreter version in `X.Y` form, as pip's `--python-version` expects
    pub fn python_version(&self) -> Option<String> {
        match self {
            Self::Python { major, minor } => Some(format!("{}.{}", major, minor)),
            Self::Node { .. } => None,
        }
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::Python {
            major: 3,
            minor: 12,
        }
    }
}

impl fmt::Display for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Python { major, minor } => write!(f, "python{}.{}", major, minor),
            Self::Node { major } => write!(f, "nodejs{}.x", major),
        }
    }
}

impl FromStr for Runtime {
    type Err = LayerkitError;

    fn from_str(s: &str) -> LayerkitResult<Self> {
        let unsupported = || LayerkitError::UnsupportedRuntime(s.to_string());
        let id = s.trim().to_ascii_lowercase();

        if let Some(version) = id.strip_prefix("python") {
            let (major, minor) = version.split_once('.').ok_or_else(unsupported)?;
            return Ok(Self::Python {
                major: major.parse().map_err(|_| unsupported())?,
                minor: minor.parse().map_err(|_| unsupported())?,
            });
        }

        if let Some(version) = id.strip_prefix("nodejs") {
            let major = version.strip_suffix(".x").unwrap_or(version);
            return Ok(Self::Node {
                major: major.parse().map_err(|_| unsupported())?,
            });
        }

        Err(unsupported())
    }
}
