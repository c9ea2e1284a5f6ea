//! Error types for layerkit
//!
//! All modules use `LayerkitResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for layerkit operations
pub type LayerkitResult<T> = Result<T, LayerkitError>;

/// All errors that can occur in layerkit
#[derive(Error, Debug)]
pub enum LayerkitError {
    // Environment errors
    #[error("Required tool not found: {name}. {hint}")]
    ToolNotFound { name: String, hint: String },

    #[error("Unsupported runtime: {0}. Expected pythonX.Y or nodejsN.x")]
    UnsupportedRuntime(String),

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid bundle name '{name}': {reason}")]
    InvalidBundleName { name: String, reason: String },

    // Manifest errors
    #[error("Requirements manifest not found: {0}")]
    ManifestNotFound(PathBuf),

    // Pipeline errors
    #[error("Dependency installation failed ({tool}):\n{reason}")]
    InstallFailed { tool: String, reason: String },

    #[error("Archiving failed ({tool}):\n{reason}")]
    ArchiveFailed { tool: String, reason: String },

    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Layer verification failed: {0}")]
    VerifyFailed(String),

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("Invalid path: {path}: {reason}")]
    PathInvalid { path: PathBuf, reason: String },

    // Process errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command execution error: {command}, stderr: {stderr}")]
    CommandExecution { command: String, stderr: String },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl LayerkitError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Create a command execution error
    pub fn command_exec(command: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self::CommandExecution {
            command: command.into(),
            stderr: stderr.into(),
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::ManifestNotFound(_) => {
                Some("Create the manifest or pass one with: layerkit build -r <file>")
            }
            Self::UnsupportedRuntime(_) => Some("Examples: python3.12, python3.11, nodejs20.x"),
            Self::InstallFailed { .. } => Some("Re-run with -vv to see the full installer output"),
            Self::ArchiveFailed { .. } => {
                Some("Try the in-process archiver: layerkit build --archiver native")
            }
            Self::VerifyFailed(_) => Some("Rebuild with --clean to start from an empty staging tree"),
            Self::ToolNotFound { .. } => Some("Run: layerkit status"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = LayerkitError::ManifestNotFound(PathBuf::from("requirements.txt"));
        assert!(err.to_string().contains("requirements.txt"));
    }

    #[test]
    fn error_hint() {
        let err = LayerkitError::InstallFailed {
            tool: "pip".to_string(),
            reason: "no matching distribution".to_string(),
        };
        assert_eq!(
            err.hint(),
            Some("Re-run with -vv to see the full installer output")
        );
    }

    #[test]
    fn error_without_hint() {
        assert!(LayerkitError::Internal("boom".to_string()).hint().is_none());
    }

    #[test]
    fn install_failure_keeps_tool_output() {
        let err = LayerkitError::InstallFailed {
            tool: "pip".to_string(),
            reason: "ERROR: No matching distribution found for nope==9".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("pip"));
        assert!(msg.contains("No matching distribution"));
    }
}
