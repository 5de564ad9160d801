//! Error taxonomy for the acquisition and materialization pipeline
//!
//! Every variant is terminal to the current run; nothing here is retried.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Pipeline errors
#[derive(Debug, Error)]
pub enum ScaffoldError {
    /// The package registry could not answer a resolve or download request
    #[error("Registry unreachable for '{package}': {reason}")]
    RegistryUnreachable { package: String, reason: String },

    /// Creating or writing the cache store (or target directory) failed
    #[error("Failed to write {}: {source}", .path.display())]
    CacheWriteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// No catalog entry was resolved for this run
    #[error("No template selected")]
    NoTemplateSelected,

    /// Catalog entry declares an installation type we do not know
    #[error("Unknown install strategy '{value}' for template '{template}'")]
    UnknownStrategy { template: String, value: String },

    /// Command is empty or its program is not on the allow-list
    #[error("Command not allowed: '{command}'")]
    CommandNotAllowed { command: String },

    /// An allowed command ran but did not complete successfully
    #[error("{message} (command: '{command}', exit code: {})", display_code(.code))]
    CommandFailed {
        command: String,
        message: String,
        code: Option<i32>,
    },

    /// Custom template has no usable entry-point file
    #[error("Custom installer entry point missing for template '{template}'")]
    CustomInstallerMissing {
        template: String,
        path: Option<PathBuf>,
    },

    /// A template file could not be rendered
    #[error("Failed to render {}: {reason}", .path.display())]
    RenderFailed { path: PathBuf, reason: String },

    /// Version string is neither "latest" nor valid semver
    #[error("Invalid version '{value}': {source}")]
    InvalidVersion {
        value: String,
        #[source]
        source: semver::Error,
    },

    /// Downloaded artifact could not be unpacked
    #[error("Invalid archive for '{package}': {reason}")]
    InvalidArchive { package: String, reason: String },

    /// Copying the template payload into the target failed
    #[error("Failed to materialize {}: {source}", .path.display())]
    MaterializeFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ScaffoldError {
    pub(crate) fn registry(package: &str, reason: impl ToString) -> Self {
        Self::RegistryUnreachable {
            package: package.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn cache_write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::CacheWriteFailed {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn materialize(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::MaterializeFailed {
            path: path.into(),
            source,
        }
    }
}

fn display_code(code: &Option<i32>) -> String {
    code.map_or_else(|| "none".to_string(), |c| c.to_string())
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, ScaffoldError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_failed_message_includes_exit_code() {
        let err = ScaffoldError::CommandFailed {
            command: "npm install".to_string(),
            message: "dependency installation failed".to_string(),
            code: Some(1),
        };
        let text = err.to_string();
        assert!(text.starts_with("dependency installation failed"));
        assert!(text.contains("exit code: 1"));
    }

    #[test]
    fn test_command_failed_without_code() {
        let err = ScaffoldError::CommandFailed {
            command: "npm start".to_string(),
            message: "start command failed".to_string(),
            code: None,
        };
        assert!(err.to_string().contains("exit code: none"));
    }
}
