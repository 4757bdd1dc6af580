//! Error handling for plugin publishing
//!
//! This module provides the error taxonomy of a publish run with recovery
//! guidance, using the thiserror crate for ergonomic error handling.
//!
//! Per-package publish failures are not represented here: they are recorded
//! in the run's result and never abort the batch.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for plugin publishing operations
#[derive(Error, Debug)]
pub enum PublishError {
    // Fatal preconditions
    #[error("artifact root not found: {}", path.display())]
    ArtifactRootMissing { path: PathBuf },

    #[error("registry document not found: {}", path.display())]
    RegistryDocumentMissing { path: PathBuf },

    #[error("registry identity check failed: {message}")]
    IdentityCheckFailed { message: String },

    // Selection errors
    #[error("no plugins match the specified criteria ({} available)", available.len())]
    FilterEmpty { available: Vec<String> },

    // Version errors
    #[error("a version is required to publish")]
    VersionRequired,

    #[error("publishing cancelled by operator")]
    Cancelled,

    // State errors
    #[error("invalid publish state transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    // Document errors
    #[error("invalid manifest {}: {message}", path.display())]
    ManifestInvalid { path: PathBuf, message: String },

    #[error("{} is outside of {}", path.display(), root.display())]
    PathOutsideRoot { path: PathBuf, root: PathBuf },

    #[error("configuration error: {0}")]
    ConfigError(String),

    // Command execution errors
    #[error("command error: {0}")]
    Command(#[from] crate::security::CommandError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PublishError {
    /// Check if this error aborts a run before any local mutation
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ArtifactRootMissing { .. }
                | Self::RegistryDocumentMissing { .. }
                | Self::IdentityCheckFailed { .. }
                | Self::FilterEmpty { .. }
                | Self::ConfigError(_)
        )
    }

    /// Process exit code the CLI reports for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Cancelled => 0,
            _ => 1,
        }
    }

    /// Get suggested actions for this error
    pub fn suggested_actions(&self) -> Vec<&'static str> {
        match self {
            Self::ArtifactRootMissing { .. } => vec![
                "Build the plugins before publishing",
                "Check packageRoot and distDir in .plugin-publisher.yaml",
            ],
            Self::RegistryDocumentMissing { .. } => vec![
                "Run `plugin-publisher generate` to regenerate the registry document",
                "Pass --scan to read the artifact tree directly",
            ],
            Self::IdentityCheckFailed { .. } => vec![
                "Run `npm login`",
                "Check that npm is installed and on PATH",
            ],
            Self::FilterEmpty { .. } => {
                vec!["Compare the filters with the available plugin list"]
            }
            Self::VersionRequired => vec!["Pass --version <VERSION>"],
            Self::Cancelled => vec![],
            Self::InvalidTransition { .. } => vec!["Report this as a bug"],
            Self::ManifestInvalid { .. } => vec![
                "Fix or delete the manifest and run `plugin-publisher generate`",
            ],
            Self::PathOutsideRoot { .. } => {
                vec!["Keep distDir inside packageRoot"]
            }
            Self::ConfigError(_) => vec!["Check .plugin-publisher.yaml"],
            Self::Command(_) => vec![
                "Check the command output",
                "Check that npm is installed and on PATH",
            ],
            Self::Io(_) => vec!["Check file permissions and paths"],
            Self::Json(_) => vec!["Check that the JSON documents are well-formed"],
        }
    }

    /// Get error code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::ArtifactRootMissing { .. } => "ARTIFACT_ROOT_MISSING",
            Self::RegistryDocumentMissing { .. } => "REGISTRY_DOCUMENT_MISSING",
            Self::IdentityCheckFailed { .. } => "IDENTITY_CHECK_FAILED",
            Self::FilterEmpty { .. } => "FILTER_EMPTY",
            Self::VersionRequired => "VERSION_REQUIRED",
            Self::Cancelled => "CANCELLED",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::ManifestInvalid { .. } => "MANIFEST_INVALID",
            Self::PathOutsideRoot { .. } => "PATH_OUTSIDE_ROOT",
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::Command(_) => "COMMAND_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Json(_) => "JSON_ERROR",
        }
    }
}

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, PublishError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_root_missing_is_fatal() {
        let error = PublishError::ArtifactRootMissing {
            path: PathBuf::from("packages/plugins/dist"),
        };

        assert!(error.is_fatal());
        assert_eq!(error.code(), "ARTIFACT_ROOT_MISSING");
        assert_eq!(error.exit_code(), 1);
        assert!(error.to_string().contains("packages/plugins/dist"));
        assert!(!error.suggested_actions().is_empty());
    }

    #[test]
    fn test_filter_empty_reports_available_count() {
        let error = PublishError::FilterEmpty {
            available: vec![
                "@droply/plugins-nodejs-compression-gzip".to_string(),
                "@droply/plugins-web-archive-tar".to_string(),
            ],
        };

        assert!(error.is_fatal());
        assert!(error.to_string().contains("2 available"));
    }

    #[test]
    fn test_cancelled_exits_cleanly() {
        let error = PublishError::Cancelled;

        assert!(!error.is_fatal());
        assert_eq!(error.exit_code(), 0);
        assert!(error.suggested_actions().is_empty());
    }

    #[test]
    fn test_identity_check_failed() {
        let error = PublishError::IdentityCheckFailed {
            message: "ENEEDAUTH".to_string(),
        };

        assert_eq!(error.code(), "IDENTITY_CHECK_FAILED");
        assert!(error.is_fatal());
        assert!(
            error
                .suggested_actions()
                .iter()
                .any(|a| a.contains("npm login"))
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let error: PublishError = io.into();

        assert_eq!(error.code(), "IO_ERROR");
        assert!(!error.is_fatal());
    }

    #[test]
    fn test_invalid_transition_display() {
        let error = PublishError::InvalidTransition {
            from: "Init".to_string(),
            to: "Done".to_string(),
        };

        assert_eq!(
            error.to_string(),
            "invalid publish state transition: Init -> Done"
        );
    }
}
