//! Unified error types for the hostbox workspace.
//!
//! Every variant maps onto one operator-facing exit status through
//! [`HostboxError::exit_code`].

use std::path::PathBuf;

use thiserror::Error;

/// Exit status for a successful operation.
pub const EXIT_SUCCESS: i32 = 0;
/// Exit status for generic failures and invalid arguments.
pub const EXIT_FAILURE: i32 = 1;
/// Exit status for an operation run in the wrong execution context.
pub const EXIT_WRONG_CONTEXT: i32 = 126;
/// Exit status for a missing dependency or a missing export/clone target.
pub const EXIT_NOT_FOUND: i32 = 127;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum HostboxError {
    /// The operation was invoked from a context where it cannot run.
    #[error("wrong execution context: {message}")]
    WrongContext {
        /// Description of the context violation.
        message: String,
    },

    /// The request carries missing or conflicting fields.
    #[error("invalid request: {message}")]
    InvalidRequest {
        /// Description of the invalid field combination.
        message: String,
    },

    /// A required resource was not found.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Type of the missing resource.
        kind: &'static str,
        /// Identifier of the missing resource.
        id: String,
    },

    /// A required external program is not installed.
    #[error("missing dependency: {name}")]
    MissingDependency {
        /// Name of the missing program.
        name: String,
    },

    /// A clone was requested from a container that is still running.
    #[error("container {name} is running; stop it before cloning")]
    SourceRunning {
        /// Name of the running source container.
        name: String,
    },

    /// An artifact selected for removal is not managed by hostbox.
    #[error("{} is not exported by hostbox", path.display())]
    NotExported {
        /// Path of the artifact that lacks the sentinel marker.
        path: PathBuf,
    },

    /// An export would overwrite a file that hostbox does not manage.
    #[error("refusing to overwrite {}: file is not managed by hostbox", path.display())]
    ArtifactConflict {
        /// Path of the unmanaged file.
        path: PathBuf,
    },

    /// Committing a container to an image failed.
    #[error("failed to commit container {source_name} to image {tag}")]
    CommitFailed {
        /// Container that was being committed.
        source_name: String,
        /// Image tag that was requested.
        tag: String,
    },

    /// The container manager reported a failure.
    #[error("{tool} exited with status {status}: {stderr}")]
    ExternalTool {
        /// Program that failed.
        tool: String,
        /// Exit status reported by the program.
        status: i32,
        /// Captured standard error, trimmed.
        stderr: String,
    },

    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

impl HostboxError {
    /// Builds an [`HostboxError::Io`] for the given path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns the process exit status this error maps to.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::WrongContext { .. } => EXIT_WRONG_CONTEXT,
            Self::NotFound { .. } | Self::MissingDependency { .. } => EXIT_NOT_FOUND,
            Self::InvalidRequest { .. }
            | Self::SourceRunning { .. }
            | Self::NotExported { .. }
            | Self::ArtifactConflict { .. }
            | Self::CommitFailed { .. }
            | Self::ExternalTool { .. }
            | Self::Io { .. }
            | Self::Serialization { .. } => EXIT_FAILURE,
        }
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, HostboxError>;
