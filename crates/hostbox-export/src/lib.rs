//! # hostbox-export
//!
//! Host artifact rewriter. Turns container applications, services, and
//! executables into host-side artifacts that transparently re-enter the
//! container they came from.
//!
//! Every artifact embeds the same re-entry command built by
//! [`reentry::ReentryCommand`], which doubles as the marker that gates
//! safe deletion.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod atomic;
pub mod binary;
pub mod context;
pub mod desktop;
pub mod entry;
pub mod icons;
pub mod reentry;
pub mod service;

use std::path::PathBuf;

use hostbox_common::error::Result;

pub use context::ExportContext;
pub use reentry::ReentryCommand;

/// What to export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportTarget {
    /// Desktop entries launching `token`.
    Application {
        /// Executable or launcher name to match.
        token: String,
        /// Custom name label; `none` disables it.
        label: Option<String>,
    },
    /// An executable inside the container.
    Binary {
        /// Absolute in-container path.
        path: PathBuf,
        /// Host directory for the shim.
        dest_dir: Option<PathBuf>,
    },
    /// A systemd unit.
    Service {
        /// Unit name or prefix.
        unit: String,
    },
}

/// Whether to create or remove the artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportAction {
    /// Write the host artifact.
    #[default]
    Export,
    /// Remove a previously exported artifact.
    Delete,
}

/// Result of an export invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportReport {
    /// Artifacts written.
    Exported(Vec<PathBuf>),
    /// An equivalent artifact was already present.
    Unchanged(PathBuf),
    /// Artifacts removed.
    Removed(Vec<PathBuf>),
}

/// Runs one export or delete.
///
/// # Errors
///
/// Returns an error if the target cannot be found, the artifact is not
/// managed by hostbox, or a file operation fails.
pub fn run(ctx: &ExportContext, target: &ExportTarget, action: ExportAction) -> Result<ExportReport> {
    match (target, action) {
        (ExportTarget::Application { token, label }, ExportAction::Export) => {
            let label = desktop::label_suffix(ctx.reentry.container().as_str(), label.as_deref());
            desktop::export(ctx, token, &label).map(ExportReport::Exported)
        }
        (ExportTarget::Application { token, .. }, ExportAction::Delete) => {
            desktop::unexport(ctx, token).map(ExportReport::Removed)
        }
        (ExportTarget::Binary { path, dest_dir }, ExportAction::Export) => {
            binary::export(ctx, path, dest_dir.as_deref()).map(|p| ExportReport::Exported(vec![p]))
        }
        (ExportTarget::Binary { path, dest_dir }, ExportAction::Delete) => {
            binary::unexport(ctx, path, dest_dir.as_deref()).map(|p| ExportReport::Removed(vec![p]))
        }
        (ExportTarget::Service { unit }, ExportAction::Export) => {
            service::export(ctx, unit).map(|outcome| match outcome {
                service::ServiceExport::Written(p) => ExportReport::Exported(vec![p]),
                service::ServiceExport::Unchanged(p) => ExportReport::Unchanged(p),
            })
        }
        (ExportTarget::Service { unit }, ExportAction::Delete) => {
            service::unexport(ctx, unit).map(|p| ExportReport::Removed(vec![p]))
        }
    }
}
