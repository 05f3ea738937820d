//! Binary export: host shims that run a container executable.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use hostbox_common::constants;
use hostbox_common::error::{HostboxError, Result};

use crate::atomic;
use crate::context::ExportContext;
use crate::reentry::ReentryCommand;

/// Renders the shim for `binary`.
///
/// Outside any container the shim re-enters the target container. From
/// another container it hops to the host first. Inside the target
/// container it executes the binary directly.
#[must_use]
pub fn render_shim(reentry: &ReentryCommand, binary: &Path) -> String {
    let target = binary.display().to_string();
    let wrapped = reentry.wrap(&target);
    let container = reentry.container();
    let id = constants::CONTAINER_ID_ENV;

    let mut shim = String::new();
    let _ = writeln!(shim, "#!/bin/sh");
    let _ = writeln!(shim, "{}", constants::BINARY_SENTINEL);
    let _ = writeln!(shim, "# name: {container}");
    let _ = writeln!(shim, "if [ -z \"${{{id}:-}}\" ]; then");
    let _ = writeln!(shim, "\texec {wrapped} \"$@\"");
    let _ = writeln!(shim, "elif [ \"${{{id}}}\" != \"{container}\" ]; then");
    let _ = writeln!(shim, "\texec {} {wrapped} \"$@\"", constants::HOST_EXEC_PATH);
    let _ = writeln!(shim, "else");
    let _ = writeln!(shim, "\texec '{target}'{} \"$@\"", reentry.extra_suffix());
    let _ = writeln!(shim, "fi");
    shim
}

fn destination(ctx: &ExportContext, binary: &Path, dest_dir: Option<&Path>) -> Result<PathBuf> {
    let name = binary.file_name().ok_or_else(|| HostboxError::InvalidRequest {
        message: format!("{} does not name a file", binary.display()),
    })?;
    let dir = dest_dir.map_or_else(|| ctx.default_bin_dir(), Path::to_path_buf);
    Ok(ctx.host_path(&dir).join(name))
}

fn is_shim(path: &Path) -> bool {
    fs::read_to_string(path).is_ok_and(|t| t.contains(constants::BINARY_SENTINEL))
}

/// Writes a shim for the container executable `binary` on the host.
///
/// `dest_dir` is a host path and defaults to `~/.local/bin`.
///
/// # Errors
///
/// Returns [`HostboxError::InvalidRequest`] for a relative path,
/// [`HostboxError::NotFound`] when the binary is missing, and
/// [`HostboxError::ArtifactConflict`] when an unrelated file occupies the
/// destination.
pub fn export(ctx: &ExportContext, binary: &Path, dest_dir: Option<&Path>) -> Result<PathBuf> {
    if !binary.is_absolute() {
        return Err(HostboxError::InvalidRequest {
            message: format!("binary path must be absolute: {}", binary.display()),
        });
    }
    if !ctx.container_path(binary).is_file() {
        return Err(HostboxError::NotFound {
            kind: "binary",
            id: binary.display().to_string(),
        });
    }

    let dest = destination(ctx, binary, dest_dir)?;
    if dest.exists() && !is_shim(&dest) {
        return Err(HostboxError::ArtifactConflict { path: dest });
    }
    atomic::write_atomic(&dest, &render_shim(&ctx.reentry, binary), 0o755)?;
    tracing::info!(binary = %binary.display(), dest = %dest.display(), "binary exported");
    Ok(dest)
}

/// Removes the shim for `binary`.
///
/// # Errors
///
/// Returns [`HostboxError::NotExported`] when the destination is missing or
/// is not a shim.
pub fn unexport(ctx: &ExportContext, binary: &Path, dest_dir: Option<&Path>) -> Result<PathBuf> {
    let dest = destination(ctx, binary, dest_dir)?;
    if !is_shim(&dest) {
        return Err(HostboxError::NotExported { path: dest });
    }
    atomic::remove(&dest)?;
    Ok(dest)
}
