//! Atomic artifact writes.
//!
//! Content is staged in a uniquely named scratch file next to the
//! destination and renamed over it. The scratch file is deleted when it
//! goes out of scope, so a failed write leaves no partial artifact.

use std::fs::{self, Permissions};
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use hostbox_common::error::{HostboxError, Result};

/// Writes `contents` to `path` with `mode`, replacing any previous file.
///
/// # Errors
///
/// Returns an error if the parent directory cannot be created or the
/// scratch file cannot be written or renamed.
pub fn write_atomic(path: &Path, contents: &str, mode: u32) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| HostboxError::InvalidRequest {
            message: format!("{} has no parent directory", path.display()),
        })?;
    fs::create_dir_all(dir).map_err(|e| HostboxError::io(dir, e))?;

    let mut scratch = tempfile::Builder::new()
        .prefix(".hostbox-")
        .tempfile_in(dir)
        .map_err(|e| HostboxError::io(dir, e))?;
    scratch
        .write_all(contents.as_bytes())
        .map_err(|e| HostboxError::io(scratch.path(), e))?;
    scratch
        .as_file()
        .set_permissions(Permissions::from_mode(mode))
        .map_err(|e| HostboxError::io(scratch.path(), e))?;
    let _ = scratch
        .persist(path)
        .map_err(|e| HostboxError::io(path, e.error))?;

    tracing::debug!(path = %path.display(), mode = %format!("{mode:o}"), "artifact written");
    Ok(())
}

/// Removes a file, mapping failures to the workspace error type.
///
/// # Errors
///
/// Returns an error if the file cannot be removed.
pub fn remove(path: &Path) -> Result<()> {
    fs::remove_file(path).map_err(|e| HostboxError::io(path, e))?;
    tracing::debug!(path = %path.display(), "artifact removed");
    Ok(())
}
