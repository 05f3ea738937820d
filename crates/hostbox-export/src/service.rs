//! Service export: systemd user units that run inside the container.

use std::fs;
use std::path::{Path, PathBuf};

use hostbox_common::error::{HostboxError, Result};
use walkdir::WalkDir;

use crate::atomic;
use crate::context::ExportContext;
use crate::entry::EntryFile;
use crate::reentry::ReentryCommand;

/// System unit directories, most general first.
const SYSTEM_UNIT_DIRS: [&str; 3] = [
    "/usr/lib/systemd/system",
    "/lib/systemd/system",
    "/etc/systemd/system",
];

/// User unit directory relative to the container home.
const USER_UNIT_DIR: &str = ".config/systemd/user";

/// Directives whose command lines are rewritten.
pub const EXEC_DIRECTIVES: [&str; 6] = [
    "ExecStart",
    "ExecStartPre",
    "ExecStartPost",
    "ExecReload",
    "ExecStop",
    "ExecStopPost",
];

/// Special prefixes systemd accepts in front of an executable path.
const EXEC_PREFIX_CHARS: [char; 5] = ['-', '@', ':', '+', '!'];

/// Finds the most specific unit file whose name starts with `unit`.
///
/// Directories are scanned from general to specific and the last match wins.
///
/// # Errors
///
/// Returns [`HostboxError::NotFound`] when no unit matches.
pub fn find_unit(ctx: &ExportContext, unit: &str) -> Result<PathBuf> {
    let user_dir = ctx.container_home.join(USER_UNIT_DIR);
    let dirs = SYSTEM_UNIT_DIRS
        .iter()
        .map(|d| ctx.container_path(Path::new(d)))
        .chain(std::iter::once(ctx.container_path(&user_dir)));

    let mut found = None;
    for dir in dirs {
        let matches = WalkDir::new(dir)
            .max_depth(1)
            .sort_by(|a, b| a.path().cmp(b.path()))
            .into_iter()
            .filter_map(std::result::Result::ok)
            .filter(|e| e.file_type().is_file())
            .filter(|e| e.file_name().to_string_lossy().starts_with(unit));
        if let Some(last) = matches.last() {
            found = Some(last.into_path());
        }
    }

    found.ok_or_else(|| HostboxError::NotFound {
        kind: "service",
        id: unit.to_owned(),
    })
}

/// Rewrites every execution directive to run through the re-entry command.
///
/// Lines that already re-enter the container are left alone, and
/// systemd's special executable prefixes stay in front of the command.
#[must_use]
pub fn rewrite_unit(text: &str, reentry: &ReentryCommand) -> String {
    let mut file = EntryFile::parse(text);
    for directive in EXEC_DIRECTIVES {
        file.rewrite(directive, |value| {
            if reentry.is_wrapped(value) {
                return None;
            }
            let command = value.trim_start_matches(EXEC_PREFIX_CHARS);
            let prefix = &value[..value.len() - command.len()];
            Some(format!("{prefix}{}", reentry.wrap(command)))
        });
    }
    file.render()
}

/// Outcome of a service export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceExport {
    /// The unit was written.
    Written(PathBuf),
    /// An exported unit was already in place.
    Unchanged(PathBuf),
}

/// Host path of the exported unit, prefixed with the container name.
fn destination(ctx: &ExportContext, source: &Path) -> PathBuf {
    let name = source
        .file_name()
        .map_or_else(String::new, |n| n.to_string_lossy().into_owned());
    ctx.units_dir()
        .join(format!("{}-{name}", ctx.reentry.container()))
}

/// Exports the unit for `unit` into the host's user unit directory.
///
/// # Errors
///
/// Returns [`HostboxError::NotFound`] when no unit matches,
/// [`HostboxError::ArtifactConflict`] when a file that does not re-enter
/// this container occupies the destination, or an I/O error if the
/// artifact cannot be written.
pub fn export(ctx: &ExportContext, unit: &str) -> Result<ServiceExport> {
    let source = find_unit(ctx, unit)?;
    let dest = destination(ctx, &source);

    if dest.exists() {
        if fs::read_to_string(&dest).is_ok_and(|t| ctx.reentry.is_wrapped(&t)) {
            tracing::info!(dest = %dest.display(), "service already exported");
            return Ok(ServiceExport::Unchanged(dest));
        }
        return Err(HostboxError::ArtifactConflict { path: dest });
    }

    let text = fs::read_to_string(&source).map_err(|e| HostboxError::io(&source, e))?;
    atomic::write_atomic(&dest, &rewrite_unit(&text, &ctx.reentry), 0o644)?;
    tracing::info!(source = %ctx.container_abs(&source).display(), dest = %dest.display(), "service exported");
    Ok(ServiceExport::Written(dest))
}

/// Removes the exported unit for `unit`.
///
/// # Errors
///
/// Returns [`HostboxError::NotFound`] when no source unit matches and
/// [`HostboxError::NotExported`] when the destination is missing or does
/// not re-enter this container.
pub fn unexport(ctx: &ExportContext, unit: &str) -> Result<PathBuf> {
    let source = find_unit(ctx, unit)?;
    let dest = destination(ctx, &source);
    if !fs::read_to_string(&dest).is_ok_and(|t| ctx.reentry.is_wrapped(&t)) {
        return Err(HostboxError::NotExported { path: dest });
    }
    atomic::remove(&dest)?;
    Ok(dest)
}
