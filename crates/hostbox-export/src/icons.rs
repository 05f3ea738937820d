//! Icon resolution and copying for exported applications.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::context::ExportContext;

/// Directories searched for icons referenced by bare name.
pub const ICON_DIRS: [&str; 3] = [
    "/usr/share/icons",
    "/usr/share/pixmaps",
    "/var/lib/flatpak/exports/share/icons",
];

/// Source prefixes that map onto `~/.local/share` on the host.
const SHARE_PREFIXES: [&str; 2] = ["/usr/share", "/var/lib/flatpak/exports/share"];

/// Maps an in-container icon path to its location relative to the host home.
///
/// `pixmaps` trees become `icons` trees. Returns `None` for paths outside
/// the canonical prefixes.
#[must_use]
pub fn remap(source: &Path) -> Option<PathBuf> {
    let rest = SHARE_PREFIXES
        .iter()
        .find_map(|prefix| source.strip_prefix(prefix).ok())?;
    let rest = rest
        .strip_prefix("pixmaps")
        .map_or_else(|_| rest.to_path_buf(), |p| Path::new("icons").join(p));
    Some(Path::new(".local/share").join(rest))
}

/// Resolves an `Icon=` value to the in-container files it names.
///
/// An absolute path is kept as-is when it exists. A bare name matches
/// every file under [`ICON_DIRS`] with that stem.
#[must_use]
pub fn resolve(ctx: &ExportContext, icon: &str) -> Vec<PathBuf> {
    let icon = icon.trim();
    if icon.is_empty() {
        return Vec::new();
    }
    let as_path = Path::new(icon);
    if as_path.is_absolute() {
        return if ctx.container_path(as_path).is_file() {
            vec![as_path.to_path_buf()]
        } else {
            Vec::new()
        };
    }

    ICON_DIRS
        .iter()
        .flat_map(|dir| {
            WalkDir::new(ctx.container_path(Path::new(dir)))
                .sort_by(|a, b| a.path().cmp(b.path()))
                .into_iter()
                .filter_map(Result::ok)
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.path().file_stem().is_some_and(|stem| stem == icon))
        .map(|entry| ctx.container_abs(entry.path()))
        .collect()
}

/// Copies the icons named by an `Icon=` value into the host icon tree.
///
/// Returns the replacement `Icon=` value when the value was an absolute
/// path that moved. Copy failures are logged and skipped.
pub fn export(ctx: &ExportContext, icon: &str) -> Option<String> {
    let mut replacement = None;
    for source in resolve(ctx, icon) {
        let Some(relative) = remap(&source) else {
            tracing::debug!(icon = %source.display(), "icon outside shared prefixes, left in place");
            continue;
        };
        let dest = ctx.host_home_path(&relative);
        if let Err(e) = copy(&ctx.container_path(&source), &dest) {
            tracing::warn!(icon = %source.display(), error = %e, "failed to copy icon");
            continue;
        }
        if Path::new(icon.trim()).is_absolute() {
            replacement = Some(ctx.host_home_abs(&relative).display().to_string());
        }
    }
    replacement
}

fn copy(source: &Path, dest: &Path) -> std::io::Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    let _ = fs::copy(source, dest)?;
    Ok(())
}
