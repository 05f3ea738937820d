//! Where an export runs and where its artifacts land.

use std::path::{Path, PathBuf};

use hostbox_common::constants;

use crate::reentry::ReentryCommand;

/// Filesystem view of one export invocation.
///
/// Container paths are resolved under `container_root` and host paths
/// under `host_root`, which is where the host filesystem is mounted
/// inside the container.
#[derive(Debug, Clone)]
pub struct ExportContext {
    /// Re-entry command targeting the current container.
    pub reentry: ReentryCommand,
    /// Root of the container filesystem, normally `/`.
    pub container_root: PathBuf,
    /// Mount point of the host filesystem, normally `/run/host`.
    pub host_root: PathBuf,
    /// Home directory of the user on the host.
    pub host_home: PathBuf,
    /// Home directory of the user inside the container.
    pub container_home: PathBuf,
}

impl ExportContext {
    /// Creates a context for the live container filesystem.
    #[must_use]
    pub fn new(reentry: ReentryCommand, host_home: PathBuf, container_home: PathBuf) -> Self {
        Self {
            reentry,
            container_root: PathBuf::from("/"),
            host_root: PathBuf::from(constants::HOST_ROOT_MOUNT),
            host_home,
            container_home,
        }
    }

    /// Resolves an absolute container path against the container root.
    #[must_use]
    pub fn container_path(&self, path: &Path) -> PathBuf {
        rebase(&self.container_root, path)
    }

    /// Converts a resolved container path back to its in-container form.
    #[must_use]
    pub fn container_abs(&self, resolved: &Path) -> PathBuf {
        resolved
            .strip_prefix(&self.container_root)
            .map_or_else(|_| resolved.to_path_buf(), |rel| Path::new("/").join(rel))
    }

    /// Resolves an absolute host path against the host mount.
    #[must_use]
    pub fn host_path(&self, path: &Path) -> PathBuf {
        rebase(&self.host_root, path)
    }

    /// Host path, as the host sees it, of a file relative to the host home.
    #[must_use]
    pub fn host_home_abs(&self, relative: &Path) -> PathBuf {
        self.host_home.join(relative)
    }

    /// Resolved path of a file relative to the host home.
    #[must_use]
    pub fn host_home_path(&self, relative: &Path) -> PathBuf {
        self.host_path(&self.host_home_abs(relative))
    }

    /// Host directory receiving desktop entries.
    #[must_use]
    pub fn applications_dir(&self) -> PathBuf {
        self.host_home_path(Path::new(".local/share/applications"))
    }

    /// Host directory receiving user units.
    #[must_use]
    pub fn units_dir(&self) -> PathBuf {
        self.host_home_path(Path::new(".config/systemd/user"))
    }

    /// Default host directory receiving binary shims, as the host sees it.
    #[must_use]
    pub fn default_bin_dir(&self) -> PathBuf {
        self.host_home_abs(Path::new(".local/bin"))
    }
}

fn rebase(root: &Path, path: &Path) -> PathBuf {
    root.join(path.strip_prefix("/").unwrap_or(path))
}

#[cfg(test)]
mod tests {
    use hostbox_common::types::ContainerName;

    use super::*;

    fn ctx() -> ExportContext {
        let reentry = ReentryCommand::new("hostbox-enter", ContainerName::new("devbox").unwrap());
        ExportContext {
            container_root: PathBuf::from("/tmp/c"),
            host_root: PathBuf::from("/tmp/h"),
            ..ExportContext::new(reentry, PathBuf::from("/home/alice"), PathBuf::from("/home/alice"))
        }
    }

    #[test]
    fn live_context_uses_host_mount() {
        let reentry = ReentryCommand::new("hostbox-enter", ContainerName::new("devbox").unwrap());
        let live = ExportContext::new(reentry, PathBuf::from("/home/alice"), PathBuf::from("/home/alice"));
        assert_eq!(
            live.applications_dir(),
            PathBuf::from("/run/host/home/alice/.local/share/applications")
        );
        assert_eq!(live.container_path(Path::new("/usr/bin/mpv")), PathBuf::from("/usr/bin/mpv"));
    }

    #[test]
    fn paths_are_rebased_and_restored() {
        let ctx = ctx();
        let resolved = ctx.container_path(Path::new("/usr/share/applications/mpv.desktop"));
        assert_eq!(resolved, PathBuf::from("/tmp/c/usr/share/applications/mpv.desktop"));
        assert_eq!(
            ctx.container_abs(&resolved),
            PathBuf::from("/usr/share/applications/mpv.desktop")
        );
        assert_eq!(
            ctx.units_dir(),
            PathBuf::from("/tmp/h/home/alice/.config/systemd/user")
        );
        assert_eq!(ctx.default_bin_dir(), PathBuf::from("/home/alice/.local/bin"));
    }
}
