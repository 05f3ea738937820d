//! Host capability probing.
//!
//! Inspects the host filesystem once per launch for optional integration
//! points. Every probe is a read-only query; the result is an immutable
//! [`HostFacts`] snapshot consumed by the launch synthesizer.

use std::path::{Path, PathBuf};

use hostbox_common::constants;
use hostbox_common::error::{HostboxError, Result};

/// Identity of the user invoking hostbox on the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostUser {
    /// Login name.
    pub name: String,
    /// Numeric user ID.
    pub uid: u32,
    /// Numeric primary group ID.
    pub gid: u32,
    /// Home directory on the host.
    pub home: PathBuf,
    /// Login shell basename, e.g. `bash`.
    pub shell: String,
}

impl HostUser {
    /// Resolves the calling user from the process credentials.
    ///
    /// `home` and `shell` come from the outer layer's environment snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the user database has no entry for the caller.
    #[cfg(target_os = "linux")]
    pub fn current(home: PathBuf, shell: Option<&str>) -> Result<Self> {
        use nix::unistd::{User, getgid, getuid};

        let uid = getuid();
        let user = User::from_uid(uid)
            .map_err(|e| HostboxError::NotFound {
                kind: "user",
                id: format!("{uid}: {e}"),
            })?
            .ok_or_else(|| HostboxError::NotFound {
                kind: "user",
                id: uid.to_string(),
            })?;
        let shell = shell
            .map(|s| Path::new(s).file_name().map_or(s, |n| n.to_str().unwrap_or(s)))
            .unwrap_or("bash")
            .to_owned();
        Ok(Self {
            name: user.name,
            uid: uid.as_raw(),
            gid: getgid().as_raw(),
            home,
            shell,
        })
    }

    /// Stub for non-Linux platforms.
    ///
    /// # Errors
    ///
    /// Always returns an error; hostbox requires Linux.
    #[cfg(not(target_os = "linux"))]
    pub fn current(_home: PathBuf, _shell: Option<&str>) -> Result<Self> {
        Err(HostboxError::WrongContext {
            message: "hostbox requires a Linux host".into(),
        })
    }
}

/// Snapshot of optional host integration points.
///
/// An absent fact means the matching launch clause is omitted, never
/// replaced by a default.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostFacts {
    /// The invoking user.
    pub user: HostUser,
    /// Host name of the machine.
    pub hostname: String,
    /// `/sys/fs/selinux` exists.
    pub selinux: bool,
    /// `/nix` exists.
    pub nix_store: bool,
    /// Resolved target when `/dev/shm` is a symlink.
    pub shm_target: Option<PathBuf>,
    /// `/run/user/<uid>`, when present.
    pub runtime_dir: Option<PathBuf>,
    /// `/var/home/<user>`, when present and distinct from the user's home.
    pub ostree_home: Option<PathBuf>,
    /// `/var/log/journal` exists on the host.
    ///
    /// Informational only: it is logged with the other facts, while the
    /// launch plan always gives the container its own journal volume.
    pub journal: bool,
}

/// Probes a host filesystem rooted at a configurable prefix.
///
/// Production code probes `/`; tests point the prober at a scratch tree.
#[derive(Debug, Clone)]
pub struct HostProbe {
    root: PathBuf,
}

impl HostProbe {
    /// Creates a prober for the filesystem mounted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Collects all host facts for the given user.
    #[must_use]
    pub fn probe(&self, user: HostUser, hostname: String) -> HostFacts {
        let facts = HostFacts {
            selinux: self.host("/sys/fs/selinux").exists(),
            nix_store: self.host("/nix").is_dir(),
            shm_target: self.shm_target(),
            runtime_dir: self.runtime_dir(user.uid),
            ostree_home: self.ostree_home(&user),
            journal: self.host("/var/log/journal").is_dir(),
            hostname,
            user,
        };
        tracing::debug!(facts = ?facts, root = %self.root.display(), "probed host");
        facts
    }

    /// Returns whether the probed filesystem belongs to a container.
    ///
    /// A non-empty `CONTAINER_ID` or either manager's marker file counts.
    #[must_use]
    pub fn inside_container(&self, container_id: Option<&str>) -> bool {
        container_id.is_some_and(|id| !id.is_empty())
            || constants::CONTAINER_MARKERS
                .iter()
                .any(|marker| self.host(marker).exists())
    }

    fn host(&self, absolute: &str) -> PathBuf {
        self.root.join(absolute.trim_start_matches('/'))
    }

    fn shm_target(&self) -> Option<PathBuf> {
        let shm = self.host("/dev/shm");
        let is_link = std::fs::symlink_metadata(&shm).is_ok_and(|m| m.file_type().is_symlink());
        if !is_link {
            return None;
        }
        let resolved = std::fs::canonicalize(&shm).ok()?;
        let root = std::fs::canonicalize(&self.root).unwrap_or_else(|_| self.root.clone());
        let relative = resolved.strip_prefix(&root).ok()?;
        Some(Path::new("/").join(relative))
    }

    fn runtime_dir(&self, uid: u32) -> Option<PathBuf> {
        let path = format!("/run/user/{uid}");
        self.host(&path).is_dir().then(|| PathBuf::from(path))
    }

    fn ostree_home(&self, user: &HostUser) -> Option<PathBuf> {
        let path = PathBuf::from("/var/home").join(&user.name);
        if path == user.home {
            return None;
        }
        self.host(&path.to_string_lossy()).is_dir().then_some(path)
    }
}

impl Default for HostProbe {
    fn default() -> Self {
        Self::new("/")
    }
}

/// Returns the host name of the machine, falling back to `localhost`.
#[must_use]
pub fn hostname() -> String {
    #[cfg(target_os = "linux")]
    {
        nix::unistd::gethostname()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "localhost".to_owned())
    }
    #[cfg(not(target_os = "linux"))]
    {
        "localhost".to_owned()
    }
}
