//! Mount clauses for the container manager's `create` call.

use std::path::{Path, PathBuf};

/// Propagation and access mode of a bind mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountMode {
    /// Read-only bind.
    ReadOnly,
    /// Recursive slave propagation: host mount events appear inside live.
    RecursiveSlave,
}

impl MountMode {
    const fn suffix(self) -> &'static str {
        match self {
            Self::ReadOnly => "ro",
            Self::RecursiveSlave => "rslave",
        }
    }
}

/// A single mount requested from the container manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MountSpec {
    /// Bind a host path into the container.
    Bind {
        /// Host path.
        source: PathBuf,
        /// In-container path.
        target: PathBuf,
        /// Propagation or access mode.
        mode: MountMode,
    },
    /// Manager-owned anonymous volume, not backed by the container overlay.
    Volume {
        /// In-container path.
        target: PathBuf,
    },
    /// Fresh devpts instance.
    Devpts {
        /// In-container path.
        target: PathBuf,
    },
}

impl MountSpec {
    /// Bind mount with recursive slave propagation at the same path.
    pub fn shared(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self::Bind {
            source: path.clone(),
            target: path,
            mode: MountMode::RecursiveSlave,
        }
    }

    /// Read-only bind mount from `source` to `target`.
    pub fn read_only(source: impl Into<PathBuf>, target: impl Into<PathBuf>) -> Self {
        Self::Bind {
            source: source.into(),
            target: target.into(),
            mode: MountMode::ReadOnly,
        }
    }

    /// In-container path this mount occupies.
    #[must_use]
    pub fn target(&self) -> &Path {
        match self {
            Self::Bind { target, .. } | Self::Volume { target } | Self::Devpts { target } => target,
        }
    }

    /// Serializes the mount into a manager flag and its value.
    #[must_use]
    pub fn to_args(&self) -> [String; 2] {
        match self {
            Self::Bind {
                source,
                target,
                mode,
            } => [
                "--volume".to_owned(),
                format!("{}:{}:{}", source.display(), target.display(), mode.suffix()),
            ],
            Self::Volume { target } => ["--volume".to_owned(), target.display().to_string()],
            Self::Devpts { target } => [
                "--mount".to_owned(),
                format!("type=devpts,destination={}", target.display()),
            ],
        }
    }
}
