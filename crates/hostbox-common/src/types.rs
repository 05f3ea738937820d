//! Domain primitive types used across the hostbox workspace.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{HostboxError, Result};

/// Container manager implementation driving the containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManagerKind {
    /// Pick whichever supported manager is installed, preferring podman.
    #[default]
    Auto,
    /// Podman.
    Podman,
    /// Docker.
    Docker,
}

/// Optional manager features that alter the generated `create` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ManagerCapability {
    /// `--ulimit host`: inherit the host's resource limits.
    HostUlimits,
    /// Annotation asking the OCI runtime to keep supplementary groups.
    KeepOriginalGroups,
    /// Dedicated devpts mount on `/dev/pts`.
    DevptsMount,
    /// `--systemd=always`: run a full service manager as PID 1.
    SystemdInit,
    /// `--userns keep-id`: keep the invoking UID mapped to itself.
    KeepIdUserns,
}

impl ManagerKind {
    /// Returns the program name invoked for this manager.
    #[must_use]
    pub const fn program(self) -> &'static str {
        match self {
            Self::Auto | Self::Podman => "podman",
            Self::Docker => "docker",
        }
    }

    /// Returns whether the manager understands the given optional flag family.
    ///
    /// `Auto` must be resolved first and supports nothing on its own.
    #[must_use]
    pub const fn supports(self, capability: ManagerCapability) -> bool {
        match self {
            Self::Podman => matches!(
                capability,
                ManagerCapability::HostUlimits
                    | ManagerCapability::KeepOriginalGroups
                    | ManagerCapability::DevptsMount
                    | ManagerCapability::SystemdInit
                    | ManagerCapability::KeepIdUserns
            ),
            Self::Auto | Self::Docker => false,
        }
    }
}

impl fmt::Display for ManagerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Podman => write!(f, "podman"),
            Self::Docker => write!(f, "docker"),
        }
    }
}

impl FromStr for ManagerKind {
    type Err = HostboxError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "auto" => Ok(Self::Auto),
            "podman" => Ok(Self::Podman),
            "docker" => Ok(Self::Docker),
            other => Err(HostboxError::InvalidRequest {
                message: format!("unsupported container manager: {other}"),
            }),
        }
    }
}

/// A container name accepted by both supported managers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainerName(String);

impl ContainerName {
    /// Validates and wraps a container name.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty or contains characters the
    /// managers reject.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if !is_legal_name(&name) {
            return Err(HostboxError::InvalidRequest {
                message: format!(
                    "invalid container name \"{name}\": must match [A-Za-z0-9][A-Za-z0-9_.-]*"
                ),
            });
        }
        Ok(Self(name))
    }

    /// Derives a name from an image reference.
    ///
    /// Takes the last path segment, drops the tag and digest, and replaces
    /// characters the managers reject with `-`.
    ///
    /// # Errors
    ///
    /// Returns an error if nothing usable remains after sanitizing.
    pub fn from_image(image: &str) -> Result<Self> {
        let base = image.rsplit('/').next().unwrap_or(image);
        let base = base.split('@').next().unwrap_or(base);
        let base = base.split(':').next().unwrap_or(base);
        let sanitized: String = base
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                    c
                } else {
                    '-'
                }
            })
            .collect();
        let trimmed = sanitized.trim_start_matches(['_', '.', '-']);
        Self::new(trimmed)
    }

    /// Returns the inner string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn is_legal_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    first.is_ascii_alphanumeric()
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

/// Lifecycle state of a container as reported by the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContainerState {
    /// Created but never started.
    Created,
    /// Actively running.
    Running,
    /// Paused by the manager.
    Paused,
    /// Stopped after running.
    Exited,
    /// Any state string the manager reports that is not listed above.
    Unknown,
}

impl ContainerState {
    /// Maps a manager's state string onto a lifecycle state.
    #[must_use]
    pub fn from_manager(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "created" | "configured" | "initialized" => Self::Created,
            "running" => Self::Running,
            "paused" => Self::Paused,
            "exited" | "stopped" | "dead" => Self::Exited,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for ContainerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Running => write!(f, "running"),
            Self::Paused => write!(f, "paused"),
            Self::Exited => write!(f, "exited"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}
