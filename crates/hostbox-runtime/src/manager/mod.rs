//! Container manager gateway.
//!
//! The core talks to podman or docker only through [`ContainerManager`],
//! and only reads existence, running state, and identifiers back.

pub mod cli;

use std::fmt;

use hostbox_common::error::Result;
use hostbox_common::types::{ContainerState, ManagerKind};
use hostbox_core::launch::LaunchPlan;

pub use cli::CliManager;

/// Object class an inspection targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InspectKind {
    /// A container.
    Container,
    /// A local image.
    Image,
}

impl fmt::Display for InspectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Container => write!(f, "container"),
            Self::Image => write!(f, "image"),
        }
    }
}

/// Structured fields read back from an inspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectReport {
    /// Whether the object exists.
    pub exists: bool,
    /// Lifecycle state, for containers.
    pub state: Option<ContainerState>,
    /// Manager-assigned identifier.
    pub id: Option<String>,
}

impl InspectReport {
    /// Report for an object the manager does not know.
    #[must_use]
    pub const fn missing() -> Self {
        Self {
            exists: false,
            state: None,
            id: None,
        }
    }
}

/// Narrow contract the core consumes from podman or docker.
///
/// Implementors execute one manager operation per call and report success
/// or a [`hostbox_common::error::HostboxError`]; nothing is retried.
pub trait ContainerManager {
    /// Concrete manager behind this gateway.
    fn kind(&self) -> ManagerKind;

    /// Inspects a container or image by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the manager cannot be run or its output cannot
    /// be parsed. A missing object is not an error.
    fn inspect(&self, kind: InspectKind, name: &str) -> Result<InspectReport>;

    /// Pulls an image.
    ///
    /// # Errors
    ///
    /// Returns an error if the pull fails.
    fn pull(&self, image: &str) -> Result<()>;

    /// Creates a container from a launch plan.
    ///
    /// # Errors
    ///
    /// Returns an error if creation fails; the container is then considered
    /// not created.
    fn create(&self, plan: &LaunchPlan) -> Result<()>;

    /// Commits a container to a new image tag.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit fails.
    fn commit(&self, id: &str, tag: &str) -> Result<()>;

    /// Renders the full command line `create` would run, for dry runs.
    fn create_command_line(&self, plan: &LaunchPlan) -> Vec<String>;
}
