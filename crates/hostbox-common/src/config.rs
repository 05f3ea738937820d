//! Global configuration model for hostbox.
//!
//! The outer layer assembles one [`HostboxConfig`] per invocation and hands
//! it to the core by value; nothing below the CLI reads the environment.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::types::ManagerKind;

/// Root configuration for hostbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostboxConfig {
    /// Container manager to drive.
    pub manager: ManagerKind,
    /// Image used when neither an image nor a clone source is given.
    pub default_image: String,
    /// Name used together with the default image.
    pub default_name: String,
    /// Program that enters a container; embedded in re-entry commands.
    pub enter_program: String,
    /// Program prefixed to manager calls in rootful mode.
    pub sudo_program: String,
    /// Host-side paths of the companion executables mounted into containers.
    pub companions: CompanionBinaries,
}

impl Default for HostboxConfig {
    fn default() -> Self {
        Self {
            manager: ManagerKind::Auto,
            default_image: constants::DEFAULT_IMAGE.to_owned(),
            default_name: constants::DEFAULT_NAME.to_owned(),
            enter_program: constants::DEFAULT_ENTER_PROGRAM.to_owned(),
            sudo_program: constants::DEFAULT_SUDO_PROGRAM.to_owned(),
            companions: CompanionBinaries::default(),
        }
    }
}

/// Host paths of the three executables every container needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanionBinaries {
    /// Entrypoint that initializes the container on first start.
    pub entrypoint: PathBuf,
    /// Helper that exports applications, binaries and services to the host.
    pub export: PathBuf,
    /// Relay that runs commands on the host from inside the container.
    pub host_exec: PathBuf,
}

impl Default for CompanionBinaries {
    fn default() -> Self {
        Self {
            entrypoint: PathBuf::from("/usr/bin/hostbox-init"),
            export: PathBuf::from("/usr/bin/hostbox-export"),
            host_exec: PathBuf::from("/usr/bin/hostbox-host-exec"),
        }
    }
}
