//! Container create requests.
//!
//! A [`CreateRequest`] is what the operator asked for. Validation and
//! defaulting turn it into a [`ResolvedRequest`], the only input the
//! launch synthesizer accepts.

use std::path::PathBuf;

use hostbox_common::config::{CompanionBinaries, HostboxConfig};
use hostbox_common::error::{HostboxError, Result};
use hostbox_common::types::{ContainerName, ManagerKind};

/// Declarative description of the container to create.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateRequest {
    /// Image reference; defaults to the configured image.
    pub image: Option<String>,
    /// Container name; derived from the image when absent.
    pub name: Option<String>,
    /// Home directory to use inside the container instead of the host home.
    pub custom_home: Option<PathBuf>,
    /// Drive a rootful manager.
    pub rootful: bool,
    /// Run a full init system as PID 1 instead of sharing the host PID namespace.
    pub init: bool,
    /// Container manager to drive.
    pub manager: ManagerKind,
    /// Raw manager flags appended verbatim after every generated clause.
    pub additional_flags: Option<String>,
    /// Command run by the entrypoint before container initialization.
    pub pre_init_hooks: Option<String>,
    /// Command run by the entrypoint after container initialization.
    pub init_hooks: Option<String>,
    /// Pull the image even if it is present locally.
    pub always_pull: bool,
    /// Existing container to clone instead of pulling an image.
    pub clone_source: Option<String>,
}

/// Where the image for a new container comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// A registry or local image reference.
    Image(String),
    /// An existing container to commit into a fresh image.
    Clone(ContainerName),
}

impl CreateRequest {
    /// Validates the request and decides where its image comes from.
    ///
    /// # Errors
    ///
    /// Returns [`HostboxError::InvalidRequest`] when the image and clone
    /// source are both set, a clone has no explicit name, or the custom home
    /// is not absolute.
    pub fn image_source(&self, config: &HostboxConfig) -> Result<ImageSource> {
        if let Some(home) = &self.custom_home {
            if !home.is_absolute() {
                return Err(HostboxError::InvalidRequest {
                    message: format!("custom home must be absolute: {}", home.display()),
                });
            }
        }
        match (&self.image, &self.clone_source) {
            (Some(_), Some(_)) => Err(HostboxError::InvalidRequest {
                message: "an image and a clone source are mutually exclusive".into(),
            }),
            (None, Some(source)) => {
                if self.name.is_none() {
                    return Err(HostboxError::InvalidRequest {
                        message: "a name is required when cloning a container".into(),
                    });
                }
                Ok(ImageSource::Clone(ContainerName::new(source.as_str())?))
            }
            (Some(image), None) if image.trim().is_empty() => Err(HostboxError::InvalidRequest {
                message: "image reference is empty".into(),
            }),
            (Some(image), None) => Ok(ImageSource::Image(image.clone())),
            (None, None) => Ok(ImageSource::Image(config.default_image.clone())),
        }
    }

    /// Binds the request to a concrete image and manager.
    ///
    /// The name defaults together with the image: no image and no clone
    /// source yields the configured default name, otherwise the name is
    /// derived from the image reference.
    ///
    /// # Errors
    ///
    /// Returns an error if the manager is unresolved or the name is illegal.
    pub fn resolve(
        self,
        image: String,
        manager: ManagerKind,
        config: &HostboxConfig,
    ) -> Result<ResolvedRequest> {
        if manager == ManagerKind::Auto {
            return Err(HostboxError::InvalidRequest {
                message: "container manager must be resolved before synthesis".into(),
            });
        }
        let name = match (&self.name, &self.image, &self.clone_source) {
            (Some(name), _, _) => ContainerName::new(name.as_str())?,
            (None, None, None) => ContainerName::new(config.default_name.as_str())?,
            (None, _, _) => ContainerName::from_image(&image)?,
        };
        Ok(ResolvedRequest {
            image,
            name,
            custom_home: self.custom_home,
            rootful: self.rootful,
            init: self.init,
            manager,
            additional_flags: split_flags(self.additional_flags.as_deref())?,
            pre_init_hooks: self.pre_init_hooks.unwrap_or_default(),
            init_hooks: self.init_hooks.unwrap_or_default(),
            always_pull: self.always_pull,
            companions: config.companions.clone(),
        })
    }
}

/// Splits caller-supplied manager flags with shell quoting rules.
fn split_flags(flags: Option<&str>) -> Result<Vec<String>> {
    let Some(flags) = flags else {
        return Ok(Vec::new());
    };
    shell_words::split(flags).map_err(|e| HostboxError::InvalidRequest {
        message: format!("cannot parse additional flags {flags:?}: {e}"),
    })
}

/// A validated request with its image, name and manager settled.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRequest {
    /// Image the container is created from.
    pub image: String,
    /// Container name.
    pub name: ContainerName,
    /// Custom home directory, if any.
    pub custom_home: Option<PathBuf>,
    /// Drive a rootful manager.
    pub rootful: bool,
    /// Run a full init system.
    pub init: bool,
    /// Concrete container manager.
    pub manager: ManagerKind,
    /// Raw manager flags appended verbatim, already split into arguments.
    pub additional_flags: Vec<String>,
    /// Pre-init hook command, possibly empty.
    pub pre_init_hooks: String,
    /// Init hook command, possibly empty.
    pub init_hooks: String,
    /// Pull even when the image is present.
    pub always_pull: bool,
    /// Companion executables mounted into the container.
    pub companions: CompanionBinaries,
}
