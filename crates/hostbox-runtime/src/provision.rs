//! Provisioning engine that turns a create request into a container.

use chrono::NaiveDate;
use hostbox_common::config::HostboxConfig;
use hostbox_common::error::Result;
use hostbox_common::types::ContainerName;
use hostbox_core::host::HostFacts;
use hostbox_core::launch::synthesize;
use hostbox_core::request::{CreateRequest, ImageSource};

use crate::clone::{clone_tag, resolve_clone};
use crate::manager::{ContainerManager, InspectKind};

/// Result of a provisioning run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionOutcome {
    /// The container was created.
    Created {
        /// Name of the new container.
        name: ContainerName,
        /// Image it was created from.
        image: String,
    },
    /// A container with that name already exists; nothing was done.
    AlreadyExists {
        /// Name of the existing container.
        name: ContainerName,
    },
    /// Dry run: the command that would have been executed.
    DryRun {
        /// Full manager command line.
        command: Vec<String>,
    },
}

/// Coordinates validation, cloning, pulling, synthesis and creation.
pub struct Provisioner<'a> {
    manager: &'a dyn ContainerManager,
    config: &'a HostboxConfig,
    today: NaiveDate,
}

impl<'a> Provisioner<'a> {
    /// Creates a provisioner using today's local date for clone tags.
    #[must_use]
    pub fn new(manager: &'a dyn ContainerManager, config: &'a HostboxConfig) -> Self {
        Self::with_date(manager, config, chrono::Local::now().date_naive())
    }

    /// Creates a provisioner with a fixed date for clone tags.
    #[must_use]
    pub const fn with_date(
        manager: &'a dyn ContainerManager,
        config: &'a HostboxConfig,
        today: NaiveDate,
    ) -> Self {
        Self {
            manager,
            config,
            today,
        }
    }

    /// Provisions the container described by `request` on a probed host.
    ///
    /// In dry-run mode the manager is never asked to mutate anything and
    /// clone sources are not committed.
    ///
    /// # Errors
    ///
    /// Returns an error if the request is invalid, the clone source cannot
    /// be committed, or the manager fails to pull or create.
    pub fn provision(
        &self,
        request: CreateRequest,
        facts: &HostFacts,
        dry_run: bool,
    ) -> Result<ProvisionOutcome> {
        let source = request.image_source(self.config)?;
        let cloned = matches!(source, ImageSource::Clone(_));

        let image = match source {
            ImageSource::Image(image) => image,
            ImageSource::Clone(src) if dry_run => clone_tag(&src, self.today),
            ImageSource::Clone(src) => {
                if let Some(name) = self.existing(request.name.as_deref())? {
                    return Ok(ProvisionOutcome::AlreadyExists { name });
                }
                resolve_clone(self.manager, &src, self.today)?
            }
        };

        let resolved = request.resolve(image, self.manager.kind(), self.config)?;
        let plan = synthesize(&resolved, facts);

        if dry_run {
            return Ok(ProvisionOutcome::DryRun {
                command: self.manager.create_command_line(&plan),
            });
        }

        if let Some(name) = self.existing(Some(resolved.name.as_str()))? {
            return Ok(ProvisionOutcome::AlreadyExists { name });
        }

        if !cloned && self.needs_pull(&resolved.image, resolved.always_pull)? {
            self.manager.pull(&resolved.image)?;
        }

        self.manager.create(&plan)?;
        tracing::info!(name = %resolved.name, image = %resolved.image, "container provisioned");
        Ok(ProvisionOutcome::Created {
            name: resolved.name,
            image: resolved.image,
        })
    }

    fn existing(&self, name: Option<&str>) -> Result<Option<ContainerName>> {
        let Some(name) = name else {
            return Ok(None);
        };
        let name = ContainerName::new(name)?;
        let report = self.manager.inspect(InspectKind::Container, name.as_str())?;
        if report.exists {
            tracing::info!(name = %name, "container already exists");
            return Ok(Some(name));
        }
        Ok(None)
    }

    fn needs_pull(&self, image: &str, always_pull: bool) -> Result<bool> {
        if always_pull {
            return Ok(true);
        }
        Ok(!self.manager.inspect(InspectKind::Image, image)?.exists)
    }
}
