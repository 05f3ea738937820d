//! Gateway backed by the podman or docker command-line interface.

use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

use hostbox_common::error::{HostboxError, Result};
use hostbox_common::types::{ContainerState, ManagerKind};
use hostbox_core::launch::LaunchPlan;
use serde::Deserialize;

use super::{ContainerManager, InspectKind, InspectReport};

/// One element of the JSON array printed by `<manager> inspect`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InspectEntry {
    id: String,
    #[serde(default)]
    state: Option<InspectState>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InspectState {
    status: String,
}

/// Runs manager operations by spawning the manager binary.
#[derive(Debug, Clone)]
pub struct CliManager {
    kind: ManagerKind,
    program: PathBuf,
    sudo: Option<String>,
}

impl CliManager {
    /// Creates a gateway for an explicit manager binary.
    ///
    /// In rootful mode every call is prefixed with `sudo`.
    #[must_use]
    pub fn new(kind: ManagerKind, program: impl Into<PathBuf>, sudo: Option<String>) -> Self {
        Self {
            kind,
            program: program.into(),
            sudo,
        }
    }

    /// Locates the requested manager on `PATH`.
    ///
    /// [`ManagerKind::Auto`] prefers podman and falls back to docker.
    ///
    /// # Errors
    ///
    /// Returns [`HostboxError::MissingDependency`] if no suitable manager
    /// is installed.
    pub fn detect(kind: ManagerKind, sudo: Option<String>) -> Result<Self> {
        let candidates: &[ManagerKind] = match kind {
            ManagerKind::Auto => &[ManagerKind::Podman, ManagerKind::Docker],
            ManagerKind::Podman => &[ManagerKind::Podman],
            ManagerKind::Docker => &[ManagerKind::Docker],
        };
        for candidate in candidates {
            if let Ok(program) = which::which(candidate.program()) {
                tracing::debug!(manager = %candidate, program = %program.display(), "container manager found");
                return Ok(Self::new(*candidate, program, sudo));
            }
        }
        Err(HostboxError::MissingDependency {
            name: match kind {
                ManagerKind::Auto => "podman or docker".to_owned(),
                other => other.program().to_owned(),
            },
        })
    }

    fn command(&self) -> Command {
        match &self.sudo {
            Some(sudo) => {
                let mut cmd = Command::new(sudo);
                let _ = cmd.arg(&self.program);
                cmd
            }
            None => Command::new(&self.program),
        }
    }

    fn output(&self, args: &[&str]) -> Result<Output> {
        tracing::debug!(program = %self.program.display(), ?args, "running container manager");
        self.command()
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| HostboxError::io(&self.program, e))
    }

    fn check(&self, output: &Output) -> Result<()> {
        if output.status.success() {
            return Ok(());
        }
        Err(HostboxError::ExternalTool {
            tool: self.kind.program().to_owned(),
            status: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
        })
    }
}

impl ContainerManager for CliManager {
    fn kind(&self) -> ManagerKind {
        self.kind
    }

    fn inspect(&self, kind: InspectKind, name: &str) -> Result<InspectReport> {
        let kind_arg = kind.to_string();
        let output = self.output(&["inspect", "--type", &kind_arg, name])?;
        if !output.status.success() {
            return Ok(InspectReport::missing());
        }
        parse_inspect(&output.stdout)
    }

    fn pull(&self, image: &str) -> Result<()> {
        tracing::info!(image, "pulling image");
        let status = self
            .command()
            .args(["pull", image])
            .status()
            .map_err(|e| HostboxError::io(&self.program, e))?;
        if status.success() {
            return Ok(());
        }
        Err(HostboxError::ExternalTool {
            tool: self.kind.program().to_owned(),
            status: status.code().unwrap_or(-1),
            stderr: format!("could not pull image {image}"),
        })
    }

    fn create(&self, plan: &LaunchPlan) -> Result<()> {
        let mut args = vec!["create".to_owned()];
        args.extend(plan.to_args());
        let refs: Vec<&str> = args.iter().map(String::as_str).collect();
        let output = self.output(&refs)?;
        self.check(&output)?;
        tracing::info!(
            id = %String::from_utf8_lossy(&output.stdout).trim(),
            "container created"
        );
        Ok(())
    }

    fn commit(&self, id: &str, tag: &str) -> Result<()> {
        let output = self.output(&["container", "commit", id, tag])?;
        self.check(&output)
    }

    fn create_command_line(&self, plan: &LaunchPlan) -> Vec<String> {
        let mut line = Vec::new();
        if let Some(sudo) = &self.sudo {
            line.push(sudo.clone());
        }
        line.push(self.program.display().to_string());
        line.push("create".to_owned());
        line.extend(plan.to_args());
        line
    }
}

/// Parses `<manager> inspect` JSON into the fields the core consumes.
fn parse_inspect(stdout: &[u8]) -> Result<InspectReport> {
    let entries: Vec<InspectEntry> = serde_json::from_slice(stdout)?;
    Ok(entries
        .into_iter()
        .next()
        .map_or_else(InspectReport::missing, |entry| InspectReport {
            exists: true,
            state: entry
                .state
                .map(|s| ContainerState::from_manager(&s.status)),
            id: Some(entry.id),
        }))
}
