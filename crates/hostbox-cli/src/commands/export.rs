//! `hostbox export` — Export an application, binary or service to the host.

use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgGroup, Args};
use hostbox_common::config::HostboxConfig;
use hostbox_common::constants;
use hostbox_common::error::{EXIT_SUCCESS, HostboxError};
use hostbox_common::types::ContainerName;
use hostbox_core::host::HostProbe;
use hostbox_export::{ExportAction, ExportContext, ExportReport, ExportTarget, ReentryCommand};

use crate::output::{BOLD, DIM, GREEN, RESET};

/// Arguments for the `export` command.
#[allow(clippy::struct_excessive_bools)]
#[derive(Args, Debug)]
#[command(group(ArgGroup::new("target").required(true).args(["app", "bin", "service"])))]
pub struct ExportArgs {
    /// Application to export, by executable or launcher name.
    #[arg(short, long)]
    pub app: Option<String>,

    /// Absolute path of a binary to export.
    #[arg(short, long)]
    pub bin: Option<PathBuf>,

    /// Systemd unit to export.
    #[arg(short, long)]
    pub service: Option<String>,

    /// Remove the exported artifact instead of creating it.
    #[arg(short, long)]
    pub delete: bool,

    /// Label appended to exported application names; `none` disables it.
    #[arg(long)]
    pub export_label: Option<String>,

    /// Host directory receiving exported binaries.
    #[arg(long)]
    pub export_path: Option<PathBuf>,

    /// Flags appended to the exported command.
    #[arg(long, allow_hyphen_values = true)]
    pub extra_flags: Option<String>,

    /// Run the exported command through sudo inside the container.
    #[arg(short = 'S', long)]
    pub sudo: bool,

    /// The container is managed by a rootful manager.
    #[arg(short, long)]
    pub root: bool,

    /// Name of the container this command runs in.
    #[arg(long, env = constants::CONTAINER_ID_ENV, hide = true)]
    pub container_id: Option<String>,

    /// Home of the user on the host when the container uses a custom home.
    #[arg(long, env = constants::HOST_HOME_ENV, hide = true)]
    pub host_home: Option<PathBuf>,
}

impl ExportArgs {
    fn target(&self) -> ExportTarget {
        if let Some(path) = &self.bin {
            ExportTarget::Binary {
                path: path.clone(),
                dest_dir: self.export_path.clone(),
            }
        } else if let Some(unit) = &self.service {
            ExportTarget::Service { unit: unit.clone() }
        } else {
            ExportTarget::Application {
                token: self.app.clone().unwrap_or_default(),
                label: self.export_label.clone(),
            }
        }
    }

    const fn action(&self) -> ExportAction {
        if self.delete {
            ExportAction::Delete
        } else {
            ExportAction::Export
        }
    }
}

/// Executes the `export` command.
///
/// # Errors
///
/// Returns an error if run outside a container or the export fails.
pub fn execute(args: ExportArgs, config: &HostboxConfig) -> anyhow::Result<i32> {
    let container_id = args.container_id.as_deref().filter(|id| !id.is_empty());
    if !HostProbe::default().inside_container(container_id) {
        return Err(HostboxError::WrongContext {
            message: "hostbox export must be run inside a container".into(),
        }
        .into());
    }
    let container = ContainerName::new(container_id.ok_or_else(|| HostboxError::WrongContext {
        message: format!("{} is not set", constants::CONTAINER_ID_ENV),
    })?)?;

    let container_home = std::env::var_os("HOME")
        .map(PathBuf::from)
        .context("HOME is not set")?;
    let host_home = args.host_home.clone().unwrap_or_else(|| container_home.clone());

    let reentry = ReentryCommand::new(config.enter_program.clone(), container)
        .rootful(args.root)
        .sudo(args.sudo)
        .extra_flags(args.extra_flags.clone());
    let ctx = ExportContext::new(reentry, host_home, container_home);

    let report = hostbox_export::run(&ctx, &args.target(), args.action())?;
    print_report(&report);
    Ok(EXIT_SUCCESS)
}

fn print_report(report: &ExportReport) {
    match report {
        ExportReport::Exported(paths) => {
            for path in paths {
                eprintln!("  {GREEN}●{RESET} {BOLD}exported{RESET} {}", path.display());
            }
        }
        ExportReport::Unchanged(path) => {
            eprintln!("  {DIM}already exported: {}{RESET}", path.display());
        }
        ExportReport::Removed(paths) => {
            for path in paths {
                eprintln!("  {GREEN}●{RESET} {BOLD}removed{RESET} {}", path.display());
            }
        }
    }
}
