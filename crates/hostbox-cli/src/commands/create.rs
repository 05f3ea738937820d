//! `hostbox create` — Create a host-integrated container.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use hostbox_common::config::HostboxConfig;
use hostbox_common::error::{EXIT_SUCCESS, HostboxError};
use hostbox_core::host::{self, HostProbe, HostUser};
use hostbox_core::request::CreateRequest;
use hostbox_runtime::manager::{CliManager, ContainerManager};
use hostbox_runtime::provision::{ProvisionOutcome, Provisioner};

use crate::output::{BOLD, CYAN, DIM, GREEN, RESET, YELLOW, shell_join};

/// Arguments for the `create` command.
#[allow(clippy::struct_excessive_bools)]
#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Image to create the container from.
    #[arg(short, long, env = "HOSTBOX_CONTAINER_IMAGE")]
    pub image: Option<String>,

    /// Name of the container; derived from the image when omitted.
    #[arg(short, long, env = "HOSTBOX_CONTAINER_NAME")]
    pub name: Option<String>,

    /// Clone an existing stopped container instead of using an image.
    #[arg(short, long, conflicts_with = "image")]
    pub clone: Option<String>,

    /// Custom home directory for the container.
    #[arg(short = 'H', long)]
    pub home: Option<PathBuf>,

    /// Drive a rootful container manager through sudo.
    #[arg(short, long)]
    pub root: bool,

    /// Run a full init system inside the container.
    #[arg(short = 'I', long)]
    pub init: bool,

    /// Pull the image even if it is present locally.
    #[arg(short, long)]
    pub pull: bool,

    /// Extra flags passed verbatim to the manager's create call.
    #[arg(short, long, allow_hyphen_values = true)]
    pub additional_flags: Option<String>,

    /// Command run before the container is initialized.
    #[arg(long)]
    pub pre_init_hooks: Option<String>,

    /// Command run after the container is initialized.
    #[arg(long)]
    pub init_hooks: Option<String>,

    /// Print the create command instead of running it.
    #[arg(short, long)]
    pub dry_run: bool,
}

impl CreateArgs {
    fn request(self) -> CreateRequest {
        CreateRequest {
            image: self.image,
            name: self.name,
            custom_home: self.home,
            rootful: self.root,
            init: self.init,
            additional_flags: self.additional_flags,
            pre_init_hooks: self.pre_init_hooks,
            init_hooks: self.init_hooks,
            always_pull: self.pull,
            clone_source: self.clone,
            ..CreateRequest::default()
        }
    }
}

/// Executes the `create` command.
///
/// # Errors
///
/// Returns an error if the invocation context is wrong, no manager is
/// installed, or provisioning fails.
pub fn execute(args: CreateArgs, config: &HostboxConfig) -> anyhow::Result<i32> {
    if !args.root && std::env::var_os("SUDO_USER").is_some() {
        return Err(HostboxError::WrongContext {
            message: "running hostbox create via sudo is not supported; use --root".into(),
        }
        .into());
    }

    let home = std::env::var_os("HOME")
        .map(PathBuf::from)
        .context("HOME is not set")?;
    let shell = std::env::var("SHELL").ok();
    let user = HostUser::current(home, shell.as_deref())?;
    let facts = HostProbe::default().probe(user, host::hostname());

    let sudo = args.root.then(|| config.sudo_program.clone());
    let manager = CliManager::detect(config.manager, sudo)?;
    let dry_run = args.dry_run;
    let mut request = args.request();
    request.manager = manager.kind();

    let outcome = Provisioner::new(&manager, config).provision(request, &facts, dry_run)?;
    report(&outcome, config);
    Ok(EXIT_SUCCESS)
}

fn report(outcome: &ProvisionOutcome, config: &HostboxConfig) {
    match outcome {
        ProvisionOutcome::Created { name, image } => {
            eprintln!();
            eprintln!("  {GREEN}{BOLD}Created{RESET} {BOLD}{name}{RESET} {DIM}from {image}{RESET}");
            eprintln!();
            eprintln!("  Enter it with: {CYAN}{} {name}{RESET}", config.enter_program);
        }
        ProvisionOutcome::AlreadyExists { name } => {
            eprintln!("  {YELLOW}Container {BOLD}{name}{RESET}{YELLOW} already exists.{RESET}");
            eprintln!("  Enter it with: {CYAN}{} {name}{RESET}", config.enter_program);
        }
        ProvisionOutcome::DryRun { command } => {
            println!("{}", shell_join(command));
        }
    }
}
