//! `hostbox host-exec` — Run a command on the host from inside a container.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use hostbox_common::constants;
use hostbox_common::error::HostboxError;
use hostbox_core::host::{HostProbe, HostUser};
use hostbox_runtime::relay::{self, RelayRequest, RelayStrategy};

/// Arguments for the `host-exec` command.
#[derive(Args, Debug)]
pub struct HostExecArgs {
    /// Skip the host spawn service and chroot into the host filesystem.
    #[arg(long)]
    pub chroot: bool,

    /// Name of the container this command runs in.
    #[arg(long, env = constants::CONTAINER_ID_ENV, hide = true)]
    pub container_id: Option<String>,

    /// Command to run on the host; the user's shell when omitted.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

/// Executes the `host-exec` command and returns the host command's status.
///
/// # Errors
///
/// Returns an error if run outside a container or the relay cannot start.
pub fn execute(args: HostExecArgs) -> anyhow::Result<i32> {
    if !HostProbe::default().inside_container(args.container_id.as_deref()) {
        return Err(HostboxError::WrongContext {
            message: "hostbox host-exec must be run inside a container".into(),
        }
        .into());
    }

    let home = std::env::var_os("HOME")
        .map(PathBuf::from)
        .context("HOME is not set")?;
    let shell = std::env::var("SHELL").ok();
    let user = HostUser::current(home, shell.as_deref())?;
    let cwd = std::env::current_dir().context("cannot determine the working directory")?;

    let request = RelayRequest {
        command: args.command,
        cwd,
        env: relay::filter_env(std::env::vars()),
        uid: user.uid,
        gid: user.gid,
        shell: user.shell,
    };
    let strategy = RelayStrategy::detect(args.chroot);
    tracing::debug!(?strategy, "host relay strategy selected");
    let command = relay::plan_relay(&request, &strategy, Path::new(constants::HOST_ROOT_MOUNT));
    Ok(relay::run_relay(&command)?)
}
