//! CLI command definitions and dispatch.

pub mod create;
pub mod export;
pub mod host_exec;

use clap::{Parser, Subcommand};
use hostbox_common::config::HostboxConfig;
use hostbox_common::constants;
use hostbox_common::types::ManagerKind;

/// hostbox — containers tightly integrated with the host.
#[derive(Parser, Debug)]
#[command(name = "hostbox", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Show debug logs.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Container manager to drive (auto, podman, docker).
    #[arg(long, global = true, env = "HOSTBOX_CONTAINER_MANAGER", default_value = "auto")]
    pub manager: ManagerKind,

    /// Program that enters a container, embedded in exported artifacts.
    #[arg(long, global = true, env = "HOSTBOX_ENTER_PATH", default_value = constants::DEFAULT_ENTER_PROGRAM)]
    pub enter_program: String,

    /// Program used to run the manager as root.
    #[arg(long, global = true, env = "HOSTBOX_SUDO_PROGRAM", default_value = constants::DEFAULT_SUDO_PROGRAM)]
    pub sudo_program: String,
}

impl Cli {
    /// Assembles the invocation's configuration from flags and environment.
    fn config(&self) -> HostboxConfig {
        HostboxConfig {
            manager: self.manager,
            enter_program: self.enter_program.clone(),
            sudo_program: self.sudo_program.clone(),
            ..HostboxConfig::default()
        }
    }
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a container integrated with the host.
    Create(create::CreateArgs),
    /// Export an application, binary or service to the host.
    Export(export::ExportArgs),
    /// Run a command on the host from inside a container.
    HostExec(host_exec::HostExecArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// Returns the process exit status on success.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<i32> {
    let config = cli.config();
    match cli.command {
        Command::Create(args) => create::execute(args, &config),
        Command::Export(args) => export::execute(args, &config),
        Command::HostExec(args) => host_exec::execute(args),
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_feed_configuration() {
        let cli = Cli::try_parse_from([
            "hostbox",
            "--manager",
            "docker",
            "--enter-program",
            "/opt/hostbox/enter",
            "create",
        ])
        .expect("parse");
        let cfg = cli.config();
        assert_eq!(cfg.manager, ManagerKind::Docker);
        assert_eq!(cfg.enter_program, "/opt/hostbox/enter");
        assert_eq!(cfg.default_image, constants::DEFAULT_IMAGE);
    }
}
