//! Host execution relay.
//!
//! Runs a command on the host from inside a container, either through a
//! spawn service listening on the session bus or by chrooting into the
//! host root mounted at `/run/host`. The working directory and a filtered
//! environment snapshot are explicit inputs.

use std::path::{Path, PathBuf};
use std::process::Command;

use hostbox_common::constants;
use hostbox_common::error::{HostboxError, Result};

/// Variable names never forwarded to the host.
const BLOCKED_NAMES: [&str; 6] = ["HOST", "HOSTNAME", "HOME", "PATH", "PROFILEREAD", "SHELL"];

/// Characters that disqualify a value from forwarding.
const BLOCKED_VALUE_CHARS: [char; 4] = ['"', '\'', '`', '$'];

/// How the relay reaches the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayStrategy {
    /// Delegate to a host spawn service client.
    Spawn(PathBuf),
    /// `chroot` into the host root filesystem.
    Chroot,
}

impl RelayStrategy {
    /// Picks the spawn service when installed, unless `force_chroot` is set.
    #[must_use]
    pub fn detect(force_chroot: bool) -> Self {
        if force_chroot {
            return Self::Chroot;
        }
        which::which(constants::HOST_SPAWN_PROGRAM).map_or(Self::Chroot, Self::Spawn)
    }
}

/// A command to run on the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayRequest {
    /// Program and arguments; empty runs the host user's shell.
    pub command: Vec<String>,
    /// Working directory to run in.
    pub cwd: PathBuf,
    /// Environment forwarded to the host, already filtered.
    pub env: Vec<(String, String)>,
    /// Caller's user ID.
    pub uid: u32,
    /// Caller's group ID.
    pub gid: u32,
    /// Shell used when no command is given.
    pub shell: String,
}

/// Fully resolved process invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayCommand {
    /// Program to execute.
    pub program: String,
    /// Arguments to the program.
    pub args: Vec<String>,
    /// Working directory for the spawned process, if it must be set.
    pub cwd: Option<PathBuf>,
}

/// Filters an environment snapshot down to what may cross to the host.
///
/// Drops private names (leading `_`), host-identity variables, `XDG_*_DIRS`
/// search paths, and values containing whitespace or shell quoting.
pub fn filter_env(vars: impl IntoIterator<Item = (String, String)>) -> Vec<(String, String)> {
    let mut kept: Vec<(String, String)> = vars
        .into_iter()
        .filter(|(key, value)| forwardable(key, value))
        .collect();
    kept.sort();
    kept
}

fn forwardable(key: &str, value: &str) -> bool {
    if key.is_empty() || key.starts_with('_') || BLOCKED_NAMES.contains(&key) {
        return false;
    }
    if key.starts_with("XDG_") && key.ends_with("_DIRS") {
        return false;
    }
    !value
        .chars()
        .any(|c| c.is_whitespace() || BLOCKED_VALUE_CHARS.contains(&c))
}

/// Builds the host invocation for a request under a strategy.
#[must_use]
pub fn plan_relay(request: &RelayRequest, strategy: &RelayStrategy, host_root: &Path) -> RelayCommand {
    let command = if request.command.is_empty() {
        vec![request.shell.clone()]
    } else {
        request.command.clone()
    };

    match strategy {
        RelayStrategy::Spawn(program) => RelayCommand {
            program: program.display().to_string(),
            args: command,
            cwd: Some(request.cwd.clone()),
        },
        RelayStrategy::Chroot => {
            let mut args = vec![
                format!("--userspec={}:{}", request.uid, request.gid),
                format!("{}/", host_root.display()),
                "/usr/bin/env".to_owned(),
            ];
            args.extend(request.env.iter().map(|(k, v)| format!("{k}={v}")));
            args.extend([
                "sh".to_owned(),
                "-c".to_owned(),
                r#"cd "$1" && shift && exec "$@""#.to_owned(),
                "sh".to_owned(),
                request.cwd.display().to_string(),
            ]);
            args.extend(command);
            RelayCommand {
                program: "chroot".to_owned(),
                args,
                cwd: None,
            }
        }
    }
}

/// Runs a relay command to completion and returns its exit status.
///
/// # Errors
///
/// Returns an error if the process cannot be spawned.
pub fn run_relay(command: &RelayCommand) -> Result<i32> {
    tracing::info!(program = %command.program, args = ?command.args, "relaying command to host");
    let mut cmd = Command::new(&command.program);
    let _ = cmd.args(&command.args);
    if let Some(cwd) = &command.cwd {
        let _ = cmd.current_dir(cwd);
    }
    let status = cmd.status().map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => HostboxError::MissingDependency {
            name: command.program.clone(),
        },
        _ => HostboxError::io(&command.program, e),
    })?;
    Ok(status.code().unwrap_or(1))
}
