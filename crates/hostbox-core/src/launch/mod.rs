//! Launch plans: the structured argument list for a container `create` call.
//!
//! A [`LaunchPlan`] stays typed until the gateway boundary, where
//! [`LaunchPlan::to_args`] flattens it into the manager's argv. Building goes
//! through [`LaunchPlanBuilder`], which refuses duplicate mount targets and
//! duplicate environment keys: the first clause for a target wins.

pub mod mount;
pub mod namespace;
pub mod synthesize;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

pub use mount::{MountMode, MountSpec};
pub use namespace::SharedNamespaces;
pub use synthesize::synthesize;

/// One typed clause of a `create` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchArg {
    /// Bare flag, e.g. `--privileged`.
    Flag(String),
    /// Flag with a value, e.g. `--hostname box`.
    Option {
        /// Flag name including dashes.
        flag: String,
        /// Flag value.
        value: String,
    },
    /// Environment assignment.
    Env {
        /// Variable name.
        key: String,
        /// Variable value.
        value: String,
    },
    /// Mount request.
    Mount(MountSpec),
    /// Caller-supplied token passed through untouched.
    Raw(String),
}

/// Arguments handed to the in-container entrypoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntrypointInvocation {
    /// In-container path of the entrypoint.
    pub program: String,
    /// Image the container runs.
    pub image: String,
    /// User name to create inside the container.
    pub user_name: String,
    /// User ID to create inside the container.
    pub uid: u32,
    /// Group ID to create inside the container.
    pub gid: u32,
    /// Effective home directory.
    pub home: PathBuf,
    /// Whether a full init system runs as PID 1.
    pub init: bool,
    /// Pre-init hook command, passed verbatim.
    pub pre_init_hooks: String,
    /// Init hook command, passed verbatim.
    pub init_hooks: String,
}

impl EntrypointInvocation {
    fn to_args(&self) -> Vec<String> {
        vec![
            "--entrypoint".to_owned(),
            self.program.clone(),
            self.image.clone(),
            "--name".to_owned(),
            self.user_name.clone(),
            "--user".to_owned(),
            self.uid.to_string(),
            "--group".to_owned(),
            self.gid.to_string(),
            "--home".to_owned(),
            self.home.display().to_string(),
            "--init".to_owned(),
            u8::from(self.init).to_string(),
            "--pre-init-hooks".to_owned(),
            self.pre_init_hooks.clone(),
            "--".to_owned(),
            self.init_hooks.clone(),
        ]
    }
}

/// Ordered, typed description of a container `create` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchPlan {
    args: Vec<LaunchArg>,
    entrypoint: EntrypointInvocation,
}

impl LaunchPlan {
    /// Returns the clauses preceding the entrypoint invocation.
    #[must_use]
    pub fn args(&self) -> &[LaunchArg] {
        &self.args
    }

    /// Returns the entrypoint invocation.
    #[must_use]
    pub const fn entrypoint(&self) -> &EntrypointInvocation {
        &self.entrypoint
    }

    /// Iterates the mount clauses in emission order.
    pub fn mounts(&self) -> impl Iterator<Item = &MountSpec> {
        self.args.iter().filter_map(|arg| match arg {
            LaunchArg::Mount(spec) => Some(spec),
            _ => None,
        })
    }

    /// Looks up an environment assignment by name.
    #[must_use]
    pub fn env(&self, key: &str) -> Option<&str> {
        self.args.iter().find_map(|arg| match arg {
            LaunchArg::Env { key: k, value } if k == key => Some(value.as_str()),
            _ => None,
        })
    }

    /// Returns whether the plan mounts something at `target`.
    #[must_use]
    pub fn mounts_target(&self, target: impl AsRef<Path>) -> bool {
        self.mounts().any(|m| m.target() == target.as_ref())
    }

    /// Flattens the plan into the argv following `<manager> create`.
    #[must_use]
    pub fn to_args(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(self.args.len() * 2 + 17);
        for arg in &self.args {
            match arg {
                LaunchArg::Flag(flag) | LaunchArg::Raw(flag) => out.push(flag.clone()),
                LaunchArg::Option { flag, value } => {
                    out.push(flag.clone());
                    out.push(value.clone());
                }
                LaunchArg::Env { key, value } => {
                    out.push("--env".to_owned());
                    out.push(format!("{key}={value}"));
                }
                LaunchArg::Mount(spec) => out.extend(spec.to_args()),
            }
        }
        out.extend(self.entrypoint.to_args());
        out
    }
}

/// Accumulates clauses while enforcing target and key uniqueness.
#[derive(Debug, Default)]
pub struct LaunchPlanBuilder {
    args: Vec<LaunchArg>,
    mount_targets: HashSet<PathBuf>,
    env_keys: HashSet<String>,
}

impl LaunchPlanBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a bare flag.
    pub fn flag(&mut self, flag: impl Into<String>) {
        self.args.push(LaunchArg::Flag(flag.into()));
    }

    /// Appends a flag with a value.
    pub fn option(&mut self, flag: impl Into<String>, value: impl Into<String>) {
        self.args.push(LaunchArg::Option {
            flag: flag.into(),
            value: value.into(),
        });
    }

    /// Appends an environment assignment unless the key is already set.
    pub fn env(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        if self.env_keys.insert(key.clone()) {
            self.args.push(LaunchArg::Env {
                key,
                value: value.into(),
            });
        } else {
            tracing::debug!(key = %key, "environment key already set, skipping");
        }
    }

    /// Appends a mount unless its target is already covered.
    pub fn mount(&mut self, spec: MountSpec) {
        if self.mount_targets.insert(spec.target().to_path_buf()) {
            self.args.push(LaunchArg::Mount(spec));
        } else {
            tracing::debug!(mount_target = %spec.target().display(), "mount target already covered, skipping");
        }
    }

    /// Appends caller-supplied arguments verbatim.
    pub fn raw(&mut self, flags: &[String]) {
        self.args.extend(flags.iter().cloned().map(LaunchArg::Raw));
    }

    /// Finishes the plan with its entrypoint invocation.
    #[must_use]
    pub fn build(self, entrypoint: EntrypointInvocation) -> LaunchPlan {
        LaunchPlan {
            args: self.args,
            entrypoint,
        }
    }
}
