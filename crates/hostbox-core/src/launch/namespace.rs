//! Host namespaces shared with the container.

/// Which host namespaces the container joins instead of creating its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct SharedNamespaces {
    /// Share the host IPC namespace.
    pub ipc: bool,
    /// Share the host network namespace.
    pub network: bool,
    /// Share the host PID namespace.
    pub pid: bool,
}

impl SharedNamespaces {
    /// IPC and network are always shared; the PID namespace only when the
    /// container does not run its own init as PID 1.
    #[must_use]
    pub const fn for_init(init: bool) -> Self {
        Self {
            ipc: true,
            network: true,
            pid: !init,
        }
    }

    /// Serializes the shared namespaces as manager flags.
    #[must_use]
    pub fn to_args(self) -> Vec<(&'static str, &'static str)> {
        let mut args = Vec::with_capacity(3);
        if self.ipc {
            args.push(("--ipc", "host"));
        }
        if self.network {
            args.push(("--network", "host"));
        }
        if self.pid {
            args.push(("--pid", "host"));
        }
        args
    }
}
