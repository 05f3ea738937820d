//! System-wide constants and default paths.

/// Application name used in labels and CLI output.
pub const APP_NAME: &str = "hostbox";

/// Binary name for the CLI.
pub const BIN_NAME: &str = "hostbox";

/// Image used when neither an image nor a clone source is requested.
pub const DEFAULT_IMAGE: &str = "registry.fedoraproject.org/fedora-toolbox:latest";

/// Container name used together with [`DEFAULT_IMAGE`].
pub const DEFAULT_NAME: &str = "my-hostbox";

/// Program that enters a named container; used by re-entry commands.
pub const DEFAULT_ENTER_PROGRAM: &str = "hostbox-enter";

/// Program used to escalate manager calls in rootful mode.
pub const DEFAULT_SUDO_PROGRAM: &str = "sudo";

/// Label attached to every container created by hostbox.
pub const MANAGER_LABEL: &str = "manager=hostbox";

/// In-container path of the entrypoint companion executable.
pub const ENTRYPOINT_PATH: &str = "/usr/bin/entrypoint";

/// In-container path of the export companion executable.
pub const EXPORT_HELPER_PATH: &str = "/usr/bin/hostbox-export";

/// In-container path of the host-exec relay companion executable.
pub const HOST_EXEC_PATH: &str = "/usr/bin/hostbox-host-exec";

/// Mount point of the host root filesystem inside the container.
pub const HOST_ROOT_MOUNT: &str = "/run/host";

/// Environment variable carrying the original host home when a custom home is used.
pub const HOST_HOME_ENV: &str = "HOSTBOX_HOST_HOME";

/// Environment variable naming the container the current process runs in.
pub const CONTAINER_ID_ENV: &str = "CONTAINER_ID";

/// Marker files whose presence identifies a container execution context.
pub const CONTAINER_MARKERS: [&str; 2] = ["/run/.containerenv", "/.dockerenv"];

/// Terminfo search path exported into every container.
pub const TERMINFO_DIRS: &str = "/usr/share/terminfo:/run/host/usr/share/terminfo";

/// Spawn service used by the host-exec relay when available.
pub const HOST_SPAWN_PROGRAM: &str = "host-spawn";

/// Sentinel comment written into every exported binary shim.
pub const BINARY_SENTINEL: &str = "# hostbox_binary";
