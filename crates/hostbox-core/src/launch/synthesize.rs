//! Launch configuration synthesis.
//!
//! [`synthesize`] is a pure function of a [`ResolvedRequest`] and a
//! [`HostFacts`] snapshot. Every rule below is additive and independent;
//! emission order only decides which clause wins when two claim the same
//! mount target or environment key, and the more specific clause is always
//! emitted first.

use std::path::{Path, PathBuf};

use hostbox_common::constants;
use hostbox_common::types::ManagerCapability;

use super::{EntrypointInvocation, LaunchPlan, LaunchPlanBuilder, MountSpec, SharedNamespaces};
use crate::host::HostFacts;
use crate::request::ResolvedRequest;

/// Host files bound read-only at creation time.
const HOST_CONFIG_FILES: [&str; 3] = ["/etc/hosts", "/etc/localtime", "/etc/resolv.conf"];

/// Builds the launch plan for a resolved request on a probed host.
#[must_use]
pub fn synthesize(request: &ResolvedRequest, facts: &HostFacts) -> LaunchPlan {
    let mut plan = LaunchPlanBuilder::new();
    let home = effective_home(request, facts);

    identity_clauses(&mut plan, request, facts);
    for (flag, value) in SharedNamespaces::for_init(request.init).to_args() {
        plan.option(flag, value);
    }
    environment_clauses(&mut plan, request, facts, home);
    mount_clauses(&mut plan, request, facts);
    manager_clauses(&mut plan, request);

    plan.raw(&request.additional_flags);

    tracing::info!(
        name = %request.name,
        image = %request.image,
        manager = %request.manager,
        init = request.init,
        rootful = request.rootful,
        "synthesized launch plan"
    );

    plan.build(EntrypointInvocation {
        program: constants::ENTRYPOINT_PATH.to_owned(),
        image: request.image.clone(),
        user_name: facts.user.name.clone(),
        uid: facts.user.uid,
        gid: facts.user.gid,
        home: home.to_path_buf(),
        init: request.init,
        pre_init_hooks: request.pre_init_hooks.clone(),
        init_hooks: request.init_hooks.clone(),
    })
}

fn effective_home<'a>(request: &'a ResolvedRequest, facts: &'a HostFacts) -> &'a Path {
    request.custom_home.as_deref().unwrap_or(&facts.user.home)
}

fn identity_clauses(plan: &mut LaunchPlanBuilder, request: &ResolvedRequest, facts: &HostFacts) {
    let hostname = if request.init {
        format!("{}.{}", request.name, facts.hostname)
    } else {
        facts.hostname.clone()
    };
    plan.option("--hostname", hostname);
    plan.option("--name", request.name.as_str());
    plan.flag("--privileged");
    plan.option("--security-opt", "label=disable");
    plan.option("--user", "root:root");
    plan.option("--label", constants::MANAGER_LABEL);
}

fn environment_clauses(
    plan: &mut LaunchPlanBuilder,
    request: &ResolvedRequest,
    facts: &HostFacts,
    home: &Path,
) {
    plan.env("SHELL", facts.user.shell.as_str());
    plan.env("HOME", home.display().to_string());
    if request.custom_home.is_some() {
        plan.env(constants::HOST_HOME_ENV, facts.user.home.display().to_string());
    }
    plan.env("container", request.manager.program());
    plan.env("TERMINFO_DIRS", constants::TERMINFO_DIRS);
    plan.env(constants::CONTAINER_ID_ENV, request.name.as_str());
}

fn mount_clauses(plan: &mut LaunchPlanBuilder, request: &ResolvedRequest, facts: &HostFacts) {
    let companions = &request.companions;
    plan.mount(MountSpec::read_only(&companions.entrypoint, constants::ENTRYPOINT_PATH));
    plan.mount(MountSpec::read_only(&companions.export, constants::EXPORT_HELPER_PATH));
    plan.mount(MountSpec::read_only(&companions.host_exec, constants::HOST_EXEC_PATH));

    if let Some(custom) = &request.custom_home {
        plan.mount(MountSpec::shared(custom));
    }
    plan.mount(MountSpec::shared(&facts.user.home));
    if let Some(ostree) = &facts.ostree_home {
        plan.mount(MountSpec::shared(ostree));
    }

    plan.mount(MountSpec::Bind {
        source: PathBuf::from("/"),
        target: PathBuf::from(constants::HOST_ROOT_MOUNT),
        mode: super::MountMode::RecursiveSlave,
    });
    plan.mount(MountSpec::shared("/tmp"));
    plan.mount(MountSpec::shared("/dev"));
    plan.mount(MountSpec::shared("/sys"));

    if facts.selinux {
        plan.mount(MountSpec::Volume {
            target: PathBuf::from("/sys/fs/selinux"),
        });
    }
    plan.mount(MountSpec::Volume {
        target: PathBuf::from("/var/log/journal"),
    });
    if let Some(shm) = &facts.shm_target {
        plan.mount(MountSpec::shared(shm));
    }
    if facts.nix_store {
        plan.mount(MountSpec::shared("/nix"));
    }
    if let Some(runtime) = &facts.runtime_dir {
        plan.mount(MountSpec::shared(runtime));
    }

    for file in HOST_CONFIG_FILES {
        plan.mount(MountSpec::read_only(file, file));
    }
}

fn manager_clauses(plan: &mut LaunchPlanBuilder, request: &ResolvedRequest) {
    let manager = request.manager;
    if manager.supports(ManagerCapability::HostUlimits) {
        plan.option("--ulimit", "host");
    }
    if manager.supports(ManagerCapability::KeepOriginalGroups) {
        plan.option("--annotation", "run.oci.keep_original_groups=1");
    }
    if manager.supports(ManagerCapability::DevptsMount) {
        plan.mount(MountSpec::Devpts {
            target: PathBuf::from("/dev/pts"),
        });
    }
    if request.init && manager.supports(ManagerCapability::SystemdInit) {
        plan.option("--systemd", "always");
    }
    if !request.rootful && manager.supports(ManagerCapability::KeepIdUserns) {
        plan.option("--userns", "keep-id");
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use hostbox_common::config::CompanionBinaries;
    use hostbox_common::types::{ContainerName, ManagerKind};

    use super::*;
    use crate::host::HostUser;

    fn request(manager: ManagerKind) -> ResolvedRequest {
        ResolvedRequest {
            image: "registry.fedoraproject.org/fedora-toolbox:latest".into(),
            name: ContainerName::new("devbox").unwrap(),
            custom_home: None,
            rootful: false,
            init: false,
            manager,
            additional_flags: Vec::new(),
            pre_init_hooks: String::new(),
            init_hooks: String::new(),
            always_pull: false,
            companions: CompanionBinaries::default(),
        }
    }

    fn bare_facts() -> HostFacts {
        HostFacts {
            user: HostUser {
                name: "alice".into(),
                uid: 1000,
                gid: 1000,
                home: PathBuf::from("/home/alice"),
                shell: "zsh".into(),
            },
            hostname: "workstation".into(),
            selinux: false,
            nix_store: false,
            shm_target: None,
            runtime_dir: None,
            ostree_home: None,
            journal: false,
        }
    }

    fn rich_facts() -> HostFacts {
        HostFacts {
            selinux: true,
            nix_store: true,
            shm_target: Some(PathBuf::from("/run/shm")),
            runtime_dir: Some(PathBuf::from("/run/user/1000")),
            ostree_home: Some(PathBuf::from("/var/home/alice")),
            journal: true,
            ..bare_facts()
        }
    }

    const PODMAN_ONLY: [&str; 5] = [
        "--ulimit",
        "--annotation",
        "type=devpts,destination=/dev/pts",
        "--systemd",
        "--userns",
    ];

    #[test]
    fn synthesis_is_deterministic() {
        let req = request(ManagerKind::Podman);
        let facts = rich_facts();
        assert_eq!(synthesize(&req, &facts).to_args(), synthesize(&req, &facts).to_args());
    }

    #[test]
    fn base_clauses_share_host_namespaces_and_run_as_root() {
        let args = synthesize(&request(ManagerKind::Podman), &bare_facts()).to_args();
        for pair in [["--ipc", "host"], ["--network", "host"], ["--pid", "host"], ["--user", "root:root"]] {
            assert!(args.windows(2).any(|w| w == pair), "missing {pair:?} in {args:?}");
        }
    }

    #[test]
    fn init_mode_drops_host_pid_and_enables_systemd_on_podman() {
        let mut req = request(ManagerKind::Podman);
        req.init = true;
        let args = synthesize(&req, &bare_facts()).to_args();
        assert!(!args.windows(2).any(|w| w == ["--pid", "host"]));
        assert!(args.windows(2).any(|w| w == ["--systemd", "always"]));
        assert!(args.windows(2).any(|w| w == ["--hostname", "devbox.workstation"]));
    }

    #[test]
    fn docker_never_receives_podman_flags() {
        for init in [false, true] {
            for rootful in [false, true] {
                let mut req = request(ManagerKind::Docker);
                req.init = init;
                req.rootful = rootful;
                let args = synthesize(&req, &rich_facts()).to_args();
                for flag in PODMAN_ONLY {
                    assert!(!args.iter().any(|a| a == flag), "{flag} leaked into {args:?}");
                }
            }
        }
    }

    #[test]
    fn rootful_podman_skips_keep_id() {
        let mut req = request(ManagerKind::Podman);
        req.rootful = true;
        let args = synthesize(&req, &bare_facts()).to_args();
        assert!(!args.iter().any(|a| a == "--userns"));
        assert!(args.windows(2).any(|w| w == ["--ulimit", "host"]));
    }

    #[test]
    fn mount_targets_are_unique() {
        let mut req = request(ManagerKind::Podman);
        req.custom_home = Some(PathBuf::from("/home/alice"));
        let mut facts = rich_facts();
        facts.shm_target = Some(PathBuf::from("/tmp"));
        let plan = synthesize(&req, &facts);
        let mut seen = HashSet::new();
        for mount in plan.mounts() {
            assert!(seen.insert(mount.target().to_path_buf()), "duplicate {:?}", mount.target());
        }
    }

    #[test]
    fn absent_facts_omit_optional_mounts() {
        let plan = synthesize(&request(ManagerKind::Podman), &bare_facts());
        for target in ["/sys/fs/selinux", "/nix", "/run/user/1000", "/var/home/alice"] {
            assert!(!plan.mounts_target(target), "{target} should be absent");
        }
        assert!(plan.mounts_target("/var/log/journal"));
    }

    #[test]
    fn journal_volume_does_not_depend_on_host_journal() {
        let req = request(ManagerKind::Podman);
        let without = synthesize(&req, &bare_facts());
        let with = synthesize(&req, &HostFacts { journal: true, ..bare_facts() });
        assert!(without.mounts_target("/var/log/journal"));
        assert_eq!(without.to_args(), with.to_args());
    }

    #[test]
    fn present_facts_add_optional_mounts() {
        let plan = synthesize(&request(ManagerKind::Podman), &rich_facts());
        for target in ["/sys/fs/selinux", "/nix", "/run/user/1000", "/var/home/alice", "/run/shm"] {
            assert!(plan.mounts_target(target), "{target} should be mounted");
        }
    }

    #[test]
    fn fixed_mounts_are_always_present() {
        let args = synthesize(&request(ManagerKind::Docker), &bare_facts()).to_args();
        for spec in [
            "/:/run/host:rslave",
            "/tmp:/tmp:rslave",
            "/dev:/dev:rslave",
            "/sys:/sys:rslave",
            "/home/alice:/home/alice:rslave",
            "/etc/hosts:/etc/hosts:ro",
            "/etc/localtime:/etc/localtime:ro",
            "/etc/resolv.conf:/etc/resolv.conf:ro",
            "/usr/bin/hostbox-init:/usr/bin/entrypoint:ro",
            "/usr/bin/hostbox-export:/usr/bin/hostbox-export:ro",
            "/usr/bin/hostbox-host-exec:/usr/bin/hostbox-host-exec:ro",
        ] {
            assert!(args.iter().any(|a| a == spec), "missing {spec}");
        }
    }

    #[test]
    fn custom_home_overrides_home_and_exports_host_home() {
        let mut req = request(ManagerKind::Podman);
        req.custom_home = Some(PathBuf::from("/srv/boxes/devbox"));
        let plan = synthesize(&req, &bare_facts());
        assert_eq!(plan.env("HOME"), Some("/srv/boxes/devbox"));
        assert_eq!(plan.env(constants::HOST_HOME_ENV), Some("/home/alice"));
        assert!(plan.mounts_target("/srv/boxes/devbox"));
        assert_eq!(plan.entrypoint().home, PathBuf::from("/srv/boxes/devbox"));
    }

    #[test]
    fn host_home_marker_is_absent_without_custom_home() {
        let plan = synthesize(&request(ManagerKind::Podman), &bare_facts());
        assert_eq!(plan.env("HOME"), Some("/home/alice"));
        assert!(plan.env(constants::HOST_HOME_ENV).is_none());
    }

    #[test]
    fn additional_flags_come_after_generated_clauses() {
        let mut req = request(ManagerKind::Podman);
        req.additional_flags = vec!["--cpus".into(), "2".into()];
        let args = synthesize(&req, &bare_facts()).to_args();
        let extra = args.iter().position(|a| a == "--cpus").unwrap();
        let userns = args.iter().position(|a| a == "--userns").unwrap();
        let entry = args.iter().position(|a| a == "--entrypoint").unwrap();
        assert!(userns < extra && extra < entry);
        assert_eq!(args[extra + 1], "2");
    }

    #[test]
    fn entrypoint_carries_identity_and_hooks() {
        let mut req = request(ManagerKind::Podman);
        req.pre_init_hooks = "mkdir -p /opt/x".into();
        req.init_hooks = "dnf install -y vim".into();
        let args = synthesize(&req, &bare_facts()).to_args();
        let entry = args.iter().position(|a| a == "--entrypoint").unwrap();
        assert_eq!(
            &args[entry..],
            [
                "--entrypoint",
                "/usr/bin/entrypoint",
                "registry.fedoraproject.org/fedora-toolbox:latest",
                "--name",
                "alice",
                "--user",
                "1000",
                "--group",
                "1000",
                "--home",
                "/home/alice",
                "--init",
                "0",
                "--pre-init-hooks",
                "mkdir -p /opt/x",
                "--",
                "dnf install -y vim",
            ]
        );
    }
}
