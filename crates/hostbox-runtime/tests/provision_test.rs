//! End-to-end provisioning tests against an in-memory container manager.
//!
//! These tests drive the full create pipeline:
//! 1. Validate and default the request
//! 2. Resolve clone sources (state guard, commit, dated tag)
//! 3. Skip existing containers
//! 4. Pull when required
//! 5. Synthesize and hand the plan to the manager

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;

use chrono::NaiveDate;
use hostbox_common::config::HostboxConfig;
use hostbox_common::error::{HostboxError, Result};
use hostbox_common::types::{ContainerState, ManagerKind};
use hostbox_core::host::{HostFacts, HostUser};
use hostbox_core::launch::LaunchPlan;
use hostbox_core::request::CreateRequest;
use hostbox_runtime::manager::{ContainerManager, InspectKind, InspectReport};
use hostbox_runtime::provision::{ProvisionOutcome, Provisioner};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Pull(String),
    Create(Vec<String>),
    Commit(String, String),
}

#[derive(Default)]
struct FakeManager {
    kind: Option<ManagerKind>,
    containers: HashMap<String, ContainerState>,
    images: Vec<String>,
    fail_create: bool,
    calls: RefCell<Vec<Call>>,
}

impl FakeManager {
    fn podman() -> Self {
        Self {
            kind: Some(ManagerKind::Podman),
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }
}

impl ContainerManager for FakeManager {
    fn kind(&self) -> ManagerKind {
        self.kind.unwrap_or(ManagerKind::Podman)
    }

    fn inspect(&self, kind: InspectKind, name: &str) -> Result<InspectReport> {
        Ok(match kind {
            InspectKind::Container => self.containers.get(name).map_or_else(
                InspectReport::missing,
                |state| InspectReport {
                    exists: true,
                    state: Some(*state),
                    id: Some(format!("id-{name}")),
                },
            ),
            InspectKind::Image => InspectReport {
                exists: self.images.iter().any(|i| i == name),
                state: None,
                id: None,
            },
        })
    }

    fn pull(&self, image: &str) -> Result<()> {
        self.calls.borrow_mut().push(Call::Pull(image.into()));
        Ok(())
    }

    fn create(&self, plan: &LaunchPlan) -> Result<()> {
        self.calls.borrow_mut().push(Call::Create(plan.to_args()));
        if self.fail_create {
            return Err(HostboxError::ExternalTool {
                tool: "podman".into(),
                status: 125,
                stderr: "name in use".into(),
            });
        }
        Ok(())
    }

    fn commit(&self, id: &str, tag: &str) -> Result<()> {
        self.calls
            .borrow_mut()
            .push(Call::Commit(id.into(), tag.into()));
        Ok(())
    }

    fn create_command_line(&self, plan: &LaunchPlan) -> Vec<String> {
        let mut line = vec!["podman".to_owned(), "create".to_owned()];
        line.extend(plan.to_args());
        line
    }
}

fn facts() -> HostFacts {
    HostFacts {
        user: HostUser {
            name: "alice".into(),
            uid: 1000,
            gid: 1000,
            home: PathBuf::from("/home/alice"),
            shell: "bash".into(),
        },
        hostname: "workstation".into(),
        selinux: false,
        nix_store: false,
        shm_target: None,
        runtime_dir: None,
        ostree_home: None,
        journal: true,
    }
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 31).unwrap()
}

#[test]
fn default_request_pulls_and_creates_default_container() {
    let mgr = FakeManager::podman();
    let cfg = HostboxConfig::default();
    let outcome = Provisioner::with_date(&mgr, &cfg, today())
        .provision(CreateRequest::default(), &facts(), false)
        .expect("provision");

    assert_eq!(
        outcome,
        ProvisionOutcome::Created {
            name: hostbox_common::types::ContainerName::new(cfg.default_name.as_str()).unwrap(),
            image: cfg.default_image.clone(),
        }
    );
    let calls = mgr.calls();
    assert_eq!(calls[0], Call::Pull(cfg.default_image.clone()));
    let Call::Create(args) = &calls[1] else {
        unreachable!("second call must be create");
    };
    assert!(args.windows(2).any(|w| w == ["--name", cfg.default_name.as_str()]));
}

#[test]
fn local_image_is_not_pulled_unless_forced() {
    let mut mgr = FakeManager::podman();
    mgr.images.push("alpine:3.20".into());
    let cfg = HostboxConfig::default();
    let req = CreateRequest {
        image: Some("alpine:3.20".into()),
        ..CreateRequest::default()
    };
    let _ = Provisioner::with_date(&mgr, &cfg, today())
        .provision(req.clone(), &facts(), false)
        .expect("provision");
    assert!(!mgr.calls().iter().any(|c| matches!(c, Call::Pull(_))));

    let mgr = FakeManager {
        images: vec!["alpine:3.20".into()],
        ..FakeManager::podman()
    };
    let forced = CreateRequest {
        always_pull: true,
        ..req
    };
    let _ = Provisioner::with_date(&mgr, &cfg, today())
        .provision(forced, &facts(), false)
        .expect("provision");
    assert_eq!(mgr.calls()[0], Call::Pull("alpine:3.20".into()));
}

#[test]
fn existing_container_is_left_alone() {
    let mut mgr = FakeManager::podman();
    let _ = mgr.containers.insert("alpine".into(), ContainerState::Exited);
    let cfg = HostboxConfig::default();
    let req = CreateRequest {
        image: Some("alpine".into()),
        ..CreateRequest::default()
    };
    let outcome = Provisioner::with_date(&mgr, &cfg, today())
        .provision(req, &facts(), false)
        .expect("provision");
    assert!(matches!(outcome, ProvisionOutcome::AlreadyExists { .. }));
    assert!(mgr.calls().is_empty());
}

#[test]
fn clone_commits_stopped_source_and_creates_from_tag() {
    let mut mgr = FakeManager::podman();
    let _ = mgr.containers.insert("Work".into(), ContainerState::Exited);
    let cfg = HostboxConfig::default();
    let req = CreateRequest {
        clone_source: Some("Work".into()),
        name: Some("work-copy".into()),
        ..CreateRequest::default()
    };
    let outcome = Provisioner::with_date(&mgr, &cfg, today())
        .provision(req, &facts(), false)
        .expect("provision");

    assert!(matches!(outcome, ProvisionOutcome::Created { ref image, .. } if image == "work:2025-01-31"));
    let calls = mgr.calls();
    assert_eq!(calls[0], Call::Commit("id-Work".into(), "work:2025-01-31".into()));
    assert!(!calls.iter().any(|c| matches!(c, Call::Pull(_))));
}

#[test]
fn clone_of_running_source_fails_without_commit() {
    let mut mgr = FakeManager::podman();
    let _ = mgr.containers.insert("work".into(), ContainerState::Running);
    let cfg = HostboxConfig::default();
    let req = CreateRequest {
        clone_source: Some("work".into()),
        name: Some("work-copy".into()),
        ..CreateRequest::default()
    };
    let err = Provisioner::with_date(&mgr, &cfg, today())
        .provision(req, &facts(), false)
        .unwrap_err();
    assert!(matches!(err, HostboxError::SourceRunning { .. }));
    assert!(mgr.calls().is_empty());
}

#[test]
fn dry_run_touches_nothing() {
    let mut mgr = FakeManager::podman();
    let _ = mgr.containers.insert("work".into(), ContainerState::Running);
    let cfg = HostboxConfig::default();
    let req = CreateRequest {
        clone_source: Some("work".into()),
        name: Some("copy".into()),
        ..CreateRequest::default()
    };
    let outcome = Provisioner::with_date(&mgr, &cfg, today())
        .provision(req, &facts(), true)
        .expect("dry run");
    let ProvisionOutcome::DryRun { command } = outcome else {
        unreachable!("dry run must not create");
    };
    assert_eq!(&command[..2], ["podman", "create"]);
    assert!(command.iter().any(|a| a == "work:2025-01-31"));
    assert!(mgr.calls().is_empty());
}

#[test]
fn create_failure_is_surfaced() {
    let mgr = FakeManager {
        fail_create: true,
        images: vec!["alpine".into()],
        ..FakeManager::podman()
    };
    let cfg = HostboxConfig::default();
    let req = CreateRequest {
        image: Some("alpine".into()),
        ..CreateRequest::default()
    };
    let err = Provisioner::with_date(&mgr, &cfg, today())
        .provision(req, &facts(), false)
        .unwrap_err();
    assert!(err.to_string().contains("name in use"));
    assert_eq!(err.exit_code(), 1);
}

#[test]
fn docker_manager_yields_docker_plan() {
    let mgr = FakeManager {
        kind: Some(ManagerKind::Docker),
        images: vec!["alpine".into()],
        ..FakeManager::default()
    };
    let cfg = HostboxConfig::default();
    let req = CreateRequest {
        image: Some("alpine".into()),
        init: true,
        ..CreateRequest::default()
    };
    let _ = Provisioner::with_date(&mgr, &cfg, today())
        .provision(req, &facts(), false)
        .expect("provision");
    let Call::Create(args) = &mgr.calls()[0] else {
        unreachable!("only call must be create");
    };
    assert!(args.iter().any(|a| a == "container=docker"));
    assert!(!args.iter().any(|a| a == "--systemd" || a == "--userns"));
}

#[test]
fn quoted_additional_flags_reach_the_manager_as_single_arguments() {
    let mgr = FakeManager::podman();
    let cfg = HostboxConfig::default();
    let req = CreateRequest {
        image: Some("alpine".into()),
        additional_flags: Some(r#"--env "GREETING=hello world" --label a=b"#.into()),
        ..CreateRequest::default()
    };
    let outcome = Provisioner::with_date(&mgr, &cfg, today())
        .provision(req, &facts(), true)
        .expect("dry run");
    let ProvisionOutcome::DryRun { command } = outcome else {
        unreachable!("dry run must not create");
    };
    let env = command.iter().position(|a| a == "GREETING=hello world").unwrap();
    let entry = command.iter().position(|a| a == "--entrypoint").unwrap();
    assert_eq!(command[env - 1], "--env");
    assert_eq!(&command[env + 1..entry], ["--label", "a=b"]);
}

#[test]
fn unbalanced_additional_flags_fail_before_any_manager_call() {
    let mgr = FakeManager::podman();
    let cfg = HostboxConfig::default();
    let req = CreateRequest {
        image: Some("alpine".into()),
        additional_flags: Some("--env 'GREETING=hello".into()),
        ..CreateRequest::default()
    };
    let err = Provisioner::with_date(&mgr, &cfg, today())
        .provision(req, &facts(), false)
        .unwrap_err();
    assert!(matches!(err, HostboxError::InvalidRequest { .. }));
    assert!(mgr.calls().is_empty());
}
