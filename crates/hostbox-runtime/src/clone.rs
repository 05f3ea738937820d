//! Cloning an existing container into a fresh image.

use chrono::NaiveDate;
use hostbox_common::error::{HostboxError, Result};
use hostbox_common::types::{ContainerName, ContainerState};

use crate::manager::{ContainerManager, InspectKind};

/// Image tag a clone of `source` taken on `date` is committed to.
#[must_use]
pub fn clone_tag(source: &ContainerName, date: NaiveDate) -> String {
    format!("{source}:{}", date.format("%Y-%m-%d")).to_lowercase()
}

/// Commits a stopped container to a dated image and returns its tag.
///
/// # Errors
///
/// - [`HostboxError::NotFound`] if the source container does not exist.
/// - [`HostboxError::SourceRunning`] if it is running; no commit is attempted.
/// - [`HostboxError::CommitFailed`] if the manager rejects the commit.
pub fn resolve_clone(
    manager: &dyn ContainerManager,
    source: &ContainerName,
    date: NaiveDate,
) -> Result<String> {
    let report = manager.inspect(InspectKind::Container, source.as_str())?;
    if !report.exists {
        return Err(HostboxError::NotFound {
            kind: "container",
            id: source.to_string(),
        });
    }
    if report.state == Some(ContainerState::Running) {
        return Err(HostboxError::SourceRunning {
            name: source.to_string(),
        });
    }

    let tag = clone_tag(source, date);
    let id = report.id.unwrap_or_else(|| source.to_string());
    tracing::info!(source = %source, id = %id, tag = %tag, "committing clone source");
    manager.commit(&id, &tag).map_err(|e| {
        tracing::error!(error = %e, source = %source, "commit failed");
        HostboxError::CommitFailed {
            source_name: source.to_string(),
            tag: tag.clone(),
        }
    })?;
    Ok(tag)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use hostbox_common::types::ManagerKind;
    use hostbox_core::launch::LaunchPlan;

    use super::*;
    use crate::manager::InspectReport;

    struct StubManager {
        report: InspectReport,
        commit_ok: bool,
        commits: RefCell<Vec<(String, String)>>,
    }

    impl StubManager {
        fn with_state(state: Option<ContainerState>) -> Self {
            Self {
                report: InspectReport {
                    exists: true,
                    state,
                    id: Some("c0ffee".into()),
                },
                commit_ok: true,
                commits: RefCell::new(Vec::new()),
            }
        }
    }

    impl ContainerManager for StubManager {
        fn kind(&self) -> ManagerKind {
            ManagerKind::Podman
        }

        fn inspect(&self, _kind: InspectKind, _name: &str) -> Result<InspectReport> {
            Ok(self.report.clone())
        }

        fn pull(&self, _image: &str) -> Result<()> {
            Ok(())
        }

        fn create(&self, _plan: &LaunchPlan) -> Result<()> {
            Ok(())
        }

        fn commit(&self, id: &str, tag: &str) -> Result<()> {
            self.commits.borrow_mut().push((id.into(), tag.into()));
            if self.commit_ok {
                Ok(())
            } else {
                Err(HostboxError::ExternalTool {
                    tool: "podman".into(),
                    status: 125,
                    stderr: "no space left".into(),
                })
            }
        }

        fn create_command_line(&self, _plan: &LaunchPlan) -> Vec<String> {
            Vec::new()
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
    }

    #[test]
    fn tag_is_lowercased_and_dated() {
        let name = ContainerName::new("DevBox").unwrap();
        assert_eq!(clone_tag(&name, date()), "devbox:2024-03-09");
    }

    #[test]
    fn stopped_source_is_committed() {
        let mgr = StubManager::with_state(Some(ContainerState::Exited));
        let name = ContainerName::new("devbox").unwrap();
        let tag = resolve_clone(&mgr, &name, date()).unwrap();
        assert_eq!(tag, "devbox:2024-03-09");
        assert_eq!(
            mgr.commits.borrow().as_slice(),
            [("c0ffee".to_owned(), "devbox:2024-03-09".to_owned())]
        );
    }

    #[test]
    fn running_source_is_refused_without_commit() {
        let mgr = StubManager::with_state(Some(ContainerState::Running));
        let name = ContainerName::new("devbox").unwrap();
        let err = resolve_clone(&mgr, &name, date()).unwrap_err();
        assert!(matches!(err, HostboxError::SourceRunning { .. }));
        assert!(mgr.commits.borrow().is_empty());
    }

    #[test]
    fn missing_source_is_not_found() {
        let mut mgr = StubManager::with_state(None);
        mgr.report = InspectReport::missing();
        let name = ContainerName::new("ghost").unwrap();
        let err = resolve_clone(&mgr, &name, date()).unwrap_err();
        assert_eq!(err.exit_code(), 127);
    }

    #[test]
    fn failed_commit_is_reported_as_commit_failed() {
        let mut mgr = StubManager::with_state(Some(ContainerState::Exited));
        mgr.commit_ok = false;
        let name = ContainerName::new("devbox").unwrap();
        let err = resolve_clone(&mgr, &name, date()).unwrap_err();
        assert!(matches!(err, HostboxError::CommitFailed { .. }));
    }
}
