//! Plan execution
//!
//! Walks a plan's flattened action list in order and applies each action
//! against the installed store. Failure semantics are deliberately simple:
//! a failing action halts the remaining plan, everything already applied
//! stands, and nothing is rolled back. Transient repository failures during
//! fetch are retried a bounded number of times before the action fails.

use crate::error::{ExtmanError, Result};
use crate::extension::{ExtensionId, LocalExtension};
use crate::plan::{ActionKind, Plan, PlanAction};
use crate::repository::Repository;
use crate::store::InstalledStore;

/// Hooks the executor reports through while walking a plan. Cancellation is
/// checked between actions, never mid-action.
pub trait ExecutionObserver {
    fn log(&self, message: String);
    fn cancelled(&self) -> bool;
}

/// Observer that drops logs and never cancels.
pub struct SilentObserver;

impl ExecutionObserver for SilentObserver {
    fn log(&self, _message: String) {}

    fn cancelled(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ExecutorConfig {
    /// Total fetch attempts per action, including the first one.
    pub fetch_attempts: u32,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        ExecutorConfig { fetch_attempts: 3 }
    }
}

/// What the executor actually did, for the end-of-job summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionSummary {
    pub applied: usize,
    pub skipped: usize,
}

/// Applies plan actions against a repository and an installed store.
pub struct Executor<'a> {
    repository: &'a dyn Repository,
    store: &'a dyn InstalledStore,
    config: ExecutorConfig,
}

impl<'a> Executor<'a> {
    pub fn new(repository: &'a dyn Repository, store: &'a dyn InstalledStore) -> Self {
        Executor {
            repository,
            store,
            config: ExecutorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    /// Apply every action of the plan, in flattened order.
    pub fn execute(&self, plan: &Plan, observer: &dyn ExecutionObserver) -> Result<ExecutionSummary> {
        let mut summary = ExecutionSummary::default();

        for action in plan.actions() {
            if observer.cancelled() {
                return Err(ExtmanError::Cancelled);
            }

            match action.kind {
                ActionKind::None => {
                    observer.log(format!("{} already satisfied, skipping", action.extension.id));
                    summary.skipped += 1;
                }
                ActionKind::Install | ActionKind::Upgrade => {
                    self.apply_install(&action, observer)?;
                    summary.applied += 1;
                }
                ActionKind::Uninstall => {
                    self.apply_uninstall(&action, observer)?;
                    summary.applied += 1;
                }
            }
        }

        Ok(summary)
    }

    fn apply_install(&self, action: &PlanAction, observer: &dyn ExecutionObserver) -> Result<()> {
        observer.log(format!("Applying {action}"));

        let bytes = self
            .fetch_with_retry(&action.extension.id, observer)
            .map_err(|e| execution_error(action, &e))?;

        let mut local = LocalExtension::new(
            action.extension.clone(),
            &action.namespace,
            !action.dependency,
        );

        // An upgrade inherits the namespaces and directness of the release
        // it replaces, so the new version stays visible everywhere the old
        // one was.
        if let Some(previous) = &action.previous {
            for namespace in &previous.namespaces {
                local.namespaces.insert(namespace.clone());
            }
            local.direct = local.direct || previous.direct;
        }

        self.store
            .register(&local, Some(&bytes))
            .map_err(|e| execution_error(action, &e))
    }

    fn apply_uninstall(&self, action: &PlanAction, observer: &dyn ExecutionObserver) -> Result<()> {
        observer.log(format!("Applying {action}"));

        self.store
            .unregister(&action.extension.id.name, &action.namespace)
            .map_err(|e| execution_error(action, &e))
    }

    fn fetch_with_retry(
        &self,
        id: &ExtensionId,
        observer: &dyn ExecutionObserver,
    ) -> Result<Vec<u8>> {
        let mut attempt = 1;
        loop {
            match self.repository.fetch(id) {
                Ok(bytes) => return Ok(bytes),
                Err(e) if e.is_transient() && attempt < self.config.fetch_attempts => {
                    observer.log(format!(
                        "Fetch of {id} failed ({e}), retrying ({attempt}/{})",
                        self.config.fetch_attempts
                    ));
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn execution_error(action: &PlanAction, cause: &ExtmanError) -> ExtmanError {
    // Cancellation is a job outcome, not an action failure
    if matches!(cause, ExtmanError::Cancelled) {
        return ExtmanError::Cancelled;
    }
    ExtmanError::ExecutionFailed {
        kind: action.kind.to_string(),
        id: action.extension.id.to_string(),
        namespace: action.namespace.clone(),
        reason: cause.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extension::Extension;
    use crate::plan::PlanNode;
    use crate::repository::MemoryRepository;
    use crate::store::MemoryStore;
    use crate::version::{Version, VersionConstraint};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ext(name: &str, version: &str) -> Extension {
        Extension::new(ExtensionId::new(name, Version::new(version)))
    }

    fn action(name: &str, version: &str, kind: ActionKind) -> PlanAction {
        PlanAction {
            extension: ext(name, version),
            previous: None,
            kind,
            namespace: "main".to_string(),
            constraint: VersionConstraint::Any,
            dependency: false,
        }
    }

    fn plan_of(actions: Vec<PlanAction>) -> Plan {
        Plan::new(actions.into_iter().map(PlanNode::leaf).collect())
    }

    #[test]
    fn test_install_registers_with_artifact() {
        let mut repo = MemoryRepository::new();
        repo.publish(ext("editor", "1.0"), b"payload".to_vec());
        let store = MemoryStore::new();

        let plan = plan_of(vec![action("editor", "1.0", ActionKind::Install)]);
        let summary = Executor::new(&repo, &store)
            .execute(&plan, &SilentObserver)
            .unwrap();

        assert_eq!(summary, ExecutionSummary { applied: 1, skipped: 0 });
        let installed = store.get("editor", "main").unwrap().unwrap();
        assert!(installed.direct);
    }

    #[test]
    fn test_none_actions_are_skipped() {
        let repo = MemoryRepository::new();
        let store = MemoryStore::new();

        let plan = plan_of(vec![action("editor", "1.0", ActionKind::None)]);
        let summary = Executor::new(&repo, &store)
            .execute(&plan, &SilentObserver)
            .unwrap();

        assert_eq!(summary, ExecutionSummary { applied: 0, skipped: 1 });
        assert!(store.get("editor", "main").unwrap().is_none());
    }

    #[test]
    fn test_transient_fetch_failures_are_retried() {
        let mut repo = MemoryRepository::new();
        repo.publish(ext("editor", "1.0"), b"payload".to_vec());
        repo.fail_next_fetches(2);
        let store = MemoryStore::new();

        let plan = plan_of(vec![action("editor", "1.0", ActionKind::Install)]);
        let summary = Executor::new(&repo, &store)
            .execute(&plan, &SilentObserver)
            .unwrap();

        assert_eq!(summary.applied, 1);
    }

    #[test]
    fn test_retry_budget_is_bounded() {
        let mut repo = MemoryRepository::new();
        repo.publish(ext("editor", "1.0"), b"payload".to_vec());
        repo.fail_next_fetches(3);
        let store = MemoryStore::new();

        let plan = plan_of(vec![action("editor", "1.0", ActionKind::Install)]);
        let result = Executor::new(&repo, &store).execute(&plan, &SilentObserver);

        assert!(matches!(result, Err(ExtmanError::ExecutionFailed { .. })));
        assert!(store.get("editor", "main").unwrap().is_none());
    }

    #[test]
    fn test_failure_halts_plan_but_keeps_applied_actions() {
        let mut repo = MemoryRepository::new();
        repo.publish(ext("first", "1.0"), b"ok".to_vec());
        // second is planned but has no artifact, so its fetch fails hard
        let store = MemoryStore::new();

        let plan = plan_of(vec![
            action("first", "1.0", ActionKind::Install),
            action("second", "1.0", ActionKind::Install),
            action("third", "1.0", ActionKind::Install),
        ]);
        let result = Executor::new(&repo, &store)
            .with_config(ExecutorConfig { fetch_attempts: 1 })
            .execute(&plan, &SilentObserver);

        assert!(matches!(result, Err(ExtmanError::ExecutionFailed { .. })));
        assert!(store.get("first", "main").unwrap().is_some());
        assert!(store.get("second", "main").unwrap().is_none());
        assert!(store.get("third", "main").unwrap().is_none());
    }

    #[test]
    fn test_upgrade_inherits_previous_namespaces() {
        let mut repo = MemoryRepository::new();
        repo.publish(ext("editor", "2.0"), b"v2".to_vec());
        let store = MemoryStore::new();

        let mut previous = LocalExtension::new(ext("editor", "1.0"), "main", true);
        previous.namespaces.insert("other".to_string());
        store.register(&previous, None).unwrap();

        let mut upgrade = action("editor", "2.0", ActionKind::Upgrade);
        upgrade.previous = Some(previous);
        upgrade.dependency = true;

        Executor::new(&repo, &store)
            .execute(&plan_of(vec![upgrade]), &SilentObserver)
            .unwrap();

        let installed = store.get("editor", "other").unwrap().unwrap();
        assert_eq!(installed.id().version, Version::new("2.0"));
        // Directness survives even though the upgrade came in as a dependency
        assert!(installed.direct);
    }

    #[test]
    fn test_uninstall_unregisters() {
        let repo = MemoryRepository::new();
        let store = MemoryStore::new();
        store
            .register(&LocalExtension::new(ext("editor", "1.0"), "main", true), None)
            .unwrap();

        let plan = plan_of(vec![action("editor", "1.0", ActionKind::Uninstall)]);
        Executor::new(&repo, &store)
            .execute(&plan, &SilentObserver)
            .unwrap();

        assert!(store.get("editor", "main").unwrap().is_none());
    }

    #[test]
    fn test_cancellation_observed_between_actions() {
        struct CancelAfter {
            checks: AtomicUsize,
        }
        impl ExecutionObserver for CancelAfter {
            fn log(&self, _message: String) {}
            fn cancelled(&self) -> bool {
                self.checks.fetch_add(1, Ordering::SeqCst) >= 1
            }
        }

        let mut repo = MemoryRepository::new();
        repo.publish(ext("first", "1.0"), b"ok".to_vec());
        repo.publish(ext("second", "1.0"), b"ok".to_vec());
        let store = MemoryStore::new();

        let plan = plan_of(vec![
            action("first", "1.0", ActionKind::Install),
            action("second", "1.0", ActionKind::Install),
        ]);
        let result = Executor::new(&repo, &store).execute(
            &plan,
            &CancelAfter {
                checks: AtomicUsize::new(0),
            },
        );

        assert!(matches!(result, Err(ExtmanError::Cancelled)));
        // The first action completed before the cancellation checkpoint
        assert!(store.get("first", "main").unwrap().is_some());
        assert!(store.get("second", "main").unwrap().is_none());
    }

    #[test]
    fn test_dependency_install_is_not_direct() {
        let mut repo = MemoryRepository::new();
        repo.publish(ext("core", "1.0"), b"ok".to_vec());
        let store = MemoryStore::new();

        let mut dep = action("core", "1.0", ActionKind::Install);
        dep.dependency = true;

        Executor::new(&repo, &store)
            .execute(&plan_of(vec![dep]), &SilentObserver)
            .unwrap();

        assert!(!store.get("core", "main").unwrap().unwrap().direct);
    }

    #[test]
    fn test_action_display_names_kind_and_namespace() {
        let a = action("editor", "1.0", ActionKind::Install);
        assert_eq!(a.to_string(), "INSTALL editor/1.0 on main");
    }
}
