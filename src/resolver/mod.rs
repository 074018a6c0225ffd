//! Dependency resolution and installation planning
//!
//! This module turns a request (install, upgrade or uninstall one or more
//! extensions into a namespace) into a plan tree annotated with per-node
//! actions. It handles:
//! - recursive resolution of mandatory dependencies via the repository
//! - revisit detection for diamond dependencies, with constraint merging
//! - explicit rejection of dependency cycles
//! - action-kind computation against the installed store
//! - reverse-dependency analysis for uninstalls, raising a confirmation
//!   question before a cascading removal
//!
//! During resolution, nodes live in an arena (an indexed slot list) keyed by
//! (extension name, namespace) so revisits are detected in O(1); the acyclic
//! plan tree is only materialized at the end.

use std::collections::HashMap;

use crate::error::{ExtmanError, Result};
use crate::extension::{Extension, ExtensionId, LocalExtension};
use crate::job::question::{ConfirmationPort, Question};
use crate::plan::{ActionKind, Plan, PlanAction, PlanNode};
use crate::repository::{Repository, best_match};
use crate::store::{InstalledStore, backward_dependencies};
use crate::version::VersionConstraint;

/// One requested extension: an exact release or a name plus constraint.
#[derive(Debug, Clone)]
pub enum Target {
    Id(ExtensionId),
    Named {
        name: String,
        constraint: VersionConstraint,
    },
}

impl Target {
    fn name(&self) -> &str {
        match self {
            Target::Id(id) => &id.name,
            Target::Named { name, .. } => name,
        }
    }

    fn constraint(&self) -> VersionConstraint {
        match self {
            Target::Id(id) => VersionConstraint::exact(id.version.clone()),
            Target::Named { constraint, .. } => constraint.clone(),
        }
    }
}

/// Request to install or upgrade extensions into a namespace.
#[derive(Debug, Clone)]
pub struct InstallRequest {
    pub targets: Vec<Target>,
    pub namespace: String,
    /// When set, targets already satisfied by an installed release are
    /// still re-resolved against the repository looking for a newer one.
    pub upgrade: bool,
    pub interactive: bool,
}

/// Request to remove extensions from a namespace.
#[derive(Debug, Clone)]
pub struct UninstallRequest {
    pub names: Vec<String>,
    pub namespace: String,
    pub interactive: bool,
}

/// Any plannable request.
#[derive(Debug, Clone)]
pub enum Request {
    Install(InstallRequest),
    Uninstall(UninstallRequest),
}

impl Request {
    pub fn namespace(&self) -> &str {
        match self {
            Request::Install(r) => &r.namespace,
            Request::Uninstall(r) => &r.namespace,
        }
    }

    pub fn interactive(&self) -> bool {
        match self {
            Request::Install(r) => r.interactive,
            Request::Uninstall(r) => r.interactive,
        }
    }

    /// Short human-readable description, used in progress logs.
    pub fn describe(&self) -> String {
        match self {
            Request::Install(r) => {
                let names: Vec<&str> = r.targets.iter().map(Target::name).collect();
                let verb = if r.upgrade { "upgrade" } else { "install" };
                format!("{verb} {} on {}", names.join(", "), r.namespace)
            }
            Request::Uninstall(r) => {
                format!("uninstall {} from {}", r.names.join(", "), r.namespace)
            }
        }
    }
}

/// Arena slot for one resolved extension in one namespace.
struct Slot {
    action: PlanAction,
    children: Vec<usize>,
}

/// Turns requests into plans.
pub struct Planner<'a> {
    repository: &'a dyn Repository,
    store: &'a dyn InstalledStore,
    confirmation: &'a dyn ConfirmationPort,

    /// Resolved slots, indexed by `index`.
    slots: Vec<Slot>,

    /// (extension name, namespace) -> slot, for O(1) revisit detection.
    index: HashMap<(String, String), usize>,

    /// Names currently being resolved, for cycle detection.
    stack: Vec<String>,
}

impl<'a> Planner<'a> {
    pub fn new(
        repository: &'a dyn Repository,
        store: &'a dyn InstalledStore,
        confirmation: &'a dyn ConfirmationPort,
    ) -> Self {
        Planner {
            repository,
            store,
            confirmation,
            slots: Vec::new(),
            index: HashMap::new(),
            stack: Vec::new(),
        }
    }

    /// Produce the plan for a request.
    pub fn plan(mut self, request: &Request) -> Result<Plan> {
        let roots = match request {
            Request::Install(install) => self.plan_install(install)?,
            Request::Uninstall(uninstall) => self.plan_uninstall(uninstall)?,
        };

        Ok(Plan::new(self.materialize(&roots)))
    }

    fn plan_install(&mut self, request: &InstallRequest) -> Result<Vec<usize>> {
        let mut roots = Vec::new();

        for target in &request.targets {
            let idx = self.resolve(
                target.name(),
                &target.constraint(),
                &request.namespace,
                request.upgrade,
                false,
            )?;
            if !roots.contains(&idx) {
                roots.push(idx);
            }
        }

        Ok(roots)
    }

    /// Resolve one extension into the arena, returning its slot.
    ///
    /// `dependency` marks transitive resolutions; `upgrade` only applies to
    /// directly requested targets.
    fn resolve(
        &mut self,
        name: &str,
        constraint: &VersionConstraint,
        namespace: &str,
        upgrade: bool,
        dependency: bool,
    ) -> Result<usize> {
        self.check_cycle(name)?;

        let key = (name.to_string(), namespace.to_string());
        if let Some(&idx) = self.index.get(&key) {
            return self.revisit(idx, name, constraint);
        }

        let installed = self.store.get(name, namespace)?;

        // Already satisfied and no upgrade requested: a NONE node, recursing
        // so every satisfied transitive dependency also shows up as NONE.
        if let Some(local) = &installed {
            if constraint.satisfies(&local.id().version) && !upgrade {
                let extension = local.extension.clone();
                return self.finish_node(
                    name,
                    namespace,
                    extension,
                    None,
                    ActionKind::None,
                    constraint.clone(),
                    dependency,
                );
            }
        }

        let extension = self.resolve_metadata(name, constraint)?;

        let (kind, previous) = match installed {
            Some(local) => {
                let diff = extension.id.version.compare_to(&local.id().version);
                if diff < 0 {
                    // An explicit pin on an older release is a refused
                    // downgrade. Anything looser means the repository simply
                    // has nothing newer: the installed release stays.
                    if matches!(constraint, VersionConstraint::Exact(_)) {
                        return Err(ExtmanError::NewerVersionInstalled {
                            name: name.to_string(),
                            installed: local.id().version.to_string(),
                            requested: extension.id.version.to_string(),
                        });
                    }
                    let extension = local.extension.clone();
                    return self.finish_node(
                        name,
                        namespace,
                        extension,
                        None,
                        ActionKind::None,
                        constraint.clone(),
                        dependency,
                    );
                }
                if diff == 0 {
                    // Upgrade intent with nothing newer available
                    (ActionKind::None, None)
                } else {
                    (ActionKind::Upgrade, Some(local))
                }
            }
            None => (ActionKind::Install, None),
        };

        self.finish_node(
            name,
            namespace,
            extension,
            previous,
            kind,
            constraint.clone(),
            dependency,
        )
    }

    /// Resolve metadata for a name under a constraint: exact pins go through
    /// `resolve`, everything else picks the best satisfying release.
    fn resolve_metadata(
        &self,
        name: &str,
        constraint: &VersionConstraint,
    ) -> Result<Extension> {
        if let VersionConstraint::Exact(version) = constraint {
            let id = ExtensionId::new(name, version.clone());
            return self.repository.resolve(&id);
        }

        best_match(self.repository, name, constraint)?.ok_or_else(|| {
            ExtmanError::ResolutionFailed {
                name: name.to_string(),
                constraint: constraint.to_string(),
            }
        })
    }

    /// Recurse into mandatory dependencies, then allocate and index the slot.
    #[allow(clippy::too_many_arguments)]
    fn finish_node(
        &mut self,
        name: &str,
        namespace: &str,
        extension: Extension,
        previous: Option<LocalExtension>,
        kind: ActionKind,
        constraint: VersionConstraint,
        dependency: bool,
    ) -> Result<usize> {
        self.stack.push(name.to_string());

        let mut children = Vec::new();
        for dep in extension.mandatory_dependencies().cloned().collect::<Vec<_>>() {
            let child = self.resolve(&dep.name, &dep.constraint, namespace, false, true)?;
            if !children.contains(&child) {
                children.push(child);
            }
        }

        self.stack.pop();

        let action = PlanAction {
            extension,
            previous,
            kind,
            namespace: namespace.to_string(),
            constraint,
            dependency,
        };

        let idx = self.slots.len();
        self.slots.push(Slot { action, children });
        self.index
            .insert((name.to_string(), namespace.to_string()), idx);

        Ok(idx)
    }

    /// An extension re-encountered in the same plan: reuse the slot when the
    /// chosen version still satisfies, otherwise merge constraints and
    /// re-check, failing with a conflict rather than silently picking one.
    fn revisit(&mut self, idx: usize, name: &str, constraint: &VersionConstraint) -> Result<usize> {
        let chosen = self.slots[idx].action.extension.id.version.clone();

        if constraint.satisfies(&chosen) {
            return Ok(idx);
        }

        let merged = self.slots[idx].action.constraint.merge(constraint, name)?;
        if merged.satisfies(&chosen) {
            self.slots[idx].action.constraint = merged;
            return Ok(idx);
        }

        Err(ExtmanError::ConstraintConflict {
            name: name.to_string(),
            existing: format!("{chosen} (already planned)"),
            requested: constraint.to_string(),
        })
    }

    fn check_cycle(&self, name: &str) -> Result<()> {
        if self.stack.iter().any(|n| n == name) {
            let mut chain = self.stack.clone();
            chain.push(name.to_string());
            return Err(ExtmanError::CyclicDependency {
                chain: chain.join(" -> "),
            });
        }
        Ok(())
    }

    fn plan_uninstall(&mut self, request: &UninstallRequest) -> Result<Vec<usize>> {
        let mut roots = Vec::new();

        for name in &request.names {
            let local = self.store.get(name, &request.namespace)?.ok_or_else(|| {
                ExtmanError::NotInstalled {
                    name: name.clone(),
                    namespace: request.namespace.clone(),
                }
            })?;

            let cascade = self.dependent_closure(name, &request.namespace)?;

            if !cascade.is_empty() {
                let affected: Vec<ExtensionId> =
                    cascade.iter().map(|l| l.id().clone()).collect();
                let question =
                    Question::cascade_removal(name, &request.namespace, affected.clone());

                let confirmed = self.confirmation.confirm(question)?;
                if !confirmed {
                    let dependents: Vec<String> =
                        affected.iter().map(ToString::to_string).collect();
                    return Err(ExtmanError::UninstallBlocked {
                        name: name.clone(),
                        namespace: request.namespace.clone(),
                        dependents: dependents.join(", "),
                    });
                }
            }

            let idx = self.removal_node(&local, &request.namespace)?;
            if !roots.contains(&idx) {
                roots.push(idx);
            }
        }

        Ok(roots)
    }

    /// Transitive reverse-dependent closure of `name`, in removal order.
    fn dependent_closure(&self, name: &str, namespace: &str) -> Result<Vec<LocalExtension>> {
        let mut closure: Vec<LocalExtension> = Vec::new();
        let mut queue: Vec<String> = vec![name.to_string()];
        let mut seen: Vec<String> = vec![name.to_string()];

        while let Some(current) = queue.pop() {
            for dependent in backward_dependencies(self.store, &current, namespace)? {
                let dependent_name = dependent.id().name.clone();
                if !seen.contains(&dependent_name) {
                    seen.push(dependent_name.clone());
                    queue.push(dependent_name);
                    closure.push(dependent);
                }
            }
        }

        Ok(closure)
    }

    /// Build the removal node for one installed extension; reverse
    /// dependents become children so they flatten (and execute) first.
    fn removal_node(&mut self, local: &LocalExtension, namespace: &str) -> Result<usize> {
        let name = local.id().name.clone();

        let key = (name.clone(), namespace.to_string());
        if let Some(&idx) = self.index.get(&key) {
            return Ok(idx);
        }

        self.stack.push(name.clone());

        let mut children = Vec::new();
        for dependent in backward_dependencies(self.store, &name, namespace)? {
            // A dependency cycle among installed extensions: the edge back
            // into an in-flight node is dropped, everything is removed once.
            if self.stack.iter().any(|n| n == &dependent.id().name) {
                continue;
            }
            let child = self.removal_node(&dependent, namespace)?;
            if !children.contains(&child) {
                children.push(child);
            }
        }

        self.stack.pop();

        let action = PlanAction {
            extension: local.extension.clone(),
            previous: Some(local.clone()),
            kind: ActionKind::Uninstall,
            namespace: namespace.to_string(),
            constraint: VersionConstraint::Any,
            dependency: !local.direct,
        };

        let idx = self.slots.len();
        self.slots.push(Slot { action, children });
        self.index.insert(key, idx);

        Ok(idx)
    }

    /// Materialize the owned, acyclic plan tree from the arena. Each slot
    /// becomes exactly one node: later references to an already-attached
    /// slot are dropped, its action is guaranteed to flatten earlier.
    fn materialize(&self, roots: &[usize]) -> Vec<PlanNode> {
        let mut attached = vec![false; self.slots.len()];
        roots
            .iter()
            .filter_map(|&idx| self.build_node(idx, &mut attached))
            .collect()
    }

    fn build_node(&self, idx: usize, attached: &mut [bool]) -> Option<PlanNode> {
        if attached[idx] {
            return None;
        }
        attached[idx] = true;

        let slot = &self.slots[idx];
        let children = slot
            .children
            .iter()
            .filter_map(|&child| self.build_node(child, attached))
            .collect();

        Some(PlanNode {
            action: slot.action.clone(),
            children,
        })
    }
}
