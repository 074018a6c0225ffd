//! Resolution plans
//!
//! A plan is the tree of actions produced by the resolver for one request,
//! plus a flattened, dependency-before-dependent action list. The flat list
//! is recomputed on every read while the owning job is still running (the
//! tree may change on interactive answers) and cached exactly once when the
//! job reaches its terminal FINISHED state.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::extension::{Extension, LocalExtension};
use crate::version::VersionConstraint;

/// What the executor should do for one extension. Closed set, so matches
/// stay exhaustive at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActionKind {
    /// Already satisfied; nothing to do.
    None,
    /// Fetch and register a fresh install.
    Install,
    /// Fetch and register over an older installed release.
    Upgrade,
    /// Unregister an installed release.
    Uninstall,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ActionKind::None => "NONE",
            ActionKind::Install => "INSTALL",
            ActionKind::Upgrade => "UPGRADE",
            ActionKind::Uninstall => "UNINSTALL",
        };
        f.write_str(s)
    }
}

/// One planned action: immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanAction {
    /// Target extension release.
    pub extension: Extension,

    /// The installed release this action replaces or removes, if any.
    pub previous: Option<LocalExtension>,

    pub kind: ActionKind,

    /// Installation scope the action applies to.
    pub namespace: String,

    /// The constraint that produced this resolution.
    pub constraint: VersionConstraint,

    /// True when the extension is pulled in as a dependency rather than
    /// being directly requested.
    pub dependency: bool,
}

impl fmt::Display for PlanAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} on {}",
            self.kind, self.extension.id, self.namespace
        )
    }
}

/// A node of the resolution tree: one action plus the resolved dependencies
/// it relies on. Owned exclusively by its plan, acyclic by construction.
#[derive(Debug, Clone, Serialize)]
pub struct PlanNode {
    pub action: PlanAction,
    pub children: Vec<PlanNode>,
}

impl PlanNode {
    pub fn leaf(action: PlanAction) -> Self {
        PlanNode {
            action,
            children: Vec::new(),
        }
    }
}

/// Flattened action list cache. Explicit tagged state so the
/// "cached only once finished" invariant stays auditable.
#[derive(Debug, Clone)]
enum ActionCache {
    NotCached,
    Cached(Vec<PlanAction>),
}

/// The resolved, ordered set of actions for one request.
#[derive(Debug, Clone)]
pub struct Plan {
    roots: Vec<PlanNode>,
    cache: ActionCache,
}

impl Plan {
    pub fn new(roots: Vec<PlanNode>) -> Self {
        Plan {
            roots,
            cache: ActionCache::NotCached,
        }
    }

    pub fn roots(&self) -> &[PlanNode] {
        &self.roots
    }

    /// The flattened action list, children before their parent so every
    /// dependency's action precedes anything depending on it.
    ///
    /// Recomputed per call until `freeze` runs; value-stable afterwards.
    pub fn actions(&self) -> Vec<PlanAction> {
        match &self.cache {
            ActionCache::Cached(actions) => actions.clone(),
            ActionCache::NotCached => self.flatten(),
        }
    }

    /// Populate the cache. Called exactly once, when the owning job reaches
    /// FINISHED; the flattened list never changes afterwards.
    pub fn freeze(&mut self) {
        if matches!(self.cache, ActionCache::NotCached) {
            self.cache = ActionCache::Cached(self.flatten());
        }
    }

    pub fn is_frozen(&self) -> bool {
        matches!(self.cache, ActionCache::Cached(_))
    }

    /// Post-order traversal of all roots, deduplicated by
    /// (extension name, namespace): a diamond dependency resolved twice
    /// yields exactly one action.
    fn flatten(&self) -> Vec<PlanAction> {
        let mut actions = Vec::new();
        let mut seen: HashSet<(String, String)> = HashSet::new();

        for root in &self.roots {
            flatten_into(root, &mut actions, &mut seen);
        }

        actions
    }
}

fn flatten_into(
    node: &PlanNode,
    actions: &mut Vec<PlanAction>,
    seen: &mut HashSet<(String, String)>,
) {
    for child in &node.children {
        flatten_into(child, actions, seen);
    }

    let key = (
        node.action.extension.id.name.clone(),
        node.action.namespace.clone(),
    );
    if seen.insert(key) {
        actions.push(node.action.clone());
    }
}
