//! Extension metadata model
//!
//! An extension is a versioned, installable unit of functionality with
//! declared dependencies. `Extension` is immutable once resolved from a
//! repository; `LocalExtension` adds the mutable installation state the
//! executor maintains (namespaces, direct-vs-dependency flag).

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::version::{Version, VersionConstraint};

/// Identity of a specific extension release: (name, version).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExtensionId {
    pub name: String,
    pub version: Version,
}

impl ExtensionId {
    pub fn new(name: impl Into<String>, version: Version) -> Self {
        ExtensionId {
            name: name.into(),
            version,
        }
    }
}

impl fmt::Display for ExtensionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.version)
    }
}

/// An edge in the dependency graph.
///
/// Optional dependencies are suggestions: recorded in the plan metadata but
/// never resolved automatically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionDependency {
    pub name: String,
    pub constraint: VersionConstraint,
    #[serde(default)]
    pub optional: bool,
}

impl ExtensionDependency {
    pub fn new(name: impl Into<String>, constraint: VersionConstraint) -> Self {
        ExtensionDependency {
            name: name.into(),
            constraint,
            optional: false,
        }
    }

    pub fn optional(name: impl Into<String>, constraint: VersionConstraint) -> Self {
        ExtensionDependency {
            name: name.into(),
            constraint,
            optional: true,
        }
    }
}

impl fmt::Display for ExtensionDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.constraint)
    }
}

/// Immutable metadata for one releasable unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extension {
    pub id: ExtensionId,

    /// Artifact kind (e.g. "jar", "xar"); opaque to the planner.
    #[serde(default = "default_kind")]
    pub kind: String,

    /// Mandatory dependencies, resolved transitively.
    #[serde(default)]
    pub dependencies: Vec<ExtensionDependency>,

    /// Suggested dependencies; recorded, never auto-resolved.
    #[serde(default)]
    pub suggestions: Vec<ExtensionDependency>,

    /// Identifier of the repository this metadata was resolved from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
}

fn default_kind() -> String {
    "artifact".to_string()
}

impl Extension {
    pub fn new(id: ExtensionId) -> Self {
        Extension {
            id,
            kind: default_kind(),
            dependencies: Vec::new(),
            suggestions: Vec::new(),
            repository: None,
        }
    }

    /// Mandatory dependencies only.
    pub fn mandatory_dependencies(&self) -> impl Iterator<Item = &ExtensionDependency> {
        self.dependencies.iter().filter(|d| !d.optional)
    }

    /// Find the declared dependency edge towards `name`, if any.
    pub fn dependency_on(&self, name: &str) -> Option<&ExtensionDependency> {
        self.dependencies
            .iter()
            .find(|d| !d.optional && d.name == name)
    }
}

/// An extension plus its installation state within the installed store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalExtension {
    pub extension: Extension,

    /// Namespaces this release is installed into.
    pub namespaces: BTreeSet<String>,

    /// True for directly requested installs, false for dependency-only ones.
    pub direct: bool,
}

impl LocalExtension {
    pub fn new(extension: Extension, namespace: impl Into<String>, direct: bool) -> Self {
        let mut namespaces = BTreeSet::new();
        namespaces.insert(namespace.into());
        LocalExtension {
            extension,
            namespaces,
            direct,
        }
    }

    pub fn id(&self) -> &ExtensionId {
        &self.extension.id
    }

    pub fn is_installed_in(&self, namespace: &str) -> bool {
        self.namespaces.contains(namespace)
    }
}
