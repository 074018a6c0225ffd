//! Installed-extension store
//!
//! Tracks which extension releases are installed into which namespaces.
//! The planner reads it to decide action kinds and to walk reverse
//! dependencies; the executor mutates it when applying plan actions.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::Result;
use crate::extension::LocalExtension;

/// Persistent record of installed extensions per namespace.
pub trait InstalledStore: Send + Sync {
    /// The installed release of `name` in `namespace`, if any.
    fn get(&self, name: &str, namespace: &str) -> Result<Option<LocalExtension>>;

    /// Every extension installed into `namespace`.
    fn installed(&self, namespace: &str) -> Result<Vec<LocalExtension>>;

    /// Register an installed release, replacing any previous release of the
    /// same name in the same namespaces. `artifact` carries the fetched
    /// bytes for stores that persist them; they stay opaque.
    fn register(&self, local: &LocalExtension, artifact: Option<&[u8]>) -> Result<()>;

    /// Remove the registration of `name` from `namespace`.
    fn unregister(&self, name: &str, namespace: &str) -> Result<()>;
}

/// Installed extensions in `namespace` that declare a mandatory dependency
/// on `name` (the reverse dependency edge set).
pub fn backward_dependencies(
    store: &dyn InstalledStore,
    name: &str,
    namespace: &str,
) -> Result<Vec<LocalExtension>> {
    let mut dependents: Vec<LocalExtension> = store
        .installed(namespace)?
        .into_iter()
        .filter(|local| local.extension.dependency_on(name).is_some())
        .collect();

    dependents.sort_by(|a, b| a.id().name.cmp(&b.id().name));

    Ok(dependents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extension::{Extension, ExtensionDependency, ExtensionId};
    use crate::version::{Version, VersionConstraint};

    fn local(name: &str, version: &str, deps: &[&str], namespace: &str) -> LocalExtension {
        let mut extension = Extension::new(ExtensionId::new(name, Version::new(version)));
        extension.dependencies = deps
            .iter()
            .map(|d| ExtensionDependency::new(*d, VersionConstraint::Any))
            .collect();
        LocalExtension::new(extension, namespace, true)
    }

    #[test]
    fn test_backward_dependencies() {
        let store = MemoryStore::new();
        store
            .register(&local("core", "1.0", &[], "main"), None)
            .unwrap();
        store
            .register(&local("editor", "1.0", &["core"], "main"), None)
            .unwrap();
        store
            .register(&local("viewer", "1.0", &["core"], "main"), None)
            .unwrap();
        store
            .register(&local("standalone", "1.0", &[], "main"), None)
            .unwrap();

        let dependents = backward_dependencies(&store, "core", "main").unwrap();
        let names: Vec<&str> = dependents.iter().map(|l| l.id().name.as_str()).collect();
        assert_eq!(names, vec!["editor", "viewer"]);

        assert!(
            backward_dependencies(&store, "standalone", "main")
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn test_backward_dependencies_scoped_to_namespace() {
        let store = MemoryStore::new();
        store
            .register(&local("core", "1.0", &[], "main"), None)
            .unwrap();
        store
            .register(&local("editor", "1.0", &["core"], "other"), None)
            .unwrap();

        assert!(
            backward_dependencies(&store, "core", "main")
                .unwrap()
                .is_empty()
        );
    }
}
