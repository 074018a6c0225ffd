//! Repository client interface
//!
//! The planner consumes a narrow repository surface: search by name,
//! resolve exact metadata, fetch artifact bytes. Transport is someone
//! else's problem; the two implementations here are an in-memory map for
//! unit tests and a JSON index directory for the CLI.

pub mod file;
pub mod memory;

pub use file::FileRepository;
pub use memory::MemoryRepository;

use crate::error::Result;
use crate::extension::{Extension, ExtensionId};
use crate::version::VersionConstraint;

/// The narrow interface the planner needs from an extension repository.
pub trait Repository: Send + Sync {
    /// All known releases whose name contains the query (exact name first).
    fn search(&self, query: &str) -> Result<Vec<Extension>>;

    /// Metadata for one exact release. Fails with `ExtensionNotFound`.
    fn resolve(&self, id: &ExtensionId) -> Result<Extension>;

    /// Artifact bytes for one exact release. Fails with `RepositoryIo` on
    /// transport/storage problems; bytes are opaque to the planner.
    fn fetch(&self, id: &ExtensionId) -> Result<Vec<u8>>;
}

/// Pick the best (highest-versioned) release of `name` satisfying
/// `constraint`, or `None` when the repository has no satisfying release.
pub fn best_match(
    repository: &dyn Repository,
    name: &str,
    constraint: &VersionConstraint,
) -> Result<Option<Extension>> {
    let mut best: Option<Extension> = None;

    for candidate in repository.search(name)? {
        if candidate.id.name != name || !constraint.satisfies(&candidate.id.version) {
            continue;
        }
        let newer = match &best {
            Some(current) => candidate.id.version > current.id.version,
            None => true,
        };
        if newer {
            best = Some(candidate);
        }
    }

    Ok(best)
}
