//! In-memory repository, used by unit tests and as a fixture backend
//!
//! Also supports simulating transient fetch failures so the executor's
//! bounded retry can be exercised deterministically.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::error::{ExtmanError, Result};
use crate::extension::{Extension, ExtensionId};
use crate::repository::Repository;

/// A repository backed by a plain map of published releases.
#[derive(Default)]
pub struct MemoryRepository {
    extensions: HashMap<ExtensionId, (Extension, Vec<u8>)>,
    /// Number of fetch calls that fail with `RepositoryIo` before one succeeds.
    fetch_failures: AtomicU32,
}

impl MemoryRepository {
    pub fn new() -> Self {
        MemoryRepository::default()
    }

    /// Publish a release with its artifact bytes.
    pub fn publish(&mut self, extension: Extension, artifact: Vec<u8>) {
        self.extensions
            .insert(extension.id.clone(), (extension, artifact));
    }

    /// Make the next `count` fetch calls fail with a transient error.
    pub fn fail_next_fetches(&self, count: u32) {
        self.fetch_failures.store(count, Ordering::SeqCst);
    }
}

impl Repository for MemoryRepository {
    fn search(&self, query: &str) -> Result<Vec<Extension>> {
        let mut results: Vec<Extension> = self
            .extensions
            .values()
            .filter(|(e, _)| e.id.name.contains(query))
            .map(|(e, _)| e.clone())
            .collect();

        // Exact names first, then by id for deterministic output
        results.sort_by(|a, b| {
            (a.id.name != query, &a.id.name, &a.id.version)
                .cmp(&(b.id.name != query, &b.id.name, &b.id.version))
        });

        Ok(results)
    }

    fn resolve(&self, id: &ExtensionId) -> Result<Extension> {
        self.extensions
            .get(id)
            .map(|(e, _)| e.clone())
            .ok_or_else(|| ExtmanError::ExtensionNotFound { id: id.to_string() })
    }

    fn fetch(&self, id: &ExtensionId) -> Result<Vec<u8>> {
        let remaining = self.fetch_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fetch_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(ExtmanError::RepositoryIo {
                message: format!("simulated transient failure fetching {id}"),
            });
        }

        self.extensions
            .get(id)
            .map(|(_, bytes)| bytes.clone())
            .ok_or_else(|| ExtmanError::RepositoryIo {
                message: format!("no artifact stored for {id}"),
            })
    }
}
