//! In-memory installed store, used by unit tests and job-level tests

use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::{ExtmanError, Result};
use crate::extension::LocalExtension;
use crate::store::InstalledStore;

/// Installed state held in a mutex-guarded map keyed by (name, namespace).
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<(String, String), LocalExtension>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<(String, String), LocalExtension>>> {
        self.entries.lock().map_err(|_| ExtmanError::IoError {
            message: "installed store mutex poisoned".to_string(),
        })
    }
}

impl InstalledStore for MemoryStore {
    fn get(&self, name: &str, namespace: &str) -> Result<Option<LocalExtension>> {
        Ok(self
            .lock()?
            .get(&(name.to_string(), namespace.to_string()))
            .cloned())
    }

    fn installed(&self, namespace: &str) -> Result<Vec<LocalExtension>> {
        let mut result: Vec<LocalExtension> = self
            .lock()?
            .iter()
            .filter(|((_, ns), _)| ns == namespace)
            .map(|(_, local)| local.clone())
            .collect();
        result.sort_by(|a, b| a.id().name.cmp(&b.id().name));
        Ok(result)
    }

    fn register(&self, local: &LocalExtension, _artifact: Option<&[u8]>) -> Result<()> {
        let mut entries = self.lock()?;
        for namespace in &local.namespaces {
            entries.insert(
                (local.id().name.clone(), namespace.clone()),
                local.clone(),
            );
        }
        Ok(())
    }

    fn unregister(&self, name: &str, namespace: &str) -> Result<()> {
        let mut entries = self.lock()?;
        let removed = entries.remove(&(name.to_string(), namespace.to_string()));

        if removed.is_none() {
            return Err(ExtmanError::NotInstalled {
                name: name.to_string(),
                namespace: namespace.to_string(),
            });
        }

        // The same extension may remain registered under other namespaces;
        // those entries must stop naming the removed one
        for ((entry_name, _), local) in entries.iter_mut() {
            if entry_name == name {
                local.namespaces.remove(namespace);
            }
        }

        Ok(())
    }
}
