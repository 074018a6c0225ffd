//! File-backed installed store
//!
//! Installation state lives in `<state-dir>/installed.json`; artifact bytes
//! are persisted under `<state-dir>/artifacts/` named `<name>-<version>`.
//! Every mutation rewrites the JSON file as a whole: installed state is
//! small and whole-file writes keep partial updates off disk.

use std::path::PathBuf;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::error::{ExtmanError, Result};
use crate::extension::LocalExtension;
use crate::store::InstalledStore;

#[derive(Debug, Default, Serialize, Deserialize)]
struct InstalledFile {
    extensions: Vec<LocalExtension>,
}

/// Installed store rooted at a state directory.
pub struct FileStore {
    state_dir: PathBuf,
    // Serializes read-modify-write cycles within one process; cross-process
    // callers are already serialized by the namespace job lock.
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn open(state_dir: impl Into<PathBuf>) -> Result<Self> {
        let state_dir = state_dir.into();
        std::fs::create_dir_all(&state_dir)?;
        Ok(FileStore {
            state_dir,
            write_lock: Mutex::new(()),
        })
    }

    fn installed_path(&self) -> PathBuf {
        self.state_dir.join("installed.json")
    }

    fn artifacts_dir(&self) -> PathBuf {
        self.state_dir.join("artifacts")
    }

    fn load(&self) -> Result<InstalledFile> {
        let path = self.installed_path();
        if !path.exists() {
            return Ok(InstalledFile::default());
        }

        let content =
            std::fs::read_to_string(&path).map_err(|e| ExtmanError::ConfigReadFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        serde_json::from_str(&content).map_err(|e| ExtmanError::ConfigParseFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    fn save(&self, file: &InstalledFile) -> Result<()> {
        let content = serde_json::to_string_pretty(file)?;
        std::fs::write(self.installed_path(), content)?;
        Ok(())
    }

    fn guard(&self) -> Result<std::sync::MutexGuard<'_, ()>> {
        self.write_lock.lock().map_err(|_| ExtmanError::IoError {
            message: "installed store lock poisoned".to_string(),
        })
    }
}

impl InstalledStore for FileStore {
    fn get(&self, name: &str, namespace: &str) -> Result<Option<LocalExtension>> {
        Ok(self
            .load()?
            .extensions
            .into_iter()
            .find(|local| local.id().name == name && local.is_installed_in(namespace)))
    }

    fn installed(&self, namespace: &str) -> Result<Vec<LocalExtension>> {
        let mut result: Vec<LocalExtension> = self
            .load()?
            .extensions
            .into_iter()
            .filter(|local| local.is_installed_in(namespace))
            .collect();
        result.sort_by(|a, b| a.id().name.cmp(&b.id().name));
        Ok(result)
    }

    fn register(&self, local: &LocalExtension, artifact: Option<&[u8]>) -> Result<()> {
        let _guard = self.guard()?;

        let mut file = self.load()?;
        file.extensions.retain(|existing| {
            existing.id().name != local.id().name
                || existing
                    .namespaces
                    .intersection(&local.namespaces)
                    .next()
                    .is_none()
        });
        file.extensions.push(local.clone());
        file.extensions.sort_by(|a, b| a.id().name.cmp(&b.id().name));
        self.save(&file)?;

        if let Some(bytes) = artifact {
            let dir = self.artifacts_dir();
            std::fs::create_dir_all(&dir)?;
            let file_name = format!("{}-{}", local.id().name, local.id().version);
            std::fs::write(dir.join(file_name), bytes)?;
        }

        Ok(())
    }

    fn unregister(&self, name: &str, namespace: &str) -> Result<()> {
        let _guard = self.guard()?;

        let mut file = self.load()?;
        let mut found = false;

        file.extensions.retain_mut(|local| {
            if local.id().name != name || !local.is_installed_in(namespace) {
                return true;
            }
            found = true;
            local.namespaces.remove(namespace);
            // Drop the record entirely once no namespace references it
            if local.namespaces.is_empty() {
                let file_name = format!("{}-{}", local.id().name, local.id().version);
                let _ = std::fs::remove_file(self.artifacts_dir().join(file_name));
                return false;
            }
            true
        });

        if !found {
            return Err(ExtmanError::NotInstalled {
                name: name.to_string(),
                namespace: namespace.to_string(),
            });
        }

        self.save(&file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extension::{Extension, ExtensionId};
    use crate::version::Version;
    use tempfile::TempDir;

    fn local(name: &str, version: &str, namespace: &str) -> LocalExtension {
        LocalExtension::new(
            Extension::new(ExtensionId::new(name, Version::new(version))),
            namespace,
            true,
        )
    }

    #[test]
    fn test_round_trip_through_disk() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::open(temp.path()).unwrap();

        store
            .register(&local("editor", "1.2", "main"), Some(b"payload"))
            .unwrap();

        // Reopen to prove state survives the process boundary
        let reopened = FileStore::open(temp.path()).unwrap();
        let installed = reopened.get("editor", "main").unwrap().unwrap();
        assert_eq!(installed.id().version, Version::new("1.2"));
        assert_eq!(
            std::fs::read(temp.path().join("artifacts/editor-1.2")).unwrap(),
            b"payload"
        );
    }

    #[test]
    fn test_unregister_removes_record_and_artifact() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::open(temp.path()).unwrap();
        store
            .register(&local("editor", "1.2", "main"), Some(b"payload"))
            .unwrap();

        store.unregister("editor", "main").unwrap();

        assert!(store.get("editor", "main").unwrap().is_none());
        assert!(!temp.path().join("artifacts/editor-1.2").exists());
    }

    #[test]
    fn test_upgrade_replaces_same_namespace_entry() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::open(temp.path()).unwrap();
        store.register(&local("editor", "1.0", "main"), None).unwrap();
        store.register(&local("editor", "2.0", "main"), None).unwrap();

        let installed = store.installed("main").unwrap();
        assert_eq!(installed.len(), 1);
        assert_eq!(installed[0].id().version, Version::new("2.0"));
    }

    #[test]
    fn test_namespaces_are_independent() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::open(temp.path()).unwrap();
        store.register(&local("editor", "1.0", "main"), None).unwrap();
        store.register(&local("editor", "2.0", "other"), None).unwrap();

        assert_eq!(
            store.get("editor", "main").unwrap().unwrap().id().version,
            Version::new("1.0")
        );
        assert_eq!(
            store.get("editor", "other").unwrap().unwrap().id().version,
            Version::new("2.0")
        );
    }
}
