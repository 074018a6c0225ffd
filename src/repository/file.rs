//! File-backed repository
//!
//! A repository directory holds an `index.json` listing every published
//! release and, optionally, artifact files referenced by relative path:
//!
//! ```json
//! {
//!   "extensions": [
//!     {
//!       "id": { "name": "editor", "version": "1.2" },
//!       "kind": "xar",
//!       "dependencies": [ { "name": "core", "constraint": ">=1.0" } ],
//!       "artifact": "artifacts/editor-1.2.xar"
//!     }
//!   ]
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{ExtmanError, Result};
use crate::extension::{Extension, ExtensionDependency, ExtensionId};
use crate::repository::Repository;

/// One `index.json` entry: extension metadata plus artifact location.
#[derive(Debug, Deserialize)]
struct IndexEntry {
    id: ExtensionId,
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    dependencies: Vec<ExtensionDependency>,
    #[serde(default)]
    suggestions: Vec<ExtensionDependency>,
    #[serde(default)]
    artifact: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct Index {
    extensions: Vec<IndexEntry>,
}

/// A repository rooted at a directory with an `index.json`.
pub struct FileRepository {
    root: PathBuf,
    entries: Vec<(Extension, Option<PathBuf>)>,
}

impl FileRepository {
    /// Open a repository directory, parsing its index eagerly.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let index_path = root.join("index.json");

        let content =
            std::fs::read_to_string(&index_path).map_err(|e| ExtmanError::ConfigReadFailed {
                path: index_path.display().to_string(),
                reason: e.to_string(),
            })?;

        let index: Index =
            serde_json::from_str(&content).map_err(|e| ExtmanError::ConfigParseFailed {
                path: index_path.display().to_string(),
                reason: e.to_string(),
            })?;

        let name = root
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("file")
            .to_string();

        let entries = index
            .extensions
            .into_iter()
            .map(|entry| {
                let mut extension = Extension::new(entry.id);
                if let Some(kind) = entry.kind {
                    extension.kind = kind;
                }
                extension.dependencies = entry.dependencies;
                extension.suggestions = entry.suggestions;
                extension.repository = Some(name.clone());
                (extension, entry.artifact)
            })
            .collect();

        Ok(FileRepository { root, entries })
    }

    fn artifact_path(&self, id: &ExtensionId) -> Option<&Path> {
        self.entries
            .iter()
            .find(|(e, _)| &e.id == id)
            .and_then(|(_, artifact)| artifact.as_deref())
    }
}

impl Repository for FileRepository {
    fn search(&self, query: &str) -> Result<Vec<Extension>> {
        let mut results: Vec<Extension> = self
            .entries
            .iter()
            .filter(|(e, _)| e.id.name.contains(query))
            .map(|(e, _)| e.clone())
            .collect();

        results.sort_by(|a, b| {
            (a.id.name != query, &a.id.name, &a.id.version)
                .cmp(&(b.id.name != query, &b.id.name, &b.id.version))
        });

        Ok(results)
    }

    fn resolve(&self, id: &ExtensionId) -> Result<Extension> {
        self.entries
            .iter()
            .find(|(e, _)| &e.id == id)
            .map(|(e, _)| e.clone())
            .ok_or_else(|| ExtmanError::ExtensionNotFound { id: id.to_string() })
    }

    fn fetch(&self, id: &ExtensionId) -> Result<Vec<u8>> {
        // A release without an artifact file is metadata-only; its bytes are
        // empty rather than an error so plans over it still execute.
        let Some(relative) = self.artifact_path(id) else {
            if self.entries.iter().any(|(e, _)| &e.id == id) {
                return Ok(Vec::new());
            }
            return Err(ExtmanError::RepositoryIo {
                message: format!("unknown artifact {id}"),
            });
        };

        let path = self.root.join(relative);
        std::fs::read(&path).map_err(|e| ExtmanError::RepositoryIo {
            message: format!("failed to read {}: {e}", path.display()),
        })
    }
}
