//! Common test utilities for extman integration tests

use assert_cmd::Command;
use std::path::PathBuf;
use tempfile::TempDir;

/// A test environment with its own repository and state directory
#[allow(dead_code)]
pub struct TestEnv {
    /// Temporary directory
    #[allow(dead_code)]
    pub temp: TempDir,
    /// Repository directory (holds index.json and artifacts)
    pub registry: PathBuf,
    /// State directory (holds installed.json)
    pub state: PathBuf,
}

#[allow(dead_code)]
impl TestEnv {
    /// Create a new empty test environment
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let registry = temp.path().join("registry");
        let state = temp.path().join("state");
        std::fs::create_dir_all(&registry).expect("Failed to create registry directory");
        std::fs::create_dir_all(&state).expect("Failed to create state directory");
        Self {
            temp,
            registry,
            state,
        }
    }

    /// Create an environment publishing a small extension graph:
    ///
    /// - core 1.0 and 2.0 (no dependencies)
    /// - editor 1.0 (depends on core >=1.0) and editor 2.0 (core >=2.0)
    /// - viewer 1.0 (depends on core >=1.0)
    pub fn with_sample_repo() -> Self {
        let env = Self::new();
        env.write_index(
            r#"{
  "extensions": [
    { "id": { "name": "core", "version": "1.0" }, "artifact": "artifacts/core-1.0" },
    { "id": { "name": "core", "version": "2.0" }, "artifact": "artifacts/core-2.0" },
    { "id": { "name": "editor", "version": "1.0" },
      "dependencies": [ { "name": "core", "constraint": ">=1.0" } ],
      "artifact": "artifacts/editor-1.0" },
    { "id": { "name": "editor", "version": "2.0" },
      "dependencies": [ { "name": "core", "constraint": ">=2.0" } ],
      "artifact": "artifacts/editor-2.0" },
    { "id": { "name": "viewer", "version": "1.0" },
      "dependencies": [ { "name": "core", "constraint": ">=1.0" } ],
      "artifact": "artifacts/viewer-1.0" }
  ]
}"#,
        );
        for name in [
            "core-1.0",
            "core-2.0",
            "editor-1.0",
            "editor-2.0",
            "viewer-1.0",
        ] {
            env.write_artifact(name, name.as_bytes());
        }
        env
    }

    /// Write the repository index
    pub fn write_index(&self, content: &str) {
        std::fs::write(self.registry.join("index.json"), content)
            .expect("Failed to write index.json");
    }

    /// Write an artifact file under the repository's artifacts directory
    pub fn write_artifact(&self, name: &str, bytes: &[u8]) {
        let dir = self.registry.join("artifacts");
        std::fs::create_dir_all(&dir).expect("Failed to create artifacts directory");
        std::fs::write(dir.join(name), bytes).expect("Failed to write artifact");
    }

    /// Command wired to this environment's registry and state directory
    // Temporary fix for deprecated cargo_bin - will be updated when build-dir issues are resolved
    #[allow(deprecated)]
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("extman").expect("Failed to find extman binary");
        cmd.env("EXTMAN_REGISTRY", &self.registry);
        cmd.env("EXTMAN_STATE_DIR", &self.state);
        cmd.env_remove("EXTMAN_NAMESPACE");
        cmd
    }

    /// Raw content of the installed store file
    pub fn installed_json(&self) -> String {
        std::fs::read_to_string(self.state.join("installed.json"))
            .expect("Failed to read installed.json")
    }

    /// Whether an artifact was persisted to the state directory
    pub fn artifact_installed(&self, file_name: &str) -> bool {
        self.state.join("artifacts").join(file_name).exists()
    }
}
