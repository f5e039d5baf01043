//! [`TestProject`] builder for reconciliation test scenarios.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value, json};
use tempfile::TempDir;

/// A temporary project directory with helpers for setup and assertion.
///
/// # Example
///
/// ```rust,no_run
/// use devscaffold_test_utils::TestProject;
///
/// let project = TestProject::new()
///     .with_ddev(&["NIGHTWATCH_DRUPAL_URL=http://web"])
///     .with_manifest(&["nightwatch"])
///     .with_yarn_lock();
/// project.assert_file_exists(".ddev/config.yaml");
/// ```
pub struct TestProject {
    temp_dir: TempDir,
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

impl TestProject {
    /// Create an empty temporary project.
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root().join(relative)
    }

    /// Write `content` to `relative`, creating parent directories.
    pub fn write(&self, relative: &str, content: impl AsRef<[u8]>) {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
    }

    pub fn with_file(self, relative: &str, content: impl AsRef<[u8]>) -> Self {
        self.write(relative, content);
        self
    }

    pub fn with_dir(self, relative: &str) -> Self {
        fs::create_dir_all(self.path(relative)).unwrap();
        self
    }

    /// Mark the project as DDEV-managed with the given web environment.
    pub fn with_ddev(self, web_environment: &[&str]) -> Self {
        let mut config = String::from("name: scratch\ntype: drupal10\n");
        if !web_environment.is_empty() {
            config.push_str("web_environment:\n");
            for entry in web_environment {
                config.push_str(&format!("  - {entry}\n"));
            }
        }
        self.with_file(".ddev/config.yaml", config)
    }

    /// Write a `package.json` declaring `dev_dependencies` with a `*` range.
    pub fn with_manifest(self, dev_dependencies: &[&str]) -> Self {
        let deps: Map<String, Value> = dev_dependencies
            .iter()
            .map(|name| (name.to_string(), json!("*")))
            .collect();
        let manifest = json!({
            "name": "scratch",
            "private": true,
            "devDependencies": deps,
        });
        self.with_file("package.json", serde_json::to_vec_pretty(&manifest).unwrap())
    }

    pub fn with_yarn_lock(self) -> Self {
        self.with_file("yarn.lock", "# yarn lockfile v1\n")
    }

    pub fn with_npm_lock(self) -> Self {
        self.with_file("package-lock.json", "{\"lockfileVersion\": 3}\n")
    }

    pub fn read(&self, relative: &str) -> Vec<u8> {
        fs::read(self.path(relative))
            .unwrap_or_else(|_| panic!("Could not read file: {}", self.path(relative).display()))
    }

    /// Parse `package.json`.
    pub fn manifest(&self) -> Value {
        serde_json::from_slice(&self.read("package.json")).unwrap()
    }

    /// Assert that `path` (relative to the project root) exists.
    ///
    /// # Panics
    /// Panics with a descriptive message if the path does not exist.
    pub fn assert_file_exists(&self, path: &str) {
        let full_path = self.path(path);
        assert!(
            full_path.exists(),
            "Expected file to exist: {}",
            full_path.display()
        );
    }

    /// Assert that `path` (relative to the project root) does **not** exist.
    pub fn assert_file_not_exists(&self, path: &str) {
        let full_path = self.path(path);
        assert!(
            !full_path.exists(),
            "Expected file NOT to exist: {}",
            full_path.display()
        );
    }

    /// Assert that the file at `path` has exactly `expected` as content.
    pub fn assert_file_bytes(&self, path: &str, expected: &[u8]) {
        let actual = self.read(path);
        assert!(
            actual == expected,
            "File {} differs from expected content.\nExpected: {}\nActual: {}",
            path,
            String::from_utf8_lossy(expected),
            String::from_utf8_lossy(&actual)
        );
    }
}
