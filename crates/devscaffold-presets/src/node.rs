//! Node.js manifest and lockfile inspection

use std::collections::BTreeSet;

use devscaffold_fs::{DocumentFormat, NormalizedPath, io};
use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, Result};

pub const PACKAGE_JSON: &str = "package.json";
pub const YARN_LOCK: &str = "yarn.lock";
pub const NPM_LOCK: &str = "package-lock.json";

/// Which dependency-manager lockfiles exist in the project.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LockfilePresence {
    pub yarn_lock: bool,
    pub npm_lock: bool,
}

/// Snapshot of the dev dependencies a manifest declares.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ManifestState {
    pub declared_dev_dependency_names: BTreeSet<String>,
}

impl ManifestState {
    pub fn new(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            declared_dev_dependency_names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Build the snapshot from a parsed `package.json`.
    ///
    /// A dependency counts as declared only when its version specifier is a
    /// non-empty string.
    pub fn from_manifest(manifest: &Value) -> Self {
        let names: BTreeSet<String> = manifest
            .get("devDependencies")
            .and_then(Value::as_object)
            .map(|deps| {
                deps.iter()
                    .filter(|(_, spec)| spec.as_str().is_some_and(|s| !s.trim().is_empty()))
                    .map(|(name, _)| name.clone())
                    .collect()
            })
            .unwrap_or_default();
        Self {
            declared_dev_dependency_names: names,
        }
    }

    pub fn declares(&self, name: &str) -> bool {
        self.declared_dev_dependency_names.contains(name)
    }
}

/// The Node side of a project directory.
#[derive(Debug, Clone)]
pub struct NodeProject {
    root: NormalizedPath,
}

impl NodeProject {
    pub fn new(root: NormalizedPath) -> Self {
        Self { root }
    }

    pub fn manifest_path(&self) -> NormalizedPath {
        self.root.join(PACKAGE_JSON)
    }

    pub fn has_manifest(&self) -> bool {
        self.manifest_path().is_file()
    }

    pub fn lockfiles(&self) -> LockfilePresence {
        LockfilePresence {
            yarn_lock: self.root.join(YARN_LOCK).is_file(),
            npm_lock: self.root.join(NPM_LOCK).is_file(),
        }
    }

    /// Read the manifest's declared dev dependencies.
    ///
    /// Returns `Ok(None)` when there is no manifest yet.
    pub fn manifest_state(&self) -> Result<Option<ManifestState>> {
        let path = self.manifest_path();
        let Some(bytes) = io::read_bytes(&path)? else {
            return Ok(None);
        };
        let manifest = DocumentFormat::Json.parse(&bytes)?;
        if !manifest.is_object() {
            return Err(Error::ManifestShape {
                path: path.to_native(),
            });
        }
        Ok(Some(ManifestState::from_manifest(&manifest)))
    }

    /// Set the manifest's `name` field, leaving every other field intact.
    ///
    /// Returns `false` when the name already matched.
    pub fn rename_manifest(&self, name: &str) -> Result<bool> {
        let path = self.manifest_path();
        let text = io::read_text(&path)?;
        let mut manifest = DocumentFormat::Json.parse(text.as_bytes())?;
        let Some(fields) = manifest.as_object_mut() else {
            return Err(Error::ManifestShape {
                path: path.to_native(),
            });
        };

        if fields.get("name").and_then(Value::as_str) == Some(name) {
            return Ok(false);
        }
        fields.insert("name".to_string(), Value::String(name.to_string()));

        io::write_atomic(&path, &DocumentFormat::Json.render(&manifest)?)?;
        tracing::info!(path = %path, name, "Renamed manifest");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn project(temp: &TempDir) -> NodeProject {
        NodeProject::new(NormalizedPath::new(temp.path()))
    }

    #[test]
    fn test_empty_version_is_not_declared() {
        let manifest = json!({
            "devDependencies": {
                "nightwatch": "^3.0.0",
                "nightwatch-accessibility": "",
                "broken": null
            }
        });
        let state = ManifestState::from_manifest(&manifest);
        assert!(state.declares("nightwatch"));
        assert!(!state.declares("nightwatch-accessibility"));
        assert!(!state.declares("broken"));
    }

    #[test]
    fn test_runtime_dependencies_do_not_count() {
        let manifest = json!({"dependencies": {"nightwatch": "^3.0.0"}});
        assert!(ManifestState::from_manifest(&manifest).declared_dev_dependency_names.is_empty());
    }

    #[test]
    fn test_manifest_state_absent() {
        let temp = TempDir::new().unwrap();
        assert_eq!(project(&temp).manifest_state().unwrap(), None);
    }

    #[test]
    fn test_manifest_state_array_root_is_error() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(PACKAGE_JSON), "[]").unwrap();
        assert!(matches!(
            project(&temp).manifest_state(),
            Err(Error::ManifestShape { .. })
        ));
    }

    #[test]
    fn test_lockfiles() {
        let temp = TempDir::new().unwrap();
        assert_eq!(project(&temp).lockfiles(), LockfilePresence::default());

        fs::write(temp.path().join(NPM_LOCK), "{}").unwrap();
        assert_eq!(
            project(&temp).lockfiles(),
            LockfilePresence {
                yarn_lock: false,
                npm_lock: true
            }
        );
    }

    #[test]
    fn test_rename_only_touches_name_field() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(PACKAGE_JSON),
            r#"{"name": "html", "description": "html theme assets", "packageManager": "yarn@4.1.0"}"#,
        )
        .unwrap();

        assert!(project(&temp).rename_manifest("drupal-site").unwrap());

        let written: Value =
            serde_json::from_str(&fs::read_to_string(temp.path().join(PACKAGE_JSON)).unwrap())
                .unwrap();
        assert_eq!(written["name"], json!("drupal-site"));
        assert_eq!(written["description"], json!("html theme assets"));
        assert_eq!(written["packageManager"], json!("yarn@4.1.0"));
    }

    #[test]
    fn test_rename_is_noop_when_matching() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(PACKAGE_JSON), r#"{"name": "drupal-site"}"#).unwrap();
        assert!(!project(&temp).rename_manifest("drupal-site").unwrap());
    }
}
