//! Project-level configuration from `.devscaffold.toml`

use std::path::PathBuf;

use devscaffold_fs::{ConfigStore, NormalizedPath};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::plan::ExecutionMode;

/// File name of the project configuration, relative to the project root.
pub const CONFIG_FILE: &str = ".devscaffold.toml";

/// `[reconcile]` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReconcileSection {
    /// Whether dependency installs run or are queued for the user
    #[serde(default)]
    pub execution_mode: Option<ExecutionMode>,
    /// Directory of reference templates, relative to the project root.
    ///
    /// The templates bundled with the binary are used when unset.
    #[serde(default)]
    pub reference_dir: Option<PathBuf>,
}

/// Parsed `.devscaffold.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub reconcile: ReconcileSection,
}

impl ProjectConfig {
    /// Load the configuration of the project at `root`, or defaults when absent.
    pub fn load(root: &NormalizedPath) -> Result<Self> {
        let path = root.join(CONFIG_FILE);
        Ok(ConfigStore::new().load_optional(&path)?.unwrap_or_default())
    }

    pub fn execution_mode(&self) -> ExecutionMode {
        self.reconcile.execution_mode.unwrap_or_default()
    }

    /// The configured reference directory, resolved against `root`.
    pub fn reference_dir(&self, root: &NormalizedPath) -> Option<NormalizedPath> {
        self.reconcile.reference_dir.as_ref().map(|dir| {
            if dir.is_absolute() {
                NormalizedPath::new(dir)
            } else {
                root.join(&dir.to_string_lossy())
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ProjectConfig::load(&NormalizedPath::new(dir.path())).unwrap();
        assert_eq!(config, ProjectConfig::default());
        assert_eq!(config.execution_mode(), ExecutionMode::Advisory);
    }

    #[test]
    fn reads_mode_and_reference_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "[reconcile]\nexecution_mode = \"auto\"\nreference_dir = \"vendor/scaffold\"\n",
        )
        .unwrap();

        let root = NormalizedPath::new(dir.path());
        let config = ProjectConfig::load(&root).unwrap();
        assert_eq!(config.execution_mode(), ExecutionMode::Auto);
        assert_eq!(
            config.reference_dir(&root).unwrap(),
            root.join("vendor/scaffold")
        );
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "[reconcile]\nexecution_mode = \"yolo\"\n").unwrap();
        assert!(ProjectConfig::load(&NormalizedPath::new(dir.path())).is_err());
    }
}
