//! The target project directory

use devscaffold_fs::{NormalizedPath, io};
use devscaffold_presets::NodeProject;

use crate::error::Result;

/// Filesystem access scoped to one project root.
///
/// All paths passed in are relative to the root.
#[derive(Debug, Clone)]
pub struct ProjectDir {
    root: NormalizedPath,
}

impl ProjectDir {
    pub fn new(root: impl Into<NormalizedPath>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &NormalizedPath {
        &self.root
    }

    pub fn resolve(&self, relative: &NormalizedPath) -> NormalizedPath {
        self.root.join(relative.as_str())
    }

    pub fn exists(&self, relative: &NormalizedPath) -> bool {
        self.resolve(relative).exists()
    }

    /// Read a file, `None` when it does not exist.
    pub fn read_bytes(&self, relative: &NormalizedPath) -> Result<Option<Vec<u8>>> {
        Ok(io::read_bytes(&self.resolve(relative))?)
    }

    /// Write a file atomically, creating parent directories.
    pub fn write_bytes(&self, relative: &NormalizedPath, content: &[u8]) -> Result<()> {
        Ok(io::write_atomic(&self.resolve(relative), content)?)
    }

    /// Create a directory and its parents; an existing one is left alone.
    pub fn ensure_directory(&self, relative: &NormalizedPath) -> Result<()> {
        Ok(io::ensure_dir(&self.resolve(relative))?)
    }

    /// The Node manifest and lockfiles of this project.
    pub fn node(&self) -> NodeProject {
        NodeProject::new(self.root.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_nested_target() {
        let dir = tempfile::tempdir().unwrap();
        let project = ProjectDir::new(dir.path());
        let target = NormalizedPath::new(".ddev/docker-compose.selenium.yaml");

        assert!(!project.exists(&target));
        assert!(project.read_bytes(&target).unwrap().is_none());

        project.write_bytes(&target, b"services: {}\n").unwrap();
        assert!(project.exists(&target));
        assert_eq!(project.read_bytes(&target).unwrap().unwrap(), b"services: {}\n");
    }

    #[test]
    fn ensure_directory_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let project = ProjectDir::new(dir.path());
        let guard = NormalizedPath::new("test/nightwatch");

        project.ensure_directory(&guard).unwrap();
        project.ensure_directory(&guard).unwrap();
        assert!(dir.path().join("test/nightwatch").is_dir());
    }
}
