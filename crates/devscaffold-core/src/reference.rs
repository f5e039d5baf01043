//! Reference template stores

use devscaffold_fs::{NormalizedPath, io};

use crate::catalog::ArtifactDescriptor;
use crate::error::Result;

/// Read-only source of reference templates.
pub trait ReferenceStore: Send + Sync {
    /// Read the template for `descriptor`.
    ///
    /// Returns `Ok(None)` when the store has no such template.
    ///
    /// # Errors
    ///
    /// Returns an error when the template exists but cannot be read.
    fn read(&self, descriptor: &ArtifactDescriptor) -> Result<Option<Vec<u8>>>;

    /// Where the template lives, for display next to drift warnings.
    fn locate(&self, descriptor: &ArtifactDescriptor) -> String;
}

const BUNDLED: &[(&str, &[u8])] = &[
    ("Taskfile.dev.yml", include_bytes!("../scaffold/Taskfile.dev.yml")),
    (
        "docker-compose.selenium.yaml",
        include_bytes!("../scaffold/docker-compose.selenium.yaml"),
    ),
    ("nightwatch.conf.js", include_bytes!("../scaffold/nightwatch.conf.js")),
    ("example.nightwatch.js", include_bytes!("../scaffold/example.nightwatch.js")),
];

/// Templates compiled into the binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledReferences;

impl BundledReferences {
    pub fn new() -> Self {
        Self
    }

    pub fn get(&self, reference_file: &str) -> Option<&'static [u8]> {
        BUNDLED
            .iter()
            .find(|(name, _)| *name == reference_file)
            .map(|(_, bytes)| *bytes)
    }
}

impl ReferenceStore for BundledReferences {
    fn read(&self, descriptor: &ArtifactDescriptor) -> Result<Option<Vec<u8>>> {
        Ok(self.get(&descriptor.reference_file).map(<[u8]>::to_vec))
    }

    fn locate(&self, descriptor: &ArtifactDescriptor) -> String {
        format!("bundled:{}", descriptor.reference_file)
    }
}

/// Templates read from a scaffold directory on disk.
#[derive(Debug, Clone)]
pub struct DirectoryReferences {
    dir: NormalizedPath,
}

impl DirectoryReferences {
    pub fn new(dir: NormalizedPath) -> Self {
        Self { dir }
    }

    fn path_of(&self, descriptor: &ArtifactDescriptor) -> NormalizedPath {
        self.dir.join(&descriptor.reference_file)
    }
}

impl ReferenceStore for DirectoryReferences {
    fn read(&self, descriptor: &ArtifactDescriptor) -> Result<Option<Vec<u8>>> {
        Ok(io::read_bytes(&self.path_of(descriptor))?)
    }

    fn locate(&self, descriptor: &ArtifactDescriptor) -> String {
        self.path_of(descriptor).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    #[test]
    fn every_bundled_artifact_has_a_template() {
        let store = BundledReferences::new();
        for descriptor in Catalog::bundled().iter() {
            let bytes = store.read(descriptor).unwrap();
            assert!(
                bytes.is_some_and(|b| !b.is_empty()),
                "no bundled template for {}",
                descriptor.reference_id
            );
        }
    }

    #[test]
    fn bundled_taskfile_parses() {
        let bytes = BundledReferences::new().get("Taskfile.dev.yml").unwrap();
        let tree = devscaffold_fs::DocumentFormat::Yaml.parse(bytes).unwrap();
        assert!(tree["includes"].is_object());
    }

    #[test]
    fn directory_store_reports_missing_template() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryReferences::new(NormalizedPath::new(dir.path()));
        let catalog = Catalog::bundled();
        let descriptor = catalog.get("taskfile").unwrap();

        assert!(store.read(descriptor).unwrap().is_none());
        std::fs::write(dir.path().join("Taskfile.dev.yml"), "includes: {}\n").unwrap();
        assert_eq!(store.read(descriptor).unwrap().unwrap(), b"includes: {}\n");
        assert!(store.locate(descriptor).ends_with("/Taskfile.dev.yml"));
    }
}
