//! The catalog of managed scaffold artifacts

use std::collections::HashSet;

use devscaffold_fs::{DocumentFormat, KeyPath, NormalizedPath};
use devscaffold_presets::EnvironmentKind;
use serde::Serialize;

use crate::error::{Error, Result};

/// How an installed artifact is compared against its reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComparisonStrategy {
    /// Byte-for-byte comparison through a content digest
    ExactContentHash,
    /// Only the values at the declared key-paths must match
    StructuredKeySubset {
        format: DocumentFormat,
        key_paths: Vec<KeyPath>,
    },
}

impl ComparisonStrategy {
    pub fn structured(format: DocumentFormat, key_paths: &[&str]) -> Self {
        Self::StructuredKeySubset {
            format,
            key_paths: key_paths.iter().map(|p| KeyPath::parse(p)).collect(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::ExactContentHash => "exact-content-hash",
            Self::StructuredKeySubset { .. } => "structured-key-subset",
        }
    }
}

impl Serialize for ComparisonStrategy {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        match self {
            Self::ExactContentHash => {
                let mut s = serializer.serialize_struct("ComparisonStrategy", 1)?;
                s.serialize_field("kind", self.label())?;
                s.end()
            }
            Self::StructuredKeySubset { format, key_paths } => {
                let mut s = serializer.serialize_struct("ComparisonStrategy", 3)?;
                s.serialize_field("kind", self.label())?;
                s.serialize_field("format", format)?;
                let paths: Vec<String> = key_paths.iter().map(ToString::to_string).collect();
                s.serialize_field("key_paths", &paths)?;
                s.end()
            }
        }
    }
}

/// When an artifact is installed and whether it is watched for drift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum InstallPolicy {
    /// Installed when absent and checked for drift on every pass
    Managed,
    /// Installed once while `guard_dir` does not exist, then left to the project
    SeedOnce { guard_dir: NormalizedPath },
}

/// Identity of one managed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactDescriptor {
    pub reference_id: String,
    /// File name of the template inside the reference store
    pub reference_file: String,
    /// Path relative to the project root
    pub target_path: NormalizedPath,
    pub strategy: ComparisonStrategy,
    pub policy: InstallPolicy,
    /// Only applies while this environment is active
    pub requires_environment: Option<EnvironmentKind>,
}

impl ArtifactDescriptor {
    pub fn new(
        reference_id: impl Into<String>,
        reference_file: impl Into<String>,
        target_path: impl Into<NormalizedPath>,
        strategy: ComparisonStrategy,
    ) -> Self {
        Self {
            reference_id: reference_id.into(),
            reference_file: reference_file.into(),
            target_path: target_path.into(),
            strategy,
            policy: InstallPolicy::Managed,
            requires_environment: None,
        }
    }

    pub fn seed_once(mut self, guard_dir: impl Into<NormalizedPath>) -> Self {
        self.policy = InstallPolicy::SeedOnce {
            guard_dir: guard_dir.into(),
        };
        self
    }

    pub fn requires(mut self, environment: EnvironmentKind) -> Self {
        self.requires_environment = Some(environment);
        self
    }

    /// Whether this artifact participates in a pass under `environment`.
    pub fn applies_to(&self, environment: EnvironmentKind) -> bool {
        self.requires_environment.is_none_or(|required| required == environment)
    }
}

/// An ordered, validated list of artifact descriptors.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct Catalog {
    artifacts: Vec<ArtifactDescriptor>,
}

impl Catalog {
    /// Build a catalog, enforcing unique reference ids and contained target paths.
    pub fn new(artifacts: Vec<ArtifactDescriptor>) -> Result<Self> {
        let mut seen = HashSet::new();
        for artifact in &artifacts {
            if !seen.insert(artifact.reference_id.as_str()) {
                return Err(Error::DuplicateReference {
                    reference_id: artifact.reference_id.clone(),
                });
            }
            if !artifact.target_path.is_contained_relative() {
                return Err(Error::InvalidTargetPath {
                    reference_id: artifact.reference_id.clone(),
                    path: artifact.target_path.to_string(),
                });
            }
            if let ComparisonStrategy::StructuredKeySubset { key_paths, .. } = &artifact.strategy
                && key_paths.iter().any(|p| p.segments().is_empty())
            {
                return Err(Error::Config {
                    message: format!("'{}' declares an empty key-path", artifact.reference_id),
                });
            }
        }
        Ok(Self { artifacts })
    }

    /// The drainpipe-dev test-tooling scaffold.
    pub fn bundled() -> Self {
        Self {
            artifacts: vec![
                ArtifactDescriptor::new(
                    "taskfile",
                    "Taskfile.dev.yml",
                    "Taskfile.dev.yml",
                    ComparisonStrategy::structured(DocumentFormat::Yaml, &["includes.*"]),
                ),
                ArtifactDescriptor::new(
                    "selenium-compose",
                    "docker-compose.selenium.yaml",
                    ".ddev/docker-compose.selenium.yaml",
                    ComparisonStrategy::ExactContentHash,
                )
                .requires(EnvironmentKind::Ddev),
                ArtifactDescriptor::new(
                    "nightwatch-config",
                    "nightwatch.conf.js",
                    "nightwatch.conf.js",
                    ComparisonStrategy::ExactContentHash,
                ),
                ArtifactDescriptor::new(
                    "nightwatch-example",
                    "example.nightwatch.js",
                    "test/nightwatch/example.nightwatch.js",
                    ComparisonStrategy::ExactContentHash,
                )
                .seed_once("test/nightwatch"),
            ],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ArtifactDescriptor> {
        self.artifacts.iter()
    }

    pub fn get(&self, reference_id: &str) -> Option<&ArtifactDescriptor> {
        self.artifacts.iter().find(|a| a.reference_id == reference_id)
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::bundled()
    }
}
