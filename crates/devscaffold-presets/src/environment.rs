//! Local development environment detection
//!
//! The only containerized environment recognised today is DDEV, detected by
//! its `.ddev/config.yaml` marker. Everything else is treated as a plain host.

use devscaffold_fs::{DocumentFormat, NormalizedPath, io};
use serde::Serialize;
use serde_json::Value;

use crate::error::Result;

/// Marker file whose presence means DDEV manages this project.
pub const DDEV_CONFIG: &str = ".ddev/config.yaml";

/// Environment variable DDEV sets to the project name inside its containers.
pub const DDEV_PROJECT_VAR: &str = "DDEV_PROJECT";

/// Which local development environment is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentKind {
    /// No managed environment; commands run directly on the host
    Host,
    Ddev,
}

impl std::fmt::Display for EnvironmentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Host => write!(f, "host"),
            Self::Ddev => write!(f, "ddev"),
        }
    }
}

/// Immutable per-pass facts about the active environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvironmentContext {
    pub kind: EnvironmentKind,
    /// Project identifier used when naming a freshly created manifest
    pub project_identifier: Option<String>,
    /// Entries of the environment's own `web_environment` list.
    ///
    /// `None` when the environment config could not be read as a mapping,
    /// in which case capability checks are skipped.
    pub web_environment: Option<Vec<String>>,
}

impl EnvironmentContext {
    /// A plain host with nothing environment-specific.
    pub fn host() -> Self {
        Self {
            kind: EnvironmentKind::Host,
            project_identifier: None,
            web_environment: None,
        }
    }

    pub fn ddev(project_identifier: Option<String>, web_environment: Option<Vec<String>>) -> Self {
        Self {
            kind: EnvironmentKind::Ddev,
            project_identifier,
            web_environment,
        }
    }

    pub fn is(&self, kind: EnvironmentKind) -> bool {
        self.kind == kind
    }

    /// Whether `entry` is present in the environment's web environment.
    ///
    /// Returns `None` when the environment's configuration is unknown.
    pub fn has_web_environment(&self, entry: &str) -> Option<bool> {
        self.web_environment
            .as_ref()
            .map(|entries| entries.iter().any(|e| e == entry))
    }
}

impl Default for EnvironmentContext {
    fn default() -> Self {
        Self::host()
    }
}

/// Source of the per-pass [`EnvironmentContext`].
pub trait EnvironmentProber {
    /// Inspect the environment.
    ///
    /// # Errors
    ///
    /// Returns an error when environment facts cannot be gathered at all.
    /// Callers degrade to [`EnvironmentContext::host`] in that case.
    fn probe(&self) -> Result<EnvironmentContext>;
}

/// Detects DDEV through its marker file and reads its `config.yaml`.
#[derive(Debug, Clone)]
pub struct DdevProber {
    root: NormalizedPath,
    project_var: Option<String>,
}

impl DdevProber {
    pub fn new(root: NormalizedPath, project_var: Option<String>) -> Self {
        Self { root, project_var }
    }

    /// Create a prober that reads `DDEV_PROJECT` from the process environment.
    pub fn from_env(root: NormalizedPath) -> Self {
        let project_var = std::env::var(DDEV_PROJECT_VAR)
            .ok()
            .filter(|v| !v.trim().is_empty());
        Self::new(root, project_var)
    }

    fn config_path(&self) -> NormalizedPath {
        self.root.join(DDEV_CONFIG)
    }
}

impl EnvironmentProber for DdevProber {
    fn probe(&self) -> Result<EnvironmentContext> {
        let config_path = self.config_path();
        let Some(bytes) = io::read_bytes(&config_path)? else {
            return Ok(EnvironmentContext::host());
        };

        let config = match DocumentFormat::Yaml.parse(&bytes) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(path = %config_path, error = %e, "Unreadable DDEV config; skipping capability checks");
                return Ok(EnvironmentContext::ddev(self.project_var.clone(), None));
            }
        };

        let project_identifier = self.project_var.clone().or_else(|| {
            config
                .get("name")
                .and_then(Value::as_str)
                .map(str::to_string)
        });

        Ok(EnvironmentContext::ddev(
            project_identifier,
            Some(web_environment_entries(&config)),
        ))
    }
}

/// Extract `web_environment` entries from a parsed DDEV config.
///
/// Anything other than a list, including an empty config, means no
/// entries. Non-string items never match an entry and are dropped.
fn web_environment_entries(config: &Value) -> Vec<String> {
    match config.get("web_environment") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}
