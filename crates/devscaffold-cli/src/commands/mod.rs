//! Command implementations for devscaffold-cli

pub mod catalog;
pub mod check;
pub mod reconcile;
pub mod render;

pub use catalog::run_catalog;
pub use check::run_check;
pub use reconcile::run_reconcile;

use std::path::Path;

use devscaffold_core::{
    BundledReferences, DirectoryReferences, ExecutionMode, Planner, ProjectConfig, ProjectDir,
    ReconcileEvent, ReconcileOptions, ReconcileReport, Reconciler, ReferenceStore,
};
use devscaffold_fs::NormalizedPath;
use devscaffold_presets::{DdevProber, SystemRunner};

use crate::error::{CliError, Result};

/// A project opened for one command: its root, configuration and reference store.
pub struct Session {
    pub root: NormalizedPath,
    pub config: ProjectConfig,
    references: Box<dyn ReferenceStore>,
}

impl Session {
    /// Open the project at `project`.
    ///
    /// `reference_dir` overrides the configured reference directory; the
    /// bundled templates are used when neither is set.
    pub fn open(project: &Path, reference_dir: Option<&Path>) -> Result<Self> {
        if !project.is_dir() {
            return Err(CliError::user(format!(
                "Project directory not found: {}",
                project.display()
            )));
        }
        let root = NormalizedPath::new(project);
        let config = ProjectConfig::load(&root)?;

        let reference_dir = reference_dir
            .map(NormalizedPath::new)
            .or_else(|| config.reference_dir(&root));
        let references: Box<dyn ReferenceStore> = match reference_dir {
            Some(dir) if !dir.is_dir() => {
                return Err(CliError::user(format!("Reference directory not found: {dir}")));
            }
            Some(dir) => {
                tracing::debug!(dir = %dir, "Using reference directory");
                Box::new(DirectoryReferences::new(dir))
            }
            None => Box::new(BundledReferences::new()),
        };

        Ok(Self {
            root,
            config,
            references,
        })
    }

    /// Command-line mode, falling back to the configured one.
    pub fn mode(&self, flag: Option<ExecutionMode>) -> ExecutionMode {
        flag.unwrap_or_else(|| self.config.execution_mode())
    }

    /// Run one pass with real subprocesses and the DDEV prober.
    pub fn reconcile(
        &self,
        mode: ExecutionMode,
        dry_run: bool,
        sink: &mut (dyn FnMut(ReconcileEvent<'_>) + Send),
    ) -> Result<ReconcileReport> {
        let prober = DdevProber::from_env(self.root.clone());
        let runner = SystemRunner::new(self.root.clone());
        let reconciler = Reconciler::new(
            ProjectDir::new(self.root.clone()),
            &*self.references,
            &prober,
            &runner,
        )
        .with_planner(Planner::default().with_mode(mode))
        .with_options(ReconcileOptions { dry_run });

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(runtime.block_on(reconciler.reconcile(sink))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_project_is_a_user_error() {
        let temp = TempDir::new().unwrap();
        let result = Session::open(&temp.path().join("nope"), None);
        assert!(matches!(result, Err(CliError::User { .. })));
    }

    #[test]
    fn missing_reference_dir_is_a_user_error() {
        let temp = TempDir::new().unwrap();
        let result = Session::open(temp.path(), Some(&temp.path().join("scaffold")));
        assert!(matches!(result, Err(CliError::User { .. })));
    }

    #[test]
    fn flag_overrides_configured_mode() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(".devscaffold.toml"),
            "[reconcile]\nexecution_mode = \"auto\"\n",
        )
        .unwrap();
        let session = Session::open(temp.path(), None).unwrap();
        assert_eq!(session.mode(None), ExecutionMode::Auto);
        assert_eq!(session.mode(Some(ExecutionMode::Advisory)), ExecutionMode::Advisory);
    }
}
