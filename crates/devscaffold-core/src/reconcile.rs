//! Running a reconciliation pass against a real project
//!
//! The [`Reconciler`] gathers a [`ProjectSnapshot`], plans with the
//! [`Planner`], and carries out the delegated actions one at a time in
//! stage order. Dependency stages are planned only after any manifest
//! bootstrap has run, so manager selection sees the post-bootstrap lock
//! state.

use devscaffold_presets::{
    CommandLine, EnvironmentContext, EnvironmentProber, LockfilePresence, ManifestState, OutputLine,
    ProcessRunner,
};
use serde::Serialize;

use crate::catalog::InstallPolicy;
use crate::error::{Error, Result};
use crate::manager::ManagerKind;
use crate::plan::{PlanAction, ReconciliationPlan};
use crate::planner::{ArtifactObservation, ManifestObservation, Planner, ProjectSnapshot};
use crate::project::ProjectDir;
use crate::reference::ReferenceStore;

/// Options for a reconciliation pass
#[derive(Debug, Clone, Copy, Default)]
pub struct ReconcileOptions {
    /// Plan only; nothing is written and no command is run
    pub dry_run: bool,
}

/// What happened to one planned action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum ActionOutcome {
    /// The project was changed as planned
    Applied,
    /// Shown to the user only
    Displayed,
    Skipped { reason: String },
    /// A delegated command exited with a non-zero status
    Failed { command: String, exit_code: i32 },
    /// The action could not be carried out at all
    Error { message: String },
}

impl ActionOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. } | Self::Error { .. })
    }
}

/// Progress notifications emitted while a pass runs.
#[derive(Debug)]
pub enum ReconcileEvent<'a> {
    Started(&'a PlanAction),
    Output(OutputLine),
    Finished(&'a PlanAction, &'a ActionOutcome),
}

/// Result of one reconciliation pass.
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileReport {
    pub environment: EnvironmentContext,
    /// `None` when the dependency stages did not run
    pub manager: Option<ManagerKind>,
    pub plan: ReconciliationPlan,
    /// One outcome per plan action, in plan order
    pub outcomes: Vec<ActionOutcome>,
    /// Stage-level failures that did not abort the pass
    pub errors: Vec<String>,
}

impl ReconcileReport {
    pub fn entries(&self) -> impl Iterator<Item = (&PlanAction, &ActionOutcome)> {
        self.plan.iter().zip(&self.outcomes)
    }

    /// True when every action went through and no stage failed.
    pub fn is_success(&self) -> bool {
        self.errors.is_empty() && !self.outcomes.iter().any(ActionOutcome::is_failure)
    }
}

/// Drives one reconciliation pass over a project directory.
pub struct Reconciler<'a> {
    project: ProjectDir,
    planner: Planner,
    references: &'a dyn ReferenceStore,
    prober: &'a dyn EnvironmentProber,
    runner: &'a dyn ProcessRunner,
    options: ReconcileOptions,
}

impl<'a> Reconciler<'a> {
    pub fn new(
        project: ProjectDir,
        references: &'a dyn ReferenceStore,
        prober: &'a dyn EnvironmentProber,
        runner: &'a dyn ProcessRunner,
    ) -> Self {
        Self {
            project,
            planner: Planner::default(),
            references,
            prober,
            runner,
            options: ReconcileOptions::default(),
        }
    }

    pub fn with_planner(mut self, planner: Planner) -> Self {
        self.planner = planner;
        self
    }

    pub fn with_options(mut self, options: ReconcileOptions) -> Self {
        self.options = options;
        self
    }

    /// Gather every fact a plan depends on.
    ///
    /// An environment that cannot be probed degrades to a plain host.
    ///
    /// # Errors
    ///
    /// Fails when a reference template exists but cannot be read. An
    /// unreadable target is recorded on its observation instead.
    pub fn snapshot(&self) -> Result<ProjectSnapshot> {
        let environment = self.prober.probe().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Environment probe failed; continuing without environment actions");
            EnvironmentContext::host()
        });

        let mut artifacts = Vec::new();
        for descriptor in self.planner.applicable(&environment) {
            let reference = self
                .references
                .read(descriptor)
                .map_err(|e| Error::ReferenceUnverifiable {
                    reference_id: descriptor.reference_id.clone(),
                    reason: e.to_string(),
                })?;
            let guard_present = match &descriptor.policy {
                InstallPolicy::SeedOnce { guard_dir } => self.project.exists(guard_dir),
                InstallPolicy::Managed => false,
            };
            let (target, target_error) = match self.project.read_bytes(&descriptor.target_path) {
                Ok(target) => (target, None),
                Err(e) => {
                    tracing::warn!(path = %descriptor.target_path, error = %e, "Target unreadable");
                    (None, Some(e.to_string()))
                }
            };
            artifacts.push(ArtifactObservation {
                reference_id: descriptor.reference_id.clone(),
                reference_location: self.references.locate(descriptor),
                reference,
                target,
                target_error,
                guard_present,
            });
        }

        let node = self.project.node();
        Ok(ProjectSnapshot {
            environment,
            artifacts,
            manifest: observe_manifest(node.manifest_state()),
            lockfiles: node.lockfiles(),
        })
    }

    /// Run one pass.
    ///
    /// # Errors
    ///
    /// Fails only when the pass cannot start or a reference template is
    /// broken. Failures of individual actions are recorded in the report.
    pub async fn reconcile(
        &self,
        sink: &mut (dyn FnMut(ReconcileEvent<'_>) + Send),
    ) -> Result<ReconcileReport> {
        let snapshot = self.snapshot()?;

        if self.options.dry_run {
            let plan = self.planner.plan(&snapshot)?;
            let manager = match snapshot.manifest {
                ManifestObservation::Unreadable(_) => None,
                _ => Some(ManagerKind::select(snapshot.lockfiles)),
            };
            let mut report = ReconcileReport {
                environment: snapshot.environment.clone(),
                manager,
                outcomes: plan.iter().map(|a| self.dry_run_outcome(a)).collect(),
                plan,
                errors: Vec::new(),
            };
            if let ManifestObservation::Unreadable(reason) = &snapshot.manifest {
                report.errors.push(reason.clone());
            }
            return Ok(report);
        }

        let mut plan = ReconciliationPlan::new();
        self.planner.plan_artifacts(&snapshot, &mut plan)?;
        self.planner.plan_capabilities(&snapshot.environment, &mut plan);
        self.planner.plan_bootstrap(&snapshot, &mut plan);

        let mut outcomes = Vec::with_capacity(plan.len());
        let mut bootstrapped = false;
        for action in plan.iter() {
            sink(ReconcileEvent::Started(action));
            let outcome = self.execute(action, &snapshot, sink).await;
            if matches!(action, PlanAction::BootstrapManifest { .. }) {
                bootstrapped = true;
            }
            sink(ReconcileEvent::Finished(action, &outcome));
            outcomes.push(outcome);
        }

        let mut errors = Vec::new();
        let node = self.project.node();
        let (manifest, lockfiles) = if bootstrapped {
            (observe_manifest(node.manifest_state()), node.lockfiles())
        } else {
            (snapshot.manifest.clone(), snapshot.lockfiles)
        };

        let mut manager = None;
        match manifest_for_dependencies(manifest, &node.manifest_path()) {
            Ok(manifest) => {
                let start = plan.len();
                manager = Some(self.planner.plan_dependencies(
                    &snapshot.environment,
                    &manifest,
                    lockfiles,
                    &mut plan,
                ));
                for action in &plan.actions()[start..] {
                    sink(ReconcileEvent::Started(action));
                    let outcome = self.execute(action, &snapshot, sink).await;
                    sink(ReconcileEvent::Finished(action, &outcome));
                    outcomes.push(outcome);
                }
            }
            Err(message) => {
                tracing::warn!(%message, "Skipping dependency reconciliation");
                errors.push(message);
            }
        }

        Ok(ReconcileReport {
            environment: snapshot.environment,
            manager,
            plan,
            outcomes,
            errors,
        })
    }

    fn dry_run_outcome(&self, action: &PlanAction) -> ActionOutcome {
        if action.is_mutating() {
            ActionOutcome::Skipped {
                reason: "dry run".to_string(),
            }
        } else {
            ActionOutcome::Displayed
        }
    }

    async fn execute(
        &self,
        action: &PlanAction,
        snapshot: &ProjectSnapshot,
        sink: &mut (dyn FnMut(ReconcileEvent<'_>) + Send),
    ) -> ActionOutcome {
        match action {
            PlanAction::InstallFile {
                reference_id,
                target_path,
                ..
            } => {
                let Some(bytes) = snapshot
                    .observation(reference_id)
                    .and_then(|o| o.reference.as_deref())
                else {
                    return ActionOutcome::Error {
                        message: format!("no reference content for '{reference_id}'"),
                    };
                };
                if let Some(InstallPolicy::SeedOnce { guard_dir }) =
                    self.planner.catalog().get(reference_id).map(|d| &d.policy)
                    && let Err(e) = self.project.ensure_directory(guard_dir)
                {
                    return ActionOutcome::Error {
                        message: e.to_string(),
                    };
                }
                match self.project.write_bytes(target_path, bytes) {
                    Ok(()) => {
                        tracing::info!(artifact = %reference_id, target = %target_path, "Installed");
                        ActionOutcome::Applied
                    }
                    Err(e) => ActionOutcome::Error {
                        message: e.to_string(),
                    },
                }
            }
            PlanAction::BootstrapManifest { commands, rename_to } => {
                if let Some(outcome) = self.run_all(commands, sink).await {
                    return outcome;
                }
                if let Some(name) = rename_to {
                    let node = self.project.node();
                    if node.has_manifest()
                        && let Err(e) = node.rename_manifest(name)
                    {
                        return ActionOutcome::Error {
                            message: e.to_string(),
                        };
                    }
                }
                ActionOutcome::Applied
            }
            PlanAction::RunManagerCommand {
                command, follow_up, ..
            } => {
                let commands: Vec<CommandLine> =
                    std::iter::once(command.clone()).chain(follow_up.clone()).collect();
                self.run_all(&commands, sink)
                    .await
                    .unwrap_or(ActionOutcome::Applied)
            }
            PlanAction::WarnDrift { .. }
            | PlanAction::WarnMissingCapability { .. }
            | PlanAction::QueueUserCommand { .. } => ActionOutcome::Displayed,
        }
    }

    /// Run `commands` in order, stopping at the first failure.
    ///
    /// Returns the failing outcome, or `None` when every command succeeded.
    async fn run_all(
        &self,
        commands: &[CommandLine],
        sink: &mut (dyn FnMut(ReconcileEvent<'_>) + Send),
    ) -> Option<ActionOutcome> {
        for command in commands {
            tracing::info!(command = %command, "Running");
            let mut forward = |line: OutputLine| {
                tracing::debug!(stream = ?line.stream, "{}", line.text);
                sink(ReconcileEvent::Output(line));
            };
            match self.runner.run(command, &mut forward).await {
                Ok(0) => {}
                Ok(exit_code) => {
                    return Some(ActionOutcome::Failed {
                        command: command.to_string(),
                        exit_code,
                    });
                }
                Err(e) => {
                    return Some(ActionOutcome::Error {
                        message: e.to_string(),
                    });
                }
            }
        }
        None
    }
}

fn observe_manifest(state: devscaffold_presets::Result<Option<ManifestState>>) -> ManifestObservation {
    match state {
        Ok(Some(manifest)) => ManifestObservation::Present(manifest),
        Ok(None) => ManifestObservation::Missing,
        Err(e) => ManifestObservation::Unreadable(e.to_string()),
    }
}

/// The manifest the dependency stages work from after bootstrap.
fn manifest_for_dependencies(
    observation: ManifestObservation,
    path: &devscaffold_fs::NormalizedPath,
) -> std::result::Result<ManifestState, String> {
    match observation {
        ManifestObservation::Present(manifest) => Ok(manifest),
        ManifestObservation::Missing => Err(Error::ManifestUnavailable {
            path: path.to_native(),
        }
        .to_string()),
        ManifestObservation::Unreadable(reason) => Err(reason),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_serializes_with_tag() {
        let value = serde_json::to_value(ActionOutcome::Failed {
            command: "yarn add --dev nightwatch".into(),
            exit_code: 1,
        })
        .unwrap();
        assert_eq!(value["outcome"], "failed");
        assert_eq!(value["exit_code"], 1);
    }

    #[test]
    fn failures_are_detected() {
        assert!(ActionOutcome::Error { message: "x".into() }.is_failure());
        assert!(!ActionOutcome::Displayed.is_failure());
        assert!(!ActionOutcome::Skipped { reason: "dry run".into() }.is_failure());
    }
}
