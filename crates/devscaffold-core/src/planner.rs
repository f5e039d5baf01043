//! The reconciliation planner
//!
//! Turns a [`ProjectSnapshot`] into a [`ReconciliationPlan`]. Planning is
//! pure: every fact about the project is in the snapshot, and the stages
//! run in a fixed order.
//!
//! 1. Catalog pass: install absent artifacts, warn about drifted ones
//! 2. Environment capability check
//! 3. Manifest bootstrap
//! 4. Manager selection
//! 5. Gap analysis
//! 6. Remediation

use devscaffold_presets::{
    CommandLine, EnvironmentContext, EnvironmentKind, LockfilePresence, ManifestState,
};

use crate::catalog::{ArtifactDescriptor, Catalog, InstallPolicy};
use crate::dependencies::{self, DependencySpec};
use crate::drift::{self, InstallState, Side};
use crate::error::{Error, Result};
use crate::manager::ManagerKind;
use crate::plan::{ExecutionMode, PlanAction, ReconciliationPlan};

/// Web-environment entry Nightwatch needs to reach the site from the test container.
pub const NIGHTWATCH_WEB_ENVIRONMENT: &str = "NIGHTWATCH_DRUPAL_URL=http://web";

/// What was read for one catalog artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactObservation {
    pub reference_id: String,
    /// Human-readable location of the reference, shown next to drift warnings
    pub reference_location: String,
    /// `None` when the reference store has no such template
    pub reference: Option<Vec<u8>>,
    /// `None` when the target file does not exist
    pub target: Option<Vec<u8>>,
    /// Set when the target path exists but cannot be read
    pub target_error: Option<String>,
    /// Whether a seed-once artifact's guard directory exists
    pub guard_present: bool,
}

/// What is known about the project's dependency manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestObservation {
    Missing,
    Present(ManifestState),
    /// The manifest exists but cannot be read
    Unreadable(String),
}

/// All facts one planning pass depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSnapshot {
    pub environment: EnvironmentContext,
    pub artifacts: Vec<ArtifactObservation>,
    pub manifest: ManifestObservation,
    pub lockfiles: LockfilePresence,
}

impl ProjectSnapshot {
    pub fn observation(&self, reference_id: &str) -> Option<&ArtifactObservation> {
        self.artifacts.iter().find(|o| o.reference_id == reference_id)
    }
}

/// Plans reconciliation passes for one catalog and dependency set.
#[derive(Debug, Clone)]
pub struct Planner {
    catalog: Catalog,
    required: Vec<DependencySpec>,
    mode: ExecutionMode,
}

impl Default for Planner {
    fn default() -> Self {
        Self::new(Catalog::bundled(), dependencies::nightwatch_toolchain())
    }
}

impl Planner {
    pub fn new(catalog: Catalog, required: Vec<DependencySpec>) -> Self {
        Self {
            catalog,
            required,
            mode: ExecutionMode::default(),
        }
    }

    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn required(&self) -> &[DependencySpec] {
        &self.required
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    /// Catalog entries that take part in a pass under `environment`.
    pub fn applicable<'a>(
        &'a self,
        environment: &'a EnvironmentContext,
    ) -> impl Iterator<Item = &'a ArtifactDescriptor> + 'a {
        self.catalog.iter().filter(|d| d.applies_to(environment.kind))
    }

    /// Plan a full pass.
    ///
    /// A missing manifest is assumed to have been bootstrapped empty when
    /// the dependency stages run; lock state is taken from the snapshot.
    ///
    /// # Errors
    ///
    /// Fails only when a reference template is missing or unusable, in
    /// which case no later stage runs.
    pub fn plan(&self, snapshot: &ProjectSnapshot) -> Result<ReconciliationPlan> {
        let mut plan = ReconciliationPlan::new();
        self.plan_artifacts(snapshot, &mut plan)?;
        self.plan_capabilities(&snapshot.environment, &mut plan);
        self.plan_bootstrap(snapshot, &mut plan);

        match &snapshot.manifest {
            ManifestObservation::Present(manifest) => {
                self.plan_dependencies(&snapshot.environment, manifest, snapshot.lockfiles, &mut plan);
            }
            ManifestObservation::Missing => {
                self.plan_dependencies(
                    &snapshot.environment,
                    &ManifestState::default(),
                    snapshot.lockfiles,
                    &mut plan,
                );
            }
            ManifestObservation::Unreadable(reason) => {
                tracing::warn!(%reason, "Manifest unreadable; skipping dependency reconciliation");
            }
        }
        Ok(plan)
    }

    /// Stage 1: compare every applicable artifact against its reference.
    pub fn plan_artifacts(&self, snapshot: &ProjectSnapshot, plan: &mut ReconciliationPlan) -> Result<()> {
        for descriptor in self.applicable(&snapshot.environment) {
            let observation =
                snapshot
                    .observation(&descriptor.reference_id)
                    .ok_or_else(|| Error::MissingObservation {
                        reference_id: descriptor.reference_id.clone(),
                    })?;

            if observation.reference.is_none() {
                return Err(Error::ReferenceNotFound {
                    reference_id: descriptor.reference_id.clone(),
                    location: observation.reference_location.clone(),
                });
            }

            if let InstallPolicy::SeedOnce { guard_dir } = &descriptor.policy {
                if observation.guard_present
                    || observation.target.is_some()
                    || observation.target_error.is_some()
                {
                    tracing::debug!(
                        artifact = %descriptor.reference_id,
                        guard = %guard_dir,
                        "Seed-once artifact already seeded"
                    );
                } else {
                    plan.push(install(descriptor, observation));
                }
                continue;
            }

            if let Some(reason) = &observation.target_error {
                plan.push(PlanAction::WarnDrift {
                    reference_id: descriptor.reference_id.clone(),
                    reference_location: observation.reference_location.clone(),
                    target_path: descriptor.target_path.clone(),
                    mismatches: Vec::new(),
                    reason: Some(reason.clone()),
                });
                continue;
            }

            let assessment = drift::assess(
                descriptor,
                observation.reference.as_deref(),
                observation.target.as_deref(),
            );
            match assessment.state {
                InstallState::Absent => plan.push(install(descriptor, observation)),
                InstallState::Identical => {}
                InstallState::Drifted => plan.push(PlanAction::WarnDrift {
                    reference_id: descriptor.reference_id.clone(),
                    reference_location: observation.reference_location.clone(),
                    target_path: descriptor.target_path.clone(),
                    mismatches: assessment.mismatches,
                    reason: None,
                }),
                InstallState::Unverifiable {
                    side: Side::Reference,
                    reason,
                } => {
                    return Err(Error::ReferenceUnverifiable {
                        reference_id: descriptor.reference_id.clone(),
                        reason,
                    });
                }
                InstallState::Unverifiable {
                    side: Side::Target,
                    reason,
                } => plan.push(PlanAction::WarnDrift {
                    reference_id: descriptor.reference_id.clone(),
                    reference_location: observation.reference_location.clone(),
                    target_path: descriptor.target_path.clone(),
                    mismatches: Vec::new(),
                    reason: Some(reason),
                }),
            }
        }
        Ok(())
    }

    /// Stage 2: capabilities the environment's own configuration must provide.
    ///
    /// The environment config is never edited; a gap is always surfaced
    /// with the commands that would close it.
    pub fn plan_capabilities(&self, environment: &EnvironmentContext, plan: &mut ReconciliationPlan) {
        if !environment.is(EnvironmentKind::Ddev) {
            return;
        }
        match environment.has_web_environment(NIGHTWATCH_WEB_ENVIRONMENT) {
            Some(true) => {}
            Some(false) => plan.push(PlanAction::WarnMissingCapability {
                message: format!(
                    "DDEV web environment does not set {NIGHTWATCH_WEB_ENVIRONMENT}; Nightwatch cannot reach the site"
                ),
                remediation: vec![
                    CommandLine::new("ddev")
                        .arg("config")
                        .arg(format!("--web-environment={NIGHTWATCH_WEB_ENVIRONMENT}")),
                    CommandLine::new("ddev").arg("restart"),
                ],
                missing_dependencies: Vec::new(),
            }),
            None => tracing::debug!("DDEV configuration unknown; skipping capability check"),
        }
    }

    /// Stage 3: create a manifest when the project has none.
    pub fn plan_bootstrap(&self, snapshot: &ProjectSnapshot, plan: &mut ReconciliationPlan) {
        if !matches!(snapshot.manifest, ManifestObservation::Missing) {
            return;
        }
        plan.push(PlanAction::BootstrapManifest {
            commands: bootstrap_commands(),
            rename_to: snapshot.environment.project_identifier.clone(),
        });
    }

    /// Stages 4 to 6: select the manager, find missing dependencies, and
    /// emit the remediation.
    ///
    /// Returns the selected manager.
    pub fn plan_dependencies(
        &self,
        environment: &EnvironmentContext,
        manifest: &ManifestState,
        lockfiles: LockfilePresence,
        plan: &mut ReconciliationPlan,
    ) -> ManagerKind {
        let manager = ManagerKind::select(lockfiles);
        let gap = dependencies::missing(&self.required, &manifest.declared_dev_dependency_names);
        tracing::debug!(%manager, missing = gap.len(), "Dependency gap analysed");
        if gap.is_empty() {
            return manager;
        }

        let tokens = dependencies::resolution_tokens(&gap);
        let Some(command) = manager.install_command(&tokens) else {
            let names: Vec<String> = gap.into_iter().map(|dep| dep.name).collect();
            plan.push(PlanAction::WarnMissingCapability {
                message: format!(
                    "No yarn.lock or package-lock.json found; install these dev dependencies manually: {}",
                    names.join(", ")
                ),
                remediation: Vec::new(),
                missing_dependencies: names,
            });
            return manager;
        };

        let follow_up = if environment.is(EnvironmentKind::Ddev) {
            manager.container_follow_up()
        } else {
            None
        };
        plan.push(match self.mode {
            ExecutionMode::Auto => PlanAction::RunManagerCommand {
                manager,
                command,
                follow_up,
            },
            ExecutionMode::Advisory => PlanAction::QueueUserCommand {
                manager,
                command,
                follow_up,
            },
        });
        manager
    }
}

/// Commands that create a minimal manifest.
pub fn bootstrap_commands() -> Vec<CommandLine> {
    vec![
        CommandLine::new("yarn").args(["set", "version", "berry"]),
        CommandLine::new("yarn").args(["init", "-p"]),
    ]
}

fn install(descriptor: &ArtifactDescriptor, observation: &ArtifactObservation) -> PlanAction {
    PlanAction::InstallFile {
        reference_id: descriptor.reference_id.clone(),
        reference_location: observation.reference_location.clone(),
        target_path: descriptor.target_path.clone(),
    }
}
