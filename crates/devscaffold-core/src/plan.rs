//! Reconciliation plans and their actions

use devscaffold_fs::NormalizedPath;
use devscaffold_presets::CommandLine;
use serde::{Deserialize, Serialize};

use crate::manager::ManagerKind;
use crate::structured::KeyPathMismatch;

/// Whether dependency installs are run or handed to the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Run the install command directly
    Auto,
    /// Print the install command for the user to run
    #[default]
    Advisory,
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Advisory => write!(f, "advisory"),
        }
    }
}

impl std::str::FromStr for ExecutionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "advisory" => Ok(Self::Advisory),
            other => Err(format!("unknown execution mode '{other}' (expected 'auto' or 'advisory')")),
        }
    }
}

/// One step of a reconciliation pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum PlanAction {
    /// Copy the reference template to its target path
    InstallFile {
        reference_id: String,
        reference_location: String,
        target_path: NormalizedPath,
    },
    /// The installed copy differs from its reference and needs human review
    WarnDrift {
        reference_id: String,
        reference_location: String,
        target_path: NormalizedPath,
        mismatches: Vec<KeyPathMismatch>,
        /// Set when the installed copy could not be read or parsed
        reason: Option<String>,
    },
    /// Something the engine will not fix on its own
    WarnMissingCapability {
        message: String,
        remediation: Vec<CommandLine>,
        missing_dependencies: Vec<String>,
    },
    /// Create a minimal dependency manifest
    BootstrapManifest {
        commands: Vec<CommandLine>,
        /// Structured rewrite of the manifest's `name` once it exists
        rename_to: Option<String>,
    },
    /// Install missing dependencies now
    RunManagerCommand {
        manager: ManagerKind,
        command: CommandLine,
        follow_up: Option<CommandLine>,
    },
    /// Leave the dependency install to the user
    QueueUserCommand {
        manager: ManagerKind,
        command: CommandLine,
        follow_up: Option<CommandLine>,
    },
}

impl PlanAction {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InstallFile { .. } => "install-file",
            Self::WarnDrift { .. } => "warn-drift",
            Self::WarnMissingCapability { .. } => "warn-missing-capability",
            Self::BootstrapManifest { .. } => "bootstrap-manifest",
            Self::RunManagerCommand { .. } => "run-manager-command",
            Self::QueueUserCommand { .. } => "queue-user-command",
        }
    }

    /// Whether carrying out this action changes the project.
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            Self::InstallFile { .. } | Self::BootstrapManifest { .. } | Self::RunManagerCommand { .. }
        )
    }
}

/// Ordered output of one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ReconciliationPlan {
    actions: Vec<PlanAction>,
}

impl ReconciliationPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, action: PlanAction) {
        tracing::debug!(kind = action.kind(), "Planned action");
        self.actions.push(action);
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlanAction> {
        self.actions.iter()
    }

    pub fn actions(&self) -> &[PlanAction] {
        &self.actions
    }

    /// True when any installed artifact needs human review.
    pub fn has_drift(&self) -> bool {
        self.actions.iter().any(|a| matches!(a, PlanAction::WarnDrift { .. }))
    }

    /// Every command the user is asked to run, in plan order.
    pub fn user_commands(&self) -> Vec<&CommandLine> {
        let mut commands = Vec::new();
        for action in &self.actions {
            match action {
                PlanAction::WarnMissingCapability { remediation, .. } => commands.extend(remediation),
                PlanAction::QueueUserCommand { command, follow_up, .. } => {
                    commands.push(command);
                    commands.extend(follow_up);
                }
                _ => {}
            }
        }
        commands
    }
}

impl<'a> IntoIterator for &'a ReconciliationPlan {
    type Item = &'a PlanAction;
    type IntoIter = std::slice::Iter<'a, PlanAction>;

    fn into_iter(self) -> Self::IntoIter {
        self.actions.iter()
    }
}
