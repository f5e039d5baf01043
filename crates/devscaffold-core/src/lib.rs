//! Scaffold reconciliation engine
//!
//! Brings a project's development-tooling scaffold into a consistent state
//! against a set of reference templates:
//!
//! - **Catalog**: the managed artifacts and how each is compared
//! - **Drift detection**: exact content digests, or a declared subset of
//!   keys for structured config
//! - **Dependency gap analysis** and **manager selection** for the test
//!   toolchain
//! - **Planner**: turns a snapshot of the project into an ordered plan
//! - **Reconciler**: gathers the snapshot and carries the plan out
//!
//! # Architecture
//!
//! ```text
//!               devscaffold-cli
//!                      |
//!              devscaffold-core
//!                      |
//!        +-------------+--------------+
//!        |                            |
//!  devscaffold-fs            devscaffold-presets
//! ```
//!
//! # Example
//!
//! ```ignore
//! use devscaffold_core::{Planner, ExecutionMode};
//!
//! let planner = Planner::default().with_mode(ExecutionMode::Advisory);
//! let plan = planner.plan(&snapshot)?;
//! for command in plan.user_commands() {
//!     println!("{command}");
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod dependencies;
pub mod drift;
pub mod error;
pub mod manager;
pub mod plan;
pub mod planner;
pub mod project;
pub mod reconcile;
pub mod reference;
pub mod structured;

pub use catalog::{ArtifactDescriptor, Catalog, ComparisonStrategy, InstallPolicy};
pub use config::{CONFIG_FILE, ProjectConfig};
pub use dependencies::{DependencySpec, nightwatch_toolchain};
pub use drift::{ArtifactAssessment, InstallState, Side};
pub use error::{Error, Result};
pub use manager::ManagerKind;
pub use plan::{ExecutionMode, PlanAction, ReconciliationPlan};
pub use planner::{ArtifactObservation, ManifestObservation, Planner, ProjectSnapshot};
pub use project::ProjectDir;
pub use reconcile::{ActionOutcome, ReconcileEvent, ReconcileOptions, ReconcileReport, Reconciler};
pub use reference::{BundledReferences, DirectoryReferences, ReferenceStore};
pub use structured::KeyPathMismatch;
