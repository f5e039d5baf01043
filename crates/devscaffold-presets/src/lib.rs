//! Environment and toolchain probes for devscaffold.
//!
//! This crate answers the questions the reconciliation planner needs about
//! the world outside the scaffold: which local development environment is
//! active, what the Node manifest declares, which lockfiles exist, and how
//! to run a package-manager command while streaming its output.

pub mod environment;
pub mod error;
pub mod node;
pub mod process;

pub use environment::{DdevProber, EnvironmentContext, EnvironmentKind, EnvironmentProber};
pub use error::{Error, Result};
pub use node::{LockfilePresence, ManifestState, NodeProject};
pub use process::{CommandLine, OutputLine, OutputStream, ProcessRunner, SystemRunner};
