//! Shared test utilities for the devscaffold workspace.
//!
//! Dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`project`]: [`TestProject`](project::TestProject) builder for scratch target projects
//! - [`runner`]: [`ScriptedRunner`](runner::ScriptedRunner), a process runner that
//!   records commands and simulates package-manager effects

pub mod project;
pub mod runner;

pub use project::TestProject;
pub use runner::ScriptedRunner;
