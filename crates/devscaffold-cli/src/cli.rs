//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use devscaffold_core::ExecutionMode;

/// devscaffold - Keep a project's test-tooling scaffold in shape
#[derive(Parser, Debug)]
#[command(name = "devscaffold")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Project directory to reconcile
    #[arg(short, long, global = true, default_value = ".")]
    pub project: PathBuf,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Run one reconciliation pass
    ///
    /// Installs missing scaffold files, bootstraps package.json when there
    /// is none, and installs or queues missing test dependencies.
    ///
    /// Examples:
    ///   devscaffold reconcile                 # Advisory: print install commands
    ///   devscaffold reconcile --mode auto     # Run install commands
    ///   devscaffold reconcile --dry-run       # Show the plan only
    Reconcile {
        /// Run dependency installs (auto) or print them (advisory)
        #[arg(short, long, env = "DEVSCAFFOLD_MODE")]
        mode: Option<ExecutionMode>,

        /// Directory of reference templates instead of the bundled ones
        #[arg(long, env = "DEVSCAFFOLD_REFERENCE_DIR")]
        reference_dir: Option<PathBuf>,

        /// Preview the plan without changing anything
        #[arg(long)]
        dry_run: bool,

        /// Output the report as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Show what a pass would do; exits with 2 when files have drifted
    Check {
        /// Directory of reference templates instead of the bundled ones
        #[arg(long, env = "DEVSCAFFOLD_REFERENCE_DIR")]
        reference_dir: Option<PathBuf>,

        /// Output the report as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// List the managed scaffold files
    Catalog {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_reconcile_with_mode() {
        let cli = Cli::try_parse_from(["devscaffold", "reconcile", "--mode", "auto", "--dry-run"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Reconcile {
                mode: Some(ExecutionMode::Auto),
                reference_dir: None,
                dry_run: true,
                json: false,
            })
        );
    }

    #[test]
    fn invalid_mode_is_rejected() {
        assert!(Cli::try_parse_from(["devscaffold", "reconcile", "--mode", "sometimes"]).is_err());
    }

    #[test]
    fn global_project_flag_after_subcommand() {
        let cli = Cli::try_parse_from(["devscaffold", "check", "--project", "/srv/site"]).unwrap();
        assert_eq!(cli.project, PathBuf::from("/srv/site"));
    }

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
