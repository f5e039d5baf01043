//! devscaffold CLI
//!
//! Installs and checks the development scaffold of a project and
//! reconciles its test-tooling dependencies.

mod cli;
mod commands;
mod error;
mod logging;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands};
use error::Result;

fn main() {
    match run() {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            std::process::exit(1);
        }
    }
}

/// Returns the process exit code.
fn run() -> Result<i32> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Some(cmd) => execute_command(&cli.project, cmd),
        None => {
            println!("{} scaffold reconciliation", "devscaffold".green().bold());
            println!();
            println!("Run {} for available commands.", "devscaffold --help".cyan());
            Ok(0)
        }
    }
}

fn execute_command(project: &std::path::Path, cmd: Commands) -> Result<i32> {
    match cmd {
        Commands::Reconcile {
            mode,
            reference_dir,
            dry_run,
            json,
        } => commands::run_reconcile(project, mode, reference_dir.as_deref(), dry_run, json),
        Commands::Check { reference_dir, json } => {
            commands::run_check(project, reference_dir.as_deref(), json)
        }
        Commands::Catalog { json } => commands::run_catalog(json).map(|()| 0),
    }
}
