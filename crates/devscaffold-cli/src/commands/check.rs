//! The check command

use std::path::Path;

use colored::Colorize;

use super::{Session, render};
use crate::error::Result;

/// Exit code when installed files have drifted from their references.
pub const DRIFT_EXIT_CODE: i32 = 2;

/// Plan a pass without changing anything and report drift.
pub fn run_check(project: &Path, reference_dir: Option<&Path>, json: bool) -> Result<i32> {
    let session = Session::open(project, reference_dir)?;
    let mode = session.mode(None);

    if !json {
        println!(
            "{} Checking {}...",
            "=>".blue().bold(),
            session.root.to_string().cyan()
        );
    }

    let report = session.reconcile(mode, true, &mut |_| {})?;
    let code = if report.plan.has_drift() { DRIFT_EXIT_CODE } else { 0 };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        render::pending(&report);
        render::summary(&report);
        if code != 0 {
            println!();
            println!(
                "Run {} after reviewing the drifted files.",
                "devscaffold reconcile".cyan()
            );
        }
    }
    Ok(code)
}
