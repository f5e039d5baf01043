//! The reconcile command

use std::path::Path;

use colored::Colorize;
use devscaffold_core::ExecutionMode;

use super::{Session, render};
use crate::error::Result;

/// Run one reconciliation pass.
///
/// Failed installs are reported as warnings; the exit code is only
/// non-zero when the pass could not run at all.
pub fn run_reconcile(
    project: &Path,
    mode: Option<ExecutionMode>,
    reference_dir: Option<&Path>,
    dry_run: bool,
    json: bool,
) -> Result<i32> {
    let session = Session::open(project, reference_dir)?;
    let mode = session.mode(mode);

    if !json {
        println!(
            "{} Reconciling {} ({} mode{})",
            "=>".blue().bold(),
            session.root.to_string().cyan(),
            mode,
            if dry_run { ", dry run" } else { "" }
        );
    }

    let report = session.reconcile(mode, dry_run, &mut |event| {
        if !json {
            render::event(event);
        }
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(0);
    }

    if dry_run {
        render::pending(&report);
    }
    render::summary(&report);
    Ok(0)
}
