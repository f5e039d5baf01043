//! The catalog command

use colored::Colorize;
use devscaffold_core::{Catalog, InstallPolicy};

use crate::error::Result;

/// List the managed scaffold files.
pub fn run_catalog(json: bool) -> Result<()> {
    let catalog = Catalog::bundled();

    if json {
        println!("{}", serde_json::to_string_pretty(&catalog)?);
        return Ok(());
    }

    println!("{} Managed scaffold files:", "=>".blue().bold());
    for artifact in catalog.iter() {
        let mut notes = vec![artifact.strategy.label().to_string()];
        if let InstallPolicy::SeedOnce { guard_dir } = &artifact.policy {
            notes.push(format!("seeded while {guard_dir} is absent"));
        }
        if let Some(environment) = artifact.requires_environment {
            notes.push(format!("{environment} only"));
        }
        println!(
            "   {} {:<20} {:<42} {}",
            "-".green(),
            artifact.reference_id.bold(),
            artifact.target_path.to_string().cyan(),
            notes.join(", ").dimmed()
        );
    }
    Ok(())
}
