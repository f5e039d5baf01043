//! Terminal rendering of reconciliation progress and reports

use colored::Colorize;
use devscaffold_core::{ActionOutcome, KeyPathMismatch, PlanAction, ReconcileEvent, ReconcileReport};
use devscaffold_presets::OutputStream;
use serde_json::Value;

/// Print live progress for one event.
pub fn event(event: ReconcileEvent<'_>) {
    match event {
        ReconcileEvent::Started(PlanAction::BootstrapManifest { .. }) => {
            println!("{} Creating package.json", "=>".blue().bold());
        }
        ReconcileEvent::Started(PlanAction::RunManagerCommand { command, .. }) => {
            println!("{} Running {}", "=>".blue().bold(), command.to_string().cyan());
        }
        ReconcileEvent::Started(_) => {}
        ReconcileEvent::Output(line) => match line.stream {
            OutputStream::Stdout => println!("   {} {}", ">".dimmed(), line.text),
            OutputStream::Stderr => println!("   {} {}", "ERR >".yellow(), line.text),
        },
        ReconcileEvent::Finished(action, outcome) => finished(action, outcome),
    }
}

fn finished(action: &PlanAction, outcome: &ActionOutcome) {
    match (action, outcome) {
        (PlanAction::InstallFile { target_path, .. }, ActionOutcome::Applied) => {
            println!("{} Installed {}", "OK".green().bold(), target_path.to_string().cyan());
        }
        (PlanAction::BootstrapManifest { .. }, ActionOutcome::Applied) => {
            println!("{} Created package.json", "OK".green().bold());
        }
        (PlanAction::RunManagerCommand { manager, .. }, ActionOutcome::Applied) => {
            println!("{} Dependencies installed with {}", "OK".green().bold(), manager);
        }
        (_, ActionOutcome::Failed { command, exit_code }) => {
            println!(
                "{} {} exited with status {}",
                "WARN".yellow().bold(),
                command.cyan(),
                exit_code
            );
        }
        (_, ActionOutcome::Error { message }) => {
            println!("{} {}", "WARN".yellow().bold(), message);
        }
        _ => {}
    }
}

/// Print what a dry run would have done.
pub fn pending(report: &ReconcileReport) {
    for (action, outcome) in report.entries() {
        if !matches!(outcome, ActionOutcome::Skipped { .. }) {
            continue;
        }
        match action {
            PlanAction::InstallFile { target_path, .. } => {
                println!("   {} install {}", "+".green(), target_path.to_string().cyan());
            }
            PlanAction::BootstrapManifest { commands, rename_to } => {
                for command in commands {
                    println!("   {} run {}", "+".green(), command.to_string().cyan());
                }
                if let Some(name) = rename_to {
                    println!("   {} name package.json {}", "+".green(), name.cyan());
                }
            }
            PlanAction::RunManagerCommand {
                command, follow_up, ..
            } => {
                for command in std::iter::once(command).chain(follow_up) {
                    println!("   {} run {}", "+".green(), command.to_string().cyan());
                }
            }
            _ => {}
        }
    }
}

/// Print warnings, the commands left to the user, and stage errors.
pub fn summary(report: &ReconcileReport) {
    let mut quiet = true;

    for action in report.plan.iter() {
        match action {
            PlanAction::WarnDrift {
                reference_location,
                target_path,
                mismatches,
                reason,
                ..
            } => {
                quiet = false;
                println!();
                println!(
                    "{} {} differs from {}",
                    "DRIFTED".red().bold(),
                    target_path.to_string().cyan(),
                    reference_location.dimmed()
                );
                if let Some(reason) = reason {
                    println!("   {} could not be verified: {}", "!".red(), reason);
                }
                for mismatch in mismatches {
                    println!("   {} {}", "!".red(), describe(mismatch));
                }
                println!("   Review the file and merge the changes by hand.");
            }
            PlanAction::WarnMissingCapability { message, .. } => {
                quiet = false;
                println!();
                println!("{} {}", "WARN".yellow().bold(), message);
            }
            _ => {}
        }
    }

    let commands = report.plan.user_commands();
    if !commands.is_empty() {
        quiet = false;
        println!();
        println!("{}", "You must run the following commands:".bold());
        for command in commands {
            println!("   {}", command.to_string().cyan());
        }
    }

    for error in &report.errors {
        quiet = false;
        println!();
        println!("{} {}", "ERROR".red().bold(), error);
    }

    if quiet && report.plan.iter().all(|a| !a.is_mutating()) {
        println!("{} Scaffold is up to date.", "OK".green().bold());
    }
}

fn describe(mismatch: &KeyPathMismatch) -> String {
    let show = |value: &Option<Value>| match value {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => "(missing)".to_string(),
    };
    format!(
        "{}: expected {}, found {}",
        mismatch.key_path,
        show(&mismatch.reference_value),
        show(&mismatch.target_value)
    )
}
