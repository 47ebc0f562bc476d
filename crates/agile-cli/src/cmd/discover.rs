use super::{load_config, locate, lock_issue};
use crate::output::{print_bullets, print_json};
use agile_core::{bdd::BddReport, discovery, AgileError};
use clap::Subcommand;
use std::path::Path;

#[derive(Subcommand)]
pub enum DiscoverSubcommand {
    /// Move to the next discovery phase (leaving synthesize runs the BDD validator)
    Advance,
    /// Show the current phase and what it asks for
    Status,
    /// Run the BDD validator without changing the phase
    Validate,
    /// Return to not_started, keeping the written content
    Reset,
}

pub fn run(root: &Path, name: &str, subcmd: DiscoverSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        DiscoverSubcommand::Advance => advance(root, name, json),
        DiscoverSubcommand::Status => status(root, name, json),
        DiscoverSubcommand::Validate => validate(root, name, json),
        DiscoverSubcommand::Reset => reset(root, name, json),
    }
}

fn advance(root: &Path, name: &str, json: bool) -> anyhow::Result<()> {
    let cfg = load_config(root)?;
    let _lock = lock_issue(root, name, &cfg)?;
    let issue = locate(root, name)?;
    let step = discovery::advance(&issue, &cfg)?;

    if json {
        print_json(&step)?;
    } else if step.changed {
        println!("Discovery for '{name}': {} -> {}", step.from, step.to);
        println!("{}", step.to.guide());
    } else {
        println!("Discovery for '{name}' is already {}", step.to);
    }
    Ok(())
}

fn status(root: &Path, name: &str, json: bool) -> anyhow::Result<()> {
    let cfg = load_config(root)?;
    let issue = locate(root, name)?;
    let status = discovery::status(&issue, &cfg)?;

    if json {
        return print_json(&status);
    }
    println!("Phase: {}", status.phase);
    if let Some(next) = status.next {
        println!("Next:  {next}");
    }
    println!();
    println!("{}", status.guide);
    println!();
    print_report(&status.report);
    Ok(())
}

fn validate(root: &Path, name: &str, json: bool) -> anyhow::Result<()> {
    let cfg = load_config(root)?;
    let issue = locate(root, name)?;
    let report = discovery::validate(&issue, &cfg)?;

    if json {
        print_json(&report)?;
    } else {
        print_report(&report);
    }
    if report.valid {
        return Ok(());
    }
    Err(AgileError::validation(format!("discovery for '{name}'"), report.errors()).into())
}

fn reset(root: &Path, name: &str, json: bool) -> anyhow::Result<()> {
    let cfg = load_config(root)?;
    let _lock = lock_issue(root, name, &cfg)?;
    let issue = locate(root, name)?;
    let previous = discovery::reset(&issue)?;

    if json {
        print_json(&serde_json::json!({ "name": name, "from": previous, "to": "not_started" }))?;
    } else {
        println!("Discovery for '{name}' reset from {previous} to not_started");
    }
    Ok(())
}

fn print_report(report: &BddReport) {
    let mark = |present: bool| if present { "x" } else { " " };
    println!("[{}] User Persona", mark(report.has_persona));
    println!("[{}] Problem Statement", mark(report.has_problem_statement));
    println!(
        "[{}] Scenarios ({} written)",
        mark(report.has_scenarios),
        report.scenario_count
    );
    println!("[{}] Out of Scope", mark(report.has_out_of_scope));
    println!("[{}] Assumptions", mark(report.has_assumptions));
    if report.valid {
        println!("BDD: valid");
    } else {
        print_bullets("BDD problems:", &report.errors());
    }
}
