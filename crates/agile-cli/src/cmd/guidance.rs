use super::{load_config, locate, lock_issue};
use crate::output::{print_bullets, print_json};
use agile_core::{
    frontmatter,
    guidance::{self, Guidance},
    spec,
    types::GuidanceStatus,
    AgileError,
};
use anyhow::Context;
use clap::Subcommand;
use std::path::Path;

#[derive(Subcommand)]
pub enum GuidanceSubcommand {
    /// Show the guidance document's state and whether it is stale
    Show { name: String },
    /// Mark the guidance as updated now (creates it if missing)
    Update { name: String },
    /// Fail if any spec was completed after the last guidance update
    Validate { name: String },
    /// Set the guidance status: draft, active, finalized
    Status { name: String, status: String },
}

pub fn run(root: &Path, subcmd: GuidanceSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        GuidanceSubcommand::Show { name } => show(root, &name, json),
        GuidanceSubcommand::Update { name } => update(root, &name, json),
        GuidanceSubcommand::Validate { name } => validate(root, &name, json),
        GuidanceSubcommand::Status { name, status } => set_status(root, &name, &status, json),
    }
}

fn stale_names(doc: Option<&Guidance>, specs: &[spec::Spec]) -> Vec<String> {
    guidance::stale_specs(doc, specs)
        .into_iter()
        .map(|s| s.name.clone())
        .collect()
}

fn show(root: &Path, name: &str, json: bool) -> anyhow::Result<()> {
    let issue = locate(root, name)?;
    let doc = Guidance::load(&issue.dir)?;
    let specs = spec::list_specs(&issue.dir)?;
    let needs_update = guidance::needs_update(doc.as_ref(), &specs);
    let stale = stale_names(doc.as_ref(), &specs);

    if json {
        return print_json(&serde_json::json!({
            "issue": name,
            "guidance": doc,
            "needs_update": needs_update,
            "stale_specs": stale,
        }));
    }

    let Some(doc) = doc else {
        println!("No technical guidance for '{name}'. Run `agile guidance update {name}` to create it.");
        return Ok(());
    };
    println!("Guidance:          {}", doc.path.display());
    println!("Status:            {}", doc.status);
    println!(
        "Last updated:      {}",
        doc.last_updated
            .map(frontmatter::format_timestamp)
            .unwrap_or_else(|| "never".to_string())
    );
    println!(
        "Investigation log: {}",
        if doc.has_investigation_log { "yes" } else { "no" }
    );
    println!("Open questions:    {}", doc.open_questions);
    if needs_update {
        print_bullets("Stale: specs completed since the last update:", &stale);
    } else {
        println!("Up to date");
    }
    Ok(())
}

fn update(root: &Path, name: &str, json: bool) -> anyhow::Result<()> {
    let cfg = load_config(root)?;
    let _lock = lock_issue(root, name, &cfg)?;
    let issue = locate(root, name)?;
    let title = issue.metadata()?.title;
    let doc = guidance::mark_updated(&issue.dir, &title)
        .with_context(|| format!("failed to update guidance for '{name}'"))?;

    if json {
        print_json(&doc)?;
    } else {
        println!(
            "Updated guidance for '{name}' at {}",
            doc.last_updated
                .map(frontmatter::format_timestamp)
                .unwrap_or_default()
        );
    }
    Ok(())
}

fn validate(root: &Path, name: &str, json: bool) -> anyhow::Result<()> {
    let issue = locate(root, name)?;
    let doc = Guidance::load(&issue.dir)?;
    let specs = spec::list_specs(&issue.dir)?;
    let needs_update = guidance::needs_update(doc.as_ref(), &specs);

    if json {
        print_json(&serde_json::json!({
            "issue": name,
            "valid": !needs_update,
            "exists": doc.is_some(),
            "stale_specs": stale_names(doc.as_ref(), &specs),
        }))?;
    }
    if !needs_update {
        if !json {
            println!("Guidance for '{name}' is up to date");
        }
        return Ok(());
    }

    let missing = if doc.is_none() {
        vec!["no technical guidance document".to_string()]
    } else {
        stale_names(doc.as_ref(), &specs)
            .into_iter()
            .map(|s| format!("spec '{s}' completed after the last guidance update"))
            .collect()
    };
    Err(AgileError::validation(format!("guidance for '{name}'"), missing).into())
}

fn set_status(root: &Path, name: &str, status: &str, json: bool) -> anyhow::Result<()> {
    let status: GuidanceStatus = status.parse()?;
    let cfg = load_config(root)?;
    let _lock = lock_issue(root, name, &cfg)?;
    let issue = locate(root, name)?;
    let doc = guidance::set_status(&issue.dir, name, status)?;

    if json {
        print_json(&doc)?;
    } else {
        println!("Guidance for '{name}' is now {}", doc.status);
    }
    Ok(())
}
