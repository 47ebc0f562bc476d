use super::{load_config, locate, lock_issue};
use crate::output::{print_bullets, print_json, print_table};
use agile_core::{
    frontmatter,
    gate::GateOutcome,
    guidance::{self, Guidance},
    issue::{Issue, IssueMetadata},
    spec::{self, CompletionStatus},
    types::{IssueType, Stage},
    workflow,
};
use anyhow::Context;
use clap::ValueEnum;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ListFormat {
    Table,
    Json,
}

// ---------------------------------------------------------------------------
// create / assign / archive / delete
// ---------------------------------------------------------------------------

pub fn create(
    root: &Path,
    issue_type: &str,
    name: &str,
    title: Option<&str>,
    owner: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let issue_type: IssueType = issue_type.parse()?;
    let cfg = load_config(root)?;
    let _lock = lock_issue(root, name, &cfg)?;
    let issue = Issue::create(root, issue_type, name, title.unwrap_or(name), owner)?;

    if json {
        print_json(&issue)?;
    } else {
        println!(
            "Created {} '{}' in {}: {}",
            issue.issue_type,
            issue.name,
            issue.stage,
            issue.main_doc_path().display()
        );
    }
    Ok(())
}

pub fn assign(root: &Path, name: &str, owner: &str, json: bool) -> anyhow::Result<()> {
    if owner.trim().is_empty() {
        anyhow::bail!("owner must not be empty");
    }
    let cfg = load_config(root)?;
    let _lock = lock_issue(root, name, &cfg)?;
    let issue = locate(root, name)?;
    issue
        .assign(owner)
        .with_context(|| format!("failed to update {}", issue.main_doc_path().display()))?;

    if json {
        print_json(&serde_json::json!({ "name": name, "owner": owner.trim() }))?;
    } else {
        println!("Assigned '{name}' to {}", owner.trim());
    }
    Ok(())
}

pub fn archive(root: &Path, name: &str, json: bool) -> anyhow::Result<()> {
    let cfg = load_config(root)?;
    let _lock = lock_issue(root, name, &cfg)?;
    let issue = locate(root, name)?;
    let target = issue.archive(root, frontmatter::today())?;

    if json {
        print_json(&serde_json::json!({ "name": name, "from": issue.stage, "path": target }))?;
    } else {
        println!("Archived '{name}' from {} to {}", issue.stage, target.display());
    }
    Ok(())
}

pub fn delete(root: &Path, name: &str, json: bool) -> anyhow::Result<()> {
    let cfg = load_config(root)?;
    let _lock = lock_issue(root, name, &cfg)?;
    let issue = locate(root, name)?;
    issue.delete()?;

    if json {
        print_json(&serde_json::json!({ "name": name, "deleted": true, "stage": issue.stage }))?;
    } else {
        println!("Deleted '{name}' from {}", issue.stage);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// move
// ---------------------------------------------------------------------------

pub fn move_to(root: &Path, name: &str, stage: &str, json: bool) -> anyhow::Result<()> {
    let target: Stage = stage.parse()?;
    let cfg = load_config(root)?;
    let _lock = lock_issue(root, name, &cfg)?;
    let outcome = workflow::move_issue(root, name, target, &cfg)?;

    if json {
        print_json(&outcome)?;
    } else if outcome.moved {
        println!("Moved '{name}': {} -> {}", outcome.from, outcome.to);
    } else {
        println!("'{name}' is already in {}", outcome.to);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// list
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct ListRow {
    name: String,
    issue_type: IssueType,
    stage: Stage,
    title: String,
    owner: Option<String>,
}

pub fn list(root: &Path, stage: Option<&str>, format: ListFormat, json: bool) -> anyhow::Result<()> {
    let stage = stage.map(str::parse::<Stage>).transpose()?;
    let issues = Issue::list(root, stage)?;

    let mut rows = Vec::with_capacity(issues.len());
    for issue in &issues {
        let meta = issue
            .metadata()
            .with_context(|| format!("failed to read {}", issue.main_doc_path().display()))?;
        rows.push(ListRow {
            name: issue.name.clone(),
            issue_type: issue.issue_type,
            stage: issue.stage,
            title: meta.title,
            owner: meta.owner,
        });
    }

    if json || format == ListFormat::Json {
        return print_json(&rows);
    }
    if rows.is_empty() {
        println!("No issues.");
        return Ok(());
    }
    let table: Vec<Vec<String>> = rows
        .into_iter()
        .map(|r| {
            vec![
                r.name,
                r.issue_type.to_string(),
                r.stage.to_string(),
                r.owner.unwrap_or_else(|| "-".to_string()),
                r.title,
            ]
        })
        .collect();
    print_table(&["NAME", "TYPE", "STAGE", "OWNER", "TITLE"], &table);
    Ok(())
}

// ---------------------------------------------------------------------------
// show
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct NextStage {
    stage: Stage,
    #[serde(flatten)]
    gate: GateOutcome,
}

#[derive(Serialize)]
struct IssueView {
    #[serde(flatten)]
    issue: Issue,
    #[serde(flatten)]
    metadata: IssueMetadata,
    specs: CompletionStatus,
    guidance: Option<Guidance>,
    guidance_needs_update: bool,
    next: Option<NextStage>,
}

pub fn show(root: &Path, name: &str, json: bool) -> anyhow::Result<()> {
    let cfg = load_config(root)?;
    let issue = locate(root, name)?;
    let metadata = issue.metadata()?;
    let specs = spec::list_specs(&issue.dir)?;
    let guidance_doc = Guidance::load(&issue.dir)?;
    let next = match issue.stage.next() {
        Some(stage) => Some(NextStage {
            stage,
            gate: workflow::readiness(&issue, stage, &cfg)?,
        }),
        None => None,
    };

    let view = IssueView {
        specs: spec::completion_status(&specs),
        guidance_needs_update: guidance::needs_update(guidance_doc.as_ref(), &specs),
        guidance: guidance_doc,
        issue,
        metadata,
        next,
    };

    if json {
        return print_json(&view);
    }

    println!("{}: {}", view.issue.name, view.metadata.title);
    println!("Type:      {}", view.issue.issue_type);
    println!("Stage:     {}", view.issue.stage);
    println!(
        "Owner:     {}",
        view.metadata.owner.as_deref().unwrap_or("(none)")
    );
    if let Some(created) = view.metadata.created {
        println!("Created:   {}", frontmatter::format_date(created));
    }
    if let Some(phase) = view.metadata.discovery_phase {
        println!("Discovery: {phase}");
    }
    println!("Specs:     {}", spec::summarize(&view.specs));
    match &view.guidance {
        None => println!("Guidance:  (none)"),
        Some(g) => println!(
            "Guidance:  {} (last updated {}){}",
            g.status,
            g.last_updated
                .map(frontmatter::format_timestamp)
                .unwrap_or_else(|| "never".to_string()),
            if view.guidance_needs_update { ", stale" } else { "" }
        ),
    }
    if let Some(next) = &view.next {
        println!();
        if next.gate.valid {
            println!("Ready for {}", next.stage);
        } else {
            print_bullets(&format!("Not ready for {}:", next.stage), &next.gate.missing);
        }
    }
    Ok(())
}
