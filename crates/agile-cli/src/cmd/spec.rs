use super::{load_config, locate, lock_issue};
use crate::output::{print_json, print_table};
use agile_core::{
    frontmatter,
    guidance::{self, Guidance},
    spec::{self as spec_ops, Spec},
    types::SpecStatus,
    AgileError,
};
use clap::Subcommand;
use std::path::Path;

#[derive(Subcommand)]
pub enum SpecSubcommand {
    /// List an issue's specs, actionable first
    List { name: String },
    /// Add a pending spec to an issue
    Add {
        name: String,
        spec: String,
        /// Spec title (defaults to the spec slug)
        #[arg(long)]
        title: Option<String>,
        /// Specs this one builds on, comma-separated (e.g. schema,api)
        #[arg(long, value_delimiter = ',')]
        depends: Vec<String>,
    },
    /// Set a spec's status: pending, in-progress, in-review, completed
    Status {
        name: String,
        spec: String,
        status: String,
    },
    /// Replace a spec's dependency list (empty to clear)
    Depends {
        name: String,
        spec: String,
        /// Comma-separated spec slugs
        #[arg(value_delimiter = ',')]
        dependencies: Vec<String>,
    },
    /// Delete a spec
    Delete { name: String, spec: String },
    /// Suggest the spec to work on next
    Suggest { name: String },
}

pub fn run(root: &Path, subcmd: SpecSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        SpecSubcommand::List { name } => list(root, &name, json),
        SpecSubcommand::Add {
            name,
            spec,
            title,
            depends,
        } => add(root, &name, &spec, title.as_deref(), &depends, json),
        SpecSubcommand::Status { name, spec, status } => {
            set_status(root, &name, &spec, &status, json)
        }
        SpecSubcommand::Depends {
            name,
            spec,
            dependencies,
        } => depends(root, &name, &spec, &dependencies, json),
        SpecSubcommand::Delete { name, spec } => delete(root, &name, &spec, json),
        SpecSubcommand::Suggest { name } => suggest(root, &name, json),
    }
}

fn list(root: &Path, name: &str, json: bool) -> anyhow::Result<()> {
    let issue = locate(root, name)?;
    let specs = spec_ops::list_specs(&issue.dir)?;
    let status = spec_ops::completion_status(&specs);

    if json {
        return print_json(&serde_json::json!({
            "issue": name,
            "specs": specs,
            "completion": status,
        }));
    }
    if specs.is_empty() {
        println!("No specs for '{name}'.");
        return Ok(());
    }
    let rows: Vec<Vec<String>> = specs
        .iter()
        .map(|s| {
            vec![
                s.name.clone(),
                s.status.to_string(),
                frontmatter::format_date(s.created),
                s.dependencies.join(","),
                s.title.clone(),
            ]
        })
        .collect();
    print_table(&["SPEC", "STATUS", "CREATED", "DEPENDS", "TITLE"], &rows);
    println!();
    println!("{}", spec_ops::summarize(&status));
    Ok(())
}

fn add(
    root: &Path,
    name: &str,
    spec: &str,
    title: Option<&str>,
    depends: &[String],
    json: bool,
) -> anyhow::Result<()> {
    let cfg = load_config(root)?;
    let _lock = lock_issue(root, name, &cfg)?;
    let issue = locate(root, name)?;
    let depends = clean_list(depends);
    let added = spec_ops::add_spec(&issue.dir, spec, title.unwrap_or(spec), &depends)?;

    if json {
        print_json(&added)?;
    } else {
        println!("Added spec '{}' to '{name}' (pending)", added.name);
    }
    Ok(())
}

fn set_status(root: &Path, name: &str, spec: &str, status: &str, json: bool) -> anyhow::Result<()> {
    let status: SpecStatus = status.parse()?;
    let cfg = load_config(root)?;
    let _lock = lock_issue(root, name, &cfg)?;
    let issue = locate(root, name)?;
    let current = Spec::load(&issue.dir, spec)?;

    if status == SpecStatus::Completed {
        let guidance_doc = Guidance::load(&issue.dir)?;
        let check = guidance::validate_for_spec_completion(guidance_doc.as_ref(), &current);
        if !check.valid {
            return Err(AgileError::validation(
                format!("completing spec '{spec}'"),
                vec![check.message],
            )
            .into());
        }
    }

    let updated = spec_ops::update_status(&current, status)?;
    if json {
        print_json(&updated)?;
    } else {
        println!("Spec '{spec}': {} -> {}", current.status, updated.status);
        if let Some(done) = updated.completed {
            println!("Completed at {}", frontmatter::format_timestamp(done));
        }
    }
    Ok(())
}

fn depends(
    root: &Path,
    name: &str,
    spec: &str,
    dependencies: &[String],
    json: bool,
) -> anyhow::Result<()> {
    let cfg = load_config(root)?;
    let _lock = lock_issue(root, name, &cfg)?;
    let issue = locate(root, name)?;
    let current = Spec::load(&issue.dir, spec)?;
    let dependencies = clean_list(dependencies);
    let updated = spec_ops::set_dependencies(&current, &dependencies)?;

    if json {
        print_json(&updated)?;
    } else if updated.dependencies.is_empty() {
        println!("Spec '{spec}' has no dependencies");
    } else {
        println!("Spec '{spec}' depends on {}", updated.dependencies.join(", "));
    }
    Ok(())
}

fn clean_list(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

fn delete(root: &Path, name: &str, spec: &str, json: bool) -> anyhow::Result<()> {
    let cfg = load_config(root)?;
    let _lock = lock_issue(root, name, &cfg)?;
    let issue = locate(root, name)?;
    spec_ops::delete_spec(&issue.dir, spec)?;

    if json {
        print_json(&serde_json::json!({ "issue": name, "spec": spec, "deleted": true }))?;
    } else {
        println!("Deleted spec '{spec}' from '{name}'");
    }
    Ok(())
}

fn suggest(root: &Path, name: &str, json: bool) -> anyhow::Result<()> {
    let issue = locate(root, name)?;
    let specs = spec_ops::list_specs(&issue.dir)?;
    let next = spec_ops::suggest_next(&specs);

    if json {
        return print_json(&serde_json::json!({ "issue": name, "next": next }));
    }
    let status = spec_ops::completion_status(&specs);
    match next {
        Some(s) => println!("Next: {} ({}) {}", s.name, s.status, s.title),
        None if specs.is_empty() => println!("No specs for '{name}'."),
        None if status.all_completed => println!("All specs completed."),
        None if status.pending == 0 => println!(
            "No spec is ready: {} in review, waiting on sign-off.",
            status.in_review
        ),
        None if status.in_review > 0 => println!(
            "No spec is ready: {} in review, pending specs are waiting on dependencies.",
            status.in_review
        ),
        None => println!("No spec is ready: pending specs are waiting on dependencies."),
    }
    Ok(())
}
