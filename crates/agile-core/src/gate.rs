use crate::bdd;
use crate::config::Config;
use crate::error::Result;
use crate::guidance::{self, Guidance};
use crate::issue::{Issue, IssueMetadata};
use crate::markdown;
use crate::spec::{self, Spec};
use crate::types::{DiscoveryPhase, IssueType, Stage};
use serde::Serialize;

// ---------------------------------------------------------------------------
// IssueAnalysis
// ---------------------------------------------------------------------------

/// Everything the gates look at, read from disk once per check.
#[derive(Debug, Clone)]
pub struct IssueAnalysis {
    pub name: String,
    pub issue_type: IssueType,
    pub text: String,
    pub metadata: IssueMetadata,
    pub specs: Vec<Spec>,
    pub guidance: Option<Guidance>,
}

impl IssueAnalysis {
    pub fn load(issue: &Issue) -> Result<Self> {
        let text = issue.read_main_doc()?;
        let metadata = issue.metadata()?;
        Ok(Self {
            name: issue.name.clone(),
            issue_type: issue.issue_type,
            text,
            metadata,
            specs: spec::list_specs(&issue.dir)?,
            guidance: Guidance::load(&issue.dir)?,
        })
    }
}

// ---------------------------------------------------------------------------
// GateOutcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GateOutcome {
    pub valid: bool,
    /// Every unmet requirement, in check order.
    pub missing: Vec<String>,
}

impl GateOutcome {
    fn from_missing(missing: Vec<String>) -> Self {
        Self {
            valid: missing.is_empty(),
            missing,
        }
    }
}

// ---------------------------------------------------------------------------
// Gates
// ---------------------------------------------------------------------------

/// Readiness for entering `target`. `1-backlog` is always open.
pub fn check(target: Stage, analysis: &IssueAnalysis, config: &Config) -> GateOutcome {
    let missing = match target {
        Stage::Backlog => Vec::new(),
        Stage::Todo => ready_for_todo(analysis, config),
        Stage::InProgress => ready_for_in_progress(analysis, config),
        Stage::Review => ready_for_review(analysis),
        Stage::Done => ready_for_done(analysis),
    };
    if !missing.is_empty() {
        tracing::debug!(issue = %analysis.name, stage = %target, unmet = missing.len(), "gate not satisfied");
    }
    GateOutcome::from_missing(missing)
}

fn ready_for_todo(a: &IssueAnalysis, config: &Config) -> Vec<String> {
    let mut missing = Vec::new();
    match markdown::section(&a.text, "Description") {
        None => missing.push("missing 'Description' section".to_string()),
        Some(s) if s.is_blank() => missing.push("'Description' section is empty".to_string()),
        Some(s) => {
            let placeholders = markdown::find_placeholders(&s.body, &config.placeholder_tokens);
            if !placeholders.is_empty() {
                missing.push(format!(
                    "'Description' has unfilled placeholders: {}",
                    placeholders.join(", ")
                ));
            }
        }
    }

    if a.issue_type == IssueType::Feature {
        let phase = a.metadata.discovery_phase.unwrap_or(DiscoveryPhase::NotStarted);
        if phase != DiscoveryPhase::Complete {
            missing.push(format!(
                "discovery is at '{phase}', must be 'complete' (run `agile discover {} advance`)",
                a.name
            ));
        }
        let report = bdd::validate(&a.text, config);
        missing.extend(report.errors().into_iter().map(|e| format!("BDD: {e}")));
    }
    missing
}

fn ready_for_in_progress(a: &IssueAnalysis, config: &Config) -> Vec<String> {
    let mut missing = Vec::new();
    match a.metadata.owner.as_deref() {
        Some(owner) if !config.is_placeholder_owner(owner) => {}
        _ => missing.push(format!(
            "no owner assigned (run `agile assign {} <owner>`)",
            a.name
        )),
    }
    if a.guidance.is_none() {
        missing.push(format!(
            "no technical guidance document (run `agile guidance update {}`)",
            a.name
        ));
    }
    missing
}

fn ready_for_review(a: &IssueAnalysis) -> Vec<String> {
    let mut missing = Vec::new();
    let status = spec::completion_status(&a.specs);
    if status.total == 0 {
        missing.push("no specs defined".to_string());
    } else if !status.all_completed {
        let open: Vec<&str> = a
            .specs
            .iter()
            .filter(|s| !s.is_completed())
            .map(|s| s.name.as_str())
            .collect();
        missing.push(format!(
            "specs not completed ({}): {}",
            spec::summarize(&status),
            open.join(", ")
        ));
    }

    match &a.guidance {
        None => missing.push("no technical guidance document".to_string()),
        Some(g) => {
            let stale = guidance::stale_specs(Some(g), &a.specs);
            if !stale.is_empty() {
                let names: Vec<&str> = stale.iter().map(|s| s.name.as_str()).collect();
                missing.push(format!(
                    "technical guidance is stale: specs completed since its last update: {} (run `agile guidance update {}`)",
                    names.join(", "),
                    a.name
                ));
            }
        }
    }
    missing
}

fn ready_for_done(a: &IssueAnalysis) -> Vec<String> {
    let Some(section) = markdown::section(&a.text, "Definition of Done") else {
        return vec!["missing 'Definition of Done' section".to_string()];
    };
    let items = markdown::checklist(&section.body);
    if items.is_empty() {
        return vec!["'Definition of Done' has no checklist items".to_string()];
    }
    items
        .into_iter()
        .filter(|(checked, _)| !checked)
        .map(|(_, item)| format!("unchecked Definition of Done item: {item}"))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
