//! Stage transitions.
//!
//! Stages form a line, `1-backlog ↔ 2-todo ↔ 3-in-progress ↔ 4-review ↔
//! 5-done`, and an issue may only step to an immediate neighbour. Forward
//! steps must pass the destination's gate; backward steps skip it. The
//! folder move is the transition: there is nothing else to commit.

use crate::config::Config;
use crate::error::{AgileError, Result};
use crate::gate::{self, GateOutcome, IssueAnalysis};
use crate::io::{self, MoveMethod};
use crate::issue::Issue;
use crate::paths;
use crate::types::Stage;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveOutcome {
    pub name: String,
    pub from: Stage,
    pub to: Stage,
    /// False for a same-stage request.
    pub moved: bool,
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<MoveMethod>,
}

pub fn allowed_targets(from: Stage) -> Vec<Stage> {
    from.neighbours()
}

/// Gate outcome for moving `issue` into `target`, without moving it.
pub fn readiness(issue: &Issue, target: Stage, config: &Config) -> Result<GateOutcome> {
    let analysis = IssueAnalysis::load(issue)?;
    Ok(gate::check(target, &analysis, config))
}

pub fn move_issue(root: &Path, name: &str, target: Stage, config: &Config) -> Result<MoveOutcome> {
    let issue = Issue::locate(root, name)?;
    let from = issue.stage;

    if target == from {
        tracing::debug!(issue = name, stage = %from, "already in target stage");
        return Ok(MoveOutcome {
            name: issue.name,
            from,
            to: target,
            moved: false,
            path: issue.dir,
            method: None,
        });
    }

    if !from.is_adjacent(target) {
        return Err(AgileError::InvalidTransition {
            from: from.to_string(),
            to: target.to_string(),
            allowed: allowed_targets(from)
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        });
    }

    if target > from {
        let outcome = readiness(&issue, target, config)?;
        if !outcome.valid {
            tracing::info!(issue = name, from = %from, to = %target, "move blocked by gate");
            return Err(AgileError::validation(
                format!("move of '{name}' from {from} to {target}"),
                outcome.missing,
            ));
        }
    }

    let dest = paths::issue_dir(root, target, name);
    if dest.exists() {
        return Err(AgileError::IssueExists(format!("{target}/{name}")));
    }
    let method = io::move_dir(&issue.dir, &dest)?;
    tracing::info!(issue = name, from = %from, to = %target, ?method, "moved issue");

    Ok(MoveOutcome {
        name: issue.name,
        from,
        to: target,
        moved: true,
        path: dest,
        method: Some(method),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
