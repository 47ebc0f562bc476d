//! Feature discovery phases.
//!
//! `not_started → persona → paths → scope → synthesize → complete`, forward
//! only, plus an unconditional reset. The phase lives in the main document's
//! frontmatter; the `synthesize → complete` edge requires a valid BDD report.

use crate::bdd::{self, BddReport};
use crate::config::Config;
use crate::error::{AgileError, Result};
use crate::frontmatter;
use crate::issue::{Issue, DISCOVERY_PHASE_KEY};
use crate::types::{DiscoveryPhase, IssueType};
use serde::Serialize;

// ---------------------------------------------------------------------------
// Text transforms
// ---------------------------------------------------------------------------

/// Phase recorded in `text`; absent or unrecognized means `not_started`.
pub fn current_phase(text: &str) -> DiscoveryPhase {
    frontmatter::read(text, &[DISCOVERY_PHASE_KEY])
        .parse(DISCOVERY_PHASE_KEY)
        .unwrap_or(DiscoveryPhase::NotStarted)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Advance {
    pub from: DiscoveryPhase,
    pub to: DiscoveryPhase,
    pub changed: bool,
}

/// Advance `text` one phase. Returns the rewritten text, or
/// `ValidationFailed` when leaving `synthesize` with an invalid BDD report.
pub fn advance_text(text: &str, config: &Config) -> Result<(String, Advance)> {
    let from = current_phase(text);
    let Some(to) = from.next() else {
        return Ok((
            text.to_string(),
            Advance {
                from,
                to: from,
                changed: false,
            },
        ));
    };
    if to == DiscoveryPhase::Complete {
        let report = bdd::validate(text, config);
        if !report.valid {
            return Err(AgileError::validation(
                "discovery completion",
                report.errors(),
            ));
        }
    }
    let updated = frontmatter::write(text, DISCOVERY_PHASE_KEY, to.as_str());
    Ok((
        updated,
        Advance {
            from,
            to,
            changed: true,
        },
    ))
}

pub fn reset_text(text: &str) -> String {
    frontmatter::write(text, DISCOVERY_PHASE_KEY, DiscoveryPhase::NotStarted.as_str())
}

// ---------------------------------------------------------------------------
// Issue operations
// ---------------------------------------------------------------------------

fn require_feature(issue: &Issue) -> Result<()> {
    if issue.issue_type != IssueType::Feature {
        return Err(AgileError::NotAFeature(issue.name.clone()));
    }
    Ok(())
}

pub fn advance(issue: &Issue, config: &Config) -> Result<Advance> {
    require_feature(issue)?;
    let text = issue.read_main_doc()?;
    let (updated, step) = advance_text(&text, config)?;
    if step.changed {
        issue.write_main_doc(&updated)?;
        tracing::info!(issue = %issue.name, from = %step.from, to = %step.to, "advanced discovery");
    }
    Ok(step)
}

/// Back to `not_started`; authored content is left alone. Returns the phase
/// that was current before.
pub fn reset(issue: &Issue) -> Result<DiscoveryPhase> {
    require_feature(issue)?;
    let text = issue.read_main_doc()?;
    let previous = current_phase(&text);
    issue.write_main_doc(&reset_text(&text))?;
    tracing::info!(issue = %issue.name, from = %previous, "reset discovery");
    Ok(previous)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveryStatus {
    pub phase: DiscoveryPhase,
    pub next: Option<DiscoveryPhase>,
    pub guide: &'static str,
    pub report: BddReport,
}

pub fn status(issue: &Issue, config: &Config) -> Result<DiscoveryStatus> {
    require_feature(issue)?;
    let text = issue.read_main_doc()?;
    let phase = current_phase(&text);
    Ok(DiscoveryStatus {
        phase,
        next: phase.next(),
        guide: phase.guide(),
        report: bdd::validate(&text, config),
    })
}

pub fn validate(issue: &Issue, config: &Config) -> Result<BddReport> {
    require_feature(issue)?;
    Ok(bdd::validate(&issue.read_main_doc()?, config))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
