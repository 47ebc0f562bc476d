//! Technical guidance staleness.
//!
//! `technical-guidance.md` is considered stale once any spec has been
//! completed after the document's `last-updated` timestamp. This is a purely
//! temporal check: it detects that an update happened, not that the update
//! was relevant.

use crate::error::{AgileError, Result};
use crate::spec::Spec;
use crate::types::GuidanceStatus;
use crate::{frontmatter, io, markdown, paths, templates};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};

const LAST_UPDATED_KEY: &str = "last-updated";
const STATUS_KEY: &str = "status";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Guidance {
    #[serde(skip)]
    pub path: PathBuf,
    pub last_updated: Option<DateTime<Utc>>,
    pub status: GuidanceStatus,
    pub has_investigation_log: bool,
    pub open_questions: usize,
}

impl Guidance {
    pub fn decode(path: &Path, text: &str) -> Self {
        let fields = frontmatter::read(text, &[LAST_UPDATED_KEY, STATUS_KEY]);
        let body = frontmatter::body(text);
        let has_investigation_log = markdown::section(body, "Investigation Log")
            .is_some_and(|s| !s.is_blank());
        let open_questions = markdown::section(body, "Open Questions")
            .map(|s| {
                let settled = markdown::checklist(&s.body)
                    .iter()
                    .filter(|(done, text)| *done && !text.is_empty())
                    .count();
                markdown::list_items(&s.body).len().saturating_sub(settled)
            })
            .unwrap_or(0);
        Self {
            path: path.to_path_buf(),
            last_updated: fields.timestamp(LAST_UPDATED_KEY),
            status: fields
                .parse::<GuidanceStatus>(STATUS_KEY)
                .unwrap_or(GuidanceStatus::Draft),
            has_investigation_log,
            open_questions,
        }
    }

    /// `None` when the issue has no guidance document yet.
    pub fn load(issue_dir: &Path) -> Result<Option<Self>> {
        let path = paths::guidance_path(issue_dir);
        if !path.is_file() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(&path)?;
        Ok(Some(Self::decode(&path, &text)))
    }
}

/// True when there is no document, or any spec was completed after it was
/// last updated.
pub fn needs_update(guidance: Option<&Guidance>, specs: &[Spec]) -> bool {
    guidance.is_none() || !stale_specs(guidance, specs).is_empty()
}

/// Completed specs whose completion postdates `last-updated`. Without a
/// parseable `last-updated`, every completed spec counts.
pub fn stale_specs<'a>(guidance: Option<&Guidance>, specs: &'a [Spec]) -> Vec<&'a Spec> {
    let last_updated = guidance.and_then(|g| g.last_updated);
    specs
        .iter()
        .filter(|s| match (s.completed, last_updated) {
            (Some(done), Some(updated)) => done > updated,
            (Some(_), None) => true,
            (None, _) => false,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionCheck {
    pub valid: bool,
    pub message: String,
}

/// A spec may be completed only once guidance has been touched on or after
/// the day the spec was created.
pub fn validate_for_spec_completion(guidance: Option<&Guidance>, spec: &Spec) -> CompletionCheck {
    let Some(guidance) = guidance else {
        return CompletionCheck {
            valid: false,
            message: "no technical guidance document; run `agile guidance update` first".to_string(),
        };
    };
    match guidance.last_updated {
        Some(updated) if updated.date_naive() >= spec.created => CompletionCheck {
            valid: true,
            message: format!(
                "technical guidance updated {} (spec created {})",
                frontmatter::format_timestamp(updated),
                frontmatter::format_date(spec.created)
            ),
        },
        Some(updated) => CompletionCheck {
            valid: false,
            message: format!(
                "technical guidance last updated {}, before spec '{}' was created {}; update it first",
                frontmatter::format_timestamp(updated),
                spec.name,
                frontmatter::format_date(spec.created)
            ),
        },
        None => CompletionCheck {
            valid: false,
            message: "technical guidance has no last-updated timestamp; run `agile guidance update`"
                .to_string(),
        },
    }
}

/// Bump `last-updated` to now, creating the document from its template if
/// the issue has none.
pub fn mark_updated(issue_dir: &Path, issue_title: &str) -> Result<Guidance> {
    mark_updated_at(issue_dir, issue_title, Utc::now())
}

pub fn mark_updated_at(issue_dir: &Path, issue_title: &str, now: DateTime<Utc>) -> Result<Guidance> {
    let path = paths::guidance_path(issue_dir);
    let stamp = frontmatter::format_timestamp(now);
    let text = if path.is_file() {
        let current = std::fs::read_to_string(&path)?;
        frontmatter::write(&current, LAST_UPDATED_KEY, &stamp)
    } else {
        tracing::info!(path = %path.display(), "creating technical guidance");
        templates::guidance_document(issue_title, &stamp)
    };
    io::atomic_write(&path, text.as_bytes())?;
    Ok(Guidance::decode(&path, &text))
}

/// Rewrite `status`. The document must already exist.
pub fn set_status(issue_dir: &Path, issue_name: &str, status: GuidanceStatus) -> Result<Guidance> {
    let path = paths::guidance_path(issue_dir);
    if !path.is_file() {
        return Err(AgileError::GuidanceNotFound(issue_name.to_string()));
    }
    let text = std::fs::read_to_string(&path)?;
    let text = frontmatter::write(&text, STATUS_KEY, status.as_str());
    io::atomic_write(&path, text.as_bytes())?;
    tracing::debug!(issue = issue_name, status = %status, "updated guidance status");
    Ok(Guidance::decode(&path, &text))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
