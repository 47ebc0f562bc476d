//! The Issue aggregate.
//!
//! An issue is nothing but a folder: `agile/<stage>/<name>/` containing a
//! main document named after its type. The folder's parent directory *is* the
//! stage, so every value here is re-derived from disk on each call and there
//! is no index to fall out of sync.

use crate::error::{AgileError, Result};
use crate::types::{DiscoveryPhase, IssueType, Stage};
use crate::{frontmatter, io, paths, templates};
use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

pub const DISCOVERY_PHASE_KEY: &str = "discovery_phase";

// ---------------------------------------------------------------------------
// Issue
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub name: String,
    pub issue_type: IssueType,
    pub stage: Stage,
    pub dir: PathBuf,
}

/// Attributes read out of the main document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueMetadata {
    pub title: String,
    pub owner: Option<String>,
    pub created: Option<NaiveDate>,
    /// `None` for bugs and tasks.
    pub discovery_phase: Option<DiscoveryPhase>,
}

impl Issue {
    /// Recognize an issue folder by the main document it contains.
    pub fn from_dir(dir: &Path, stage: Stage) -> Option<Self> {
        let name = dir.file_name()?.to_string_lossy().into_owned();
        let issue_type = IssueType::all()
            .iter()
            .copied()
            .find(|t| dir.join(t.filename()).is_file())?;
        Some(Self {
            name,
            issue_type,
            stage,
            dir: dir.to_path_buf(),
        })
    }

    /// Find `name` in whichever stage directory holds it.
    pub fn locate(root: &Path, name: &str) -> Result<Self> {
        if !paths::agile_dir(root).is_dir() {
            return Err(AgileError::NotInitialized);
        }
        let mut found: Vec<Issue> = Stage::all()
            .iter()
            .filter_map(|&stage| Self::from_dir(&paths::issue_dir(root, stage, name), stage))
            .collect();
        match found.len() {
            0 => Err(AgileError::IssueNotFound(name.to_string())),
            1 => Ok(found.remove(0)),
            _ => Err(AgileError::AmbiguousIssue {
                name: name.to_string(),
                stages: found
                    .iter()
                    .map(|i| i.stage.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            }),
        }
    }

    /// Create a new issue in `1-backlog`.
    pub fn create(
        root: &Path,
        issue_type: IssueType,
        name: &str,
        title: &str,
        owner: Option<&str>,
    ) -> Result<Self> {
        paths::validate_slug(name)?;
        match Self::locate(root, name) {
            Ok(_) | Err(AgileError::AmbiguousIssue { .. }) => {
                return Err(AgileError::IssueExists(name.to_string()))
            }
            Err(AgileError::IssueNotFound(_)) => {}
            Err(e) => return Err(e),
        }

        let dir = paths::issue_dir(root, Stage::Backlog, name);
        let created = frontmatter::format_date(frontmatter::today());
        let doc = templates::issue_document(issue_type, title, owner, &created);
        io::atomic_write(&dir.join(issue_type.filename()), doc.as_bytes())?;
        tracing::info!(issue = name, kind = %issue_type, "created issue in {}", Stage::Backlog);

        Ok(Self {
            name: name.to_string(),
            issue_type,
            stage: Stage::Backlog,
            dir,
        })
    }

    /// Every issue, optionally restricted to one stage, ordered by stage then name.
    pub fn list(root: &Path, stage: Option<Stage>) -> Result<Vec<Self>> {
        if !paths::agile_dir(root).is_dir() {
            return Err(AgileError::NotInitialized);
        }
        let stages: Vec<Stage> = match stage {
            Some(s) => vec![s],
            None => Stage::all().to_vec(),
        };

        let mut issues = Vec::new();
        for stage in stages {
            let dir = paths::stage_dir(root, stage);
            if !dir.is_dir() {
                continue;
            }
            for entry in std::fs::read_dir(&dir)? {
                let entry = entry?;
                if !entry.file_type()?.is_dir() {
                    continue;
                }
                match Self::from_dir(&entry.path(), stage) {
                    Some(issue) => issues.push(issue),
                    None => tracing::debug!(
                        path = %entry.path().display(),
                        "skipping folder without a feature.md, bug.md or task.md"
                    ),
                }
            }
        }
        issues.sort_by(|a, b| a.stage.cmp(&b.stage).then_with(|| a.name.cmp(&b.name)));
        Ok(issues)
    }

    pub fn main_doc_path(&self) -> PathBuf {
        self.dir.join(self.issue_type.filename())
    }

    pub fn read_main_doc(&self) -> Result<String> {
        Ok(std::fs::read_to_string(self.main_doc_path())?)
    }

    pub fn write_main_doc(&self, text: &str) -> Result<()> {
        io::atomic_write(&self.main_doc_path(), text.as_bytes())
    }

    pub fn metadata(&self) -> Result<IssueMetadata> {
        let text = self.read_main_doc()?;
        Ok(parse_metadata(self.issue_type, &self.name, &text))
    }

    /// Record `owner` in the main document's `**Owner:**` line.
    pub fn assign(&self, owner: &str) -> Result<()> {
        let text = self.read_main_doc()?;
        let updated = set_metadata_value(&text, MetadataLabel::Owner, owner.trim());
        self.write_main_doc(&updated)?;
        tracing::info!(issue = %self.name, owner = owner.trim(), "assigned owner");
        Ok(())
    }

    /// Move the folder to `agile/archive/<name>-<date>/`.
    pub fn archive(&self, root: &Path, date: NaiveDate) -> Result<PathBuf> {
        let target = paths::archived_issue_dir(root, &self.name, &frontmatter::format_date(date));
        if target.exists() {
            return Err(AgileError::IssueExists(
                target
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| self.name.clone()),
            ));
        }
        io::move_dir(&self.dir, &target)?;
        tracing::info!(issue = %self.name, from = %self.stage, "archived issue");
        Ok(target)
    }

    pub fn delete(&self) -> Result<()> {
        std::fs::remove_dir_all(&self.dir)?;
        tracing::info!(issue = %self.name, stage = %self.stage, "deleted issue");
        Ok(())
    }
}

/// Create `agile/` with every stage directory and `archive/`. Idempotent.
/// Returns true if the layout did not exist before.
pub fn init(root: &Path) -> Result<bool> {
    let fresh = !paths::agile_dir(root).is_dir();
    for &stage in Stage::all() {
        io::ensure_dir(&paths::stage_dir(root, stage))?;
    }
    io::ensure_dir(&paths::archive_dir(root))?;
    Ok(fresh)
}

// ---------------------------------------------------------------------------
// Metadata lines
// ---------------------------------------------------------------------------

/// Body metadata lines written under the title heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataLabel {
    Owner,
    Created,
}

impl MetadataLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            MetadataLabel::Owner => "Owner",
            MetadataLabel::Created => "Created",
        }
    }

    fn pattern(self) -> &'static Regex {
        static OWNER_RE: OnceLock<Regex> = OnceLock::new();
        static CREATED_RE: OnceLock<Regex> = OnceLock::new();
        let cell = match self {
            MetadataLabel::Owner => &OWNER_RE,
            MetadataLabel::Created => &CREATED_RE,
        };
        cell.get_or_init(|| metadata_re(self.as_str()))
    }
}

fn metadata_re(label: &str) -> Regex {
    // `**Owner:** x`, `**Owner**: x`, `Owner: x`, optionally as a list item.
    Regex::new(&format!(
        r"(?mi)^([ \t]*(?:[-*][ \t]+)?\*{{0,2}}{label}\*{{0,2}}[ \t]*:[ \t]*\*{{0,2}}[ \t]*)(.*?)[ \t]*\r?$"
    ))
    .unwrap()
}

static TITLE_RE: OnceLock<Regex> = OnceLock::new();

fn title_re() -> &'static Regex {
    TITLE_RE.get_or_init(|| Regex::new(r"(?m)^#[ \t]+(.+?)[ \t]*\r?$").unwrap())
}

/// Value of a `**Label:** value` line in the body; `None` when absent or empty.
pub fn metadata_value(text: &str, label: MetadataLabel) -> Option<String> {
    let body = frontmatter::body(text);
    label
        .pattern()
        .captures(body)
        .map(|c| c[2].trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Replace the value of a `**Label:** value` line, or insert one after the
/// title heading when the document has none.
pub fn set_metadata_value(text: &str, label: MetadataLabel, value: &str) -> String {
    let body_start = text.len() - frontmatter::body(text).len();
    let (head, body) = text.split_at(body_start);
    let re = label.pattern();

    if let Some(c) = re.captures(body) {
        let value_range = c.get(2).map(|m| m.range()).unwrap_or(0..0);
        return format!(
            "{head}{}{value}{}",
            &body[..value_range.start],
            &body[value_range.end..]
        );
    }

    let line = format!("**{}:** {value}\n", label.as_str());
    match title_re().find(body) {
        Some(m) => {
            let insert_at = body[m.end()..]
                .find('\n')
                .map(|i| m.end() + i + 1)
                .unwrap_or(body.len());
            let sep = if insert_at == body.len() && !body.ends_with('\n') {
                "\n"
            } else {
                ""
            };
            format!(
                "{head}{}{sep}\n{line}{}",
                &body[..insert_at],
                &body[insert_at..]
            )
        }
        None => format!("{head}{line}{body}"),
    }
}

fn parse_metadata(issue_type: IssueType, name: &str, text: &str) -> IssueMetadata {
    let body = frontmatter::body(text);
    let title = title_re()
        .captures(body)
        .map(|c| {
            let heading = c[1].trim();
            // Strip a leading `Feature:` / `Bug:` / `Task:` label.
            match heading.split_once(':') {
                Some((kind, rest))
                    if kind.trim().eq_ignore_ascii_case(issue_type.as_str()) =>
                {
                    rest.trim().to_string()
                }
                _ => heading.to_string(),
            }
        })
        .unwrap_or_else(|| name.to_string());

    let discovery_phase = match issue_type {
        IssueType::Feature => Some(crate::discovery::current_phase(text)),
        _ => None,
    };

    IssueMetadata {
        title,
        owner: metadata_value(text, MetadataLabel::Owner),
        created: metadata_value(text, MetadataLabel::Created).and_then(|v| frontmatter::parse_date(&v)),
        discovery_phase,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
