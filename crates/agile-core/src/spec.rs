use crate::error::{AgileError, Result};
use crate::types::SpecStatus;
use crate::{frontmatter, io, paths, templates};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

const STATUS_KEY: &str = "status";
const CREATED_KEY: &str = "created";
const COMPLETED_KEY: &str = "completed";
const DEPENDENCIES_KEY: &str = "dependencies";
const SPEC_KEYS: &[&str] = &[STATUS_KEY, CREATED_KEY, COMPLETED_KEY, DEPENDENCIES_KEY];

// ---------------------------------------------------------------------------
// Spec
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Spec {
    pub name: String,
    pub title: String,
    pub status: SpecStatus,
    pub created: NaiveDate,
    /// Set iff `status` is `completed`.
    pub completed: Option<DateTime<Utc>>,
    /// Advisory only: consulted by [`suggest_next`], never enforced.
    pub dependencies: Vec<String>,
    #[serde(skip)]
    pub path: PathBuf,
}

impl Spec {
    /// Decode a spec document. Unknown or malformed values fall back to
    /// `pending`, today, and no dependencies.
    pub fn decode(name: &str, path: &Path, text: &str) -> Self {
        let fields = frontmatter::read(text, SPEC_KEYS);
        let status = fields
            .parse::<SpecStatus>(STATUS_KEY)
            .unwrap_or(SpecStatus::Pending);
        let completed = match status {
            SpecStatus::Completed => fields.timestamp(COMPLETED_KEY),
            _ => None,
        };
        let title = frontmatter::body(text)
            .lines()
            .find_map(|l| l.strip_prefix("# "))
            .map(|h| {
                let h = h.trim();
                h.strip_prefix("Spec:").map(str::trim).unwrap_or(h).to_string()
            })
            .unwrap_or_else(|| name.to_string());

        Self {
            name: name.to_string(),
            title,
            status,
            created: fields.date(CREATED_KEY).unwrap_or_else(frontmatter::today),
            completed,
            dependencies: fields.list(DEPENDENCIES_KEY),
            path: path.to_path_buf(),
        }
    }

    pub fn load(issue_dir: &Path, name: &str) -> Result<Self> {
        paths::validate_slug(name)?;
        let path = paths::spec_path(issue_dir, name);
        if !path.is_file() {
            return Err(AgileError::SpecNotFound(name.to_string()));
        }
        Self::read(name, &path)
    }

    /// Decode the file at `path`. A hand-edited `status: completed` without a
    /// readable `completed` timestamp takes the file's modification time.
    fn read(name: &str, path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let mut spec = Self::decode(name, path, &text);
        if spec.is_completed() && spec.completed.is_none() {
            spec.completed = std::fs::metadata(path)
                .and_then(|m| m.modified())
                .ok()
                .map(DateTime::<Utc>::from);
        }
        Ok(spec)
    }

    pub fn is_completed(&self) -> bool {
        self.status == SpecStatus::Completed
    }
}

// ---------------------------------------------------------------------------
// Tracker operations
// ---------------------------------------------------------------------------

/// Every `*.spec.md` in the issue folder, in-progress first, then in-review,
/// pending and completed; ties broken by name.
pub fn list_specs(issue_dir: &Path) -> Result<Vec<Spec>> {
    let mut specs = Vec::new();
    for entry in std::fs::read_dir(issue_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy().into_owned();
        let Some(name) = paths::spec_name_from_file(&file_name) else {
            continue;
        };
        specs.push(Spec::read(name, &entry.path())?);
    }
    specs.sort_by(|a, b| {
        a.status
            .sort_rank()
            .cmp(&b.status.sort_rank())
            .then_with(|| a.name.cmp(&b.name))
    });
    Ok(specs)
}

pub fn add_spec(issue_dir: &Path, name: &str, title: &str, dependencies: &[String]) -> Result<Spec> {
    paths::validate_slug(name)?;
    let path = paths::spec_path(issue_dir, name);
    if path.exists() {
        return Err(AgileError::SpecExists(name.to_string()));
    }
    let created = frontmatter::format_date(frontmatter::today());
    let doc = templates::spec_document(title, &created, dependencies);
    io::atomic_write(&path, doc.as_bytes())?;
    tracing::debug!(spec = name, "added spec");
    Ok(Spec::decode(name, &path, &doc))
}

/// Rewrite the status of `spec`, keeping the completion timestamp in step:
/// set to now on entering `completed` (also when re-completing), cleared for
/// any other status.
pub fn update_status(spec: &Spec, status: SpecStatus) -> Result<Spec> {
    update_status_at(spec, status, Utc::now())
}

pub fn update_status_at(spec: &Spec, status: SpecStatus, now: DateTime<Utc>) -> Result<Spec> {
    let text = std::fs::read_to_string(&spec.path)?;
    let text = frontmatter::write(&text, STATUS_KEY, status.as_str());
    let completed = match status {
        SpecStatus::Completed => frontmatter::format_timestamp(now),
        _ => String::new(),
    };
    let text = frontmatter::write(&text, COMPLETED_KEY, &completed);
    io::atomic_write(&spec.path, text.as_bytes())?;
    tracing::debug!(spec = %spec.name, from = %spec.status, to = %status, "updated spec status");
    Ok(Spec::decode(&spec.name, &spec.path, &text))
}

/// Replace the advisory dependency list.
pub fn set_dependencies(spec: &Spec, dependencies: &[String]) -> Result<Spec> {
    for dep in dependencies {
        paths::validate_slug(dep)?;
    }
    let text = std::fs::read_to_string(&spec.path)?;
    let text = frontmatter::write_list(&text, DEPENDENCIES_KEY, dependencies);
    io::atomic_write(&spec.path, text.as_bytes())?;
    Ok(Spec::decode(&spec.name, &spec.path, &text))
}

pub fn delete_spec(issue_dir: &Path, name: &str) -> Result<()> {
    paths::validate_slug(name)?;
    let path = paths::spec_path(issue_dir, name);
    if !path.is_file() {
        return Err(AgileError::SpecNotFound(name.to_string()));
    }
    std::fs::remove_file(&path)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Aggregates
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CompletionStatus {
    pub total: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub in_review: usize,
    pub completed: usize,
    /// At least one spec, and none left unfinished.
    pub all_completed: bool,
}

pub fn completion_status(specs: &[Spec]) -> CompletionStatus {
    let count = |s: SpecStatus| specs.iter().filter(|spec| spec.status == s).count();
    let pending = count(SpecStatus::Pending);
    let in_progress = count(SpecStatus::InProgress);
    let in_review = count(SpecStatus::InReview);
    CompletionStatus {
        total: specs.len(),
        pending,
        in_progress,
        in_review,
        completed: count(SpecStatus::Completed),
        all_completed: !specs.is_empty() && pending + in_progress + in_review == 0,
    }
}

/// Human-readable summary: "1/3 completed, 1 in progress, 0 in review, 1 pending"
pub fn summarize(status: &CompletionStatus) -> String {
    format!(
        "{}/{} completed, {} in progress, {} in review, {} pending",
        status.completed, status.total, status.in_progress, status.in_review, status.pending
    )
}

/// The spec to work on next: anything already in progress, otherwise the
/// first pending spec whose dependencies are all completed.
pub fn suggest_next(specs: &[Spec]) -> Option<&Spec> {
    if let Some(active) = specs.iter().find(|s| s.status == SpecStatus::InProgress) {
        return Some(active);
    }
    let completed: HashSet<&str> = specs
        .iter()
        .filter(|s| s.is_completed())
        .map(|s| s.name.as_str())
        .collect();
    specs.iter().find(|s| {
        s.status == SpecStatus::Pending
            && s.dependencies.iter().all(|d| completed.contains(d.as_str()))
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
