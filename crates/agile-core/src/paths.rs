use crate::error::{AgileError, Result};
use crate::types::Stage;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const AGILE_DIR: &str = "agile";
pub const ARCHIVE_DIR: &str = "agile/archive";
pub const LOCKS_DIR: &str = "agile/.locks";
pub const CONFIG_FILE: &str = "agile/config.yaml";

pub const GUIDANCE_FILE: &str = "technical-guidance.md";
pub const SPEC_SUFFIX: &str = ".spec.md";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn agile_dir(root: &Path) -> PathBuf {
    root.join(AGILE_DIR)
}

pub fn stage_dir(root: &Path, stage: Stage) -> PathBuf {
    agile_dir(root).join(stage.as_str())
}

pub fn issue_dir(root: &Path, stage: Stage, name: &str) -> PathBuf {
    stage_dir(root, stage).join(name)
}

pub fn archive_dir(root: &Path) -> PathBuf {
    root.join(ARCHIVE_DIR)
}

/// `agile/archive/<name>-<YYYY-MM-DD>/`
pub fn archived_issue_dir(root: &Path, name: &str, date: &str) -> PathBuf {
    archive_dir(root).join(format!("{name}-{date}"))
}

pub fn lock_path(root: &Path, name: &str) -> PathBuf {
    root.join(LOCKS_DIR).join(format!("{name}.lock"))
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn guidance_path(issue_dir: &Path) -> PathBuf {
    issue_dir.join(GUIDANCE_FILE)
}

pub fn spec_path(issue_dir: &Path, spec_name: &str) -> PathBuf {
    issue_dir.join(format!("{spec_name}{SPEC_SUFFIX}"))
}

/// Strip the `.spec.md` suffix from a file name, if present.
pub fn spec_name_from_file(file_name: &str) -> Option<&str> {
    file_name
        .strip_suffix(SPEC_SUFFIX)
        .filter(|name| !name.is_empty())
}

// ---------------------------------------------------------------------------
// Slug validation
// ---------------------------------------------------------------------------

static SLUG_RE: OnceLock<Regex> = OnceLock::new();

fn slug_re() -> &'static Regex {
    SLUG_RE.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9\-]*[a-z0-9]$|^[a-z0-9]$").unwrap())
}

pub fn validate_slug(slug: &str) -> Result<()> {
    if slug.is_empty() || slug.len() > 64 || !slug_re().is_match(slug) {
        return Err(AgileError::InvalidSlug(slug.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
