pub mod discover;
pub mod guidance;
pub mod init;
pub mod issue;
pub mod spec;

use agile_core::{config::Config, issue::Issue, lock::IssueLock, paths, AgileError};
use anyhow::Context;
use std::path::Path;

/// Take the writer lock for `name`. Refuses to run before `agile init` so the
/// lock directory never conjures an `agile/` tree on its own.
pub fn lock_issue(root: &Path, name: &str, cfg: &Config) -> anyhow::Result<IssueLock> {
    if !paths::agile_dir(root).is_dir() {
        return Err(AgileError::NotInitialized.into());
    }
    paths::validate_slug(name)?;
    IssueLock::acquire(root, name, cfg.lock_timeout())
        .with_context(|| format!("failed to lock issue '{name}'"))
}

pub fn load_config(root: &Path) -> anyhow::Result<Config> {
    Config::load(root).context("failed to load agile/config.yaml")
}

pub fn locate(root: &Path, name: &str) -> anyhow::Result<Issue> {
    Ok(Issue::locate(root, name)?)
}
