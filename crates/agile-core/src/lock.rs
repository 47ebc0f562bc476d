//! Advisory per-issue writer lock.
//!
//! Every mutating command holds an exclusive `fs2` lock on
//! `agile/.locks/<issue>.lock` for its duration, so two invocations touching
//! the same issue are serialized instead of silently losing a write. The lock
//! lives outside the issue folder because the folder itself moves. Advisory
//! locks are cooperative: hand edits are not blocked.

use crate::error::{AgileError, Result};
use crate::paths;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(25);

#[derive(Debug)]
pub struct IssueLock {
    file: File,
    path: PathBuf,
}

impl IssueLock {
    /// Block until the lock for `name` is free or `timeout` elapses.
    pub fn acquire(root: &Path, name: &str, timeout: Duration) -> Result<Self> {
        let path = paths::lock_path(root, name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        let started = Instant::now();
        let mut waited = false;
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => {
                    if waited {
                        tracing::debug!(issue = name, waited_ms = started.elapsed().as_millis() as u64, "acquired issue lock");
                    }
                    return Ok(Self { file, path });
                }
                Err(e) if e.kind() == fs2::lock_contended_error().kind() => {
                    if started.elapsed() >= timeout {
                        return Err(AgileError::LockTimeout(name.to_string()));
                    }
                    if !waited {
                        tracing::info!(issue = name, "waiting for another writer to release the issue");
                        waited = true;
                    }
                    std::thread::sleep(POLL_INTERVAL);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for IssueLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}
