use crate::error::Result;
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Atomically write `data` to `path` using a tempfile in the same directory.
/// Prevents partial writes from corrupting hand-edited documents.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Create a directory and all parents, idempotent.
pub fn ensure_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path)?;
    Ok(())
}

/// How a directory relocation was carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveMethod {
    Rename,
    CopyVerifyDelete,
}

/// Relocate directory `from` to `to`.
///
/// The destination's parent is created first so a failure never leaves the
/// directory unreachable. A plain rename is used where possible. When the
/// rename crosses filesystems the tree is copied, the copy is verified by
/// file count and byte total, and only then is the source removed. A failed
/// copy or verification removes the partial copy and leaves the source in place.
pub fn move_dir(from: &Path, to: &Path) -> Result<MoveMethod> {
    if let Some(parent) = to.parent() {
        ensure_dir(parent)?;
    }
    match std::fs::rename(from, to) {
        Ok(()) => Ok(MoveMethod::Rename),
        Err(e) if e.kind() == std::io::ErrorKind::CrossesDevices => {
            tracing::warn!(
                from = %from.display(),
                to = %to.display(),
                "rename crosses devices; falling back to copy + verify + delete"
            );
            copy_verify_delete(from, to)?;
            Ok(MoveMethod::CopyVerifyDelete)
        }
        Err(e) => Err(e.into()),
    }
}

/// Copy `from` to `to`, verify the copy, then remove `from`. A failure before
/// the source is removed also removes the partial copy, leaving `from` as the
/// only copy.
fn copy_verify_delete(from: &Path, to: &Path) -> Result<()> {
    if let Err(e) = copy_and_verify(from, to) {
        discard_partial_copy(to);
        return Err(e);
    }
    if let Err(e) = std::fs::remove_dir_all(from) {
        tracing::error!(
            from = %from.display(),
            to = %to.display(),
            error = %e,
            "copy verified but the source could not be removed; delete it by hand"
        );
        return Err(e.into());
    }
    Ok(())
}

fn copy_and_verify(from: &Path, to: &Path) -> Result<()> {
    copy_dir(from, to)?;
    let expected = tree_stats(from)?;
    let actual = tree_stats(to)?;
    if expected != actual {
        return Err(std::io::Error::other(format!(
            "copy of {} did not verify ({} files/{} bytes, expected {} files/{} bytes)",
            from.display(),
            actual.0,
            actual.1,
            expected.0,
            expected.1
        ))
        .into());
    }
    Ok(())
}

fn discard_partial_copy(to: &Path) {
    if !to.exists() {
        return;
    }
    match std::fs::remove_dir_all(to) {
        Ok(()) => tracing::info!(path = %to.display(), "removed partial copy"),
        Err(e) => tracing::error!(
            path = %to.display(),
            error = %e,
            "failed to remove partial copy; delete it by hand"
        ),
    }
}

fn copy_dir(from: &Path, to: &Path) -> Result<()> {
    ensure_dir(to)?;
    for entry in std::fs::read_dir(from)? {
        let entry = entry?;
        let target = to.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir(&entry.path(), &target)?;
        } else {
            std::fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// (file count, total bytes) for every regular file under `dir`.
fn tree_stats(dir: &Path) -> Result<(u64, u64)> {
    let mut files = 0;
    let mut bytes = 0;
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let meta = entry.metadata()?;
        if meta.is_dir() {
            let (f, b) = tree_stats(&entry.path())?;
            files += f;
            bytes += b;
        } else {
            files += 1;
            bytes += meta.len();
        }
    }
    Ok((files, bytes))
}
