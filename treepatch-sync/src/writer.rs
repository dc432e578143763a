//! Hash-gated atomic writes into the patch set.
//!
//! ## `write_if_changed` protocol
//!
//! 1. SHA-256 hash the new bytes.
//! 2. Hash the file currently on disk, if any.
//! 3. Identical → leave the file (and its mtime) alone.
//! 4. Ensure the parent directory exists (concurrent creation is fine).
//! 5. Write to `<path>.treepatch.tmp`.
//! 6. Rename to the final path (atomic on POSIX).

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::error::{io_err, SyncError};
use crate::paths::TMP_SUFFIX;

/// Outcome of a single gated write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Content changed or the file did not previously exist.
    Written,
    /// On-disk content already matches.
    Unchanged,
}

/// Atomically write `content` to `path` unless it already holds those bytes.
pub fn write_if_changed(path: &Path, content: &[u8]) -> Result<WriteOutcome, SyncError> {
    let tmp = PathBuf::from(format!("{}{}", path.display(), TMP_SUFFIX));
    write_if_changed_with_tmp(path, content, &tmp)
}

fn write_if_changed_with_tmp(
    path: &Path,
    content: &[u8],
    tmp: &Path,
) -> Result<WriteOutcome, SyncError> {
    let digest = sha256_hex(content);
    if let Some(existing) = hash_existing(path)? {
        if existing == digest {
            tracing::debug!("unchanged: {}", path.display());
            return Ok(WriteOutcome::Unchanged);
        }
    }

    ensure_parent(path)?;
    std::fs::write(tmp, content).map_err(|e| io_err(tmp, e))?;

    if let Err(e) = std::fs::rename(tmp, path) {
        let _ = std::fs::remove_file(tmp);
        return Err(io_err(path, e));
    }
    Ok(WriteOutcome::Written)
}

/// Copy `src` byte-for-byte to `dst` through [`write_if_changed`].
pub fn copy_if_changed(src: &Path, dst: &Path) -> Result<WriteOutcome, SyncError> {
    let bytes = std::fs::read(src).map_err(|e| io_err(src, e))?;
    write_if_changed(dst, &bytes)
}

/// Delete `path`; a missing file is not an error. Returns whether a file was removed.
pub fn remove_if_exists(path: &Path) -> Result<bool, SyncError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
        Err(err) => Err(io_err(path, err)),
    }
}

/// Create the parent directory of `path`.
///
/// `create_dir_all` treats a directory that appears concurrently as success,
/// so workers racing on a shared parent are fine.
pub fn ensure_parent(path: &Path) -> Result<(), SyncError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    Ok(())
}

fn hash_existing(path: &Path) -> Result<Option<String>, SyncError> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(sha256_hex(&bytes))),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(io_err(path, err)),
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut h = Sha256::new();
    h.update(bytes);
    hex::encode(h.finalize())
}
