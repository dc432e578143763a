//! Lazy enumeration of regular files under a tree root.

use std::path::{Path, PathBuf};

use treepatch_core::RelPath;
use walkdir::WalkDir;

use crate::error::SyncError;

/// A regular file found under a root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub rel: RelPath,
}

/// Walk every regular file under `root`, skipping directories whose name is
/// in `excluded_dirs` (at any depth).
///
/// The root is checked eagerly; entries are produced lazily in file-name
/// order. Traversal errors and file names that are not valid UTF-8 surface
/// as `Err` items and are fatal to callers that use `?`.
pub fn walk<'a>(
    root: &Path,
    excluded_dirs: &'a [String],
) -> Result<impl Iterator<Item = Result<SourceFile, SyncError>> + 'a, SyncError> {
    match std::fs::metadata(root) {
        Ok(meta) if meta.is_dir() => {}
        _ => {
            return Err(SyncError::RootNotFound {
                path: root.to_path_buf(),
            })
        }
    }

    let root = root.to_path_buf();
    let walk_root = root.clone();
    let iter = WalkDir::new(&root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(move |entry| {
            !(entry.file_type().is_dir()
                && excluded_dirs
                    .iter()
                    .any(|name| entry.file_name().to_string_lossy() == name.as_str()))
        })
        .filter_map(move |entry| match entry {
            Err(source) => Some(Err(SyncError::Walk {
                root: walk_root.clone(),
                source,
            })),
            Ok(entry) if entry.file_type().is_file() => {
                let relative = entry.path().strip_prefix(&walk_root).unwrap_or(entry.path());
                Some(match RelPath::try_from_path(relative) {
                    Some(rel) => Ok(SourceFile {
                        path: entry.into_path(),
                        rel,
                    }),
                    None => Err(SyncError::NonUtf8Path {
                        path: entry.into_path(),
                    }),
                })
            }
            Ok(_) => None,
        });
    Ok(iter)
}

/// Collect every walked file, failing on the first traversal error.
pub fn collect(root: &Path, excluded_dirs: &[String]) -> Result<Vec<SourceFile>, SyncError> {
    walk(root, excluded_dirs)?.collect()
}
