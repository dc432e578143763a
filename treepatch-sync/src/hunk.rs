//! Destination hunk-offset normalization.
//!
//! `@@ -A,B +C,D @@` becomes `@@ -A,B +_,D @@`, so a patch stops changing
//! every time an unrelated edit earlier in the destination file shifts line
//! numbers. Lengths that `similar` omits (`@@ -3 +3 @@`) stay omitted.
//!
//! A default run leaves hunk headers alone. The rewrite is applied at
//! generation time when `normalize_hunk_offsets` is set, or on demand through
//! [`normalize_patch_set`].

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use treepatch_core::RelPath;

use crate::error::{io_err, SyncError};
use crate::paths::PATCH_SUFFIX;
use crate::walker;
use crate::writer::{write_if_changed, WriteOutcome};

fn hunk_header() -> &'static Regex {
    static HUNK_HEADER: OnceLock<Regex> = OnceLock::new();
    HUNK_HEADER.get_or_init(|| {
        Regex::new(r"^@@ -(\d+)(,\d+)? \+([_\d]+)(,\d+)? @@").expect("hunk header regex is valid")
    })
}

/// Replace the destination start line of every hunk header with `_`.
///
/// Only lines beginning with `@@` are touched; line endings are preserved.
pub fn strip_dest_hunk_offsets(patch_text: &str) -> String {
    let re = hunk_header();
    let mut out = String::with_capacity(patch_text.len());
    for line in patch_text.split_inclusive('\n') {
        if line.starts_with("@@") {
            out.push_str(&re.replace(line, "@@ -${1}${2} +_${4} @@"));
        } else {
            out.push_str(line);
        }
    }
    out
}

/// Rewrite every `.patch` under `patch_dir` in place.
///
/// A file whose own relative path exists under `patched_root` is a verbatim
/// copy that merely ends in `.patch`, and is left alone. Returns the
/// artifacts whose content changed.
pub fn normalize_patch_set(
    patch_dir: &Path,
    patched_root: &Path,
) -> Result<Vec<RelPath>, SyncError> {
    let mut rewritten = Vec::new();
    for file in walker::walk(patch_dir, &[])? {
        let file = file?;
        if !file.rel.ends_with(PATCH_SUFFIX) || file.rel.under(patched_root).is_file() {
            continue;
        }
        let text = std::fs::read_to_string(&file.path).map_err(|e| io_err(&file.path, e))?;
        let normalized = strip_dest_hunk_offsets(&text);
        if write_if_changed(&file.path, normalized.as_bytes())? == WriteOutcome::Written {
            tracing::info!(path = %file.rel, "normalized hunk offsets");
            rewritten.push(file.rel);
        }
    }
    Ok(rewritten)
}
