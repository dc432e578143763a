//! The line-diff capability the generator consumes.
//!
//! [`Differ`] is the seam: the engine only needs "is there a difference" and
//! "give me the unified-diff text". [`SimilarDiffer`] is the production
//! implementation on top of `similar`.

use std::path::Path;

use similar::{Algorithm, DiffTag, TextDiff};

use treepatch_core::{DiffAlgorithm, RelPath};

use crate::error::{io_err, SyncError};

/// Unified-diff text for one relative path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchArtifact {
    old_header: String,
    new_header: String,
    hunks: String,
}

impl PatchArtifact {
    pub fn new(
        old_header: impl Into<String>,
        new_header: impl Into<String>,
        hunks: impl Into<String>,
    ) -> Self {
        Self {
            old_header: old_header.into(),
            new_header: new_header.into(),
            hunks: hunks.into(),
        }
    }

    /// An artifact with no hunks; the two files are identical.
    pub fn empty(rel: &RelPath) -> Self {
        let (old, new) = headers(rel);
        Self::new(old, new, String::new())
    }

    pub fn is_empty(&self) -> bool {
        self.hunks.is_empty()
    }

    /// Textual form; with headers this is a complete unified diff.
    pub fn render(&self, include_headers: bool) -> String {
        if !include_headers || self.is_empty() {
            return self.hunks.clone();
        }
        format!(
            "--- {}\n+++ {}\n{}",
            self.old_header, self.new_header, self.hunks
        )
    }
}

/// Produces a [`PatchArtifact`] for a baseline/modified file pair.
pub trait Differ: Send + Sync {
    fn diff(
        &self,
        algorithm: DiffAlgorithm,
        base: &Path,
        patched: &Path,
        rel: &RelPath,
    ) -> Result<PatchArtifact, SyncError>;
}

/// Line differ backed by `similar`.
#[derive(Debug, Clone, Copy)]
pub struct SimilarDiffer {
    context_radius: usize,
}

impl SimilarDiffer {
    pub fn new(context_radius: usize) -> Self {
        Self { context_radius }
    }
}

impl Default for SimilarDiffer {
    fn default() -> Self {
        Self::new(3)
    }
}

impl Differ for SimilarDiffer {
    fn diff(
        &self,
        algorithm: DiffAlgorithm,
        base: &Path,
        patched: &Path,
        rel: &RelPath,
    ) -> Result<PatchArtifact, SyncError> {
        let old = std::fs::read(base).map_err(|e| io_err(base, e))?;
        let new = std::fs::read(patched).map_err(|e| io_err(patched, e))?;
        if old == new {
            return Ok(PatchArtifact::empty(rel));
        }
        let old = as_text(base, &old)?;
        let new = as_text(patched, &new)?;
        Ok(diff_text(algorithm, self.context_radius, rel, old, new))
    }
}

/// Diff two in-memory texts line by line.
pub fn diff_text(
    algorithm: DiffAlgorithm,
    context_radius: usize,
    rel: &RelPath,
    old: &str,
    new: &str,
) -> PatchArtifact {
    let diff = TextDiff::configure()
        .algorithm(to_similar(algorithm))
        .diff_lines(old, new);
    let (old_header, new_header) = headers(rel);
    if diff.ops().iter().all(|op| op.tag() == DiffTag::Equal) {
        return PatchArtifact::new(old_header, new_header, String::new());
    }
    let hunks = diff
        .unified_diff()
        .context_radius(context_radius)
        .to_string();
    PatchArtifact::new(old_header, new_header, hunks)
}

fn headers(rel: &RelPath) -> (String, String) {
    (format!("a/{rel}"), format!("b/{rel}"))
}

fn as_text<'b>(path: &Path, bytes: &'b [u8]) -> Result<&'b str, SyncError> {
    std::str::from_utf8(bytes).map_err(|_| SyncError::NotText {
        path: path.to_path_buf(),
    })
}

fn to_similar(algorithm: DiffAlgorithm) -> Algorithm {
    match algorithm {
        DiffAlgorithm::Myers => Algorithm::Myers,
        DiffAlgorithm::Patience => Algorithm::Patience,
        DiffAlgorithm::Lcs => Algorithm::Lcs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn identical_text_is_empty() {
        let rel = RelPath::from("a.cs");
        let artifact = diff_text(DiffAlgorithm::Myers, 3, &rel, "x\ny\n", "x\ny\n");
        assert!(artifact.is_empty());
        assert_eq!(artifact.render(true), "");
    }

    #[test]
    fn changed_text_renders_headers_and_hunks() {
        let rel = RelPath::from("dir/a.cs");
        let artifact = diff_text(
            DiffAlgorithm::Patience,
            3,
            &rel,
            "one\ntwo\nthree\n",
            "one\n2\nthree\n",
        );
        assert!(!artifact.is_empty());
        let text = artifact.render(true);
        assert!(text.starts_with("--- a/dir/a.cs\n+++ b/dir/a.cs\n@@"));
        assert!(text.contains("-two\n"));
        assert!(text.contains("+2\n"));
        assert!(!artifact.render(false).contains("+++"));
    }

    #[test]
    fn binary_difference_is_not_text() {
        let tmp = TempDir::new().unwrap();
        let base = tmp.path().join("a.png");
        let patched = tmp.path().join("b.png");
        fs::write(&base, [0x89, b'P', b'N', b'G', 0xff, 0x00]).unwrap();
        fs::write(&patched, [0x89, b'P', b'N', b'G', 0xfe, 0x00]).unwrap();

        let err = SimilarDiffer::default()
            .diff(DiffAlgorithm::Myers, &base, &patched, &RelPath::from("a.png"))
            .unwrap_err();
        assert!(matches!(err, SyncError::NotText { .. }));
    }

    #[test]
    fn identical_binary_is_empty() {
        let tmp = TempDir::new().unwrap();
        let base = tmp.path().join("a.ico");
        let patched = tmp.path().join("b.ico");
        fs::write(&base, [0xff, 0xfe, 0x00]).unwrap();
        fs::write(&patched, [0xff, 0xfe, 0x00]).unwrap();

        let artifact = SimilarDiffer::default()
            .diff(DiffAlgorithm::Myers, &base, &patched, &RelPath::from("a.ico"))
            .unwrap();
        assert!(artifact.is_empty());
    }

    #[test]
    fn missing_input_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let err = SimilarDiffer::default()
            .diff(
                DiffAlgorithm::Myers,
                &tmp.path().join("nope"),
                &tmp.path().join("nope2"),
                &RelPath::from("nope"),
            )
            .unwrap_err();
        assert!(matches!(err, SyncError::Io { .. }));
    }
}
