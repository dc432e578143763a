//! Naming rules inside the patch set.
//!
//! A changed file `<rel>` is stored as `<rel>.patch`; a wholly new file is
//! stored verbatim at `<rel>`. [`target_to_artifact_path`] and
//! [`artifact_path_to_target_path`] are inverses for every `rel` that does
//! not itself end in [`PATCH_SUFFIX`].

use treepatch_core::RelPath;

/// Suffix appended to a target path to name its patch artifact.
pub const PATCH_SUFFIX: &str = ".patch";

/// Manifest of baseline files absent from the modified tree.
pub const REMOVED_FILES_LIST: &str = "removed_files.list";

/// Suffix of in-flight atomic writes.
pub const TMP_SUFFIX: &str = ".treepatch.tmp";

/// `a/b.cs` → `a/b.cs.patch`.
pub fn target_to_artifact_path(target: &RelPath) -> RelPath {
    target.with_suffix(PATCH_SUFFIX)
}

/// `a/b.cs.patch` → `a/b.cs`; anything else maps to itself (verbatim copy).
pub fn artifact_path_to_target_path(artifact: &RelPath) -> RelPath {
    artifact
        .strip_suffix(PATCH_SUFFIX)
        .unwrap_or_else(|| artifact.clone())
}

pub fn is_manifest(rel: &RelPath) -> bool {
    rel.as_str() == REMOVED_FILES_LIST
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_suffix_is_stripped() {
        let artifact = RelPath::from("Terraria/Main.cs.patch");
        assert_eq!(
            artifact_path_to_target_path(&artifact),
            RelPath::from("Terraria/Main.cs")
        );
    }

    #[test]
    fn verbatim_copy_maps_to_itself() {
        let copy = RelPath::from("Terraria/NewFile.cs");
        assert_eq!(artifact_path_to_target_path(&copy), copy);
    }

    #[test]
    fn inverse_round_trip() {
        for raw in ["a.cs", "dir/sub/b.json", "App.config"] {
            let target = RelPath::from(raw);
            let artifact = target_to_artifact_path(&target);
            assert_eq!(artifact_path_to_target_path(&artifact), target);
        }
    }

    #[test]
    fn manifest_detection_is_root_only() {
        assert!(is_manifest(&RelPath::from(REMOVED_FILES_LIST)));
        assert!(!is_manifest(&RelPath::from("sub/removed_files.list")));
    }
}
