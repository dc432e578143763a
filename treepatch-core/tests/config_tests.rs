//! Profile load/save and settings-store integration tests.

use assert_fs::prelude::*;
use chrono::{TimeZone, Utc};
use predicates::prelude::*;
use rstest::rstest;
use std::path::{Path, PathBuf};
use treepatch_core::{
    config::{self, DEFAULT_EXCLUDED_DIRS, DEFAULT_EXTENSIONS},
    settings, CoreError, DiffAlgorithm, FileSetting, Setting, SyncConfig,
};

// ---------------------------------------------------------------------------
// 1. Load error messages
// ---------------------------------------------------------------------------

#[test]
fn load_missing_config_points_at_init() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let err = config::load_at(&dir.path().join("treepatch.yaml")).unwrap_err();
    assert!(matches!(err, CoreError::ConfigNotFound { .. }), "got: {err}");
    assert!(err.to_string().contains("treepatch init"));
}

#[test]
fn load_corrupt_yaml_reports_path() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("treepatch.yaml");
    file.write_str(": : corrupt : yaml : !!!\n  - broken: [unclosed").unwrap();

    let err = config::load_at(file.path()).unwrap_err();
    assert!(matches!(err, CoreError::Parse { .. }), "got: {err}");
    assert!(err.to_string().contains("treepatch.yaml"));
}

#[rstest]
#[case::same_trees("base_dir: a\npatched_dir: a\npatch_dir: p\n", "must differ")]
#[case::patches_inside_source("base_dir: a\npatched_dir: b\npatch_dir: b\n", "patch_dir")]
#[case::patches_nested_in_modified("base_dir: a\npatched_dir: b\npatch_dir: b/patches\n", "patched_dir")]
#[case::patches_nested_in_baseline("base_dir: a\npatched_dir: b\npatch_dir: a/out\n", "base_dir")]
#[case::patches_enclose_modified("base_dir: a\npatched_dir: work/b\npatch_dir: work\n", "patched_dir")]
#[case::zero_jobs("base_dir: a\npatched_dir: b\npatch_dir: p\njobs: 0\n", "jobs")]
#[case::blank_name("name: ' '\nbase_dir: a\npatched_dir: b\npatch_dir: p\n", "name")]
fn load_rejects_invalid_profiles(#[case] yaml: &str, #[case] needle: &str) {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("treepatch.yaml");
    file.write_str(yaml).unwrap();

    let err = config::load_at(file.path()).unwrap_err();
    assert!(matches!(err, CoreError::InvalidConfig(_)), "got: {err}");
    assert!(err.to_string().contains(needle), "got: {err}");
}

// ---------------------------------------------------------------------------
// 2. Defaults and resolution
// ---------------------------------------------------------------------------

#[test]
fn minimal_profile_gets_defaults() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("treepatch.yaml");
    file.write_str("base_dir: base\npatched_dir: src\npatch_dir: patches\n")
        .unwrap();

    let cfg = config::load_at(file.path()).unwrap();
    assert_eq!(cfg.name, "default");
    assert_eq!(cfg.extensions, DEFAULT_EXTENSIONS);
    assert_eq!(cfg.excluded_dirs, DEFAULT_EXCLUDED_DIRS);
    assert_eq!(cfg.algorithm, DiffAlgorithm::Myers);
    assert_eq!(cfg.context_radius, 3);
    assert_eq!(cfg.jobs, None);
    assert!(!cfg.normalize_hunk_offsets);
    assert_eq!(cfg.cutoff_key(), "default.diff_cutoff");
}

#[test]
fn load_resolved_anchors_relative_dirs_at_config_location() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("profiles/treepatch.yaml");
    file.write_str("base_dir: ../base\npatched_dir: /abs/src\npatch_dir: patches\n")
        .unwrap();

    let cfg = config::load_resolved_at(file.path()).unwrap();
    let origin = dir.path().join("profiles");
    assert_eq!(cfg.base_dir, origin.join("../base"));
    assert_eq!(cfg.patched_dir, PathBuf::from("/abs/src"));
    assert_eq!(cfg.patch_dir, origin.join("patches"));
}

#[test]
fn bare_file_name_resolves_against_working_dir() {
    assert_eq!(config::config_origin(Path::new("treepatch.yaml")), PathBuf::from("."));
}

// ---------------------------------------------------------------------------
// 3. Save
// ---------------------------------------------------------------------------

#[rstest]
#[case(DiffAlgorithm::Myers)]
#[case(DiffAlgorithm::Patience)]
#[case(DiffAlgorithm::Lcs)]
fn save_then_load_preserves_profile(#[case] algorithm: DiffAlgorithm) {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let path = dir.path().join("nested/treepatch.yaml");
    let mut cfg = SyncConfig::new("base", "src", "patches");
    cfg.name = "tml".into();
    cfg.algorithm = algorithm;
    cfg.jobs = Some(3);

    config::save_at(&path, &cfg).unwrap();
    dir.child("nested/treepatch.yaml")
        .assert(predicate::str::contains(format!("algorithm: {algorithm}")));
    dir.child("nested/treepatch.yaml.tmp")
        .assert(predicate::path::missing());
    assert_eq!(config::load_at(&path).unwrap(), cfg);
}

#[test]
fn save_refuses_invalid_profile() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let path = dir.path().join("treepatch.yaml");
    let cfg = SyncConfig::new("same", "same", "patches");
    assert!(config::save_at(&path, &cfg).is_err());
    assert!(!path.exists());
}

// ---------------------------------------------------------------------------
// 4. Settings store
// ---------------------------------------------------------------------------

#[test]
fn cutoff_keys_for_different_profiles_coexist() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let a = FileSetting::<Option<chrono::DateTime<Utc>>>::at_home(home.path(), "a.diff_cutoff");
    let b = FileSetting::<Option<chrono::DateTime<Utc>>>::at_home(home.path(), "b.diff_cutoff");
    let t1 = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
    let t2 = Utc.with_ymd_and_hms(2025, 6, 7, 8, 9, 10).unwrap();

    assert_eq!(a.get().unwrap(), None);
    a.set(Some(t1)).unwrap();
    b.set(Some(t2)).unwrap();

    assert_eq!(a.get().unwrap(), Some(t1));
    assert_eq!(b.get().unwrap(), Some(t2));
    home.child(".treepatch/settings.json").assert(
        predicate::str::contains("a.diff_cutoff").and(predicate::str::contains("b.diff_cutoff")),
    );
}

#[test]
fn settings_file_is_plain_json_object() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let path = settings::settings_path_at(home.path());
    let setting = FileSetting::<u32>::new(&path, "answer");
    setting.set(42).unwrap();

    let doc = settings::load(&path).unwrap();
    assert_eq!(doc.get("answer"), Some(&serde_json::json!(42)));
}
