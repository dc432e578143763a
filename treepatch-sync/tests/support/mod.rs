//! Shared fixtures for treepatch-sync integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use filetime::{set_file_mtime, FileTime};
use tempfile::TempDir;
use treepatch_core::{RelPath, SyncConfig};
use treepatch_sync::{CutoffState, DiffEngine, Differ};

pub struct Fixture {
    pub tmp: TempDir,
    pub config: SyncConfig,
}

impl Fixture {
    pub fn new() -> Self {
        let tmp = TempDir::new().expect("tempdir");
        let mut config = SyncConfig::new(
            tmp.path().join("base"),
            tmp.path().join("src"),
            tmp.path().join("patches"),
        );
        config.jobs = Some(4);
        fs::create_dir_all(&config.base_dir).expect("mkdir base");
        fs::create_dir_all(&config.patched_dir).expect("mkdir src");
        Self { tmp, config }
    }

    pub fn base(&self) -> &Path {
        &self.config.base_dir
    }

    pub fn src(&self) -> &Path {
        &self.config.patched_dir
    }

    pub fn patches(&self) -> &Path {
        &self.config.patch_dir
    }

    pub fn engine(&self) -> DiffEngine {
        DiffEngine::from_config(self.config.clone(), CutoffState::in_memory(None)).expect("engine")
    }

    pub fn engine_with(&self, differ: Box<dyn Differ>, cutoff: CutoffState) -> DiffEngine {
        DiffEngine::new(self.config.clone(), differ, cutoff).expect("engine")
    }
}

pub fn write(root: &Path, rel: &str, content: impl AsRef<[u8]>) -> PathBuf {
    let path = RelPath::from(rel).under(root);
    fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    fs::write(&path, content).expect("write");
    path
}

/// Write and push the mtime into the future so the next incremental run sees it.
pub fn edit(root: &Path, rel: &str, content: impl AsRef<[u8]>) -> PathBuf {
    let path = write(root, rel, content);
    let future = FileTime::from_system_time(SystemTime::now() + Duration::from_secs(120));
    set_file_mtime(&path, future).expect("set mtime");
    path
}

/// Every file under `root` keyed by `/`-separated relative path.
pub fn snapshot(root: &Path) -> BTreeMap<String, Vec<u8>> {
    let mut out = BTreeMap::new();
    if !root.exists() {
        return out;
    }
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in fs::read_dir(&dir).expect("read_dir") {
            let path = entry.expect("entry").path();
            if path.is_dir() {
                stack.push(path);
            } else {
                let rel = RelPath::from_path(path.strip_prefix(root).expect("prefix"));
                out.insert(rel.to_string(), fs::read(&path).expect("read"));
            }
        }
    }
    out
}

/// Every directory under `root` (excluding `root`).
pub fn dirs(root: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in fs::read_dir(&dir).expect("read_dir") {
            let path = entry.expect("entry").path();
            if path.is_dir() {
                out.push(path.clone());
                stack.push(path);
            }
        }
    }
    out
}

/// Minimal unified-diff applier for round-trip checks.
///
/// Understands `@@ -a[,b] +c[,d] @@` hunks, ` `/`-`/`+` lines and the
/// `\ No newline at end of file` marker. Context is not verified.
pub fn apply_unified(base: &str, patch: &str) -> String {
    let base_lines: Vec<&str> = base.split_inclusive('\n').collect();
    let mut out = String::new();
    let mut cursor = 0usize;
    let mut in_hunk = false;
    let mut last_tag = ' ';

    for line in patch.split_inclusive('\n') {
        if line.starts_with("@@") {
            in_hunk = true;
            let (old_start, old_len) = parse_old_range(line);
            let start = if old_len == 0 { old_start } else { old_start - 1 };
            for l in &base_lines[cursor..start] {
                out.push_str(l);
            }
            cursor = start;
            continue;
        }
        if !in_hunk {
            continue;
        }
        let (tag, content) = line.split_at(1);
        match tag {
            " " => {
                out.push_str(content);
                cursor += 1;
            }
            "-" => cursor += 1,
            "+" => out.push_str(content),
            "\\" => {
                if last_tag != '-' && out.ends_with('\n') {
                    out.pop();
                }
                continue;
            }
            other => panic!("unexpected patch line tag {other:?} in {line:?}"),
        }
        last_tag = tag.chars().next().unwrap_or(' ');
    }
    for l in &base_lines[cursor..] {
        out.push_str(l);
    }
    out
}

fn parse_old_range(header: &str) -> (usize, usize) {
    let old = header
        .trim_start_matches("@@ -")
        .split(' ')
        .next()
        .expect("old range");
    let mut parts = old.split(',');
    let start: usize = parts.next().expect("start").parse().expect("numeric start");
    let len: usize = parts.next().map_or(1, |l| l.parse().expect("numeric len"));
    (start, len)
}
