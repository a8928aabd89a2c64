//! Test harness for isolated reconciliation runs.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use assert_fs::fixture::ChildPath;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use walkdir::WalkDir;

use dashboard_loader::{CounterMetrics, DashboardLayout, Reconciler};

/// Temporary `out/` and `manifests/` trees plus local metrics.
pub struct TestHarness {
    temp_dir: TempDir,
    pub output_dir: PathBuf,
    pub manifest_dir: PathBuf,
    pub metrics: Arc<CounterMetrics>,
}

impl TestHarness {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let output = temp_dir.child("out");
        let manifests = temp_dir.child("manifests");
        output.create_dir_all().expect("Failed to create output dir");
        manifests
            .create_dir_all()
            .expect("Failed to create manifest dir");

        Self {
            output_dir: output.path().to_path_buf(),
            manifest_dir: manifests.path().to_path_buf(),
            temp_dir,
            metrics: Arc::new(CounterMetrics::new()),
        }
    }

    /// A reconciler writing below `output_dir` and counting into `metrics`.
    pub fn reconciler(&self) -> Reconciler {
        Reconciler::new(DashboardLayout::new(&self.output_dir), self.metrics.clone())
    }

    /// A path below the output tree, e.g. `default/demo/a.json`.
    pub fn output(&self, relative: &str) -> ChildPath {
        self.temp_dir.child("out").child(relative)
    }

    pub fn write_manifest(&self, relative: &str, content: &str) {
        let path = self.manifest_dir.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create manifest parent");
        }
        fs::write(&path, content).expect("Failed to write manifest");
    }

    pub fn remove_manifest(&self, relative: &str) {
        fs::remove_file(self.manifest_dir.join(relative)).expect("Failed to remove manifest");
    }

    /// Every regular file below the output root as `(relative path, content)`, sorted.
    pub fn output_files(&self) -> Vec<(String, String)> {
        collect_files(&self.output_dir)
    }

    /// Polls `condition` until it holds or `timeout` passes.
    pub fn wait_for(&self, timeout: Duration, condition: impl Fn() -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(20));
        }
        condition()
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

fn collect_files(root: &Path) -> Vec<(String, String)> {
    let mut files: Vec<(String, String)> = WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let relative = e
                .path()
                .strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/");
            let content = fs::read_to_string(e.path()).unwrap_or_default();
            (relative, content)
        })
        .collect();
    files.sort();
    files
}
