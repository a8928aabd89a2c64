//! Table-driven reconciliation scenarios against a real directory tree.

mod common;

use common::{ConfigMapBuilder, TestHarness};

use assert_fs::prelude::*;
use dashboard_loader::{ReconcileError, ResourceId};

enum Step {
    Add(ConfigMapBuilder),
    Delete(&'static str, &'static str),
}

struct Scenario {
    name: &'static str,
    steps: Vec<Step>,
    expected_files: &'static [(&'static str, &'static str)],
}

fn add(namespace: &str, name: &str, entries: &[(&str, &str)]) -> Step {
    let builder = entries
        .iter()
        .fold(ConfigMapBuilder::new(namespace, name), |b, (k, v)| b.data(k, v));
    Step::Add(builder)
}

fn scenarios() -> Vec<Scenario> {
    vec![
        Scenario {
            name: "only_json_keys_are_written",
            steps: vec![add("default", "demo", &[("a.json", "{}"), ("readme.txt", "hi")])],
            expected_files: &[("default/demo/a.json", "{}")],
        },
        Scenario {
            name: "update_replaces_stale_files",
            steps: vec![
                add("default", "demo", &[("a.json", "{}")]),
                add("default", "demo", &[("b.json", "{\"b\":1}")]),
            ],
            expected_files: &[("default/demo/b.json", "{\"b\":1}")],
        },
        Scenario {
            name: "update_overwrites_changed_content",
            steps: vec![
                add("default", "demo", &[("a.json", "{\"v\":1}")]),
                add("default", "demo", &[("a.json", "{\"v\":2}")]),
            ],
            expected_files: &[("default/demo/a.json", "{\"v\":2}")],
        },
        Scenario {
            name: "delete_removes_everything",
            steps: vec![
                add("default", "demo", &[("a.json", "{}"), ("b.json", "[]")]),
                Step::Delete("default", "demo"),
            ],
            expected_files: &[],
        },
        Scenario {
            name: "same_name_in_two_namespaces_is_isolated",
            steps: vec![
                add("team-a", "overview", &[("a.json", "1")]),
                add("team-b", "overview", &[("a.json", "2")]),
                Step::Delete("team-a", "overview"),
            ],
            expected_files: &[("team-b/overview/a.json", "2")],
        },
        Scenario {
            name: "readd_after_delete",
            steps: vec![
                add("default", "demo", &[("a.json", "{}")]),
                Step::Delete("default", "demo"),
                add("default", "demo", &[("c.json", "{}")]),
            ],
            expected_files: &[("default/demo/c.json", "{}")],
        },
        Scenario {
            name: "empty_resource_clears_directory",
            steps: vec![
                add("default", "demo", &[("a.json", "{}")]),
                add("default", "demo", &[("notes.md", "# hi")]),
            ],
            expected_files: &[],
        },
        Scenario {
            name: "delete_of_unknown_resource_is_noop",
            steps: vec![
                add("default", "kept", &[("a.json", "{}")]),
                Step::Delete("default", "never-existed"),
            ],
            expected_files: &[("default/kept/a.json", "{}")],
        },
    ]
}

#[test]
fn test_reconcile_scenarios() {
    for scenario in scenarios() {
        let harness = TestHarness::new();
        let reconciler = harness.reconciler();

        for step in &scenario.steps {
            match step {
                Step::Add(builder) => {
                    reconciler
                        .reconcile_added(&builder.to_resource())
                        .unwrap_or_else(|e| panic!("{}: add failed: {}", scenario.name, e));
                }
                Step::Delete(namespace, name) => {
                    reconciler
                        .reconcile_deleted(&ResourceId::new(*namespace, *name))
                        .unwrap_or_else(|e| panic!("{}: delete failed: {}", scenario.name, e));
                }
            }
        }

        let expected: Vec<(String, String)> = scenario
            .expected_files
            .iter()
            .map(|(p, c)| (p.to_string(), c.to_string()))
            .collect();
        assert_eq!(
            harness.output_files(),
            expected,
            "scenario '{}' left unexpected files",
            scenario.name
        );
        assert_eq!(harness.metrics.create_errors(), 0, "{}", scenario.name);
        assert_eq!(harness.metrics.delete_errors(), 0, "{}", scenario.name);
    }
}

#[test]
fn test_binary_entries_are_written_verbatim() {
    let harness = TestHarness::new();
    let resource = ConfigMapBuilder::new("default", "packed")
        .binary("gz.json", &[0x1f, 0x8b, 0x00])
        .to_resource();

    harness.reconciler().reconcile_added(&resource).unwrap();

    let written = std::fs::read(harness.output("default/packed/gz.json").path()).unwrap();
    assert_eq!(written, vec![0x1f, 0x8b, 0x00]);
}

#[test]
fn test_second_identical_add_writes_nothing() {
    let harness = TestHarness::new();
    let reconciler = harness.reconciler();
    let resource = ConfigMapBuilder::new("default", "demo")
        .data("a.json", "{}")
        .to_resource();

    let first = reconciler.reconcile_added(&resource).unwrap();
    assert_eq!(first.written, vec!["a.json"]);

    let second = reconciler.reconcile_added(&resource).unwrap();
    assert!(second.is_noop());
    assert_eq!(second.unchanged, vec!["a.json"]);
    harness.output("default/demo/a.json").assert("{}");
}

#[test]
fn test_unmanaged_files_in_resource_directory_are_removed() {
    let harness = TestHarness::new();
    harness.output("default/demo").create_dir_all().unwrap();
    harness
        .output("default/demo/manual-edit.json")
        .write_str("{\"manual\":true}")
        .unwrap();

    let resource = ConfigMapBuilder::new("default", "demo")
        .data("a.json", "{}")
        .to_resource();
    let report = harness.reconciler().reconcile_added(&resource).unwrap();

    assert_eq!(report.removed, vec!["manual-edit.json"]);
    assert!(!harness.output("default/demo/manual-edit.json").path().exists());
}

#[test]
fn test_traversal_attempts_touch_nothing() {
    let harness = TestHarness::new();
    let reconciler = harness.reconciler();

    let escape = ConfigMapBuilder::new("..", "etc")
        .data("passwd.json", "{}")
        .to_resource();
    assert!(matches!(
        reconciler.reconcile_added(&escape),
        Err(ReconcileError::InvalidIdentifier { .. })
    ));
    assert!(matches!(
        reconciler.reconcile_deleted(&ResourceId::new("default", "..")),
        Err(ReconcileError::InvalidIdentifier { .. })
    ));

    assert!(harness.output_files().is_empty());
    assert_eq!(harness.metrics.create_errors(), 1);
    assert_eq!(harness.metrics.delete_errors(), 1);
}
