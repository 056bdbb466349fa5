//! Offline CLI integration tests: everything that works without the
//! automation backend (project/flow CRUD, validation, history stats), plus
//! the failure path of `run` against a dead backend.

use std::path::Path;

use assert_cmd::Command;
use flow_graph::{ActionKind, FlowGraph, FlowNode};
use predicates::prelude::*;
use tempfile::tempdir;

fn flowdeck(data_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("flowdeck").unwrap();
    cmd.arg("--data-dir").arg(data_dir);
    cmd
}

fn sample_flow(name: &str) -> FlowGraph {
    let mut graph = FlowGraph::new(name);
    let open = graph
        .add_node(FlowNode::new(
            "open page",
            ActionKind::Navigate {
                url: "https://example.com".into(),
            },
        ))
        .unwrap();
    let shoot = graph
        .add_node(FlowNode::new(
            "screenshot",
            ActionKind::Screenshot { full_page: false },
        ))
        .unwrap();
    graph.connect(&open, &shoot).unwrap();
    graph
}

#[test]
fn project_lifecycle() {
    let dir = tempdir().unwrap();

    flowdeck(dir.path())
        .args(["project", "create", "demo", "--description", "smoke test"])
        .assert()
        .success()
        .stdout(predicate::str::contains("created project"));

    flowdeck(dir.path())
        .args(["project", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("demo"));

    flowdeck(dir.path())
        .args(["project", "delete", "demo"])
        .assert()
        .success();

    flowdeck(dir.path())
        .args(["project", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("no projects"));
}

#[test]
fn flow_add_show_and_validate() {
    let dir = tempdir().unwrap();
    flowdeck(dir.path())
        .args(["project", "create", "demo"])
        .assert()
        .success();

    let mut graph = sample_flow("login-check");
    // An unconnected node makes the orphan lint fire.
    graph
        .add_node(FlowNode::new("stray", ActionKind::Wait { ms: 100 }))
        .unwrap();
    let flow_file = dir.path().join("flow.json");
    std::fs::write(&flow_file, serde_json::to_string_pretty(&graph).unwrap()).unwrap();

    flowdeck(dir.path())
        .args(["flow", "add"])
        .arg(&flow_file)
        .args(["--project", "demo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("added flow login-check"));

    flowdeck(dir.path())
        .args(["flow", "list", "--project", "demo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("login-check"));

    flowdeck(dir.path())
        .args(["flow", "show", "login-check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("<navigate>"));

    flowdeck(dir.path())
        .args(["validate", "login-check"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("is valid")
                .and(predicate::str::contains("disconnected")),
        );
}

#[test]
fn history_stats_reports_revisions() {
    let dir = tempdir().unwrap();
    flowdeck(dir.path())
        .args(["project", "create", "demo"])
        .assert()
        .success();

    let mut graph = sample_flow("evolving");
    let flow_file = dir.path().join("flow.json");
    std::fs::write(&flow_file, serde_json::to_string_pretty(&graph).unwrap()).unwrap();
    flowdeck(dir.path())
        .args(["flow", "add"])
        .arg(&flow_file)
        .args(["--project", "demo"])
        .assert()
        .success();

    // Save the same flow again with a small edit; the first version becomes
    // revision 1.
    graph.description = "second take".into();
    std::fs::write(&flow_file, serde_json::to_string_pretty(&graph).unwrap()).unwrap();
    flowdeck(dir.path())
        .args(["flow", "add"])
        .arg(&flow_file)
        .args(["--project", "demo"])
        .assert()
        .success();

    flowdeck(dir.path())
        .args(["history-stats", "evolving"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("1 saved revision")
                .and(predicate::str::contains("keyframes")),
        );
}

#[test]
fn run_against_dead_backend_fails_cleanly() {
    let dir = tempdir().unwrap();
    flowdeck(dir.path())
        .args(["project", "create", "demo"])
        .assert()
        .success();

    let graph = sample_flow("doomed");
    let flow_file = dir.path().join("flow.json");
    std::fs::write(&flow_file, serde_json::to_string_pretty(&graph).unwrap()).unwrap();
    flowdeck(dir.path())
        .args(["flow", "add"])
        .arg(&flow_file)
        .args(["--project", "demo"])
        .assert()
        .success();

    flowdeck(dir.path())
        .env("FLOWDECK_BACKEND__BASE_URL", "http://127.0.0.1:9")
        .env("FLOWDECK_RUN__MAX_ATTEMPTS", "1")
        .args(["run", "doomed"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("FAILURE"));
}

#[test]
fn unknown_flow_is_a_clean_error() {
    let dir = tempdir().unwrap();
    flowdeck(dir.path())
        .args(["validate", "no-such-flow"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no flow matches"));
}
