//! CLI integration tests
//!
//! These tests drive the binary end to end against diagram files in a
//! scratch directory.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn run(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_notagraph-cli"))
        .current_dir(dir)
        .args(args)
        .output()
        .expect("Failed to execute CLI")
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "CLI command should succeed. Stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

fn render_json(dir: &Path, model: &str) -> serde_json::Value {
    let output = run(dir, &["render", "--model", model]);
    assert_success(&output);
    serde_json::from_slice(&output.stdout).expect("Render output should be JSON")
}

#[test]
fn test_cli_init_then_render() {
    // GIVEN an empty scratch directory
    let temp_dir = TempDir::new().unwrap();

    // WHEN a sample diagram is written and rendered
    assert_success(&run(temp_dir.path(), &["init", "--out", "diagram.json"]));
    let graph = render_json(temp_dir.path(), "diagram.json");

    // THEN the root holds one clean shape at (0,0) sized (10,10)
    assert_eq!(graph["dirty"], false);
    assert_eq!(graph["root"]["kind"], "diagram");
    let shape = &graph["root"]["children"][0];
    assert_eq!(shape["kind"], "shape");
    assert_eq!(shape["position"]["x"], 0.0);
    assert_eq!(shape["size"]["width"], 10.0);
}

#[test]
fn test_cli_init_refuses_to_overwrite() {
    // GIVEN an existing diagram
    let temp_dir = TempDir::new().unwrap();
    assert_success(&run(temp_dir.path(), &["init", "--out", "diagram.json"]));

    // WHEN init runs again without --force
    let output = run(temp_dir.path(), &["init", "--out", "diagram.json"]);

    // THEN it fails and says why
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("already exists"));
}

#[test]
fn test_cli_replay_move_save_and_undo() {
    // GIVEN a sample diagram and the id of its shape
    let temp_dir = TempDir::new().unwrap();
    assert_success(&run(temp_dir.path(), &["init", "--out", "diagram.json"]));
    let graph = render_json(temp_dir.path(), "diagram.json");
    let shape_id = graph["root"]["children"][0]["id"]
        .as_str()
        .expect("Shape should have an id")
        .to_string();

    // AND an action script that moves, saves and then undoes
    let script = format!(
        "# move the shape\n\
         {{\"kind\":\"changeBounds\",\"element\":\"{id}\",\"position\":{{\"x\":5.0,\"y\":5.0}}}}\n\
         \n\
         {{\"kind\":\"saveModel\"}}\n\
         {{\"kind\":\"undo\"}}\n",
        id = shape_id
    );
    fs::write(temp_dir.path().join("actions.jsonl"), script).unwrap();
    fs::write(
        temp_dir.path().join("engine.toml"),
        "log_profile = \"test\"\nhistory_limit = 10\n",
    )
    .unwrap();

    // WHEN the script is replayed
    let output = run(
        temp_dir.path(),
        &[
            "replay",
            "--model",
            "diagram.json",
            "--actions",
            "actions.jsonl",
            "--config",
            "engine.toml",
        ],
    );
    assert_success(&output);

    // THEN the responses are the move, the undo and the save outcome
    let responses: Vec<serde_json::Value> = String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|line| serde_json::from_str(line).expect("Each response should be JSON"))
        .collect();
    let kinds: Vec<&str> = responses
        .iter()
        .map(|r| r["kind"].as_str().unwrap_or_default())
        .collect();
    assert_eq!(kinds.iter().filter(|k| **k == "updateModel").count(), 2);
    assert!(kinds.contains(&"setDirtyState"));

    // AND the file holds the moved shape, saved before the undo
    let saved = render_json(temp_dir.path(), "diagram.json");
    assert_eq!(saved["root"]["children"][0]["position"]["x"], 5.0);
}

#[test]
fn test_cli_replay_rejects_malformed_action() {
    // GIVEN an action script with an unknown action
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("actions.jsonl"),
        "{\"kind\":\"undo\"}\n{\"kind\":\"teleport\"}\n",
    )
    .unwrap();

    // WHEN replayed
    let output = run(
        temp_dir.path(),
        &[
            "replay",
            "--model",
            "diagram.json",
            "--actions",
            "actions.jsonl",
        ],
    );

    // THEN it fails naming the offending line, and nothing is written
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("actions.jsonl:2"));
    assert!(!temp_dir.path().join("diagram.json").exists());
}
