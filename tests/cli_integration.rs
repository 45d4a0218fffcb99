use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn run(root: &TempDir, args: &[&str]) -> Command {
    let mut cmd = Command::cargo_bin("pulse").unwrap();
    cmd.args(args)
        .arg("--project-root")
        .arg(root.path().as_os_str());
    cmd
}

#[test]
fn init_seeds_config_and_state() {
    let root = TempDir::new().unwrap();
    run(&root, &["init", "--name", "demo", "--agents", "build,test"])
        .assert()
        .success()
        .stdout(predicate::str::contains(".pulse.toml"));

    assert!(root.path().join(".pulse.toml").exists());
    assert!(root.path().join(".pulse/status.json").exists());
    assert!(root
        .path()
        .join(".pulse/scratchpads/build_scratchpad.md")
        .exists());

    // Re-running without --force fails with the config exit code
    run(&root, &["init", "--name", "demo"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn agent_update_roundtrips_through_status() {
    let root = TempDir::new().unwrap();
    run(&root, &["init", "--name", "demo", "--agents", "build,test"])
        .assert()
        .success();

    run(
        &root,
        &[
            "agent", "update", "build", "--status", "running", "--progress", "40", "--message",
            "halfway",
        ],
    )
    .assert()
    .success();

    let output = run(&root, &["status", "--format", "json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let doc: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(doc["agents"]["build"]["status"], "running");
    assert_eq!(doc["agents"]["build"]["progress"], 40);
    assert_eq!(doc["agents"]["build"]["message"], "halfway");
    assert_eq!(doc["agents"]["build"]["total_runs"], 1);
}

#[test]
fn progress_is_clamped_at_the_cli_boundary() {
    let root = TempDir::new().unwrap();
    run(&root, &["init", "--name", "demo", "--agents", "build"])
        .assert()
        .success();

    run(&root, &["agent", "update", "build", "--progress", "250"])
        .assert()
        .success();

    let output = run(&root, &["agent", "show", "build"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let agent: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(agent["progress"], 100);
}

#[test]
fn unknown_agent_show_is_not_found() {
    let root = TempDir::new().unwrap();
    run(&root, &["init", "--name", "demo", "--agents", "build"])
        .assert()
        .success();

    run(&root, &["agent", "show", "ghost"])
        .assert()
        .failure()
        .code(6)
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn cycle_start_sets_orchestrator_running() {
    let root = TempDir::new().unwrap();
    run(&root, &["init", "--name", "demo", "--agents", "build"])
        .assert()
        .success();

    run(&root, &["cycle", "start", "1"]).assert().success();
    run(&root, &["cycle", "set-agent", "build"])
        .assert()
        .success();

    let output = run(&root, &["status", "--format", "json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let doc: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(doc["orchestrator"]["status"], "running");
    assert_eq!(doc["orchestrator"]["current_cycle"], 1);
    assert_eq!(doc["orchestrator"]["current_agent"], "build");

    run(&root, &["cycle", "complete", "1"]).assert().success();
    let output = run(&root, &["status", "--format", "json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let doc: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(doc["orchestrator"]["status"], "idle");
    assert_eq!(doc["orchestrator"]["total_cycles_run"], 1);
}

#[test]
fn pad_section_and_show() {
    let root = TempDir::new().unwrap();
    run(&root, &["init", "--name", "demo", "--agents", "build"])
        .assert()
        .success();

    run(
        &root,
        &["pad", "section", "build", "In Progress", "- porting the API"],
    )
    .assert()
    .success();

    run(&root, &["pad", "show", "build", "--raw"])
        .assert()
        .success()
        .stdout(predicate::str::contains("## In Progress\n- porting the API"))
        .stdout(predicate::str::contains("## Next Actions"));

    run(&root, &["pad", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("build"));
}

#[test]
fn compile_emits_dashboard_asset() {
    let root = TempDir::new().unwrap();
    run(&root, &["init", "--name", "demo", "--agents", "build"])
        .assert()
        .success();

    run(&root, &["compile"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Generated:"));

    let asset = std::fs::read_to_string(root.path().join("pulse_status.js")).unwrap();
    assert!(asset.contains("const pulseStatus = {"));
    assert!(asset.contains("function formatTimeAgo"));

    // Second compile with no changes skips the write
    run(&root, &["compile"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Unchanged:"));
}

#[test]
fn loop_lifecycle_and_not_found() {
    let root = TempDir::new().unwrap();
    run(&root, &["init", "--name", "demo", "--agents", "build"])
        .assert()
        .success();

    run(
        &root,
        &[
            "loop",
            "init",
            "port-api",
            "--task",
            "port the API",
            "--promise",
            "ALL TESTS PASS",
        ],
    )
    .assert()
    .success();

    run(
        &root,
        &[
            "loop",
            "update",
            "port-api",
            "--iteration",
            "1",
            "--completed",
            "scaffold,endpoints",
        ],
    )
    .assert()
    .success();

    run(
        &root,
        &["loop", "log-command", "port-api", "cargo test", "--result", "ok"],
    )
    .assert()
    .success();

    let output = run(&root, &["loop", "status", "port-api"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let record: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(record["status"], "running");
    assert_eq!(record["current_iteration"], 1);
    assert_eq!(record["commands_executed"][0]["command"], "cargo test");

    run(&root, &["loop", "complete", "port-api"])
        .assert()
        .success();

    run(&root, &["loop", "status", "ghost"])
        .assert()
        .failure()
        .code(6)
        .stderr(predicate::str::contains("not found"));

    // Dashboard data regenerated alongside the log
    assert!(root.path().join("pulse_status_data.json").exists());
}

#[test]
fn reset_returns_agents_to_defaults() {
    let root = TempDir::new().unwrap();
    run(&root, &["init", "--name", "demo", "--agents", "build"])
        .assert()
        .success();
    run(&root, &["agent", "fail", "build", "--message", "boom"])
        .assert()
        .success();

    run(&root, &["reset", "--yes"]).assert().success();

    let output = run(&root, &["status", "--format", "json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let doc: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(doc["agents"]["build"]["status"], "idle");
    assert_eq!(doc["agents"]["build"]["message"], "Ready");
}

#[test]
fn schema_prints_config_schema() {
    let mut cmd = Command::cargo_bin("pulse").unwrap();
    cmd.arg("schema")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"$schema\""))
        .stdout(predicate::str::contains("roster"));
}

#[test]
fn corrupt_status_document_self_heals() {
    let root = TempDir::new().unwrap();
    run(&root, &["init", "--name", "demo", "--agents", "build"])
        .assert()
        .success();

    std::fs::write(root.path().join(".pulse/status.json"), "{broken").unwrap();

    let output = run(&root, &["status", "--format", "json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let doc: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(doc["metadata"]["version"], "2.0");
    assert!(doc["agents"]["build"].is_object());
}
