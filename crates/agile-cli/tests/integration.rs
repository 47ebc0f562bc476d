#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

fn agile(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("agile").unwrap();
    cmd.current_dir(dir.path()).env("AGILE_ROOT", dir.path());
    cmd
}

fn init_project(dir: &TempDir) {
    agile(dir).arg("init").assert().success();
}

fn create(dir: &TempDir, kind: &str, name: &str) {
    agile(dir).args(["create", kind, name]).assert().success();
}

fn replace_in(path: &Path, from: &str, to: &str) {
    let text = std::fs::read_to_string(path).unwrap();
    assert!(text.contains(from), "{} does not contain {from:?}", path.display());
    std::fs::write(path, text.replace(from, to)).unwrap();
}

fn json_output(cmd: &mut Command) -> serde_json::Value {
    let out = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&out).unwrap()
}

// ---------------------------------------------------------------------------
// agile init
// ---------------------------------------------------------------------------

#[test]
fn init_creates_stage_directories() {
    let dir = TempDir::new().unwrap();
    agile(&dir).arg("init").assert().success();

    for stage in ["1-backlog", "2-todo", "3-in-progress", "4-review", "5-done", "archive"] {
        assert!(dir.path().join("agile").join(stage).is_dir(), "missing {stage}");
    }
    assert!(dir.path().join("agile/config.yaml").is_file());
}

#[test]
fn init_is_idempotent() {
    let dir = TempDir::new().unwrap();
    agile(&dir).arg("init").assert().success();
    agile(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("exists:  agile/config.yaml"));
}

#[test]
fn commands_before_init_fail_without_creating_agile_dir() {
    let dir = TempDir::new().unwrap();
    agile(&dir)
        .args(["create", "task", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not initialized"));
    assert!(!dir.path().join("agile").exists());
}

// ---------------------------------------------------------------------------
// agile create / list / show / assign
// ---------------------------------------------------------------------------

#[test]
fn create_then_list() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    agile(&dir)
        .args(["create", "feature", "export", "--title", "CSV export", "--owner", "dana"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created feature 'export' in 1-backlog"));
    create(&dir, "bug", "crash");

    assert!(dir.path().join("agile/1-backlog/export/feature.md").is_file());
    agile(&dir)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("CSV export"))
        .stdout(predicate::str::contains("crash"));

    let rows = json_output(agile(&dir).args(["list", "--format", "json"]));
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["name"], "crash");
    assert_eq!(rows[1]["owner"], "dana");
    assert_eq!(rows[1]["stage"], "1-backlog");
}

#[test]
fn list_filters_by_stage() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    create(&dir, "task", "a");
    let rows = json_output(agile(&dir).args(["--json", "list", "--stage", "todo"]));
    assert_eq!(rows.as_array().unwrap().len(), 0);
}

#[test]
fn create_rejects_duplicates_and_bad_input() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    create(&dir, "task", "x");
    agile(&dir)
        .args(["create", "task", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
    agile(&dir)
        .args(["create", "epic", "y"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected one of feature, bug, task"));
    agile(&dir)
        .args(["create", "task", "Bad Name"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid slug"));
}

#[test]
fn assign_and_show() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    create(&dir, "task", "x");
    agile(&dir).args(["assign", "x", "dana"]).assert().success();

    let view = json_output(agile(&dir).args(["show", "x", "--json"]));
    assert_eq!(view["owner"], "dana");
    assert_eq!(view["stage"], "1-backlog");
    assert_eq!(view["next"]["stage"], "2-todo");
    assert_eq!(view["next"]["valid"], false);
    assert_eq!(view["guidance_needs_update"], true);

    agile(&dir)
        .args(["show", "x"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Not ready for 2-todo"));
}

#[test]
fn show_unknown_issue_fails() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    agile(&dir)
        .args(["show", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("issue not found: ghost"));
}

// ---------------------------------------------------------------------------
// agile move
// ---------------------------------------------------------------------------

#[test]
fn move_to_same_stage_is_a_no_op() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    create(&dir, "task", "x");
    agile(&dir)
        .args(["move", "x", "1-backlog"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already in 1-backlog"));
}

#[test]
fn move_skipping_a_stage_is_rejected() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    create(&dir, "task", "x");
    agile(&dir)
        .args(["move", "x", "3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("allowed targets are 2-todo"));
    assert!(dir.path().join("agile/1-backlog/x").is_dir());
}

#[test]
fn move_to_unknown_stage_fails() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    create(&dir, "task", "x");
    agile(&dir)
        .args(["move", "x", "shipped"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid stage 'shipped'"));
}

#[test]
fn issue_lifecycle_end_to_end() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    create(&dir, "task", "x");

    agile(&dir)
        .args(["move", "x", "2-todo"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("blocked:"))
        .stderr(predicate::str::contains("'Description' has unfilled placeholders"));

    replace_in(
        &dir.path().join("agile/1-backlog/x/task.md"),
        "[Describe the work to be done]",
        "Rotate the signing keys.",
    );
    agile(&dir).args(["assign", "x", "dana"]).assert().success();
    agile(&dir).args(["guidance", "update", "x"]).assert().success();

    agile(&dir).args(["move", "x", "2-todo"]).assert().success();
    agile(&dir)
        .args(["move", "x", "in-progress"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2-todo -> 3-in-progress"));
    assert!(dir.path().join("agile/3-in-progress/x/task.md").is_file());

    for spec in ["keys", "rollout"] {
        agile(&dir).args(["spec", "add", "x", spec]).assert().success();
        agile(&dir)
            .args(["spec", "status", "x", spec, "completed"])
            .assert()
            .success();
    }

    agile(&dir)
        .args(["move", "x", "4-review"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("technical guidance is stale"));
    agile(&dir)
        .args(["guidance", "validate", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("completed after the last guidance update"));

    agile(&dir).args(["guidance", "update", "x"]).assert().success();
    agile(&dir).args(["guidance", "validate", "x"]).assert().success();
    agile(&dir).args(["move", "x", "4-review"]).assert().success();
    assert!(dir.path().join("agile/4-review/x").is_dir());
    assert!(!dir.path().join("agile/3-in-progress/x").exists());

    agile(&dir)
        .args(["move", "x", "5-done"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unchecked Definition of Done item"));
    replace_in(&dir.path().join("agile/4-review/x/task.md"), "- [ ]", "- [x]");
    agile(&dir).args(["move", "x", "5-done"]).assert().success();

    agile(&dir).args(["move", "x", "4-review"]).assert().success();
}

// ---------------------------------------------------------------------------
// agile spec
// ---------------------------------------------------------------------------

#[test]
fn spec_add_list_and_suggest() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    create(&dir, "task", "x");
    agile(&dir)
        .args(["spec", "add", "x", "api", "--title", "Public API", "--depends", "schema"])
        .assert()
        .success();
    agile(&dir).args(["spec", "add", "x", "schema"]).assert().success();

    let listing = json_output(agile(&dir).args(["spec", "list", "x", "--json"]));
    assert_eq!(listing["completion"]["total"], 2);
    assert_eq!(listing["specs"][0]["name"], "api");
    assert_eq!(listing["specs"][0]["dependencies"][0], "schema");

    agile(&dir)
        .args(["spec", "suggest", "x"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Next: schema"));

    agile(&dir)
        .args(["spec", "add", "x", "api"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("spec already exists: api"));
}

#[test]
fn spec_depends_rewrites_and_clears() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    create(&dir, "task", "x");
    agile(&dir).args(["spec", "add", "x", "api"]).assert().success();
    agile(&dir).args(["spec", "add", "x", "schema"]).assert().success();

    agile(&dir)
        .args(["spec", "depends", "x", "api", "schema"])
        .assert()
        .success()
        .stdout(predicate::str::contains("depends on schema"));
    agile(&dir)
        .args(["spec", "suggest", "x"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Next: schema"));

    agile(&dir)
        .args(["spec", "depends", "x", "api"])
        .assert()
        .success()
        .stdout(predicate::str::contains("has no dependencies"));
    agile(&dir)
        .args(["spec", "suggest", "x"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Next: api"));

    agile(&dir)
        .args(["spec", "depends", "x", "api", "Bad Slug"])
        .assert()
        .failure();
}

#[test]
fn suggest_reports_specs_waiting_in_review() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    create(&dir, "task", "x");
    agile(&dir).args(["spec", "add", "x", "api"]).assert().success();
    agile(&dir)
        .args(["spec", "status", "x", "api", "in-review"])
        .assert()
        .success();

    agile(&dir)
        .args(["spec", "suggest", "x"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 in review, waiting on sign-off"))
        .stdout(predicate::str::contains("dependencies").not());
}

#[test]
fn completing_a_spec_requires_guidance() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    create(&dir, "task", "x");
    agile(&dir).args(["spec", "add", "x", "api"]).assert().success();
    agile(&dir)
        .args(["spec", "status", "x", "api", "completed"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no technical guidance document"));

    agile(&dir)
        .args(["spec", "status", "x", "api", "in_progress"])
        .assert()
        .success()
        .stdout(predicate::str::contains("pending -> in-progress"));
}

#[test]
fn spec_status_round_trip_clears_completion() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    create(&dir, "task", "x");
    agile(&dir).args(["guidance", "update", "x"]).assert().success();
    agile(&dir).args(["spec", "add", "x", "api"]).assert().success();

    let done = json_output(agile(&dir).args(["--json", "spec", "status", "x", "api", "completed"]));
    assert!(done["completed"].is_string());
    let reopened = json_output(agile(&dir).args(["--json", "spec", "status", "x", "api", "pending"]));
    assert!(reopened["completed"].is_null());
}

#[test]
fn spec_delete() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    create(&dir, "task", "x");
    agile(&dir).args(["spec", "add", "x", "api"]).assert().success();
    agile(&dir).args(["spec", "delete", "x", "api"]).assert().success();
    assert!(!dir.path().join("agile/1-backlog/x/api.spec.md").exists());
    agile(&dir)
        .args(["spec", "delete", "x", "api"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("spec not found: api"));
}

#[test]
fn spec_names_are_slugs() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    create(&dir, "task", "x");
    create(&dir, "task", "y");
    agile(&dir).args(["spec", "add", "y", "api"]).assert().success();

    for sub in ["delete", "status"] {
        let mut args = vec!["spec", sub, "x", "../y/api"];
        if sub == "status" {
            args.push("pending");
        }
        agile(&dir)
            .args(&args)
            .assert()
            .failure()
            .stderr(predicate::str::contains("invalid slug '../y/api'"));
    }
    assert!(dir.path().join("agile/1-backlog/y/api.spec.md").exists());
}

// ---------------------------------------------------------------------------
// agile guidance
// ---------------------------------------------------------------------------

#[test]
fn guidance_update_creates_document() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    create(&dir, "task", "x");
    agile(&dir)
        .args(["guidance", "show", "x"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No technical guidance"));

    agile(&dir).args(["guidance", "update", "x"]).assert().success();
    let path = dir.path().join("agile/1-backlog/x/technical-guidance.md");
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("status: draft"));
    assert!(text.contains("# Technical Guidance: x"));

    agile(&dir)
        .args(["guidance", "status", "x", "finalized"])
        .assert()
        .success();
    let view = json_output(agile(&dir).args(["guidance", "show", "x", "--json"]));
    assert_eq!(view["guidance"]["status"], "finalized");
    assert_eq!(view["needs_update"], false);
}

#[test]
fn guidance_status_requires_document() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    create(&dir, "task", "x");
    agile(&dir)
        .args(["guidance", "status", "x", "active"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("technical guidance not found"));
    agile(&dir)
        .args(["guidance", "status", "x", "shipped"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected one of draft, active, finalized"));
}

// ---------------------------------------------------------------------------
// agile discover
// ---------------------------------------------------------------------------

const DISCOVERED: &str = "---
discovery_phase: synthesize
---
# Feature: Export

**Owner:** dana
**Created:** 2026-10-17

## Description
Export monthly reports as CSV.

## Discovery

### User Persona
A finance analyst closing the month.

### Problem Statement
Reports are copied into spreadsheets by hand.

### Scenarios
```gherkin
Feature: Export

  Scenario: Export a report
    Given a report with rows
    When I export it as CSV
    Then a file downloads
```

### Out of Scope
- PDF export

### Assumptions
- Reports fit in memory

## Definition of Done
- [ ] Tests written and passing
";

const SECOND_SCENARIO: &str = "
  Scenario: Export an empty report
    Given a report with no rows
    When I export it as CSV
    Then I see a warning
```";

#[test]
fn discovery_walks_phases_and_gates_completion() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    create(&dir, "feature", "export");

    for expected in ["persona", "paths", "scope", "synthesize"] {
        agile(&dir)
            .args(["discover", "export", "advance"])
            .assert()
            .success()
            .stdout(predicate::str::contains(format!("-> {expected}")));
    }

    let doc = dir.path().join("agile/1-backlog/export/feature.md");
    std::fs::write(&doc, DISCOVERED).unwrap();
    agile(&dir)
        .args(["discover", "export", "advance"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("discovery completion blocked:"))
        .stderr(predicate::str::contains("at least 2 required"));

    replace_in(&doc, "\n```\n\n### Out of Scope", &format!("{SECOND_SCENARIO}\n\n### Out of Scope"));
    agile(&dir).args(["discover", "export", "validate"]).assert().success();
    agile(&dir)
        .args(["discover", "export", "advance"])
        .assert()
        .success()
        .stdout(predicate::str::contains("synthesize -> complete"));

    let status = json_output(agile(&dir).args(["discover", "export", "status", "--json"]));
    assert_eq!(status["phase"], "complete");
    assert_eq!(status["report"]["scenario_count"], 2);

    agile(&dir).args(["move", "export", "2-todo"]).assert().success();
}

#[test]
fn discovery_reset_keeps_content() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    create(&dir, "feature", "export");
    let doc = dir.path().join("agile/1-backlog/export/feature.md");
    std::fs::write(&doc, DISCOVERED).unwrap();

    agile(&dir)
        .args(["discover", "export", "reset"])
        .assert()
        .success()
        .stdout(predicate::str::contains("reset from synthesize"));
    let text = std::fs::read_to_string(&doc).unwrap();
    assert!(text.starts_with("---\ndiscovery_phase: not_started\n---\n"));
    assert!(text.contains("A finance analyst closing the month."));
}

#[test]
fn discovery_rejects_non_features() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    create(&dir, "bug", "crash");
    agile(&dir)
        .args(["discover", "crash", "status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a feature"));
}

// ---------------------------------------------------------------------------
// agile archive / delete
// ---------------------------------------------------------------------------

#[test]
fn archive_moves_to_dated_folder() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    create(&dir, "task", "x");
    agile(&dir).args(["archive", "x"]).assert().success();

    assert!(!dir.path().join("agile/1-backlog/x").exists());
    let archived: Vec<String> = std::fs::read_dir(dir.path().join("agile/archive"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(archived.len(), 1);
    assert!(archived[0].starts_with("x-"));
    assert!(dir.path().join("agile/archive").join(&archived[0]).join("task.md").is_file());
}

#[test]
fn delete_removes_issue() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    create(&dir, "task", "x");
    agile(&dir).args(["delete", "x"]).assert().success();
    assert!(!dir.path().join("agile/1-backlog/x").exists());
    agile(&dir)
        .args(["delete", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("issue not found: x"));
}

#[test]
fn root_flag_overrides_cwd() {
    let dir = TempDir::new().unwrap();
    let elsewhere = TempDir::new().unwrap();
    let mut cmd = Command::cargo_bin("agile").unwrap();
    cmd.current_dir(elsewhere.path())
        .env_remove("AGILE_ROOT")
        .arg("--root")
        .arg(dir.path())
        .arg("init")
        .assert()
        .success();
    assert!(dir.path().join("agile/1-backlog").is_dir());
    assert!(!elsewhere.path().join("agile").exists());
}
