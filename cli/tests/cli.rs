//! CLI surface tests
//!
//! Exercise flag parsing and pre-connection validation; nothing here
//! requires a database.

use assert_cmd::Command;
use predicates::prelude::*;

fn pgschema() -> Command {
    Command::cargo_bin("pgschema").unwrap()
}

#[test]
fn help_lists_both_verbs() {
    pgschema()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("plan"))
        .stdout(predicate::str::contains("apply"));
}

#[test]
fn apply_requires_file_or_plan() {
    pgschema()
        .args(["apply", "--db", "appdb"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("exactly one of --file or --plan"));
}

#[test]
fn apply_rejects_file_and_plan_together() {
    pgschema()
        .args([
            "apply",
            "--db",
            "appdb",
            "--file",
            "schema.sql",
            "--plan",
            "plan.json",
        ])
        .assert()
        .failure();
}

#[test]
fn plan_rejects_two_stdout_outputs() {
    pgschema()
        .args([
            "plan",
            "--db",
            "appdb",
            "--file",
            "schema.sql",
            "--output-human",
            "-",
            "--output-json",
            "-",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("at most one"));
}

#[test]
fn plan_reports_unreadable_desired_file() {
    pgschema()
        .args([
            "plan",
            "--db",
            "appdb",
            "--file",
            "definitely-not-here.sql",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read"));
}

#[test]
fn invalid_lock_timeout_is_rejected_at_parse_time() {
    pgschema()
        .args([
            "apply",
            "--db",
            "appdb",
            "--file",
            "schema.sql",
            "--lock-timeout",
            "30y",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown duration unit"));
}
