//! End-to-end tests for the `gw` command-line interface.

#![allow(deprecated)] // Command::cargo_bin – macro replacement not yet stable

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn gw() -> Command {
    let mut cmd = Command::cargo_bin("gw").unwrap();
    cmd.env("NO_COLOR", "1");
    cmd
}

/// A roster file with two adventurers and a troll.
fn roster_file() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("party.json"),
        r#"{
  "entrants": [
    { "id": "Actor.xara", "name": "Xara", "abilities": { "str": 10, "dex": 16, "con": 12, "int": 10, "wis": 10, "cha": 10 }, "skills": ["stealth"] },
    { "id": "Actor.bram", "name": "Bram" },
    { "id": "Actor.troll", "name": "Cave Troll", "abilities": { "str": 18, "dex": 6, "con": 18, "int": 4, "wis": 8, "cha": 4 } }
  ]
}"#,
    )
    .unwrap();
    dir
}

// ---------------------------------------------------------------------------
// verdict
// ---------------------------------------------------------------------------

#[test]
fn verdict_majority_against_dc() {
    gw().args(["verdict", "--actors", "15,8,19", "--dc", "12"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Passes: 2/3 (2 needed)"))
        .stdout(predicate::str::contains("Success"));
}

#[test]
fn verdict_majority_fails_below_half() {
    gw().args(["verdict", "--actors", "5,8,19", "--dc", "12"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Failure"));
}

#[test]
fn verdict_average_rule() {
    gw().args(["verdict", "--actors", "10,14", "--dc", "12", "--average"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Actor average: 12.0"))
        .stdout(predicate::str::contains("Success"))
        .stdout(predicate::str::contains("average rule"));
}

#[test]
fn verdict_contested_threshold() {
    gw().args(["verdict", "--contestants", "10,16", "--actors", "14"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Threshold: 13.0 (contestant average)"))
        .stdout(predicate::str::contains("Success"));
}

#[test]
fn verdict_without_threshold_is_undecided() {
    gw().args(["verdict", "--actors", "20"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Undecided"));
}

#[test]
fn verdict_requires_actors() {
    gw().args(["verdict", "--dc", "10"]).assert().failure();
}

// ---------------------------------------------------------------------------
// roll
// ---------------------------------------------------------------------------

#[test]
fn roll_formula_is_reproducible_with_seed() {
    let first = gw()
        .args(["roll", "1d20+5", "-n", "3", "--seed", "7"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1d20 + 5"))
        .get_output()
        .stdout
        .clone();
    let second = gw()
        .args(["roll", "1d20+5", "-n", "3", "--seed", "7"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    assert_eq!(first, second);
}

#[test]
fn roll_mode_builds_keep_highest() {
    gw().args(["roll", "--mode", "advantage", "--modifier", "-2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2d20kh - 2"));
}

#[test]
fn roll_rejects_bad_formula() {
    gw().args(["roll", "banana"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn roll_rejects_unknown_mode() {
    gw().args(["roll", "--mode", "sideways"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown roll mode"));
}

// ---------------------------------------------------------------------------
// roster
// ---------------------------------------------------------------------------

#[test]
fn roster_lists_demo_party() {
    gw().arg("roster")
        .assert()
        .success()
        .stdout(predicate::str::contains("Kael Stormborn"))
        .stdout(predicate::str::contains("6 entrants"));
}

#[test]
fn roster_from_file_with_ability_column() {
    let dir = roster_file();
    gw().args(["roster", "--roster"])
        .arg(dir.path().join("party.json"))
        .args(["-k", "stealth"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Xara"))
        .stdout(predicate::str::contains("Cave Troll"))
        .stdout(predicate::str::contains("+5"));
}

#[test]
fn roster_json_round_trips_file() {
    let dir = roster_file();
    gw().args(["roster", "--json", "--roster"])
        .arg(dir.path().join("party.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("\"Actor.bram\""));
}

#[test]
fn roster_missing_file_fails() {
    gw().args(["roster", "--roster", "/nonexistent/party.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot read"));
}

#[test]
fn roster_empty_file_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("empty.json");
    fs::write(&path, r#"{"entrants": []}"#).unwrap();
    gw().args(["roster", "--roster"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no entrants"));
}

// ---------------------------------------------------------------------------
// simulate
// ---------------------------------------------------------------------------

#[test]
fn simulate_default_party_agrees() {
    gw().arg("simulate")
        .assert()
        .success()
        .stdout(predicate::str::contains("Group Check"))
        .stdout(predicate::str::contains("6 actors vs DC 12, majority rule"))
        .stdout(predicate::str::contains("Verdict:"))
        .stdout(predicate::str::contains("Replicas: 7/7 agree"));
}

#[test]
fn simulate_duplicate_delivery_still_agrees() {
    gw().args(["simulate", "--duplicate", "--seed", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Replicas: 7/7 agree"))
        .stdout(predicate::str::contains("duplicate delivery"));
}

#[test]
fn simulate_contested_check() {
    gw().args([
        "simulate",
        "--actors",
        "Kael Stormborn,Mira Quickfoot",
        "--contestants",
        "Grisly Ogre",
        "-k",
        "athletics",
    ])
    .assert()
    .success()
    .stdout(predicate::str::contains("contested by Grisly Ogre"))
    .stdout(predicate::str::contains("threshold"))
    .stdout(predicate::str::contains("Replicas: 3/3 agree"));
}

#[test]
fn simulate_abort_skips_recap() {
    gw().args(["simulate", "--abort", "--export", "md"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Session aborted"))
        .stdout(predicate::str::contains("Replicas: 7/7 agree"))
        .stdout(predicate::str::contains("## ").not());
}

#[test]
fn simulate_force_after_marks_forced() {
    gw().args(["simulate", "--force-after", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(forced)"))
        .stdout(predicate::str::contains("--"));
}

#[test]
fn simulate_exports_markdown() {
    gw().args(["simulate", "--label", "Cross the bridge", "--export", "md"])
        .assert()
        .success()
        .stdout(predicate::str::contains("## Cross the bridge"))
        .stdout(predicate::str::contains("majority rule"));
}

#[test]
fn simulate_exports_text() {
    gw().args(["simulate", "--dc", "9", "--show-dc", "--export", "text"])
        .assert()
        .success()
        .stdout(predicate::str::contains("DC 9, majority rule"))
        .stdout(predicate::str::contains("Outcome:"));
}

#[test]
fn simulate_hides_names() {
    gw().args(["simulate", "--hide-names"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Unknown"))
        .stdout(predicate::str::contains("Kael Stormborn").not());
}

#[test]
fn simulate_with_roster_file() {
    let dir = roster_file();
    gw().args(["simulate", "--roster"])
        .arg(dir.path().join("party.json"))
        .args(["--actors", "Xara,Bram", "--contestants", "Cave Troll"])
        .assert()
        .success()
        .stdout(predicate::str::contains("contested by Cave Troll"))
        .stdout(predicate::str::contains("Replicas: 3/3 agree"));
}

#[test]
fn simulate_rejects_unknown_ability() {
    gw().args(["simulate", "-k", "wizardry"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown ability key"));
}

#[test]
fn simulate_rejects_unknown_entrant() {
    gw().args(["simulate", "--actors", "Nobody"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no entrant named 'Nobody'"));
}

#[test]
fn simulate_abort_conflicts_with_force() {
    gw().args(["simulate", "--abort", "--force-after", "1"])
        .assert()
        .failure();
}
