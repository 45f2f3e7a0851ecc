#![allow(deprecated)] // Command::cargo_bin – macro replacement not yet stable

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const BUNDLE: &str = r#"{
    "engine": {"seed": 1, "learner_name": "Sam", "audio_enabled": false},
    "catalog": {
        "interactions": [
            {
                "interaction_id": 1, "interaction_type": "one-step",
                "npc": {"character_id": "ana", "character_name": "Ana", "text": "You're late."},
                "detailed_responses": [
                    {"id": 1, "text": "Sorry I'm late.", "topic": "delay", "function": "apologize", "tone": "polite"},
                    {"id": 2, "text": "Whatever.", "topic": "delay", "function": "dismiss", "tone": "rude"}
                ],
                "expectations": {"topic": "delay", "function": ["apologize"], "tone": ["polite"]},
                "success_weights": {"topic": 0.4, "function": 0.4, "tone": 0.2}
            },
            {
                "interaction_id": 2, "interaction_type": "reord",
                "npc": {"character_id": "ana", "character_name": "Ana", "text": "Put it in order."},
                "reord_segments": [{"text": "Let's "}, {"text": "go."}],
                "expectations": {"high": ["Let's go."]},
                "success_weights": {"high": 1.0},
                "hint": "Start with Let's."
            },
            {
                "interaction_id": 3, "interaction_type": "dialogue",
                "npc": {"character_id": "ben", "character_name": "Ben"},
                "lines": [
                    {"text": "Ready, {characterName}?"},
                    {"text": "Ready.", "character_id": "user"}
                ]
            }
        ]
    },
    "navigation": {
        "slots": ["nextScene"],
        "consequence": [{"interaction_id": 1, "when": {"response_id": 2}, "endpoint": true, "slot": 0, "value": 3}],
        "choice": [{"interaction_id": 1, "when": {"response_id": 1}, "endpoint": false}],
        "dialogue": [{"interaction_id": 3, "slot": 0, "value": 7}]
    }
}"#;

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("bundle.json"), BUNDLE).unwrap();
        Self { dir }
    }

    fn bundle(&self) -> PathBuf {
        self.dir.path().join("bundle.json")
    }

    fn script(&self, steps: &str) -> PathBuf {
        let path = self.dir.path().join("script.json");
        fs::write(&path, steps).unwrap();
        path
    }

    fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }
}

fn rh() -> Command {
    Command::cargo_bin("rh").unwrap()
}

// ---------------------------------------------------------------------------
// check
// ---------------------------------------------------------------------------

#[test]
fn check_valid_bundle() {
    let f = Fixture::new();
    rh().arg("check")
        .arg(f.bundle())
        .assert()
        .success()
        .stdout(predicate::str::contains("All checks passed"))
        .stdout(predicate::str::contains("3 interactions, 3 navigation rules"));
}

#[test]
fn check_reports_dangling_rule() {
    let f = Fixture::new();
    let broken = BUNDLE.replace(r#""interaction_id": 3, "slot": 0"#, r#""interaction_id": 30, "slot": 0"#);
    let path = f.write("broken.json", &broken);
    rh().arg("check")
        .arg(path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("30"))
        .stderr(predicate::str::contains("1 issue found"));
}

#[test]
fn check_missing_file_fails() {
    rh().arg("check")
        .arg("/nonexistent/bundle.json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot read"));
}

// ---------------------------------------------------------------------------
// list / show
// ---------------------------------------------------------------------------

#[test]
fn list_all_interactions() {
    let f = Fixture::new();
    rh().arg("list")
        .arg(f.bundle())
        .assert()
        .success()
        .stdout(predicate::str::contains("one-step"))
        .stdout(predicate::str::contains("reord"))
        .stdout(predicate::str::contains("3 interactions"));
}

#[test]
fn list_filtered_by_kind() {
    let f = Fixture::new();
    rh().args(["list", "--kind", "dialogue"])
        .arg(f.bundle())
        .assert()
        .success()
        .stdout(predicate::str::contains("Ben"))
        .stdout(predicate::str::contains("1 interaction"))
        .stdout(predicate::str::contains("one-step").not());
}

#[test]
fn show_interaction_with_rules() {
    let f = Fixture::new();
    rh().arg("show")
        .arg(f.bundle())
        .arg("1")
        .assert()
        .success()
        .stdout(predicate::str::contains("Sorry I'm late."))
        .stdout(predicate::str::contains("nextScene = 3"));
}

#[test]
fn show_unknown_interaction_fails() {
    let f = Fixture::new();
    rh().arg("show")
        .arg(f.bundle())
        .arg("99")
        .assert()
        .failure()
        .stderr(predicate::str::contains("99"));
}

// ---------------------------------------------------------------------------
// play
// ---------------------------------------------------------------------------

#[test]
fn play_consequence_ends_session() {
    let f = Fixture::new();
    let script = f.script(
        r#"[{"enter": 1}, {"respond": {"id": 2, "text": "Whatever.", "topic": "delay", "function": "dismiss", "tone": "rude"}}]"#,
    );
    rh().arg("play")
        .arg(f.bundle())
        .arg("--script")
        .arg(script)
        .arg("--dump")
        .assert()
        .success()
        .stdout(predicate::str::contains("You're late."))
        .stdout(predicate::str::contains("scored 0.40"))
        .stdout(predicate::str::contains("end (rule fired)"))
        .stdout(predicate::str::contains("lastResponse_1"))
        .stdout(predicate::str::contains("nextScene"));
}

#[test]
fn play_reorder_and_dialogue() {
    let f = Fixture::new();
    let script = f.script(
        r#"[{"enter": 2}, "hint", {"reorder": "Let’s go."}, {"enter": 3}, "dialogue"]"#,
    );
    rh().arg("play")
        .arg(f.bundle())
        .arg("--script")
        .arg(script)
        .assert()
        .success()
        .stdout(predicate::str::contains("Start with Let's."))
        .stdout(predicate::str::contains("scored 1.00 (high)"))
        .stdout(predicate::str::contains("Ready, Sam?"))
        .stdout(predicate::str::contains("continue (rule fired)"));
}

#[test]
fn play_reports_failing_step() {
    let f = Fixture::new();
    let script = f.script(r#"[{"enter": 1}, {"reorder": "Let's go."}]"#);
    rh().arg("play")
        .arg(f.bundle())
        .arg("--script")
        .arg(script)
        .assert()
        .failure()
        .stderr(predicate::str::contains("step 2"))
        .stderr(predicate::str::contains("one-step"));
}

#[test]
fn play_rejects_malformed_script() {
    let f = Fixture::new();
    let script = f.script(r#"[{"teleport": 4}]"#);
    rh().arg("play")
        .arg(f.bundle())
        .arg("--script")
        .arg(script)
        .assert()
        .failure()
        .stderr(predicate::str::contains("script.json"));
}

#[test]
fn play_verbose_logs_steps() {
    let f = Fixture::new();
    let script = f.script(r#"[{"enter": 3}, "dialogue"]"#);
    rh().arg("-vv")
        .arg("play")
        .arg(f.bundle())
        .arg("--script")
        .arg(script)
        .assert()
        .success()
        .stderr(predicate::str::contains("bundle loaded"))
        .stderr(predicate::str::contains("running step"));
}

#[test]
fn play_rejects_a_second_response() {
    let f = Fixture::new();
    let script = f.script(
        r#"[{"enter": 1}, {"choose": 0}, {"choose": 1}]"#,
    );
    rh().arg("play")
        .arg(f.bundle())
        .arg("--script")
        .arg(script)
        .assert()
        .failure()
        .stderr(predicate::str::contains("step 3"))
        .stderr(predicate::str::contains("done"));
}
