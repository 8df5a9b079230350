//! CLI tests for `checklist report`, `stats`, `validate` and `init`.
//!
//! Spawns the checklist binary inside a temp event folder and verifies exit
//! codes and the files it leaves behind.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use checklist::exit_codes;
use checklist::io::config::{ChecklistConfig, load_config, write_config};
use checklist::test_support::fixture_path;

fn event_folder(fixtures: &[&str], cfg: &ChecklistConfig) -> tempfile::TempDir {
    let temp = tempfile::tempdir().expect("tempdir");
    write_config(&temp.path().join("checklist.toml"), cfg).expect("write config");
    let drop = temp.path().join(&cfg.source.dir);
    fs::create_dir_all(&drop).expect("create drop folder");
    for name in fixtures {
        fs::copy(fixture_path(name), drop.join(name)).expect("copy fixture");
    }
    temp
}

fn checklist(root: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_checklist"))
        .current_dir(root)
        .args(args)
        .output()
        .expect("run checklist")
}

#[test]
fn report_writes_html_and_prints_summary() {
    let temp = event_folder(
        &["snapshot_1000.yaml", "snapshot_1015.yaml"],
        &ChecklistConfig::default(),
    );

    let output = checklist(temp.path(), &["report"]);
    assert_eq!(output.status.code(), Some(exit_codes::OK));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Event statistics:"));
    assert!(stdout.contains("- dns: 2"));

    let html = fs::read_to_string(temp.path().join("online-checklist.html")).expect("report");
    assert!(html.contains("id=\"dataStatistics\""));
}

#[test]
fn report_json_override_and_publish() {
    let mut cfg = ChecklistConfig::default();
    cfg.publish.enabled = true;
    let temp = event_folder(&["snapshot_1000.yaml"], &cfg);

    let output = checklist(temp.path(), &["report", "--format", "json", "--output-dir", "out"]);
    assert_eq!(output.status.code(), Some(exit_codes::OK));

    let report = temp.path().join("out").join("online-checklist.json");
    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report).expect("report")).expect("json");
    assert_eq!(value["card_changes"][0]["runner_id"], "1203");
    assert!(temp.path().join("publish").join("online-checklist.json").is_file());
}

#[test]
fn malformed_snapshot_exits_with_malformed_code() {
    let temp = event_folder(
        &["snapshot_1000.yaml", "missing_created.yaml"],
        &ChecklistConfig::default(),
    );

    let output = checklist(temp.path(), &["report"]);
    assert_eq!(output.status.code(), Some(exit_codes::MALFORMED));
    assert!(String::from_utf8_lossy(&output.stderr).contains("missing_created.yaml"));
    assert!(!temp.path().join("online-checklist.html").exists());

    let output = checklist(temp.path(), &["validate"]);
    assert_eq!(output.status.code(), Some(exit_codes::MALFORMED));
}

#[test]
fn missing_drop_folder_is_invalid() {
    let temp = tempfile::tempdir().expect("tempdir");
    let output = checklist(temp.path(), &["stats", "--source", "nowhere"]);
    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    assert!(String::from_utf8_lossy(&output.stderr).contains("does not exist"));
}

#[test]
fn stats_prints_rows_in_order() {
    let temp = event_folder(
        &["snapshot_1015.yaml", "snapshot_1000.yaml"],
        &ChecklistConfig::default(),
    );

    let output = checklist(temp.path(), &["stats"]);
    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert!(lines[0].starts_with("snapshot_1000.yaml"));
    assert!(lines[1].starts_with("snapshot_1015.yaml"));
    assert_eq!(lines[2], "unmatched change logs: 1");
}

#[test]
fn init_writes_default_config_once() {
    let temp = tempfile::tempdir().expect("tempdir");
    let output = checklist(temp.path(), &["init"]);
    assert_eq!(output.status.code(), Some(exit_codes::OK));

    let config = temp.path().join("checklist.toml");
    assert_eq!(load_config(&config).expect("load"), ChecklistConfig::default());
    assert!(temp.path().join("snapshots").is_dir());

    fs::write(&config, "[report]\nname = \"custom\"\n").expect("edit");
    let output = checklist(temp.path(), &["init"]);
    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert!(fs::read_to_string(&config).expect("read").contains("custom"));

    let output = checklist(temp.path(), &["init", "--force"]);
    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert!(!fs::read_to_string(&config).expect("read").contains("custom"));
}
