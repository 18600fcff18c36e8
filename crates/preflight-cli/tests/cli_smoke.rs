use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_lists_the_backup_commands() {
    Command::cargo_bin("preflight")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("validate"))
        .stdout(predicate::str::contains("restore"))
        .stdout(predicate::str::contains("changes"));
}

#[test]
fn version_flag_works() {
    Command::cargo_bin("preflight")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("preflight"));
}

#[test]
fn config_show_prints_defaults_for_a_fresh_data_dir() {
    let dir = tempfile::tempdir().unwrap();
    Command::cargo_bin("preflight")
        .unwrap()
        .args(["--data-dir", dir.path().to_str().unwrap()])
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"backup_schedule\": \"daily\""))
        .stdout(predicate::str::contains("\"backup_retention\": 7"));
}

#[test]
fn changes_update_then_list_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().to_str().unwrap();

    Command::cargo_bin("preflight")
        .unwrap()
        .args(["--data-dir", data_dir])
        .args(["changes", "update"])
        .assert()
        .success()
        .stdout(predicate::str::contains("8 records"));

    Command::cargo_bin("preflight")
        .unwrap()
        .args(["--data-dir", data_dir])
        .args(["changes", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("zha_2024_9"));
}
