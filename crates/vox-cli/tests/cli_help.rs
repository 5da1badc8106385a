use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

#[test]
fn test_help_shows_all_commands() {
    cargo_bin_cmd!("vox")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("render"))
        .stdout(predicate::str::contains("normalize"))
        .stdout(predicate::str::contains("prompt"))
        .stdout(predicate::str::contains("voices"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_render_help_shows_options() {
    cargo_bin_cmd!("vox")
        .args(["render", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--url"))
        .stdout(predicate::str::contains("--show-latency"))
        .stdout(predicate::str::contains("--strategy"))
        .stdout(predicate::str::contains("--height"));
}

#[test]
fn test_unknown_strategy_is_rejected() {
    cargo_bin_cmd!("vox")
        .args(["normalize", "--strategy", "shout", "hi"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_voices_marks_default() {
    let dir = tempfile::tempdir().unwrap();

    cargo_bin_cmd!("vox")
        .env("VOX_HOME", dir.path())
        .arg("voices")
        .assert()
        .success()
        .stdout(predicate::str::contains("* Asteria"))
        .stdout(predicate::str::contains("aura-arcas-en"));
}
