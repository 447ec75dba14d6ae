use assert_cmd::Command;
use predicates::prelude::*;

use crate::common::TestProject;

#[test]
fn test_help_lists_commands() {
    Command::cargo_bin("etch")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("render"))
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("--force"));
}

#[test]
fn test_version() {
    Command::cargo_bin("etch")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_missing_config_suggests_init() {
    let project = TestProject::new();
    project.write("a.etch.txt", "{{ var }}");

    project
        .etch()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Could not find config file"))
        .stderr(predicate::str::contains("etch init"));
}

#[test]
fn test_yaml_extension_fallback() {
    let project = TestProject::new();
    project.write("etch.config.yaml", "context:\n  var: fallback\n");
    project.write("a.etch.txt", "{{ var }}");

    project.etch().assert().success();

    assert_eq!(project.read("a.txt"), "fallback");
}

#[test]
fn test_config_flag() {
    let project = TestProject::new();
    project.write("ci/etch.yml", "context:\n  var: ci\n");
    project.write("a.etch.txt", "{{ var }}");

    project.etch().args(["--config", "ci/etch.yml"]).assert().success();

    assert_eq!(project.read("a.txt"), "ci");
}

#[test]
fn test_config_with_wrong_extension() {
    let project = TestProject::new();
    project.write("etch.json", "{}");

    project
        .etch()
        .args(["-c", "etch.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("must be a YAML file"));
}

#[test]
fn test_root_is_file() {
    let project = TestProject::with_config("context: {}\n");
    project.write("notes.txt", "plain");

    project
        .etch()
        .arg("notes.txt")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Please specify a directory to search instead."));
}

#[cfg(unix)]
#[test]
fn test_root_is_checked_before_setup() {
    let project = TestProject::with_config("setup:\n  - touch setup-ran\n");
    project.write("notes.txt", "plain");

    project.etch().arg("notes.txt").assert().failure();

    assert!(!project.exists("setup-ran"));
}

#[test]
fn test_root_does_not_exist() {
    let project = TestProject::with_config("context: {}\n");

    project
        .etch()
        .arg("nowhere")
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_quiet_prints_nothing_on_success() {
    let project = TestProject::with_config("context:\n  var: World\n");
    project.write("a.etch.txt", "{{ var }}");

    project.etch().arg("-q").assert().success().stdout(predicate::str::is_empty());

    assert_eq!(project.read("a.txt"), "World");
}

#[test]
fn test_render_subcommand_matches_default() {
    let project = TestProject::with_config("context:\n  var: World\n");
    project.write("a.etch.txt", "{{ var }}");

    project
        .etch()
        .args(["render", "."])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 template(s) written"));

    project
        .etch()
        .assert()
        .success()
        .stdout(predicate::str::contains("0 template(s) written, 1 identical."));
}

#[test]
fn test_init_then_render() {
    let project = TestProject::new();

    project
        .etch()
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized"));
    assert!(project.exists("etch.config.yml"));

    project
        .etch()
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    project.write("README.etch.md", "# {{ project }}\n");
    project.etch().assert().success();

    assert_eq!(project.read("README.md"), "# my-project\n");
}

#[test]
fn test_init_force_overwrites() {
    let project = TestProject::with_config("context: {}\n");

    project.etch().args(["init", "--force"]).assert().success();

    assert!(project.read("etch.config.yml").contains("# etch configuration"));
}
