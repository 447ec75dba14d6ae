use predicates::prelude::*;
use std::thread;
use std::time::Duration;

use crate::common::TestProject;

const CONFIG: &str = "context:\n  var: World\n";

fn project_with_two_templates() -> TestProject {
    let project = TestProject::with_config(CONFIG);
    project.write("a.etch.txt", "Hello, {{ var }}!");
    project.write("nested/b.etch.txt", "Goodbye, {{ var }}!");
    project
}

#[test]
fn test_lockfile_records_fingerprints() {
    let project = TestProject::with_config(CONFIG);
    project.write("a.etch.txt", "Hello, {{ var }}!");

    project.etch().assert().success();

    let lockfile = project.lockfile();
    assert_eq!(lockfile["version"], env!("CARGO_PKG_VERSION"));
    // FNV-1a of "Hello, World!"
    assert_eq!(lockfile["files"]["a.etch.txt"], 1_525_479_220u32);
}

#[test]
fn test_second_run_is_idempotent() {
    let project = project_with_two_templates();

    project
        .etch()
        .assert()
        .success()
        .stdout(predicate::str::contains("2 template(s) written, 0 identical. Lockfile modified."));

    let lock_mtime = project.modified(".etch.lock");
    let output_mtime = project.modified("a.txt");
    thread::sleep(Duration::from_millis(50));

    project
        .etch()
        .assert()
        .success()
        .stdout(predicate::str::contains("0 template(s) written, 2 identical. Lockfile unchanged."));

    assert_eq!(project.modified(".etch.lock"), lock_mtime);
    assert_eq!(project.modified("a.txt"), output_mtime);
}

#[test]
fn test_changed_context_rewrites_output() {
    let project = project_with_two_templates();
    project.etch().assert().success();

    project.write_config("context:\n  var: Moon\n");
    project
        .etch()
        .assert()
        .success()
        .stdout(predicate::str::contains("2 template(s) written"));

    assert_eq!(project.read("a.txt"), "Hello, Moon!");
    assert_eq!(project.read("nested/b.txt"), "Goodbye, Moon!");
}

#[test]
fn test_deleted_output_is_restored() {
    let project = project_with_two_templates();
    project.etch().assert().success();

    project.remove("a.txt");
    project
        .etch()
        .assert()
        .success()
        .stdout(predicate::str::contains("1 template(s) written, 1 identical."));

    assert_eq!(project.read("a.txt"), "Hello, World!");
}

#[test]
fn test_hand_edited_output_is_kept_while_fingerprint_matches() {
    let project = project_with_two_templates();
    project.etch().assert().success();

    project.write("a.txt", "edited by hand");
    project.etch().assert().success();

    assert_eq!(project.read("a.txt"), "edited by hand");
}

#[test]
fn test_force_rewrites_everything() {
    let project = project_with_two_templates();
    project.etch().assert().success();

    project.write("a.txt", "edited by hand");
    project
        .etch()
        .arg("--force")
        .assert()
        .success()
        .stdout(predicate::str::contains("2 template(s) written, 0 identical."));

    assert_eq!(project.read("a.txt"), "Hello, World!");
}

#[test]
fn test_corrupt_lockfiles_are_reset() {
    for corrupt in [
        "this is not json",
        "[1, 2, 3]",
        "{\"version\": \"0.0.0-other\", \"files\": {}}",
        "{\"version\": \"0.1.0\"}",
    ] {
        let project = project_with_two_templates();
        project.write(".etch.lock", corrupt);

        project
            .etch()
            .arg("-v")
            .assert()
            .success()
            .stdout(predicate::str::contains("Invalid lockfile. Resetting..."))
            .stdout(predicate::str::contains("2 template(s) written"));

        let lockfile = project.lockfile();
        assert_eq!(lockfile["version"], env!("CARGO_PKG_VERSION"), "input: {corrupt}");
        assert_eq!(
            project.lockfile_keys(),
            vec!["a.etch.txt".to_string(), "nested/b.etch.txt".to_string()],
            "input: {corrupt}"
        );
    }
}

#[test]
fn test_deleted_template_is_pruned() {
    let project = project_with_two_templates();
    project.etch().assert().success();
    assert_eq!(project.lockfile_keys().len(), 2);

    project.remove("nested/b.etch.txt");
    project.remove("nested/b.txt");
    project
        .etch()
        .assert()
        .success()
        .stdout(predicate::str::contains("0 template(s) written, 1 identical. Lockfile modified."));

    assert_eq!(project.lockfile_keys(), vec!["a.etch.txt".to_string()]);
    assert!(!project.exists("nested/b.txt"));
}

#[test]
fn test_lockfile_is_pretty_printed() {
    let project = TestProject::with_config(CONFIG);
    project.write("a.etch.txt", "Hello, {{ var }}!");
    project.etch().assert().success();

    let text = project.read(".etch.lock");
    assert!(text.starts_with("{\n    \"version\""));
    assert!(text.ends_with("}\n"));
}
