use predicates::prelude::*;

use crate::common::TestProject;

const HELLO_CONFIG: &str = "context:\n  var: World\n";

#[test]
fn test_in_place_template_renders_next_to_source() {
    let project = TestProject::with_config(HELLO_CONFIG);
    project.write("greeting.etch.txt", "Hello, {{ var }}!");

    project
        .etch()
        .assert()
        .success()
        .stdout(predicate::str::contains("1 template(s) written, 0 identical. Lockfile modified."));

    assert_eq!(project.read("greeting.txt"), "Hello, World!");
    assert!(project.exists("greeting.etch.txt"), "source template must be kept");
}

#[test]
fn test_marker_at_end_of_name() {
    let project = TestProject::with_config(HELLO_CONFIG);
    project.write("config/settings.etch", "name = \"{{ var }}\"\n");

    project.etch().assert().success();

    assert_eq!(project.read("config/settings"), "name = \"World\"\n");
}

#[test]
fn test_trailing_newline_kept_by_default() {
    let project = TestProject::with_config(HELLO_CONFIG);
    project.write("a.etch.md", "# {{ var }}\n");

    project.etch().assert().success();

    assert_eq!(project.read("a.md"), "# World\n");
}

#[test]
fn test_child_writes_root_render_to_own_output() {
    let project = TestProject::with_config("context:\n  service: api\n");
    project.write("templates/Dockerfile.etch", "FROM base\nLABEL service={{ service }}\n");
    project.write("services/api/Dockerfile.etch", "!etch:child templates/Dockerfile.etch\n");
    project.write("services/worker/Dockerfile.etch", "!etch:child templates/Dockerfile.etch");

    project.etch().assert().success();

    let expected = "FROM base\nLABEL service=api\n";
    assert_eq!(project.read("services/api/Dockerfile"), expected);
    assert_eq!(project.read("services/worker/Dockerfile"), expected);
    assert_eq!(project.read("templates/Dockerfile"), expected);

    // Pointer files are left untouched
    assert_eq!(
        project.read("services/worker/Dockerfile.etch"),
        "!etch:child templates/Dockerfile.etch"
    );
    assert_eq!(project.lockfile_keys(), vec!["templates/Dockerfile.etch".to_string()]);
}

#[test]
fn test_child_with_missing_root_template_fails() {
    let project = TestProject::with_config(HELLO_CONFIG);
    project.write("svc/app.etch.yml", "!etch:child templates/missing.etch.yml");

    project
        .etch()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid child template"));

    assert!(!project.exists("svc/app.yml"));
    assert!(!project.exists(".etch.lock"));
}

#[test]
fn test_excluded_paths_are_not_rendered() {
    let project = TestProject::with_config("context:\n  var: World\nexclude:\n  - vendor/\n  - \"*.skip.*\"\n");
    project.write("vendor/lib.etch.txt", "{{ var }}");
    project.write("note.etch.skip.txt", "{{ var }}");
    project.write("kept.etch.txt", "{{ var }}");

    project.etch().assert().success();

    assert!(project.exists("kept.txt"));
    assert!(!project.exists("vendor/lib.txt"));
    assert!(!project.exists("note.skip.txt"));
}

#[test]
fn test_ignore_files_are_applied() {
    let project =
        TestProject::with_config("context:\n  var: World\nignore_files:\n  - .gitignore\n");
    project.write(".gitignore", "# build output\nbuild/\n");
    project.write("build/out.etch.txt", "{{ var }}");
    project.write("src/in.etch.txt", "{{ var }}");

    project.etch().assert().success();

    assert!(project.exists("src/in.txt"));
    assert!(!project.exists("build/out.txt"));
}

#[test]
fn test_missing_ignore_file_fails() {
    let project =
        TestProject::with_config("context:\n  var: World\nignore_files:\n  - .missingignore\n");
    project.write("a.etch.txt", "{{ var }}");

    project
        .etch()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Could not find git-style ignore file"));
    assert!(!project.exists("a.txt"));
}

#[test]
fn test_render_error_aborts_without_writes() {
    let project = TestProject::with_config(HELLO_CONFIG);
    project.write("a.etch.txt", "{{ var }}");
    project.write("b.etch.txt", "{% if %}");

    project
        .etch()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to render template"));

    assert!(!project.exists("a.txt"));
    assert!(!project.exists(".etch.lock"));
}

#[test]
fn test_undefined_variable_is_an_error() {
    let project = TestProject::with_config(HELLO_CONFIG);
    project.write("a.etch.txt", "{{ missing }}");

    project.etch().assert().failure();
    assert!(!project.exists("a.txt"));
}

#[test]
fn test_custom_template_matcher() {
    let project =
        TestProject::with_config("context:\n  var: World\ntemplate_matcher: \"tpl|tmpl\"\n");
    project.write("a.tpl.txt", "{{ var }}");
    project.write("b.tmpl.txt", "{{ var }}");
    project.write("c.etch.txt", "{{ var }}");

    project.etch().assert().success();

    assert_eq!(project.read("a.txt"), "World");
    assert_eq!(project.read("b.txt"), "World");
    assert!(!project.exists("c.txt"));
}

#[test]
fn test_custom_delimiters() {
    let project = TestProject::with_config(
        "context:\n  var: World\nengine:\n  variable_start_string: \"<<\"\n  variable_end_string: \">>\"\n",
    );
    project.write("a.etch.txt", "<< var >> {{ untouched }}");

    project.etch().assert().success();

    assert_eq!(project.read("a.txt"), "World {{ untouched }}");
}

#[test]
fn test_tera_engine() {
    let project = TestProject::with_config("context:\n  items: [a, b]\nengine:\n  kind: tera\n");
    project.write("list.etch.txt", "{% for i in items %}{{ i | upper }}{% endfor %}");

    project.etch().assert().success();

    assert_eq!(project.read("list.txt"), "AB");
}

#[test]
fn test_include_resolves_from_root() {
    let project = TestProject::with_config(HELLO_CONFIG);
    project.write("partials/header.txt", "== {{ var }} ==");
    project.write("docs/page.etch.txt", "{% include 'partials/header.txt' %}\nbody");

    project.etch().assert().success();

    assert_eq!(project.read("docs/page.txt"), "== World ==\nbody");
}

#[test]
fn test_explicit_root_argument() {
    let project = TestProject::with_config(HELLO_CONFIG);
    project.write("site/index.etch.html", "<h1>{{ var }}</h1>");
    project.write("other/skip.etch.txt", "{{ var }}");

    project.etch().arg("site").assert().success();

    assert_eq!(project.read("site/index.html"), "<h1>World</h1>");
    assert!(project.exists("site/.etch.lock"));
    assert!(!project.exists("other/skip.txt"));
    assert!(!project.exists(".etch.lock"));
}

#[test]
fn test_verbose_prints_progress() {
    let project = TestProject::with_config(HELLO_CONFIG);
    project.write("a.etch.txt", "{{ var }}");

    project
        .etch()
        .arg("--verbose")
        .assert()
        .success()
        .stdout(predicate::str::contains("Checked 0 non-ignored files."))
        .stdout(predicate::str::contains("Found in-place template at"))
        .stdout(predicate::str::contains("Writing compiled template to"));
}
