use predicates::prelude::*;

use crate::common::TestProject;

#[test]
fn test_static_values_of_every_shape() {
    let project = TestProject::with_config(
        r#"
context:
  name: etch
  count: 3
  tags: [a, b]
  nested:
    type: static
    value:
      inner: deep
"#,
    );
    project.write(
        "out.etch.txt",
        "{{ name }} {{ count + 1 }} {{ tags | join(',') }} {{ nested.inner }}",
    );

    project.etch().assert().success();

    assert_eq!(project.read("out.txt"), "etch 4 a,b deep");
}

#[test]
fn test_environment_variable_with_default() {
    let project = TestProject::with_config(
        r#"
context:
  user:
    type: env
    value: ETCH_TEST_USER
  region:
    type: env
    value: ETCH_TEST_REGION_UNSET
    default: "  eu-west  "
"#,
    );
    project.write("out.etch.txt", "{{ user }}@{{ region }}");

    project
        .etch()
        .env("ETCH_TEST_USER", "  alice\n")
        .env_remove("ETCH_TEST_REGION_UNSET")
        .assert()
        .success();

    assert_eq!(project.read("out.txt"), "alice@eu-west");
}

#[test]
fn test_environment_variable_name_defaults_to_key() {
    let project = TestProject::with_config("context:\n  ETCH_TEST_SELF:\n    type: env\n");
    project.write("out.etch.txt", "{{ ETCH_TEST_SELF }}");

    project.etch().env("ETCH_TEST_SELF", "me").assert().success();

    assert_eq!(project.read("out.txt"), "me");
}

#[test]
fn test_missing_environment_variable_fails() {
    let project = TestProject::with_config(
        "context:\n  token:\n    type: env\n    value: ETCH_TEST_MISSING_TOKEN\n",
    );
    project.write("out.etch.txt", "{{ token }}");

    project
        .etch()
        .env_remove("ETCH_TEST_MISSING_TOKEN")
        .assert()
        .failure()
        .stderr(predicate::str::contains("ETCH_TEST_MISSING_TOKEN"));
    assert!(!project.exists("out.txt"));
}

#[test]
fn test_bool_coercion() {
    let project = TestProject::with_config(
        "context:\n  enabled:\n    type: static\n    value: \"true\"\n    as: bool\n",
    );
    project.write("out.etch.txt", "{% if enabled == true %}on{% else %}off{% endif %}");

    project.etch().assert().success();

    assert_eq!(project.read("out.txt"), "on");
}

#[test]
fn test_failed_coercion_aborts() {
    let project = TestProject::with_config(
        "context:\n  enabled:\n    type: static\n    value: truee\n    as: bool\n",
    );
    project.write("out.etch.txt", "{{ enabled }}");

    project
        .etch()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Could not convert value 'truee' to type 'bool'"));
    assert!(!project.exists("out.txt"));
}

#[test]
fn test_unknown_config_key_suggests_correction() {
    let project = TestProject::with_config("contxt:\n  var: x\n");

    project
        .etch()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown config key: 'contxt'"))
        .stderr(predicate::str::contains("Did you mean 'context'?"));
}

#[test]
fn test_repeated_context_keys_last_wins() {
    let project = TestProject::with_config(
        r#"
context:
  - name: first
  - other: kept
  - name: second
"#,
    );
    project.write("out.etch.txt", "{{ name }} {{ other }}");

    project.etch().assert().success();

    assert_eq!(project.read("out.txt"), "second kept");
}

#[cfg(unix)]
mod shell {
    use super::*;

    #[test]
    fn test_shell_output_is_trimmed() {
        let project = TestProject::with_config(
            "context:\n  greeting:\n    type: shell\n    value: echo \"Hello, World!\"\n",
        );
        project.write("out.etch.txt", "[{{ greeting }}]");

        project.etch().assert().success();

        assert_eq!(project.read("out.txt"), "[Hello, World!]");
    }

    #[test]
    fn test_multiline_shell_uses_last_command() {
        let project = TestProject::with_config(
            "context:\n  value:\n    type: shell\n    value: |\n      echo ignored\n      echo 42\n    as: int\n",
        );
        project.write("out.etch.txt", "{{ value + 1 }}");

        project.etch().assert().success();

        assert_eq!(project.read("out.txt"), "43");
    }

    #[test]
    fn test_empty_shell_output_fails() {
        let project =
            TestProject::with_config("context:\n  nothing:\n    type: shell\n    value: \"true\"\n");
        project.write("out.etch.txt", "{{ nothing }}");

        project
            .etch()
            .assert()
            .failure()
            .stderr(predicate::str::contains("printed nothing"));
    }

    #[test]
    fn test_failing_shell_command_reports_stderr() {
        let project = TestProject::with_config(
            "context:\n  broken:\n    type: shell\n    value: echo oops >&2; exit 3\n",
        );
        project.write("out.etch.txt", "{{ broken }}");

        project
            .etch()
            .assert()
            .failure()
            .stderr(predicate::str::contains("exit code 3"))
            .stderr(predicate::str::contains("oops"));
    }

    #[test]
    fn test_setup_runs_before_context() {
        let project = TestProject::with_config(
            "setup:\n  - echo from-setup > generated.txt\ncontext:\n  generated:\n    type: shell\n    value: cat generated.txt\n",
        );
        project.write("out.etch.txt", "{{ generated }}");

        project.etch().assert().success();

        assert_eq!(project.read("out.txt"), "from-setup");
    }
}
