
use predicates::boolean::PredicateBooleanExt;
use predicates::str::contains;

use crate::setup::{DEFAULT_TIMEOUT, make_cli};

#[test]
/// ./csv2sheet --help
fn test_help_lists_commands() {
    let mut cmd = make_cli();

    cmd.timeout(DEFAULT_TIMEOUT)
        .arg("--help")
        .assert()
        .success()
        .stdout(
            contains("serve")
                .and(contains("handle"))
                .and(contains("read"))
                .and(contains("add-sheet")),
        );
}

#[test]
/// Non-csv uploads are ignored without touching the network.
fn test_handle_ignores_non_csv() {
    let mut cmd = make_cli();

    cmd.timeout(DEFAULT_TIMEOUT)
        .args(["handle", "--bucket", "uploads", "--name", "notes.txt"])
        .assert()
        .success()
        .stdout(contains(r#"{"outcome":"ignored","name":"notes.txt"}"#));
}

#[test]
/// Both bucket and name are needed to describe an object.
fn test_handle_requires_name() {
    let mut cmd = make_cli();

    cmd.timeout(DEFAULT_TIMEOUT)
        .args(["handle", "--bucket", "uploads"])
        .assert()
        .failure()
        .stderr(
            contains("the following required arguments were not provided:")
                .and(contains("--name <NAME>")),
        );
}

#[test]
fn test_unknown_log_format() {
    let mut cmd = make_cli();

    cmd.timeout(DEFAULT_TIMEOUT)
        .args(["--log-format", "xml", "handle", "--bucket", "b", "--name", "a.txt"])
        .assert()
        .failure()
        .stderr(contains("Unknown log format: 'xml'"));
}

#[test]
fn test_missing_credentials_file() {
    let mut cmd = make_cli();

    cmd.timeout(DEFAULT_TIMEOUT)
        .args(["--credentials", "/does/not/exist.json"])
        .args(["handle", "--bucket", "uploads", "--name", "a.csv"])
        .assert()
        .failure()
        .stdout(contains(
            "ERROR: Failed to read service account key at '/does/not/exist.json'",
        ));
}

#[test]
/// ./csv2sheet serve --bind 127.0.0.1:0
fn test_serve_bind_addr() {
    let mut cmd = make_cli();

    cmd.timeout(DEFAULT_TIMEOUT)
        .args(["serve", "--bind", "127.0.0.1:0"])
        .assert()
        .interrupted(/* We expect a timeout here */)
        .stdout(contains("Listening on http://127.0.0.1:"));
}
