// CLI argument handling and configuration checks

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

// discard port; nothing should ever be sent to it in these tests
const UNREACHABLE_ENDPOINT: &str = "http://127.0.0.1:9/errors";

fn errlogger() -> Command {
    let mut cmd = Command::cargo_bin("errlogger").unwrap();
    for key in [
        "ERRLOGGER_ENDPOINT_URL",
        "ERRLOGGER_PAGE_URL",
        "ERRLOGGER_PARAMS",
        "ERRLOGGER_REQUEST_TIMEOUT_SECS",
        "ERRLOGGER_MAX_QUEUE_LEN",
    ] {
        cmd.env_remove(key);
    }
    cmd
}

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_help_lists_subcommands() {
    errlogger()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("send"))
        .stdout(predicate::str::contains("check-config"));
}

#[test]
fn test_check_config_reports_endpoint() {
    let file = config_file(
        r#"
endpoint_url = "https://collector.example.com/errors"

[additional_params]
app = "storefront"
"#,
    );

    errlogger()
        .args(["check-config", "--file"])
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "ok, delivering to https://collector.example.com/errors",
        ));
}

#[test]
fn test_check_config_without_endpoint_is_disabled() {
    let file = config_file("page_url = \"https://shop.example.com\"\n");

    errlogger()
        .args(["check-config", "--file"])
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("logger disabled"));
}

#[test]
fn test_check_config_rejects_malformed_file() {
    let file = config_file("endpoint_url = [unclosed");

    errlogger()
        .args(["check-config", "--file"])
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse configuration file"));
}

#[test]
fn test_check_config_rejects_non_finite_jitter() {
    let file = config_file(
        r#"
endpoint_url = "https://collector.example.com/errors"

[retry.jitter]
type = "proportional_range"
min = nan
max = 1.2
"#,
    );

    errlogger()
        .args(["check-config", "--file"])
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("retry.jitter"));
}

#[test]
fn test_send_requires_message() {
    errlogger()
        .args(["send", "--endpoint", UNREACHABLE_ENDPOINT])
        .assert()
        .failure()
        .stderr(predicate::str::contains("required"));
}

#[test]
fn test_send_filtered_error_needs_no_collector() {
    errlogger()
        .args([
            "send",
            "--endpoint",
            UNREACHABLE_ENDPOINT,
            "--param",
            "app=web",
            "Script error.",
        ])
        .assert()
        .success();
}

#[test]
fn test_param_without_value_is_rejected() {
    errlogger()
        .args([
            "send",
            "--endpoint",
            UNREACHABLE_ENDPOINT,
            "--param",
            "novalue",
            "Script error.",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected key=value"));
}

#[test]
fn test_explicit_endpoint_ignores_environment() {
    errlogger()
        .env("ERRLOGGER_MAX_QUEUE_LEN", "lots")
        .args(["send", "--endpoint", UNREACHABLE_ENDPOINT, "Script error."])
        .assert()
        .success();
}

#[test]
fn test_bad_environment_fails_without_endpoint() {
    errlogger()
        .env("ERRLOGGER_MAX_QUEUE_LEN", "lots")
        .args(["send", "Script error."])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ERRLOGGER_MAX_QUEUE_LEN"));
}

#[test]
fn test_send_without_endpoint_is_a_no_op() {
    errlogger()
        .args(["send", "TypeError: cart is undefined"])
        .assert()
        .success();
}
