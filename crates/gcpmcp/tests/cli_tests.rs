use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn gcpmcp() -> Command {
    let mut cmd = Command::cargo_bin("gcpmcp").unwrap();
    cmd.env_remove("GOOGLE_CLOUD_PROJECT")
        .env_remove("GCPMCP_CONFIG")
        .env_remove("GCPMCP_REGION")
        .env_remove("GCPMCP_TIMEOUT_SECS")
        .env_remove("GCPMCP_LOG_LEVEL")
        .env("RUST_LOG", "warn");
    cmd
}

// ============================================================================
// COMMANDS
// ============================================================================

#[test]
fn test_version() {
    gcpmcp()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("gcpmcp"))
        .stdout(predicate::str::contains("2024-11-05"));
}

#[test]
fn test_tools_lists_every_tool_without_project() {
    let output = gcpmcp().arg("tools").output().unwrap();
    assert!(output.status.success());

    let definitions: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let names: Vec<&str> = definitions
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["name"].as_str().unwrap())
        .collect();

    assert_eq!(
        names,
        vec![
            "list-cloud-functions",
            "get-cloud-function-details",
            "get-cloud-function-source",
            "get-cloud-function-logs",
            "get-cloud-function-errors",
            "test-http-function",
            "get-cloud-function-metrics",
        ]
    );
}

#[test]
fn test_serve_requires_project() {
    gcpmcp()
        .arg("serve")
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No project configured"));
}

#[test]
fn test_bad_config_file_is_reported() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "project_id: [unterminated").unwrap();

    gcpmcp()
        .arg("--config")
        .arg(file.path())
        .arg("tools")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse config file"));
}

#[test]
fn test_call_rejects_non_object_arguments() {
    gcpmcp()
        .args(["--project", "test-project", "call", "list-cloud-functions", "--args", "[1]"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Tool arguments must be a JSON object"));
}

#[test]
fn test_call_unknown_tool() {
    gcpmcp()
        .args(["--project", "test-project", "call", "delete-everything"])
        .env("GOOGLE_OAUTH_ACCESS_TOKEN", "test-token")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown tool: delete-everything"));
}

// ============================================================================
// MCP SESSION
// ============================================================================

#[test]
fn test_serve_session_over_stdio() {
    let session = concat!(
        r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2024-11-05","clientInfo":{"name":"cli-test","version":"0"}}}"#,
        "\n",
        r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
        "\n",
        r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
        "\n",
    );

    let output = gcpmcp()
        .args(["--project", "test-project", "serve"])
        .env("GOOGLE_OAUTH_ACCESS_TOKEN", "test-token")
        .write_stdin(session)
        .output()
        .unwrap();
    assert!(output.status.success());

    let responses: Vec<serde_json::Value> = String::from_utf8(output.stdout)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(responses.len(), 2);

    let init = responses.iter().find(|r| r["id"] == 1).unwrap();
    assert_eq!(init["result"]["protocolVersion"], "2024-11-05");

    let list = responses.iter().find(|r| r["id"] == 2).unwrap();
    let tools = list["result"]["tools"].as_array().unwrap();
    assert_eq!(tools.len(), 7);
    assert!(tools.iter().any(|t| t["name"] == "test-http-function"));
}
