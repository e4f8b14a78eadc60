use std::io::Write;
use std::process::{Command, Output};

use tempfile::NamedTempFile;
use wiremock::matchers::{basic_auth, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BIN: &str = env!("CARGO_BIN_EXE_zendesk-cli");

fn write_config(base_url: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        "default_profile: test\nprofiles:\n  test:\n    base_url: {base_url}/api/v2\n    email: agent@example.com\n"
    )
    .unwrap();
    file
}

async fn run_cli(config: &NamedTempFile, args: &[&str]) -> Output {
    tokio::process::Command::new(BIN)
        .arg("--config")
        .arg(config.path())
        .args(args)
        .env_remove("ZENDESK_API_TOKEN")
        .env("ZENDESK_CLI_TOKEN_TEST", "fake-token")
        .env("RUST_LOG", "error")
        .output()
        .await
        .expect("Failed to execute command")
}

#[test]
fn test_cli_version() {
    let output = Command::new(BIN)
        .arg("--version")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("zendesk-cli"));
    assert!(stdout.contains("0.1."));
}

#[test]
fn test_cli_help() {
    let output = Command::new(BIN)
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage:"));
    assert!(stdout.contains("jira-links"));
}

#[test]
fn test_jira_links_help() {
    let output = Command::new(BIN)
        .args(["jira-links", "--help"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("list"));
    assert!(stdout.contains("create"));
    assert!(stdout.contains("delete"));
}

#[test]
fn test_invalid_command() {
    let output = Command::new(BIN)
        .arg("nonexistent")
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unrecognized subcommand") || stderr.contains("error:"));
}

#[tokio::test]
async fn test_missing_profile_fails() {
    let mut config = NamedTempFile::new().unwrap();
    writeln!(config, "profiles: {{}}").unwrap();

    let output = run_cli(&config, &["jira-links", "get", "1"]).await;

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("No profile configured"));
}

#[tokio::test]
async fn test_get_link_as_json() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/jira/links/24777562"))
        .and(basic_auth("agent@example.com/token", "fake-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "jira_link": {"id": 24777562, "issue_key": "PROJ-9", "ticket_id": "12"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = write_config(&mock_server.uri());
    let output = run_cli(&config, &["--output", "json", "jira-links", "get", "24777562"]).await;

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let link: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(link["id"], 24777562);
    assert_eq!(link["issue_key"], "PROJ-9");
    assert_eq!(link["ticket_id"], 12);
}

#[tokio::test]
async fn test_list_links_quiet() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/jira/links"))
        .and(query_param("per_page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "jira_links": [{"id": 1}, {"id": 2}],
            "next_page": null,
            "count": 2
        })))
        .mount(&mock_server)
        .await;

    let config = write_config(&mock_server.uri());
    let output = run_cli(
        &config,
        &["--output", "quiet", "jira-links", "list", "--per-page", "2"],
    )
    .await;

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "1\n2");
}

#[tokio::test]
async fn test_delete_link_writes_nothing_to_stdout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/api/v2/jira/links/5"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = write_config(&mock_server.uri());
    let output = run_cli(&config, &["--output", "json", "jira-links", "delete", "5"]).await;

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(output.stdout.is_empty());
}

#[tokio::test]
async fn test_server_error_is_reported() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/api/v2/jira/links/5"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&mock_server)
        .await;

    let config = write_config(&mock_server.uri());
    let output = run_cli(&config, &["jira-links", "delete", "5"]).await;

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to delete jira link 5"));
}
