//! Integration tests for the taskflow CLI
//!
//! These tests run the actual binary with HOME and XDG_CONFIG_HOME pointed
//! at a temp dir, so config and credential files never touch the real ones.
//! Nothing here needs a running gateway.

use assert_cmd::Command;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use predicates::prelude::*;
use serde_json::json;
use std::fs;
use tempfile::TempDir;

/// Binary with an isolated home directory
fn taskflow_cmd(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("taskflow").unwrap();
    cmd.current_dir(home.path())
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join(".config"))
        .env_remove("TASKFLOW_API_URL")
        .env_remove("RUST_LOG");
    cmd
}

/// Unsigned token carrying `payload`
fn token(payload: serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let body = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{}.{}.sig", header, body)
}

fn login_as(home: &TempDir, username: &str, role: &str) {
    let link = format!(
        "https://app.example.com/magic-link?token={}",
        token(json!({"username": username, "id": "u1", "user_role": role}))
    );
    taskflow_cmd(home)
        .args(["magic-link", &link])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("Logged in as {}", username)));
}

#[test]
fn test_help_flag() {
    let home = TempDir::new().unwrap();
    taskflow_cmd(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Manage projects, tasks and task workflows"))
        .stdout(predicate::str::contains("workflow"))
        .stdout(predicate::str::contains("--api-url"));
}

#[test]
fn test_workflow_show_help() {
    let home = TempDir::new().unwrap();
    taskflow_cmd(&home)
        .args(["workflow", "show", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--svg"))
        .stdout(predicate::str::contains("--tui"));
}

// ============================================================================
// Config
// ============================================================================

#[test]
fn test_config_show_defaults() {
    let home = TempDir::new().unwrap();
    taskflow_cmd(&home)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("https://localhost:8000/api"))
        .stdout(predicate::str::contains("[layout]"));
}

#[test]
fn test_config_set_url_persists() {
    let home = TempDir::new().unwrap();
    taskflow_cmd(&home)
        .args(["config", "set-url", "http://gateway.test:9000/api"])
        .assert()
        .success();

    let saved = fs::read_to_string(home.path().join(".config/taskflow/config.toml")).unwrap();
    assert!(saved.contains("http://gateway.test:9000/api"));

    taskflow_cmd(&home)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("http://gateway.test:9000/api"));
}

#[test]
fn test_config_set_url_rejects_garbage() {
    let home = TempDir::new().unwrap();
    taskflow_cmd(&home)
        .args(["config", "set-url", "not a url"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"))
        .stderr(predicate::str::contains("TF-002"));
}

#[test]
fn test_api_url_flag_overrides_file_and_env() {
    let home = TempDir::new().unwrap();
    taskflow_cmd(&home)
        .env("TASKFLOW_API_URL", "http://from-env.test/api")
        .args(["--api-url", "http://from-flag.test/api", "config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("http://from-flag.test/api"))
        .stdout(predicate::str::contains("from-env").not());
}

// ============================================================================
// Validation and guards (no network reached)
// ============================================================================

#[test]
fn test_register_reports_every_invalid_field() {
    let home = TempDir::new().unwrap();
    taskflow_cmd(&home)
        .args([
            "register",
            "--first-name",
            "A",
            "--last-name",
            "Petrovic",
            "--username",
            "anap",
            "--email",
            "not-an-email",
            "--password",
            "Secret1!",
            "--repeat-password",
            "Secret2!",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("TF-040"))
        .stderr(predicate::str::contains("firstname"))
        .stderr(predicate::str::contains("email"))
        .stderr(predicate::str::contains("Fix:"));
}

#[test]
fn test_projects_list_requires_login() {
    let home = TempDir::new().unwrap();
    taskflow_cmd(&home)
        .args(["projects", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"))
        .stderr(predicate::str::contains("taskflow login"));
}

#[test]
fn test_magic_link_login_whoami_logout() {
    let home = TempDir::new().unwrap();
    login_as(&home, "ana", "Manager");

    taskflow_cmd(&home)
        .arg("whoami")
        .assert()
        .success()
        .stdout(predicate::str::contains("ana"))
        .stdout(predicate::str::contains("Manager"));

    taskflow_cmd(&home).arg("logout").assert().success();

    taskflow_cmd(&home)
        .arg("whoami")
        .assert()
        .failure()
        .stderr(predicate::str::contains("taskflow login"));
}

#[test]
fn test_magic_link_without_token_fails() {
    let home = TempDir::new().unwrap();
    taskflow_cmd(&home)
        .args(["magic-link", "https://app.example.com/magic-link?foo=bar"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("token"));
}

#[test]
fn test_manager_only_command_denied_for_user_role() {
    let home = TempDir::new().unwrap();
    login_as(&home, "bob", "User");

    taskflow_cmd(&home)
        .args(["workflow", "add-task", "p1", "--id", "a", "--name", "Design"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Access denied"))
        .stderr(predicate::str::contains("Manager"));
}

#[test]
fn test_expired_token_counts_as_logged_out() {
    let home = TempDir::new().unwrap();
    let stale = token(json!({"username": "ana", "user_role": "Manager", "exp": 1000}));
    taskflow_cmd(&home)
        .args(["magic-link", &stale])
        .assert()
        .success();

    taskflow_cmd(&home)
        .args(["notifications"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("taskflow login"));
}

#[test]
fn test_task_update_rejects_unknown_status() {
    let home = TempDir::new().unwrap();
    login_as(&home, "ana", "User");

    taskflow_cmd(&home)
        .args(["tasks", "update", "t1", "--status", "Finished"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown status 'Finished'"));
}

// ============================================================================
// Against a mock gateway
// ============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn test_project_notifications_are_fetched_by_project_id() {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/notifications/p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"nots": [
            {"notId": "n1", "createdAt": "2025-01-01T10:00:00Z", "userId": "p1",
             "message": "task Design is done", "status": "unread"}
        ]})))
        .expect(1)
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    login_as(&home, "bob", "User");
    taskflow_cmd(&home)
        .args(["--api-url", &format!("{}/api", server.uri())])
        .args(["notifications", "--project", "p1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("task Design is done"));
}
