#![deny(clippy::all, clippy::pedantic)]

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use httpmock::MockServer;
use predicates::str::contains;
use serde_json::{Value, json};
use tempfile::TempDir;

fn token_dir(token: Option<&str>) -> TempDir {
    let dir = TempDir::new().expect("tmp dir");
    if let Some(token) = token {
        fs::write(dir.path().join("token"), token).expect("write token");
    }
    dir
}

fn proxyboard(server: &MockServer, tokens: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("proxyboard"));
    cmd.env("PROXYBOARD_API_URL", server.url("/api"))
        .env("PROXYBOARD_TOKEN_FILE", tokens.join("token"))
        .env_remove("PROXYBOARD_CONFIG_FILE")
        .env_remove("PROXYBOARD_SECRET")
        .env_remove("RUST_LOG");
    cmd
}

fn stored_token(tokens: &Path) -> String {
    fs::read_to_string(tokens.join("token"))
        .unwrap_or_default()
        .trim()
        .to_string()
}

#[test]
fn login_stores_token_for_later_commands() {
    let server = MockServer::start();
    let issue = server.mock(|when, then| {
        when.method("POST")
            .path("/api/tokens")
            .json_body_includes(r#"{"identity":"admin@example.com","secret":"hunter22"}"#);
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({"token": "issued", "expires": "2030-01-01T00:00:00Z"}));
    });
    let me = server.mock(|when, then| {
        when.method("GET")
            .path("/api/users/me")
            .header("authorization", "Bearer issued");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({"id": 1, "email": "admin@example.com", "roles": ["admin"]}));
    });

    let tokens = token_dir(None);
    proxyboard(&server, tokens.path())
        .env("PROXYBOARD_SECRET", "hunter22")
        .args(["login", "--identity", "admin@example.com"])
        .assert()
        .success()
        .stdout(contains("Signed in as admin@example.com"));

    issue.assert();
    me.assert();
    assert_eq!(stored_token(tokens.path()), "issued");
}

#[test]
fn whoami_prints_effective_permissions() {
    let server = MockServer::start();
    let me = server.mock(|when, then| {
        when.method("GET")
            .path("/api/users/me")
            .query_param("expand", "permissions")
            .header("authorization", "Bearer stored");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({
                "id": 5,
                "email": "viewer@example.com",
                "name": "Viewer",
                "roles": [],
                "permissions": {"visibility": "all", "streams": "view"}
            }));
    });

    let tokens = token_dir(Some("stored\n"));
    let assert = proxyboard(&server, tokens.path())
        .arg("whoami")
        .assert()
        .success();

    let output = String::from_utf8_lossy(&assert.get_output().stdout);
    assert!(output.contains("Viewer <viewer@example.com>"));
    assert!(output.contains("visibility: all"));
    assert!(output.lines().any(|l| l.starts_with("Streams") && l.ends_with("view")));
    me.assert();
}

#[test]
fn expired_session_is_cleared_and_points_to_login() {
    let server = MockServer::start();
    let rejected = server.mock(|when, then| {
        when.method("GET").path("/api/users/me");
        then.status(401)
            .header("content-type", "application/json")
            .json_body(json!({"error": {"code": 401, "message": "Token has expired"}}));
    });
    let refresh = server.mock(|when, then| {
        when.method("GET").path("/api/tokens");
        then.status(401)
            .header("content-type", "application/json")
            .json_body(json!({"error": {"code": 401, "message": "Token has expired"}}));
    });

    let tokens = token_dir(Some("stale"));
    proxyboard(&server, tokens.path())
        .arg("dashboard")
        .assert()
        .failure()
        .stderr(contains("session expired"))
        .stderr(contains("proxyboard login"));

    rejected.assert_calls(1);
    refresh.assert_calls(1);
    assert_eq!(stored_token(tokens.path()), "");
}

#[test]
fn invalid_proxy_host_fails_before_network() {
    let server = MockServer::start();
    let any = server.mock(|when, then| {
        when.any_request();
        then.status(500);
    });

    let tokens = token_dir(Some("stored"));
    proxyboard(&server, tokens.path())
        .args([
            "proxy-hosts",
            "add",
            "--domain",
            "not a domain",
            "--forward-host",
            "10.0.0.5",
            "--forward-port",
            "0",
        ])
        .assert()
        .failure()
        .stderr(contains("forward_port"));

    any.assert_calls(0);
}

#[test]
fn export_writes_envelope_without_server_fields() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("GET").path("/api/users/me");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({"id": 1, "email": "admin@example.com", "roles": ["admin"]}));
    });
    let streams = server.mock(|when, then| {
        when.method("GET")
            .path("/api/nginx/streams")
            .query_param("expand", "owner");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!([
                {
                    "id": 8,
                    "created_on": "2024-05-01T10:00:00Z",
                    "owner_user_id": 1,
                    "incoming_port": 2222,
                    "forwarding_host": "10.0.0.10",
                    "forwarding_port": 22,
                    "tcp_forwarding": true
                }
            ]));
    });

    let tokens = token_dir(Some("stored"));
    let out = tokens.path().join("streams.json");
    proxyboard(&server, tokens.path())
        .args(["export", "--kind", "streams", "--output"])
        .arg(&out)
        .assert()
        .success()
        .stderr(contains("Exported to"));

    streams.assert();
    let envelope: Value =
        serde_json::from_str(&fs::read_to_string(&out).expect("export file")).expect("json");
    assert_eq!(envelope["type"], "stream");
    assert!(envelope["exported_at"].is_string());
    // A single record is exported as an object rather than a one-element array.
    let data = &envelope["data"];
    assert!(data.is_object());
    assert_eq!(data["incoming_port"], 2222);
    assert!(data.get("id").is_none());
    assert!(data.get("created_on").is_none());
}

#[test]
fn users_cannot_be_exported() {
    let server = MockServer::start();
    let tokens = token_dir(Some("stored"));
    proxyboard(&server, tokens.path())
        .args(["export", "--kind", "users"])
        .assert()
        .failure()
        .stderr(contains("users cannot be exported"));
}
