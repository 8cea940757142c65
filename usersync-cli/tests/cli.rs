//! Binary-level tests for `usersync`.
//!
//! The directory is a wiremock server; the store is a SQLite file in a
//! temp dir. `HOME` points at a temp dir so no real config is read.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const USERS_PATH: &str = "/admin/directory/v1/users";

const ENV_SETTINGS: &[&str] = &[
    "USERSYNC_CONFIG",
    "DATABASE_URL",
    "DATABASE_AUTH_TOKEN",
    "GOOGLE_DOMAIN",
    "GOOGLE_CUSTOM_FIELD_MASK",
    "GOOGLE_CREDENTIALS",
];

fn usersync(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("usersync").expect("usersync binary");
    for key in ENV_SETTINGS {
        cmd.env_remove(key);
    }
    cmd.env("HOME", home).env("NO_COLOR", "1").env("RUST_LOG", "warn");
    cmd
}

fn db_url(home: &Path) -> String {
    format!("file:{}", home.join("employees.db").display())
}

/// Credentials and config pointing the binary at `server`.
fn write_fake_google(home: &Path, server_uri: &str) -> PathBuf {
    let credentials = home.join("credentials.json");
    std::fs::write(
        &credentials,
        json!({
            "type": "authorized_user",
            "client_id": "cli-test",
            "client_secret": "secret",
            "refresh_token": "refresh",
            "token_uri": format!("{server_uri}/token"),
        })
        .to_string(),
    )
    .expect("write credentials");

    let config_dir = home.join(".usersync");
    std::fs::create_dir_all(&config_dir).expect("config dir");
    std::fs::write(
        config_dir.join("config.yaml"),
        format!("google_domain: acme.com\ndirectory_api_url: {server_uri}\n"),
    )
    .expect("write config");
    credentials
}

async fn fake_google() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "access", "expires_in": 3599})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(USERS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "users": [
                {"primaryEmail": "a@acme.com", "customSchemas": {"MessengerInfo": {"tgID": "42"}}},
                {"primaryEmail": "b@acme.com"}
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{USERS_PATH}/a@acme.com")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "primaryEmail": "a@acme.com",
            "customSchemas": {"MessengerInfo": {"tgID": "42"}}
        })))
        .mount(&server)
        .await;
    server
}

fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.output().expect("run usersync");
    assert!(
        output.status.success(),
        "usersync failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

// ---------------------------------------------------------------------------
// Setup failures
// ---------------------------------------------------------------------------

#[test]
fn missing_database_url_is_a_fatal_diagnostic() {
    let home = TempDir::new().unwrap();
    usersync(home.path())
        .arg("init-db")
        .assert()
        .failure()
        .stderr(predicate::str::contains("DATABASE_URL is not set"));
}

#[test]
fn sync_without_domain_fails_before_touching_the_store() {
    let home = TempDir::new().unwrap();
    usersync(home.path())
        .args(["sync", "--database-url", &db_url(home.path())])
        .assert()
        .failure()
        .stderr(predicate::str::contains("GOOGLE_DOMAIN is not set"));
    assert!(!home.path().join("employees.db").exists());
}

#[test]
fn explicitly_named_config_must_exist() {
    let home = TempDir::new().unwrap();
    usersync(home.path())
        .args(["init-db", "--config"])
        .arg(home.path().join("nope.yaml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load configuration"));
}

#[test]
fn unreadable_credentials_are_fatal() {
    let home = TempDir::new().unwrap();
    usersync(home.path())
        .args(["users", "--domain", "acme.com", "--database-url", ":memory:"])
        .arg("--credentials")
        .arg(home.path().join("missing.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read credentials"));
}

#[test]
fn init_db_is_idempotent() {
    let home = TempDir::new().unwrap();
    for _ in 0..2 {
        usersync(home.path())
            .arg("init-db")
            .env("DATABASE_URL", db_url(home.path()))
            .assert()
            .success()
            .stdout(predicate::str::contains("employees table ready"));
    }
    assert!(home.path().join("employees.db").exists());
}

// ---------------------------------------------------------------------------
// Against a fake directory
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread")]
async fn sync_creates_then_reports_up_to_date() {
    let server = fake_google().await;
    let home = TempDir::new().unwrap();
    let credentials = write_fake_google(home.path(), &server.uri());
    let home_path = home.path().to_path_buf();

    let (dry, first, second) = tokio::task::spawn_blocking(move || {
        let run = |extra: &[&str]| {
            stdout_of(
                usersync(&home_path)
                    .arg("sync")
                    .args(extra)
                    .env("DATABASE_URL", db_url(&home_path))
                    .env("GOOGLE_CREDENTIALS", &credentials),
            )
        };
        stdout_of(
            usersync(&home_path)
                .arg("init-db")
                .env("DATABASE_URL", db_url(&home_path)),
        );
        (run(&["--dry-run"]), run(&[]), run(&[]))
    })
    .await
    .expect("join");

    assert_eq!(
        dry.trim(),
        "[dry-run] Sync complete. Updated: 0, Created: 2, Up-to-date: 0"
    );
    assert_eq!(
        first.trim(),
        "Sync complete. Updated: 0, Created: 2, Up-to-date: 0"
    );
    assert_eq!(
        second.trim(),
        "Sync complete. Updated: 0, Created: 0, Up-to-date: 2"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn sync_json_report_lists_outcomes() {
    let server = fake_google().await;
    let home = TempDir::new().unwrap();
    let credentials = write_fake_google(home.path(), &server.uri());
    let home_path = home.path().to_path_buf();

    let out = tokio::task::spawn_blocking(move || {
        stdout_of(
            usersync(&home_path)
                .arg("init-db")
                .env("DATABASE_URL", db_url(&home_path)),
        );
        stdout_of(
            usersync(&home_path)
                .args(["sync", "--json"])
                .env("DATABASE_URL", db_url(&home_path))
                .env("GOOGLE_CREDENTIALS", &credentials),
        )
    })
    .await
    .expect("join");

    let report: serde_json::Value = serde_json::from_str(&out).expect("json report");
    assert_eq!(report["source_users"], 2);
    assert_eq!(report["tally"]["created"], 2);
    assert_eq!(report["outcomes"][0]["email"], "a@acme.com");
    assert_eq!(report["outcomes"][0]["outcome"], "created");
}

#[tokio::test(flavor = "multi_thread")]
async fn users_filter_and_lookup() {
    let server = fake_google().await;
    let home = TempDir::new().unwrap();
    let credentials = write_fake_google(home.path(), &server.uri());
    let home_path = home.path().to_path_buf();

    let (unset, lookup) = tokio::task::spawn_blocking(move || {
        let unset = stdout_of(
            usersync(&home_path)
                .args(["users", "--without-messaging-id", "--json"])
                .env("DATABASE_URL", db_url(&home_path))
                .env("GOOGLE_CREDENTIALS", &credentials),
        );
        stdout_of(
            usersync(&home_path)
                .arg("init-db")
                .env("DATABASE_URL", db_url(&home_path)),
        );
        let lookup = stdout_of(
            usersync(&home_path)
                .args(["lookup", "a@acme.com"])
                .env("DATABASE_URL", db_url(&home_path))
                .env("GOOGLE_CREDENTIALS", &credentials),
        );
        (unset, lookup)
    })
    .await
    .expect("join");

    let users: serde_json::Value = serde_json::from_str(&unset).expect("json users");
    assert_eq!(users, json!([{"email": "b@acme.com", "messaging_id": 0}]));

    assert!(lookup.contains("directory: 42"), "{lookup}");
    assert!(lookup.contains("not in store"), "{lookup}");
}
