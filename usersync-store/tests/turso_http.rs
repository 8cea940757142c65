//! Turso backend against a fake `/v2/pipeline` endpoint served by wiremock.

use serde_json::{json, Value};
use usersync_core::{Email, MessagingId, RecordStore, StoreError, StoreRecord};
use usersync_store::{TursoStore, TursoTarget};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn store(server: &MockServer) -> TursoStore {
    TursoStore::with_target(TursoTarget {
        pipeline_url: format!("{}/v2/pipeline", server.uri()),
        auth_token: Some("db-token".to_string()),
    })
}

fn execute_ok(rows: Value, affected: u64) -> Value {
    json!({
        "baton": null,
        "base_url": null,
        "results": [
            {"type": "ok", "response": {"type": "execute", "result": {
                "cols": [{"name": "email", "decltype": "TEXT"}, {"name": "telegramID", "decltype": "INTEGER"}],
                "rows": rows,
                "affected_row_count": affected,
                "last_insert_rowid": null
            }}},
            {"type": "ok", "response": {"type": "close"}}
        ]
    })
}

async fn blocking<T: Send + 'static>(f: impl FnOnce() -> T + Send + 'static) -> T {
    tokio::task::spawn_blocking(f).await.expect("join blocking task")
}

#[tokio::test(flavor = "multi_thread")]
async fn fetch_all_records_decodes_rows() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/pipeline"))
        .and(header("authorization", "Bearer db-token"))
        .and(body_partial_json(json!({
            "requests": [{"type": "execute", "stmt": {"sql": "SELECT email, telegramID FROM employees"}}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(execute_ok(
            json!([
                [{"type": "text", "value": "a@x.com"}, {"type": "integer", "value": "1"}],
                [{"type": "text", "value": "b@x.com"}, {"type": "null"}]
            ]),
            0,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let store = store(&server);
    let records = blocking(move || store.fetch_all_records())
        .await
        .expect("fetch");
    assert_eq!(
        records,
        vec![StoreRecord::new("a@x.com", 1), StoreRecord::new("b@x.com", 0)]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn insert_sends_text_and_integer_args() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/pipeline"))
        .and(body_partial_json(json!({
            "requests": [{"type": "execute", "stmt": {"args": [
                {"type": "text", "value": "b@x.com"},
                {"type": "integer", "value": "0"}
            ]}}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(execute_ok(json!([]), 1)))
        .expect(1)
        .mount(&server)
        .await;

    let store = store(&server);
    blocking(move || store.insert(&StoreRecord::new("b@x.com", 0)))
        .await
        .expect("insert");
}

#[tokio::test(flavor = "multi_thread")]
async fn constraint_failure_on_insert_is_duplicate() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/pipeline"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "baton": null,
            "base_url": null,
            "results": [
                {"type": "error", "error": {
                    "message": "SQLite error: UNIQUE constraint failed: employees.email",
                    "code": "SQLITE_CONSTRAINT_PRIMARYKEY"
                }},
                {"type": "ok", "response": {"type": "close"}}
            ]
        })))
        .mount(&server)
        .await;

    let store = store(&server);
    let err = blocking(move || store.insert(&StoreRecord::new("a@x.com", 1)))
        .await
        .unwrap_err();
    assert!(
        matches!(err, StoreError::Duplicate { ref email } if email == "a@x.com"),
        "got: {err}"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn find_record_with_no_rows_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/pipeline"))
        .respond_with(ResponseTemplate::new(200).set_body_json(execute_ok(json!([]), 0)))
        .mount(&server)
        .await;

    let store = store(&server);
    let err = blocking(move || store.find_record(&Email::from("ghost@x.com")))
        .await
        .unwrap_err();
    assert!(err.is_not_found(), "got: {err}");
}

#[tokio::test(flavor = "multi_thread")]
async fn update_with_zero_affected_rows_is_ok() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/pipeline"))
        .and(body_partial_json(json!({
            "requests": [{"type": "execute", "stmt": {"args": [
                {"type": "integer", "value": "42"},
                {"type": "text", "value": "a@x.com"}
            ]}}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(execute_ok(json!([]), 0)))
        .expect(1)
        .mount(&server)
        .await;

    let store = store(&server);
    blocking(move || store.update_messaging_id(&Email::from("a@x.com"), MessagingId(42)))
        .await
        .expect("update");
}

#[tokio::test(flavor = "multi_thread")]
async fn unauthorized_is_a_query_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/pipeline"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
        .mount(&server)
        .await;

    let store = store(&server);
    let err = blocking(move || store.fetch_all_records())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Query { .. }), "got: {err}");
    assert!(err.to_string().contains("401"));
}

#[tokio::test(flavor = "multi_thread")]
async fn garbage_body_is_a_protocol_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/pipeline"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"results\": 3}"))
        .mount(&server)
        .await;

    let store = store(&server);
    let err = blocking(move || store.fetch_all_records())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Protocol(_)), "got: {err}");
}
