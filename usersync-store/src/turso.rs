//! Turso (libsql) over its HTTP pipeline protocol.
//!
//! Every statement is sent as its own `POST /v2/pipeline` carrying an
//! `execute` followed by a `close`, so each mutation commits on its own and
//! no stream (baton) outlives a call.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;
use usersync_core::error::query_err;
use usersync_core::{Email, MessagingId, RecordStore, StoreError, StoreRecord};

use crate::schema;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const READ_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct PipelineRequest<'a> {
    requests: Vec<StreamRequest<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum StreamRequest<'a> {
    Execute { stmt: Stmt<'a> },
    Close,
}

#[derive(Debug, Serialize)]
struct Stmt<'a> {
    sql: &'a str,
    args: Vec<Value>,
}

/// A SQL value as encoded by the pipeline protocol. Integers travel as
/// decimal strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum Value {
    Null,
    Integer { value: String },
    Float { value: f64 },
    Text { value: String },
    Blob { base64: String },
}

impl Value {
    fn text(s: &str) -> Self {
        Value::Text {
            value: s.to_string(),
        }
    }

    fn integer(i: i64) -> Self {
        Value::Integer {
            value: i.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PipelineResponse {
    #[serde(default)]
    results: Vec<StreamResult>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum StreamResult {
    Ok { response: StreamResponse },
    Error { error: RemoteError },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum StreamResponse {
    Execute { result: StmtResult },
    Close,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct StmtResult {
    #[serde(default)]
    pub rows: Vec<Vec<Value>>,
    #[serde(default)]
    pub affected_row_count: u64,
}

/// An error reported by the database for a single statement.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteError {
    pub message: String,
    #[serde(default)]
    pub code: Option<String>,
}

impl RemoteError {
    pub fn is_constraint_violation(&self) -> bool {
        self.code
            .as_deref()
            .is_some_and(|c| c.starts_with("SQLITE_CONSTRAINT"))
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{} ({code})", self.message),
            None => self.message.fmt(f),
        }
    }
}

impl std::error::Error for RemoteError {}

// ---------------------------------------------------------------------------
// Connection string
// ---------------------------------------------------------------------------

/// Where to send pipelines and how to authenticate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TursoTarget {
    /// `https://<db>.turso.io/v2/pipeline`
    pub pipeline_url: String,
    pub auth_token: Option<String>,
}

impl TursoTarget {
    /// Resolve a `libsql://`, `https://` or `http://` connection string.
    ///
    /// `libsql://` maps to `https://`. An `authToken` query parameter is
    /// honoured unless `explicit_token` is given.
    pub fn parse(raw: &str, explicit_token: Option<&str>) -> Result<Self, StoreError> {
        let normalized = match raw.strip_prefix("libsql://") {
            Some(rest) => format!("https://{rest}"),
            None => raw.to_string(),
        };
        let mut url = Url::parse(&normalized).map_err(|e| StoreError::Connect {
            url: redact(raw),
            source: Box::new(e),
        })?;
        if !matches!(url.scheme(), "https" | "http") {
            return Err(StoreError::UnsupportedUrl(redact(raw)));
        }

        let url_token = url
            .query_pairs()
            .find(|(key, _)| key == "authToken")
            .map(|(_, value)| value.into_owned());
        url.set_query(None);
        url.set_fragment(None);

        Ok(Self {
            pipeline_url: format!("{}/v2/pipeline", url.as_str().trim_end_matches('/')),
            auth_token: explicit_token
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .or(url_token),
        })
    }
}

/// Drop the query string so tokens never reach logs or error messages.
pub(crate) fn redact(raw: &str) -> String {
    raw.split('?').next().unwrap_or_default().to_string()
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Remote Turso database reached over HTTP.
#[derive(Debug)]
pub struct TursoStore {
    agent: ureq::Agent,
    target: TursoTarget,
}

impl TursoStore {
    pub fn open(url: &str, auth_token: Option<&str>) -> Result<Self, StoreError> {
        let target = TursoTarget::parse(url, auth_token)?;
        if target.auth_token.is_none() {
            tracing::warn!("no auth token for {}; requests will be anonymous", redact(url));
        }
        Ok(Self::with_target(target))
    }

    pub fn with_target(target: TursoTarget) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(CONNECT_TIMEOUT)
            .timeout_read(READ_TIMEOUT)
            .build();
        Self { agent, target }
    }

    pub fn location(&self) -> &str {
        &self.target.pipeline_url
    }

    pub fn ensure_schema(&self) -> Result<(), StoreError> {
        self.execute("create table", schema::CREATE_TABLE, Vec::new())
            .map(|_| ())
    }

    fn execute(
        &self,
        operation: &'static str,
        sql: &str,
        args: Vec<Value>,
    ) -> Result<StmtResult, StoreError> {
        let body = PipelineRequest {
            requests: vec![
                StreamRequest::Execute {
                    stmt: Stmt { sql, args },
                },
                StreamRequest::Close,
            ],
        };

        let url = &self.target.pipeline_url;
        let mut request = self.agent.post(url);
        if let Some(token) = &self.target.auth_token {
            request = request.set("Authorization", &format!("Bearer {token}"));
        }

        let response = match request.send_json(&body) {
            Ok(response) => response,
            Err(ureq::Error::Status(status, response)) => {
                let body = response.into_string().unwrap_or_default();
                return Err(query_err(operation, format!("HTTP {status}: {body}")));
            }
            Err(ureq::Error::Transport(t)) => {
                return Err(StoreError::Transport {
                    url: url.clone(),
                    message: t.to_string(),
                })
            }
        };
        let text = response.into_string().map_err(|e| StoreError::Transport {
            url: url.clone(),
            message: e.to_string(),
        })?;
        let parsed: PipelineResponse = serde_json::from_str(&text)
            .map_err(|e| StoreError::Protocol(format!("malformed pipeline response: {e}")))?;

        match parsed.results.into_iter().next() {
            Some(StreamResult::Ok {
                response: StreamResponse::Execute { result },
            }) => Ok(result),
            Some(StreamResult::Ok { response }) => Err(StoreError::Protocol(format!(
                "expected execute result, got {response:?}"
            ))),
            Some(StreamResult::Error { error }) => Err(query_err(operation, error)),
            None => Err(StoreError::Protocol("empty pipeline response".to_string())),
        }
    }
}

fn record_from_row(row: &[Value]) -> Result<StoreRecord, StoreError> {
    let email = match row.first() {
        Some(Value::Text { value }) => Email(value.clone()),
        other => {
            return Err(StoreError::Protocol(format!(
                "expected text email column, got {other:?}"
            )))
        }
    };
    let messaging_id = match row.get(1) {
        Some(Value::Integer { value }) => value.parse::<i64>().map(MessagingId).map_err(|e| {
            StoreError::Protocol(format!("bad integer '{value}' for {email}: {e}"))
        })?,
        // NULL reads as unset.
        Some(Value::Null) => MessagingId::UNSET,
        other => {
            return Err(StoreError::Protocol(format!(
                "expected integer telegramID for {email}, got {other:?}"
            )))
        }
    };
    Ok(StoreRecord {
        email,
        messaging_id,
    })
}

fn is_constraint_violation(err: &StoreError) -> bool {
    match err {
        StoreError::Query { source, .. } => source
            .downcast_ref::<RemoteError>()
            .is_some_and(RemoteError::is_constraint_violation),
        _ => false,
    }
}

impl RecordStore for TursoStore {
    fn fetch_all_records(&self) -> Result<Vec<StoreRecord>, StoreError> {
        let result = self.execute("select employees", schema::SELECT_ALL, Vec::new())?;
        result.rows.iter().map(|row| record_from_row(row)).collect()
    }

    fn find_record(&self, email: &Email) -> Result<StoreRecord, StoreError> {
        let result = self.execute(
            "select employee by email",
            schema::SELECT_BY_EMAIL,
            vec![Value::text(email.as_str())],
        )?;
        match result.rows.first() {
            Some(row) => record_from_row(row),
            None => Err(StoreError::NotFound {
                email: email.to_string(),
            }),
        }
    }

    fn insert(&self, record: &StoreRecord) -> Result<(), StoreError> {
        self.execute(
            "insert employee",
            schema::INSERT,
            vec![
                Value::text(record.email.as_str()),
                Value::integer(record.messaging_id.0),
            ],
        )
        .map_err(|e| {
            if is_constraint_violation(&e) {
                StoreError::Duplicate {
                    email: record.email.to_string(),
                }
            } else {
                e
            }
        })?;
        Ok(())
    }

    fn update_messaging_id(
        &self,
        email: &Email,
        messaging_id: MessagingId,
    ) -> Result<(), StoreError> {
        let result = self.execute(
            "update telegramID",
            schema::UPDATE_MESSAGING_ID,
            vec![Value::integer(messaging_id.0), Value::text(email.as_str())],
        )?;
        if result.affected_row_count == 0 {
            tracing::debug!("update for {email} matched no rows");
        }
        Ok(())
    }
}
