//! Admin Directory user payloads and messaging-id extraction.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;
use usersync_core::{config, Email, MessagingId, SourceUser};

/// One page of `users.list`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UsersPage {
    /// Absent entirely when the page is empty.
    #[serde(default)]
    pub users: Vec<ApiUser>,
    pub next_page_token: Option<String>,
}

/// The subset of the directory user resource we read.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiUser {
    pub primary_email: String,
    #[serde(default)]
    pub custom_schemas: HashMap<String, Value>,
}

/// Where the messaging id lives inside `customSchemas`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessagingField {
    pub schema: String,
    pub field: String,
}

impl Default for MessagingField {
    fn default() -> Self {
        Self {
            schema: config::DEFAULT_MESSAGING_SCHEMA.to_string(),
            field: config::DEFAULT_MESSAGING_FIELD.to_string(),
        }
    }
}

impl MessagingField {
    /// Best-effort read of `customSchemas[schema][field]`.
    ///
    /// Absent schema, absent field or an unparsable value all yield
    /// [`MessagingId::UNSET`].
    pub(crate) fn extract(&self, user: &ApiUser) -> MessagingId {
        let value = user
            .custom_schemas
            .get(&self.schema)
            .and_then(|schema| schema.get(&self.field));
        match value.map(parse_messaging_id) {
            Some(Some(id)) => MessagingId(id),
            Some(None) => {
                tracing::debug!(
                    "{}: unparsable {}.{} value, treating as unset",
                    user.primary_email,
                    self.schema,
                    self.field
                );
                MessagingId::UNSET
            }
            None => MessagingId::UNSET,
        }
    }

    pub(crate) fn to_source_user(&self, user: &ApiUser) -> SourceUser {
        SourceUser {
            email: Email::from(user.primary_email.as_str()),
            messaging_id: self.extract(user),
        }
    }
}

/// INT64 custom fields come back as decimal strings; accept numbers too.
fn parse_messaging_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
