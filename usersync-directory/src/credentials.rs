//! Credential blob loading and access-token exchange.
//!
//! The blob is an OAuth "authorized user" document, the same shape gcloud
//! writes for application default credentials:
//!
//! ```json
//! {
//!   "type": "authorized_user",
//!   "client_id": "…apps.googleusercontent.com",
//!   "client_secret": "…",
//!   "refresh_token": "…"
//! }
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use usersync_core::DirectoryError;

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Read-only scope for the Admin SDK user listing.
pub const DIRECTORY_USER_READONLY_SCOPE: &str =
    "https://www.googleapis.com/auth/admin.directory.user.readonly";

const AUTHORIZED_USER: &str = "authorized_user";

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// A parsed `authorized_user` credential document.
#[derive(Clone, Deserialize)]
pub struct Credentials {
    #[serde(rename = "type")]
    kind: String,
    pub client_id: String,
    client_secret: String,
    refresh_token: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl Credentials {
    /// Read and validate the credential file at `path`.
    pub fn load(path: &Path) -> Result<Self, DirectoryError> {
        let contents = std::fs::read_to_string(path).map_err(|e| DirectoryError::CredentialsIo {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&contents, path)
    }

    /// Parse a credential document; `path` is used for error context only.
    pub fn parse(contents: &str, path: &Path) -> Result<Self, DirectoryError> {
        let credentials: Credentials =
            serde_json::from_str(contents).map_err(|e| invalid(path, e.to_string()))?;
        if credentials.kind != AUTHORIZED_USER {
            return Err(invalid(
                path,
                format!(
                    "unsupported credential type '{}'; expected '{AUTHORIZED_USER}'",
                    credentials.kind
                ),
            ));
        }
        if credentials.refresh_token.is_empty() {
            return Err(invalid(path, "refresh_token is empty".to_string()));
        }
        Ok(credentials)
    }

    /// Exchange the refresh token for a short-lived access token.
    pub fn access_token(&self, agent: &ureq::Agent) -> Result<String, DirectoryError> {
        tracing::debug!("exchanging refresh token at {}", self.token_uri);
        let response = agent
            .post(&self.token_uri)
            .send_form(&[
                ("grant_type", "refresh_token"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", self.refresh_token.as_str()),
                ("scope", DIRECTORY_USER_READONLY_SCOPE),
            ])
            .map_err(|e| match e {
                ureq::Error::Status(status, response) => {
                    let body = response.into_string().unwrap_or_default();
                    DirectoryError::Token(format!("token endpoint returned {status}: {body}"))
                }
                ureq::Error::Transport(t) => DirectoryError::Token(t.to_string()),
            })?;

        let body = response
            .into_string()
            .map_err(|e| DirectoryError::Token(format!("reading token response: {e}")))?;
        let token: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| DirectoryError::Token(format!("malformed token response: {e}")))?;
        Ok(token.access_token)
    }
}

fn invalid(path: &Path, reason: String) -> DirectoryError {
    DirectoryError::Credentials {
        path: PathBuf::from(path),
        reason,
    }
}
