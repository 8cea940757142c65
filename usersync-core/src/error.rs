//! Error types for usersync-core and its collaborators.

use std::path::PathBuf;

use thiserror::Error;

/// Boxed backend error that this crate cannot name (e.g. `rusqlite::Error`).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while resolving the process configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure reading the config file.
    #[error("I/O error reading config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error on load, with file path and line context from serde_yaml.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A required setting was absent from flags, environment and file.
    #[error("{key} is not set")]
    Missing { key: &'static str },

    /// An explicitly requested config file does not exist.
    #[error("config file not found at {path}")]
    NotFound { path: PathBuf },

    /// `dirs::home_dir()` returned `None`, so `~/.usersync/` cannot be located.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,
}

/// Errors from the identity-provider directory.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// The credential file could not be read.
    #[error("unable to read credentials at {path}: {source}")]
    CredentialsIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The credential file was read but is not a usable credential document.
    #[error("invalid credentials at {path}: {reason}")]
    Credentials { path: PathBuf, reason: String },

    /// Exchanging the credential for an access token failed.
    #[error("token exchange failed: {0}")]
    Token(String),

    /// The request never produced an HTTP response.
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    /// The directory API answered with a non-success status.
    #[error("directory API returned {status} for {url}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    /// The response body was not the JSON shape we expect.
    #[error("malformed directory response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("user {email} not found in directory")]
    UserNotFound { email: String },
}

/// Errors from the record store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The connection string names no supported backend.
    #[error("unsupported store URL '{0}'; expected libsql://, https://, http://, file: or :memory:")]
    UnsupportedUrl(String),

    /// Opening the store failed.
    #[error("failed to open store at {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: BoxError,
    },

    /// No row carries this email. Not an operational fault.
    #[error("no record for {email}")]
    NotFound { email: String },

    /// Insert hit the unique constraint on `email`.
    #[error("record for {email} already exists")]
    Duplicate { email: String },

    /// A statement failed inside the backend.
    #[error("{operation} failed: {source}")]
    Query {
        operation: &'static str,
        #[source]
        source: BoxError,
    },

    /// The request never produced an HTTP response.
    #[error("store request to {url} failed: {message}")]
    Transport { url: String, message: String },

    /// The remote answered with something other than a pipeline result.
    #[error("store protocol error: {0}")]
    Protocol(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// Convenience constructor for [`StoreError::Query`].
pub fn query_err(operation: &'static str, source: impl Into<BoxError>) -> StoreError {
    StoreError::Query {
        operation,
        source: source.into(),
    }
}
