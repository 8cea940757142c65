//! Domain types shared by the directory source, the record store and the
//! reconciler.
//!
//! Emails are compared byte-for-byte. Nothing in this crate case-folds or
//! trims them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A user's primary email, the join key between directory and store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Email(pub String);

impl Email {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for Email {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Email {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Messaging-platform identifier (Telegram user ID). Zero means unset.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct MessagingId(pub i64);

impl MessagingId {
    pub const UNSET: MessagingId = MessagingId(0);

    pub fn is_unset(self) -> bool {
        self == Self::UNSET
    }
}

impl fmt::Display for MessagingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<i64> for MessagingId {
    fn from(v: i64) -> Self {
        Self(v)
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// How the reconciler locates the store record for a source user.
///
/// Both strategies return the first store record carrying the email, so
/// outcomes are identical; `Index` only changes the cost from O(n·m) to
/// O(n + m).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MatchStrategy {
    #[default]
    Scan,
    Index,
}

impl fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchStrategy::Scan => write!(f, "scan"),
            MatchStrategy::Index => write!(f, "index"),
        }
    }
}

impl FromStr for MatchStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "scan" => Ok(Self::Scan),
            "index" => Ok(Self::Index),
            other => Err(format!(
                "unknown match strategy '{other}'; expected: scan, index"
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Domain structs
// ---------------------------------------------------------------------------

/// A user as listed by the identity provider for the current run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceUser {
    pub email: Email,
    #[serde(default)]
    pub messaging_id: MessagingId,
}

impl SourceUser {
    pub fn new(email: impl Into<Email>, messaging_id: impl Into<MessagingId>) -> Self {
        Self {
            email: email.into(),
            messaging_id: messaging_id.into(),
        }
    }
}

/// A persisted row in the `employees` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreRecord {
    pub email: Email,
    #[serde(default)]
    pub messaging_id: MessagingId,
}

impl StoreRecord {
    pub fn new(email: impl Into<Email>, messaging_id: impl Into<MessagingId>) -> Self {
        Self {
            email: email.into(),
            messaging_id: messaging_id.into(),
        }
    }
}

impl From<&SourceUser> for StoreRecord {
    fn from(user: &SourceUser) -> Self {
        Self {
            email: user.email.clone(),
            messaging_id: user.messaging_id,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
