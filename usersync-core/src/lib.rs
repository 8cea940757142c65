//! usersync core library: domain types, collaborator traits, errors and config.
//!
//! - [`types`]: newtypes and domain structs
//! - [`traits`]: [`DirectorySource`] and [`RecordStore`]
//! - [`error`]: [`ConfigError`], [`DirectoryError`], [`StoreError`]
//! - [`config`]: layered configuration resolved into [`Config`]

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::{Config, ConfigFile};
pub use error::{BoxError, ConfigError, DirectoryError, StoreError};
pub use traits::{DirectorySource, RecordStore};
pub use types::{Email, MatchStrategy, MessagingId, SourceUser, StoreRecord};
