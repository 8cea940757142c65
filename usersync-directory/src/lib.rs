//! # usersync-directory
//!
//! Google Workspace Admin Directory as a [`DirectorySource`].
//!
//! Load a [`Credentials`] blob, call [`GoogleDirectory::connect`] once per
//! run, then [`DirectorySource::fetch_all_users`] for the full snapshot.
//!
//! [`DirectorySource`]: usersync_core::DirectorySource
//! [`DirectorySource::fetch_all_users`]: usersync_core::DirectorySource::fetch_all_users

pub mod client;
pub mod credentials;
pub mod users;

pub use client::{DirectoryOptions, GoogleDirectory, MAX_RESULTS};
pub use credentials::Credentials;
pub use users::MessagingField;
