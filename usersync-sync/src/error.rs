//! Error types for usersync-sync.

use thiserror::Error;

use usersync_core::{DirectoryError, StoreError};

/// Errors that abort a sync run before any mutation.
///
/// Per-record mutation failures never surface here; they are recorded in
/// the [`crate::ReconcileReport`].
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("fetching directory users: {0}")]
    Directory(#[from] DirectoryError),

    #[error("fetching store records: {0}")]
    Store(#[from] StoreError),
}
