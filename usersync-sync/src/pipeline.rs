//! Shared sync pipeline entrypoint: fetch both snapshots, then reconcile.

use chrono::{DateTime, Utc};
use serde::Serialize;

use usersync_core::{DirectorySource, RecordStore};

use crate::reconcile::{reconcile_with, ReconcileOptions, ReconcileReport};
use crate::SyncError;

/// Result of one [`run`].
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub dry_run: bool,
    pub source_users: usize,
    pub store_records: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    #[serde(flatten)]
    pub reconcile: ReconcileReport,
}

impl SyncReport {
    /// `Sync complete. Updated: N, Created: N, Up-to-date: N`
    pub fn summary(&self) -> String {
        let t = &self.reconcile.tally;
        let line = format!(
            "Sync complete. Updated: {}, Created: {}, Up-to-date: {}",
            t.updated, t.created, t.up_to_date
        );
        if self.dry_run {
            format!("[dry-run] {line}")
        } else {
            line
        }
    }
}

/// Run a full sync.
///
/// The directory is fetched first, then the store. Either fetch failing
/// returns before the store sees any mutation.
pub fn run<D, S>(
    directory: &D,
    store: &S,
    options: &ReconcileOptions,
) -> Result<SyncReport, SyncError>
where
    D: DirectorySource + ?Sized,
    S: RecordStore + ?Sized,
{
    let started_at = Utc::now();

    let source_users = directory.fetch_all_users()?;
    tracing::info!("fetched {} users from the directory", source_users.len());

    let store_records = store.fetch_all_records()?;
    tracing::info!("fetched {} records from the store", store_records.len());

    let reconcile = reconcile_with(store, &source_users, &store_records, options);

    Ok(SyncReport {
        dry_run: options.dry_run,
        source_users: source_users.len(),
        store_records: store_records.len(),
        started_at,
        finished_at: Utc::now(),
        reconcile,
    })
}
