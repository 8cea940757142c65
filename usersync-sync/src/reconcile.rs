//! One-way reconciliation of a directory snapshot into the record store.
//!
//! For each source user, in source order:
//!
//! 1. Find the first store record with exactly the same email.
//! 2. No record: insert. `created` is incremented even if the insert fails.
//! 3. Record with a different messaging id: update. `updated` is incremented
//!    only on success; a failed update is counted nowhere.
//! 4. Record with the same messaging id: `up_to_date`, no store call.
//!
//! Store-only records are never touched. Each mutation commits on its own,
//! so a run that dies halfway is finished by running again.

use std::collections::HashMap;

use serde::Serialize;
use usersync_core::{Email, MatchStrategy, MessagingId, RecordStore, SourceUser, StoreRecord};

// ---------------------------------------------------------------------------
// Options and results
// ---------------------------------------------------------------------------

/// Knobs for a reconcile pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// Plan only: no insert or update reaches the store.
    pub dry_run: bool,
    pub matching: MatchStrategy,
}

/// What happened to one source user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Created,
    /// Insert failed; still tallied as created.
    CreateFailed { error: String },
    Updated { previous: MessagingId },
    /// Update failed; not tallied.
    UpdateFailed { previous: MessagingId, error: String },
    UpToDate,
    WouldCreate,
    WouldUpdate { previous: MessagingId },
}

impl Outcome {
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Outcome::CreateFailed { .. } | Outcome::UpdateFailed { .. }
        )
    }
}

/// Outcome for one source user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserOutcome {
    pub email: Email,
    pub messaging_id: MessagingId,
    #[serde(flatten)]
    pub outcome: Outcome,
}

/// Counters for a reconcile pass.
///
/// `updated + created + up_to_date` equals the number of source users minus
/// the failed updates. `failed` counts both failure kinds and is reported
/// alongside, not summed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub updated: usize,
    pub created: usize,
    pub up_to_date: usize,
    pub failed: usize,
}

impl Tally {
    fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Created | Outcome::WouldCreate => self.created += 1,
            Outcome::CreateFailed { .. } => {
                self.created += 1;
                self.failed += 1;
            }
            Outcome::Updated { .. } | Outcome::WouldUpdate { .. } => self.updated += 1,
            Outcome::UpdateFailed { .. } => self.failed += 1,
            Outcome::UpToDate => self.up_to_date += 1,
        }
    }

    /// Users with a tallied outcome.
    pub fn total(&self) -> usize {
        self.updated + self.created + self.up_to_date
    }
}

/// Full result of a reconcile pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub tally: Tally,
    /// One entry per source user, in source order.
    pub outcomes: Vec<UserOutcome>,
}

impl ReconcileReport {
    pub fn failures(&self) -> impl Iterator<Item = &UserOutcome> {
        self.outcomes.iter().filter(|o| o.outcome.is_failure())
    }
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

enum Matcher<'a> {
    Scan(&'a [StoreRecord]),
    Index(HashMap<&'a str, &'a StoreRecord>),
}

impl<'a> Matcher<'a> {
    fn new(records: &'a [StoreRecord], strategy: MatchStrategy) -> Self {
        match strategy {
            MatchStrategy::Scan => Matcher::Scan(records),
            MatchStrategy::Index => {
                let mut index = HashMap::with_capacity(records.len());
                for record in records {
                    // Keep the first record per email.
                    index.entry(record.email.as_str()).or_insert(record);
                }
                Matcher::Index(index)
            }
        }
    }

    fn find(&self, email: &Email) -> Option<&'a StoreRecord> {
        match self {
            Matcher::Scan(records) => records.iter().find(|r| r.email == *email),
            Matcher::Index(index) => index.get(email.as_str()).copied(),
        }
    }
}

// ---------------------------------------------------------------------------
// Reconcile
// ---------------------------------------------------------------------------

/// Reconcile with default options and return the three counters.
pub fn reconcile<S: RecordStore + ?Sized>(
    store: &S,
    source_users: &[SourceUser],
    store_records: &[StoreRecord],
) -> Tally {
    reconcile_with(store, source_users, store_records, &ReconcileOptions::default()).tally
}

/// Reconcile `source_users` against the `store_records` snapshot, applying
/// mutations to `store` unless `options.dry_run` is set.
///
/// Never fails: per-user store errors are logged and recorded in the
/// returned outcomes.
pub fn reconcile_with<S: RecordStore + ?Sized>(
    store: &S,
    source_users: &[SourceUser],
    store_records: &[StoreRecord],
    options: &ReconcileOptions,
) -> ReconcileReport {
    let matcher = Matcher::new(store_records, options.matching);
    let mut report = ReconcileReport {
        tally: Tally::default(),
        outcomes: Vec::with_capacity(source_users.len()),
    };

    for user in source_users {
        let outcome = match matcher.find(&user.email) {
            None => create(store, user, options.dry_run),
            Some(record) if record.messaging_id != user.messaging_id => {
                update(store, user, record.messaging_id, options.dry_run)
            }
            Some(_) => {
                tracing::debug!("{} is up to date", user.email);
                Outcome::UpToDate
            }
        };
        report.tally.record(&outcome);
        report.outcomes.push(UserOutcome {
            email: user.email.clone(),
            messaging_id: user.messaging_id,
            outcome,
        });
    }

    let t = &report.tally;
    tracing::info!(
        "reconciled {} source users against {} records: updated {}, created {}, up to date {}, failed {}",
        source_users.len(),
        store_records.len(),
        t.updated,
        t.created,
        t.up_to_date,
        t.failed
    );
    report
}

fn create<S: RecordStore + ?Sized>(store: &S, user: &SourceUser, dry_run: bool) -> Outcome {
    if dry_run {
        tracing::info!("[dry-run] would add {} ({})", user.email, user.messaging_id);
        return Outcome::WouldCreate;
    }
    match store.insert(&StoreRecord::from(user)) {
        Ok(()) => {
            tracing::info!("added {} ({})", user.email, user.messaging_id);
            Outcome::Created
        }
        Err(e) => {
            tracing::warn!("failed to add {}: {e}", user.email);
            Outcome::CreateFailed {
                error: e.to_string(),
            }
        }
    }
}

fn update<S: RecordStore + ?Sized>(
    store: &S,
    user: &SourceUser,
    previous: MessagingId,
    dry_run: bool,
) -> Outcome {
    if dry_run {
        tracing::info!(
            "[dry-run] would update {}: {previous} -> {}",
            user.email,
            user.messaging_id
        );
        return Outcome::WouldUpdate { previous };
    }
    match store.update_messaging_id(&user.email, user.messaging_id) {
        Ok(()) => {
            tracing::info!(
                "updated {}: {previous} -> {}",
                user.email,
                user.messaging_id
            );
            Outcome::Updated { previous }
        }
        Err(e) => {
            tracing::warn!("failed to update {}: {e}", user.email);
            Outcome::UpdateFailed {
                previous,
                error: e.to_string(),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
