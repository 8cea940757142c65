//! # usersync-sync
//!
//! Reconciliation of directory users into the record store.
//!
//! Call [`pipeline::run`] for a full fetch-fetch-reconcile pass, or
//! [`reconcile`] / [`reconcile_with`] when both snapshots are already in hand.

pub mod error;
pub mod pipeline;
pub mod reconcile;

pub use error::SyncError;
pub use pipeline::{run, SyncReport};
pub use reconcile::{
    reconcile, reconcile_with, Outcome, ReconcileOptions, ReconcileReport, Tally, UserOutcome,
};
