//! `usersync sync`: reconcile directory users into the store.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use usersync_sync::{Outcome, ReconcileOptions, UserOutcome};

use super::{connect_directory, open_store, GlobalArgs};

/// Arguments for `usersync sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Show what would change without writing to the store.
    #[arg(long)]
    pub dry_run: bool,

    /// Emit the full report as JSON.
    #[arg(long)]
    pub json: bool,
}

impl SyncArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let config = global.resolve()?;
        let directory = connect_directory(&config)?;
        let store = open_store(&config.database_url, config.database_auth_token.as_deref())?;

        let options = ReconcileOptions {
            dry_run: self.dry_run,
            matching: config.matching,
        };
        let report = usersync_sync::run(&directory, &store, &options).context("sync failed")?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(());
        }

        println!("{}", report.summary());
        for failure in report.reconcile.failures() {
            println!("{}", failure_line(failure));
        }
        Ok(())
    }
}

fn failure_line(failure: &UserOutcome) -> String {
    let mark = "✗".red();
    match &failure.outcome {
        Outcome::CreateFailed { error } => format!(
            "{mark} add {} ({}): {error}",
            failure.email, failure.messaging_id
        ),
        Outcome::UpdateFailed { previous, error } => format!(
            "{mark} update {} ({previous} -> {}): {error}",
            failure.email, failure.messaging_id
        ),
        other => format!("{mark} {}: {other:?}", failure.email),
    }
}
