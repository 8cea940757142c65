//! `usersync lookup`: compare one user across the directory and the store.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use usersync_core::{DirectoryError, DirectorySource, Email, MessagingId, RecordStore};

use super::{connect_directory, open_store, GlobalArgs};

/// Arguments for `usersync lookup`.
#[derive(Args, Debug)]
pub struct LookupArgs {
    /// Primary email, matched exactly.
    pub email: String,
}

impl LookupArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let config = global.resolve()?;
        let email = Email::from(self.email.trim());

        let directory = connect_directory(&config)?;
        let in_directory = match directory.fetch_user(&email) {
            Ok(user) => Some(user.messaging_id),
            Err(DirectoryError::UserNotFound { .. }) => None,
            Err(e) => {
                return Err(e).with_context(|| format!("failed to look up {email} in the directory"))
            }
        };

        let store = open_store(&config.database_url, config.database_auth_token.as_deref())?;
        let in_store = match store.find_record(&email) {
            Ok(record) => Some(record.messaging_id),
            Err(e) if e.is_not_found() => None,
            Err(e) => {
                return Err(e).with_context(|| format!("failed to look up {email} in the store"))
            }
        };

        println!("{}", email.to_string().bold());
        println!("  directory: {}", describe(in_directory, "not in directory"));
        println!("  store:     {}", describe(in_store, "not in store"));
        println!("  {}", verdict(in_directory, in_store));
        Ok(())
    }
}

fn describe(id: Option<MessagingId>, missing: &str) -> String {
    match id {
        Some(id) if id.is_unset() => format!("{id} (unset)"),
        Some(id) => id.to_string(),
        None => missing.bright_black().to_string(),
    }
}

/// What a sync would do for this user.
fn verdict(in_directory: Option<MessagingId>, in_store: Option<MessagingId>) -> String {
    match (in_directory, in_store) {
        (Some(a), Some(b)) if a == b => format!("{} up to date", "✓".green()),
        (Some(_), Some(_)) => format!("{} sync would update the store", "~".yellow()),
        (Some(_), None) => format!("{} sync would add to the store", "+".yellow()),
        (None, _) => format!("{} not managed by sync", "-".bright_black()),
    }
}
