//! `usersync init-db`: create the `employees` table.

use anyhow::{Context, Result};
use colored::Colorize;

use super::{open_store, GlobalArgs};

/// Only the store settings are needed; the directory is never contacted.
pub fn run(global: &GlobalArgs) -> Result<()> {
    let layered = global.layered()?;
    let url = layered
        .require_database_url()
        .context("incomplete configuration")?;
    let store = open_store(url, layered.database_auth_token.as_deref())?;
    store
        .ensure_schema()
        .with_context(|| format!("failed to create the employees table at {}", store.location()))?;
    println!("{} employees table ready at {}", "✓".green(), store.location());
    Ok(())
}
