//! `usersync users`: list directory users and their messaging ids.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use usersync_core::{DirectorySource, SourceUser};

use super::{connect_directory, GlobalArgs};

/// Arguments for `usersync users`.
#[derive(Args, Debug)]
pub struct UsersArgs {
    /// Only users whose messaging id is unset.
    #[arg(long)]
    pub without_messaging_id: bool,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Tabled)]
struct UserRow {
    #[tabled(rename = "email")]
    email: String,
    #[tabled(rename = "messaging id")]
    messaging_id: String,
}

impl UsersArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let config = global.resolve()?;
        let directory = connect_directory(&config)?;

        let mut users = directory
            .fetch_all_users()
            .context("failed to list directory users")?;
        if self.without_messaging_id {
            users.retain(|u| u.messaging_id.is_unset());
        }

        if self.json {
            println!("{}", serde_json::to_string_pretty(&users)?);
            return Ok(());
        }

        print_table(&users);
        Ok(())
    }
}

fn print_table(users: &[SourceUser]) {
    if users.is_empty() {
        println!("No users found.");
        return;
    }

    let rows: Vec<UserRow> = users
        .iter()
        .map(|u| UserRow {
            email: u.email.to_string(),
            messaging_id: if u.messaging_id.is_unset() {
                "-".bright_black().to_string()
            } else {
                u.messaging_id.to_string()
            },
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
    println!("{} users", users.len());
}
