//! usersync: one-way sync of Google Workspace messaging ids into the
//! `employees` table.
//!
//! # Usage
//!
//! ```text
//! usersync sync [--dry-run] [--json]
//! usersync users [--without-messaging-id] [--json]
//! usersync lookup <email>
//! usersync init-db
//! ```
//!
//! Every command accepts `--config`, `--database-url`,
//! `--database-auth-token`, `--domain`, `--custom-field-mask` and
//! `--credentials`, each with an environment fallback.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{lookup::LookupArgs, sync::SyncArgs, users::UsersArgs, GlobalArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "usersync",
    version,
    about = "Sync messaging ids from the Google Workspace directory into the employees table",
    long_about = None,
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Reconcile directory users into the store.
    Sync(SyncArgs),

    /// List directory users with their messaging id.
    Users(UsersArgs),

    /// Show the directory entry and store row for one email.
    Lookup(LookupArgs),

    /// Create the employees table if it does not exist.
    InitDb,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Sync(args) => args.run(&cli.global),
        Commands::Users(args) => args.run(&cli.global),
        Commands::Lookup(args) => args.run(&cli.global),
        Commands::InitDb => commands::init_db::run(&cli.global),
    }
}

/// Logs go to stderr so stdout stays clean for `--json`.
fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
