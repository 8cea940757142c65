//! Subcommands and the setup they share.

pub mod init_db;
pub mod lookup;
pub mod sync;
pub mod users;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use usersync_core::{config, Config, ConfigFile};
use usersync_directory::{Credentials, DirectoryOptions, GoogleDirectory};
use usersync_store::Store;

/// Flags accepted by every subcommand. Each falls back to its env var.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Config file [default: ~/.usersync/config.yaml].
    #[arg(long, global = true, env = "USERSYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Store connection string (libsql://, https://, file:, :memory:).
    #[arg(long, global = true, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Store auth token; overrides one embedded in the URL.
    #[arg(long, global = true, env = "DATABASE_AUTH_TOKEN", hide_env_values = true)]
    pub database_auth_token: Option<String>,

    /// Google Workspace domain to list users from.
    #[arg(long, global = true, env = "GOOGLE_DOMAIN")]
    pub domain: Option<String>,

    /// Custom schema names to request with each user.
    #[arg(long, global = true, env = "GOOGLE_CUSTOM_FIELD_MASK")]
    pub custom_field_mask: Option<String>,

    /// OAuth credential file [default: credentials.json].
    #[arg(long, global = true, env = "GOOGLE_CREDENTIALS")]
    pub credentials: Option<PathBuf>,
}

impl GlobalArgs {
    fn overrides(&self) -> ConfigFile {
        ConfigFile {
            database_url: self.database_url.clone(),
            database_auth_token: self.database_auth_token.clone(),
            google_domain: self.domain.clone(),
            custom_field_mask: self.custom_field_mask.clone(),
            credentials_path: self.credentials.clone(),
            ..ConfigFile::default()
        }
    }

    /// File layer plus flags, not yet validated.
    pub fn layered(&self) -> Result<ConfigFile> {
        config::layered(self.config.as_deref(), self.overrides())
            .context("failed to load configuration")
    }

    /// Fully resolved configuration.
    pub fn resolve(&self) -> Result<Config> {
        Config::try_from(self.layered()?).context("incomplete configuration")
    }
}

/// Read credentials and authenticate to the directory.
pub fn connect_directory(config: &Config) -> Result<GoogleDirectory> {
    let credentials = Credentials::load(&config.credentials_path).with_context(|| {
        format!(
            "failed to read credentials from {}",
            config.credentials_path.display()
        )
    })?;
    GoogleDirectory::connect(DirectoryOptions::from_config(config), &credentials)
        .context("failed to authenticate to the directory")
}

/// Open the store named by `url`.
pub fn open_store(url: &str, auth_token: Option<&str>) -> Result<Store> {
    Store::open(url, auth_token).context("failed to open the store")
}
