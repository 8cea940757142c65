//! Process configuration.
//!
//! # Sources, highest precedence first
//!
//! 1. Command-line flags and their environment fallbacks (resolved by the
//!    binary into a [`ConfigFile`] of overrides)
//! 2. The YAML config file, `~/.usersync/config.yaml` by default
//! 3. Built-in defaults
//!
//! # API pattern
//!
//! - `fn_at(home: &Path, …)`: explicit home; used in tests with `TempDir`
//! - `fn(…)`: derives home from `dirs::home_dir()`, delegates to `_at`
//!
//! The resolved [`Config`] is passed down explicitly; nothing below the
//! binary reads the environment.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::MatchStrategy;

pub const DEFAULT_CREDENTIALS_PATH: &str = "credentials.json";
pub const DEFAULT_MESSAGING_SCHEMA: &str = "MessengerInfo";
pub const DEFAULT_MESSAGING_FIELD: &str = "tgID";
pub const DEFAULT_DIRECTORY_API_URL: &str = "https://admin.googleapis.com";

// ---------------------------------------------------------------------------
// 1. Raw (partial) configuration
// ---------------------------------------------------------------------------

/// Every setting optional; one layer of configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub database_url: Option<String>,
    pub database_auth_token: Option<String>,
    pub google_domain: Option<String>,
    pub custom_field_mask: Option<String>,
    pub credentials_path: Option<PathBuf>,
    pub messaging_schema: Option<String>,
    pub messaging_field: Option<String>,
    pub directory_api_url: Option<String>,
    pub matching: Option<MatchStrategy>,
}

impl ConfigFile {
    /// Layer `overrides` on top of `self`; any value set in `overrides` wins.
    pub fn merge(self, overrides: ConfigFile) -> ConfigFile {
        ConfigFile {
            database_url: overrides.database_url.or(self.database_url),
            database_auth_token: overrides.database_auth_token.or(self.database_auth_token),
            google_domain: overrides.google_domain.or(self.google_domain),
            custom_field_mask: overrides.custom_field_mask.or(self.custom_field_mask),
            credentials_path: overrides.credentials_path.or(self.credentials_path),
            messaging_schema: overrides.messaging_schema.or(self.messaging_schema),
            messaging_field: overrides.messaging_field.or(self.messaging_field),
            directory_api_url: overrides.directory_api_url.or(self.directory_api_url),
            matching: overrides.matching.or(self.matching),
        }
    }

    /// The store connection string, for commands that need nothing else.
    pub fn require_database_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or(ConfigError::Missing {
                key: "DATABASE_URL",
            })
    }
}

// ---------------------------------------------------------------------------
// 2. Resolved configuration
// ---------------------------------------------------------------------------

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: String,
    pub database_auth_token: Option<String>,
    pub google_domain: String,
    /// `None` requests no custom schema fields from the directory.
    pub custom_field_mask: Option<String>,
    pub credentials_path: PathBuf,
    pub messaging_schema: String,
    pub messaging_field: String,
    pub directory_api_url: String,
    pub matching: MatchStrategy,
}

impl TryFrom<ConfigFile> for Config {
    type Error = ConfigError;

    fn try_from(raw: ConfigFile) -> Result<Self, Self::Error> {
        let database_url = non_empty(raw.database_url).ok_or(ConfigError::Missing {
            key: "DATABASE_URL",
        })?;
        let google_domain = non_empty(raw.google_domain).ok_or(ConfigError::Missing {
            key: "GOOGLE_DOMAIN",
        })?;

        Ok(Config {
            database_url,
            database_auth_token: non_empty(raw.database_auth_token),
            google_domain,
            custom_field_mask: non_empty(raw.custom_field_mask),
            credentials_path: raw
                .credentials_path
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CREDENTIALS_PATH)),
            messaging_schema: non_empty(raw.messaging_schema)
                .unwrap_or_else(|| DEFAULT_MESSAGING_SCHEMA.to_string()),
            messaging_field: non_empty(raw.messaging_field)
                .unwrap_or_else(|| DEFAULT_MESSAGING_FIELD.to_string()),
            directory_api_url: non_empty(raw.directory_api_url)
                .unwrap_or_else(|| DEFAULT_DIRECTORY_API_URL.to_string()),
            matching: raw.matching.unwrap_or_default(),
        })
    }
}

/// An empty string counts as unset, the same as an unset env var.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// ---------------------------------------------------------------------------
// 3. Load
// ---------------------------------------------------------------------------

/// `<home>/.usersync/config.yaml`. Pure, no I/O.
pub fn default_path_at(home: &Path) -> PathBuf {
    home.join(".usersync").join("config.yaml")
}

/// `default_path_at` convenience wrapper.
pub fn default_path() -> Result<PathBuf, ConfigError> {
    Ok(default_path_at(&home()?))
}

/// Load the config file at `path`.
///
/// Returns `ConfigError::NotFound` if absent,
/// `ConfigError::Parse` (with path + line context) if malformed YAML.
pub fn load_at(path: &Path) -> Result<ConfigFile, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    if contents.trim().is_empty() {
        return Ok(ConfigFile::default());
    }
    serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Load `<home>/.usersync/config.yaml`, or an empty layer if it does not exist.
pub fn load_default_at(home: &Path) -> Result<ConfigFile, ConfigError> {
    let path = default_path_at(home);
    if !path.exists() {
        return Ok(ConfigFile::default());
    }
    load_at(&path)
}

/// Merge the config file layer with `overrides`, without validating.
///
/// An explicit `config_path` must exist; otherwise the default file under
/// `home` is optional.
pub fn layered_at(
    home: &Path,
    config_path: Option<&Path>,
    overrides: ConfigFile,
) -> Result<ConfigFile, ConfigError> {
    let file = match config_path {
        Some(path) => load_at(path)?,
        None => load_default_at(home)?,
    };
    Ok(file.merge(overrides))
}

/// `layered_at` convenience wrapper.
pub fn layered(config_path: Option<&Path>, overrides: ConfigFile) -> Result<ConfigFile, ConfigError> {
    match config_path {
        // An explicit path never needs the home directory.
        Some(path) => Ok(load_at(path)?.merge(overrides)),
        None => layered_at(&home()?, None, overrides),
    }
}

/// Resolve the final [`Config`].
pub fn resolve_at(
    home: &Path,
    config_path: Option<&Path>,
    overrides: ConfigFile,
) -> Result<Config, ConfigError> {
    Config::try_from(layered_at(home, config_path, overrides)?)
}

/// `resolve_at` convenience wrapper.
pub fn resolve(config_path: Option<&Path>, overrides: ConfigFile) -> Result<Config, ConfigError> {
    Config::try_from(layered(config_path, overrides)?)
}

fn home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}
