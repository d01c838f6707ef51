//! Configuration file support for repotrack.
//!
//! Configuration is loaded with the following precedence (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (prefixed with `REPOTRACK_`, e.g. `REPOTRACK_GITHUB_TOKEN`)
//! 3. `./repotrack.toml`
//! 4. `~/.config/repotrack/config.toml`
//! 5. The unprefixed `INTERVAL` and `DB_HOST`/`DB_PORT`/`DB_USERNAME`/
//!    `DB_PASSWORD`/`DB_NAME` variables
//! 6. Built-in defaults
//!
//! Example config file:
//! ```toml
//! [database]
//! url = "sqlite://~/.local/state/repotrack/repotrack.db?mode=rwc"  # optional, this is the default
//!
//! [github]
//! token = "ghp_..."  # or REPOTRACK_GITHUB_TOKEN
//!
//! [refresh]
//! interval_hours = 1
//! requests_per_second = 5  # optional client-side pacing
//!
//! [display]
//! top_authors = 10
//!
//! [logging]
//! dir = "/var/log/repotrack"
//! ```

use std::path::PathBuf;
use std::time::Duration;

use config::builder::DefaultState;
use config::{
    Config as ConfigBuilder, ConfigBuilder as Builder, ConfigError, Environment, File, FileFormat,
};
use directories::ProjectDirs;
use serde::Deserialize;

const APP_NAME: &str = "repotrack";
const ENV_PREFIX: &str = "REPOTRACK";

/// Environment variables whose key contains an underscore, so they cannot be
/// split on `_` like the rest.
const MULTI_WORD_ENV: &[(&str, &str)] = &[
    ("refresh.interval_hours", "REPOTRACK_REFRESH_INTERVAL_HOURS"),
    ("refresh.requests_per_second", "REPOTRACK_REFRESH_REQUESTS_PER_SECOND"),
    ("display.top_authors", "REPOTRACK_DISPLAY_TOP_AUTHORS"),
];

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub github: GitHubConfig,
    pub refresh: RefreshConfig,
    pub display: DisplayConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `sqlite://` or `postgres://` URL. Defaults to a SQLite file in the
    /// XDG state directory.
    pub url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// Sent verbatim as a bearer token.
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    pub interval_hours: u64,
    /// Proactive pacing; unset means only the server's rate limits apply.
    pub requests_per_second: Option<u32>,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_hours: 1,
            requests_per_second: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Rows shown by `authors` when `-n` is not given. 0 shows everyone.
    pub top_authors: u64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self { top_authors: 10 }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Directory for `app.log` and `error.log`.
    pub dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from files and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        if let Some(xdg_config) = Self::default_config_path()
            && xdg_config.exists()
        {
            builder = builder.add_source(
                File::from(xdg_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        let local_config = PathBuf::from("repotrack.toml");
        if local_config.exists() {
            builder = builder.add_source(
                File::from(local_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        // REPOTRACK_DATABASE_URL -> database.url
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("_")
                .try_parsing(true),
        );

        builder = apply_env_overrides(builder, |name| std::env::var(name).ok())?;

        builder.build()?.try_deserialize()
    }

    /// The configured database URL, or a SQLite file in the state directory.
    ///
    /// `mode=rwc` creates the file if it doesn't exist.
    pub fn database_url(&self) -> Option<String> {
        self.database.url.clone().or_else(|| {
            Self::default_state_dir().map(|state_dir| {
                let db_path = state_dir.join("repotrack.db");
                format!("sqlite://{}?mode=rwc", db_path.display())
            })
        })
    }

    pub fn github_token(&self) -> Option<String> {
        self.github.token.clone().filter(|t| !t.is_empty())
    }

    /// Scheduler interval. Zero hours falls back to one.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh.interval_hours.max(1) * 60 * 60)
    }

    pub fn log_dir(&self) -> Option<PathBuf> {
        self.logging
            .dir
            .clone()
            .or_else(|| Self::default_state_dir().map(|dir| dir.join("logs")))
    }

    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// On Linux, `$XDG_STATE_HOME/repotrack` or `~/.local/state/repotrack`.
    /// Elsewhere, the data directory.
    pub fn default_state_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", APP_NAME).map(|dirs| {
            dirs.state_dir()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| dirs.data_dir().to_path_buf())
        })
    }
}

/// Build a Postgres URL from the `DB_HOST`, `DB_PORT`, `DB_USERNAME`,
/// `DB_PASSWORD` and `DB_NAME` variables. `DB_HOST` must be set.
fn legacy_postgres_url(lookup: &impl Fn(&str) -> Option<String>) -> Option<String> {
    let host = lookup("DB_HOST").filter(|h| !h.is_empty())?;
    let mut url = url::Url::parse("postgres://localhost").ok()?;
    url.set_host(Some(&host)).ok()?;

    if let Some(port) = lookup("DB_PORT").and_then(|p| p.parse::<u16>().ok()) {
        url.set_port(Some(port)).ok()?;
    }
    if let Some(user) = lookup("DB_USERNAME").filter(|u| !u.is_empty()) {
        url.set_username(&user).ok()?;
        if let Some(password) = lookup("DB_PASSWORD").filter(|p| !p.is_empty()) {
            url.set_password(Some(&password)).ok()?;
        }
    }
    if let Some(name) = lookup("DB_NAME").filter(|n| !n.is_empty()) {
        url.set_path(&name);
    }

    Some(url.to_string())
}

/// Apply the multi-word `REPOTRACK_*` variables as overrides. The bare
/// `INTERVAL` (hours) and `DB_*` connection variables are registered as
/// defaults, so any config file or `REPOTRACK_*` variable beats them.
fn apply_env_overrides(
    mut builder: Builder<DefaultState>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Builder<DefaultState>, ConfigError> {
    for (key, var) in MULTI_WORD_ENV {
        builder = builder.set_override_option(*key, lookup(var))?;
    }

    if let Some(hours) = lookup("INTERVAL") {
        builder = builder.set_default("refresh.interval_hours", hours)?;
    }
    if let Some(url) = legacy_postgres_url(&lookup) {
        builder = builder.set_default("database.url", url)?;
    }

    Ok(builder)
}
