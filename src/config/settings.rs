//! Application settings.
//!
//! Settings come from an optional `config.toml` and are then overridden by
//! environment variables (normally populated from `.env` via `dotenvy`):
//!
//! ```toml
//! database_url = "sqlite://data/routine_grid.sqlite?mode=rwc"
//! log_filter = "routine_grid=debug,sea_orm=warn"
//! ```

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Default location of the `SQLite` database file.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/routine_grid.sqlite?mode=rwc";

/// Default `tracing` filter when neither `RUST_LOG` nor the config sets one.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Runtime settings for the service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// `SeaORM` connection string
    pub database_url: String,
    /// `tracing_subscriber::EnvFilter` directive
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl Settings {
    /// Replaces the database URL when an override is present.
    #[must_use]
    pub fn with_database_url(mut self, database_url: Option<String>) -> Self {
        if let Some(url) = database_url.filter(|url| !url.trim().is_empty()) {
            self.database_url = url;
        }
        self
    }
}

/// Parses settings from TOML text.
///
/// # Errors
/// Returns [`Error::Config`] if the TOML is malformed.
pub fn parse_settings(contents: &str) -> Result<Settings> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse settings: {e}"),
    })
}

/// Loads settings from `path`, falling back to defaults when the file is absent.
///
/// # Errors
/// Returns [`Error::Io`] if the file exists but cannot be read, and
/// [`Error::Config`] if it cannot be parsed.
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path_ref = path.as_ref();
    if !path_ref.exists() {
        tracing::debug!("No settings file at {:?}, using defaults", path_ref);
        return Ok(Settings::default());
    }

    let contents = std::fs::read_to_string(path_ref)
        .inspect_err(|e| tracing::error!("Failed to read settings file {:?}: {}", path_ref, e))?;
    parse_settings(&contents)
}

/// Loads `./config.toml` and applies the `DATABASE_URL` environment override.
///
/// # Errors
/// Returns an error if `config.toml` exists but cannot be read or parsed.
pub fn load_default_settings() -> Result<Settings> {
    Ok(load_settings("config.toml")?.with_database_url(std::env::var("DATABASE_URL").ok()))
}
