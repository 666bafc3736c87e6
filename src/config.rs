//! Application configuration.
//!
//! Loaded from a TOML file, then overridden from the environment:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `SERPAPI_KEY` | `search.api_key` |
//! | `SKILLBUDDY_CACHE_TTL_SECONDS` | `search.cache_ttl_seconds` |
//! | `SKILLBUDDY_QUOTA_LIMIT` | `search.quota_limit` |
//! | `SKILLBUDDY_QUOTA_WINDOW_SECONDS` | `search.quota_window_seconds` |
//! | `SKILLBUDDY_PROVIDER_TIMEOUT_SECONDS` | `search.timeout_seconds` |
//!
//! The API key is never written back to disk.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use skillbuddy_jobs::JobSearchConfig;

use crate::error::{AppError, Result};

pub const ENV_API_KEY: &str = "SERPAPI_KEY";
pub const ENV_CACHE_TTL: &str = "SKILLBUDDY_CACHE_TTL_SECONDS";
pub const ENV_QUOTA_LIMIT: &str = "SKILLBUDDY_QUOTA_LIMIT";
pub const ENV_QUOTA_WINDOW: &str = "SKILLBUDDY_QUOTA_WINDOW_SECONDS";
pub const ENV_PROVIDER_TIMEOUT: &str = "SKILLBUDDY_PROVIDER_TIMEOUT_SECONDS";

/// Overrides the directory returned by [`config_dir`].
pub const ENV_CONFIG_DIR: &str = "SKILLBUDDY_CONFIG_DIR";

/// Top-level host configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Offer expired cached postings, labelled stale, when the quota is
    /// exhausted.
    pub serve_stale_on_quota_exhausted: bool,
    /// Job search engine settings.
    pub search: JobSearchConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            serve_stale_on_quota_exhausted: true,
            search: JobSearchConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    ///
    /// Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| AppError::Config(format!("{}: {e}", path.display())))
    }

    /// Resolve the effective configuration.
    ///
    /// An explicit `path` must exist. Without one, the file at
    /// [`AppConfig::default_config_path`] is used when present and defaults
    /// otherwise. Environment overrides are applied last and the result is
    /// validated.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, an override
    /// is malformed, or the merged configuration is invalid.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Self::default_config_path();
                if default_path.is_file() {
                    Self::from_file(&default_path)?
                } else {
                    tracing::debug!(path = %default_path.display(), "no config file, using defaults");
                    Self::default()
                }
            }
        };
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`] if a numeric override does not parse.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from `lookup`, which maps a variable name to its value.
    ///
    /// Blank values are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`] if a numeric override does not parse.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = lookup(ENV_API_KEY) {
            self.search.api_key = Some(key.trim().to_owned());
        }
        if let Some(raw) = lookup(ENV_CACHE_TTL) {
            self.search.cache_ttl_seconds = parse_number(ENV_CACHE_TTL, &raw)?;
        }
        if let Some(raw) = lookup(ENV_QUOTA_LIMIT) {
            self.search.quota_limit = parse_number(ENV_QUOTA_LIMIT, &raw)?;
        }
        if let Some(raw) = lookup(ENV_QUOTA_WINDOW) {
            self.search.quota_window_seconds = parse_number(ENV_QUOTA_WINDOW, &raw)?;
        }
        if let Some(raw) = lookup(ENV_PROVIDER_TIMEOUT) {
            self.search.timeout_seconds = parse_number(ENV_PROVIDER_TIMEOUT, &raw)?;
        }
        Ok(())
    }

    /// Validate the merged configuration.
    ///
    /// # Errors
    ///
    /// Returns the engine's configuration error if a search setting is
    /// invalid.
    pub fn validate(&self) -> Result<()> {
        self.search.validate()?;
        Ok(())
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `<config_dir>/config.toml`.
    pub fn default_config_path() -> PathBuf {
        config_dir().join("config.toml")
    }
}

/// Application config directory.
///
/// Resolves to `dirs::config_dir()/skillbuddy/` by default. Override with
/// the `SKILLBUDDY_CONFIG_DIR` environment variable.
#[must_use]
pub fn config_dir() -> PathBuf {
    resolve_config_dir(
        std::env::var_os(ENV_CONFIG_DIR).map(PathBuf::from),
        dirs::config_dir(),
    )
}

/// Falls back to the OS temp directory when the platform has no config dir.
fn resolve_config_dir(override_dir: Option<PathBuf>, platform_dir: Option<PathBuf>) -> PathBuf {
    if let Some(dir) = override_dir {
        return dir;
    }
    platform_dir
        .unwrap_or_else(std::env::temp_dir)
        .join("skillbuddy")
}

fn parse_number<T: FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::Config(format!("{name} must be a non-negative integer, got {raw:?}")))
}
