//! Job search configuration with sensible defaults.
//!
//! [`JobSearchConfig`] controls the provider endpoint, timeouts, the
//! retry policy, cache expiry and the rolling quota budget. The defaults
//! match a SerpAPI free plan of 250 searches per month.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::JobSearchError;

/// Default SerpAPI search endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://serpapi.com/search";

/// Searches per month allowed by the provider plan.
pub const MONTHLY_ALLOWANCE: u32 = 250;

const THIRTY_DAYS_SECS: u64 = 30 * 24 * 60 * 60;

/// Configuration for the job search engine.
///
/// Use [`Default::default()`] for sensible defaults, or construct with
/// field overrides. Deserialises from partial TOML/JSON: missing fields
/// take their default value.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JobSearchConfig {
    /// Provider search endpoint.
    pub endpoint: String,
    /// SerpAPI engine parameter.
    pub engine: String,
    /// Provider API key. Never serialised.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Maximum number of postings kept per provider response.
    pub max_results: usize,
    /// Time box for a single provider call, in seconds.
    pub timeout_seconds: u64,
    /// Fixed delay before retrying an unavailable provider, in milliseconds.
    pub retry_backoff_ms: u64,
    /// How long a cached response stays valid, in seconds.
    pub cache_ttl_seconds: u64,
    /// Upper bound on cached responses held in memory.
    pub max_cache_entries: u64,
    /// Length of the rolling quota window, in seconds.
    pub quota_window_seconds: u64,
    /// Provider calls allowed per quota window.
    pub quota_limit: u32,
    /// Drop the cached entry for a query whose fetch failed.
    pub invalidate_on_provider_error: bool,
    /// Custom User-Agent string. If `None`, a crate identifier is sent.
    pub user_agent: Option<String>,
}

impl Default for JobSearchConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            engine: "google_jobs".to_owned(),
            api_key: None,
            max_results: 10,
            timeout_seconds: 10,
            retry_backoff_ms: 1_500,
            cache_ttl_seconds: 3_600,
            max_cache_entries: 128,
            quota_window_seconds: THIRTY_DAYS_SECS,
            quota_limit: MONTHLY_ALLOWANCE,
            invalidate_on_provider_error: false,
            user_agent: None,
        }
    }
}

impl std::fmt::Debug for JobSearchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobSearchConfig")
            .field("endpoint", &self.endpoint)
            .field("engine", &self.engine)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("max_results", &self.max_results)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .field("cache_ttl_seconds", &self.cache_ttl_seconds)
            .field("max_cache_entries", &self.max_cache_entries)
            .field("quota_window_seconds", &self.quota_window_seconds)
            .field("quota_limit", &self.quota_limit)
            .field(
                "invalidate_on_provider_error",
                &self.invalidate_on_provider_error,
            )
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl JobSearchConfig {
    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - `max_results`, `timeout_seconds`, `cache_ttl_seconds`,
    ///   `max_cache_entries` and `quota_window_seconds` must be greater than 0
    /// - `endpoint` must be an absolute http(s) URL
    ///
    /// A `quota_limit` of 0 is valid and makes the engine cache-only.
    pub fn validate(&self) -> Result<(), JobSearchError> {
        if self.max_results == 0 {
            return Err(JobSearchError::Config(
                "max_results must be greater than 0".into(),
            ));
        }
        if self.timeout_seconds == 0 {
            return Err(JobSearchError::Config(
                "timeout_seconds must be greater than 0".into(),
            ));
        }
        if self.cache_ttl_seconds == 0 {
            return Err(JobSearchError::Config(
                "cache_ttl_seconds must be greater than 0".into(),
            ));
        }
        if self.max_cache_entries == 0 {
            return Err(JobSearchError::Config(
                "max_cache_entries must be greater than 0".into(),
            ));
        }
        if self.quota_window_seconds == 0 {
            return Err(JobSearchError::Config(
                "quota_window_seconds must be greater than 0".into(),
            ));
        }
        match url::Url::parse(&self.endpoint) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => {
                return Err(JobSearchError::Config(format!(
                    "endpoint scheme must be http or https, got {}",
                    url.scheme()
                )))
            }
            Err(e) => {
                return Err(JobSearchError::Config(format!(
                    "endpoint is not a valid URL: {e}"
                )))
            }
        }
        Ok(())
    }

    /// Cache entry time-to-live.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }

    /// Rolling quota window length.
    pub fn quota_window(&self) -> Duration {
        Duration::from_secs(self.quota_window_seconds)
    }

    /// Time box for one provider call.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Delay before a retry.
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}
