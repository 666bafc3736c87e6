//! Shared HTTP client for provider requests.
//!
//! Provides a [`reqwest::Client`] with the configured request timeout and
//! User-Agent.

use crate::config::JobSearchConfig;
use crate::error::JobSearchError;

/// User-Agent sent when the configuration does not override it.
pub const DEFAULT_USER_AGENT: &str = concat!("skillbuddy-jobs/", env!("CARGO_PKG_VERSION"));

/// Build a [`reqwest::Client`] configured for provider calls.
///
/// The client has:
/// - Timeout from config
/// - Custom User-Agent if configured, else [`DEFAULT_USER_AGENT`]
/// - gzip decompression
///
/// # Errors
///
/// Returns [`JobSearchError::Http`] if the client cannot be constructed.
pub fn build_client(config: &JobSearchConfig) -> Result<reqwest::Client, JobSearchError> {
    let ua = config
        .user_agent
        .clone()
        .unwrap_or_else(|| DEFAULT_USER_AGENT.to_owned());

    reqwest::Client::builder()
        .timeout(config.timeout())
        .user_agent(ua)
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| JobSearchError::Http(format!("failed to build HTTP client: {e}")))
}
