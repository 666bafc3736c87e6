//! Error types for the skillbuddy-jobs crate.
//!
//! All errors use stable string messages suitable for display to users
//! and programmatic handling. The provider API key never appears in an
//! error message.
//!
//! Cache misses and quota exhaustion are not errors: they are reported as
//! [`crate::SearchOutcome`] variants.

/// Failures of a single provider search call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// Network failure, timeout, rate limiting or a 5xx response.
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    /// The provider answered with a payload that violates its contract.
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),

    /// The provider rejected the configured credentials.
    #[error("provider rejected credentials: {0}")]
    Unauthorized(String),
}

impl ProviderError {
    /// Whether the orchestrator may retry the call that produced this error.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Errors raised by the job search engine outside of provider calls.
#[derive(Debug, thiserror::Error)]
pub enum JobSearchError {
    /// The search query failed validation.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// The skill profile is empty or malformed.
    #[error("invalid profile: {0}")]
    InvalidProfile(String),

    /// Invalid engine configuration.
    #[error("config error: {0}")]
    Config(String),

    /// The HTTP client could not be constructed.
    #[error("HTTP error: {0}")]
    Http(String),
}

/// Convenience type alias for skillbuddy-jobs results.
pub type Result<T> = std::result::Result<T, JobSearchError>;
