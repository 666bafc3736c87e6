//! Trait definition for pluggable job search providers.
//!
//! The orchestrator is generic over [`JobProvider`] so the SerpAPI client
//! can be swapped for another listing source, or for a scripted provider
//! in tests.

use crate::error::ProviderError;
use crate::types::{NormalizedPosting, SearchQuery};

/// A job listing source behind a quota-limited external API.
///
/// Implementations perform exactly **one** external call per
/// [`search`](Self::search) invocation and never retry internally; retries
/// and admission control belong to the orchestrator. Each implementation
/// handles its own:
///
/// - Request construction and credential handling
/// - Mapping transport and HTTP failures onto [`ProviderError`]
/// - Normalising raw results into [`NormalizedPosting`] values, skipping
///   entries without a title or URL
///
/// All implementations must be `Send + Sync` so one provider can serve
/// concurrent requests.
pub trait JobProvider: Send + Sync {
    /// Run one search against the provider.
    ///
    /// # Errors
    ///
    /// - [`ProviderError::Unavailable`] for network failures, timeouts,
    ///   rate limiting and 5xx responses
    /// - [`ProviderError::InvalidResponse`] for malformed payloads
    /// - [`ProviderError::Unauthorized`] for rejected credentials
    fn search(
        &self,
        query: &SearchQuery,
    ) -> impl std::future::Future<Output = Result<Vec<NormalizedPosting>, ProviderError>> + Send;

    /// Short provider name for logs.
    fn name(&self) -> &'static str;
}
