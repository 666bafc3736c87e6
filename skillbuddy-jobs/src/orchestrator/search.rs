//! Core search orchestrator: cache check, quota gate, fetch, write-back.
//!
//! Decides per query whether to serve cached postings or spend a quota
//! unit on a provider call. The quota check runs strictly after the cache
//! check and strictly before the network call, so a cache hit never
//! consumes quota and every consumed unit corresponds to an attempted
//! call. The cache is written only after a successful fetch.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::cache::{CacheEntry, JobCache};
use crate::config::JobSearchConfig;
use crate::error::{JobSearchError, ProviderError};
use crate::provider::JobProvider;
use crate::quota::QuotaTracker;
use crate::types::{CacheKey, NormalizedPosting, SearchQuery};

use super::dedup::deduplicate;

/// How long an idle per-key fetch gate is kept.
const GATE_IDLE: Duration = Duration::from_secs(600);

/// Upper bound on tracked per-key fetch gates.
const MAX_GATES: u64 = 1_024;

/// Terminal state of one orchestrated search.
#[derive(Debug, Clone)]
pub enum SearchOutcome {
    /// A valid cache entry answered the query; no quota was consumed.
    ServedFromCache(Arc<CacheEntry>),
    /// The provider answered and the result was cached.
    ServedFresh(Arc<CacheEntry>),
    /// No cache entry and no quota left; no provider call was made.
    QuotaExceeded,
    /// The provider call failed; the cache was not written.
    ProviderFailed(ProviderError),
}

/// Outcome tag surfaced to the calling layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OutcomeKind {
    ServedFromCache,
    ServedFresh,
    QuotaExceeded,
    ProviderFailed,
}

impl OutcomeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ServedFromCache => "ServedFromCache",
            Self::ServedFresh => "ServedFresh",
            Self::QuotaExceeded => "QuotaExceeded",
            Self::ProviderFailed => "ProviderFailed",
        }
    }
}

impl std::fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl SearchOutcome {
    /// The outcome tag.
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Self::ServedFromCache(_) => OutcomeKind::ServedFromCache,
            Self::ServedFresh(_) => OutcomeKind::ServedFresh,
            Self::QuotaExceeded => OutcomeKind::QuotaExceeded,
            Self::ProviderFailed(_) => OutcomeKind::ProviderFailed,
        }
    }

    /// The cache entry backing a served outcome.
    pub fn entry(&self) -> Option<&Arc<CacheEntry>> {
        match self {
            Self::ServedFromCache(entry) | Self::ServedFresh(entry) => Some(entry),
            Self::QuotaExceeded | Self::ProviderFailed(_) => None,
        }
    }

    /// Served postings; empty for failed outcomes.
    pub fn postings(&self) -> &[NormalizedPosting] {
        match self.entry() {
            Some(entry) => &entry.postings,
            None => &[],
        }
    }
}

/// Quota-aware search orchestrator.
///
/// Owns its cache, quota tracker and provider; nothing is process-global,
/// so independent instances never share state. Share one instance behind
/// an `Arc` to serve concurrent requests.
pub struct JobSearch<P> {
    provider: P,
    cache: JobCache,
    quota: Arc<QuotaTracker>,
    gates: Cache<CacheKey, Arc<Mutex<()>>>,
    unauthorized: AtomicBool,
    config: JobSearchConfig,
}

impl<P: JobProvider> JobSearch<P> {
    /// Create an orchestrator with a fresh cache and quota window sized
    /// from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`JobSearchError::Config`] if `config` is invalid.
    pub fn new(provider: P, config: JobSearchConfig) -> Result<Self, JobSearchError> {
        let cache = JobCache::new(config.cache_ttl(), config.max_cache_entries);
        let quota = Arc::new(QuotaTracker::new(config.quota_limit, config.quota_window()));
        Self::from_parts(provider, cache, quota, config)
    }

    /// Create an orchestrator around an existing cache and quota tracker.
    ///
    /// # Errors
    ///
    /// Returns [`JobSearchError::Config`] if `config` is invalid.
    pub fn from_parts(
        provider: P,
        cache: JobCache,
        quota: Arc<QuotaTracker>,
        config: JobSearchConfig,
    ) -> Result<Self, JobSearchError> {
        config.validate()?;
        Ok(Self {
            provider,
            cache,
            quota,
            gates: Cache::builder()
                .max_capacity(MAX_GATES)
                .time_to_idle(GATE_IDLE)
                .build(),
            unauthorized: AtomicBool::new(false),
            config,
        })
    }

    /// Answer a query from cache, or from the provider when quota allows.
    pub async fn search(&self, query: &SearchQuery) -> SearchOutcome {
        let key = query.cache_key();
        tracing::trace!(%key, role = query.role_title(), "job search requested");

        if let Some(entry) = self.cache.get(&key).await {
            tracing::debug!(%key, "cache hit");
            return SearchOutcome::ServedFromCache(entry);
        }
        tracing::debug!(%key, "cache miss");

        let outcome = self.fetch(query, key, true).await;
        tracing::debug!(%key, outcome = %outcome.kind(), "job search finished");
        outcome
    }

    /// Skip the cache check and fetch from the provider when quota allows.
    ///
    /// A successful fetch replaces the cached entry.
    pub async fn refresh(&self, query: &SearchQuery) -> SearchOutcome {
        let key = query.cache_key();
        let outcome = self.fetch(query, key, false).await;
        tracing::debug!(%key, outcome = %outcome.kind(), "job search refresh finished");
        outcome
    }

    /// The cached entry for `query`, even if expired.
    ///
    /// Offering stale data is a caller policy; the orchestrator never does
    /// it on its own.
    pub async fn stale(&self, query: &SearchQuery) -> Option<Arc<CacheEntry>> {
        self.cache.get_stale(&query.cache_key()).await
    }

    /// The quota tracker gating provider calls.
    pub fn quota(&self) -> &QuotaTracker {
        &self.quota
    }

    /// The response cache.
    pub fn cache(&self) -> &JobCache {
        &self.cache
    }

    /// The provider behind this orchestrator.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Whether provider calls are still permitted this session.
    pub fn is_authorized(&self) -> bool {
        !self.unauthorized.load(Ordering::Acquire)
    }

    /// Permit provider calls again after credentials were fixed.
    pub fn reset_authorization(&self) {
        self.unauthorized.store(false, Ordering::Release);
    }

    async fn fetch(&self, query: &SearchQuery, key: CacheKey, recheck_cache: bool) -> SearchOutcome {
        // One fetch per key at a time; other keys are unaffected.
        let gate = self
            .gates
            .get_with(key, async { Arc::new(Mutex::new(())) })
            .await;
        let _guard = gate.lock().await;

        if recheck_cache {
            // A concurrent request for this key may have filled the cache.
            if let Some(entry) = self.cache.get(&key).await {
                tracing::debug!(%key, "cache filled while waiting for fetch gate");
                return SearchOutcome::ServedFromCache(entry);
            }
        }

        if !self.is_authorized() {
            return SearchOutcome::ProviderFailed(ProviderError::Unauthorized(
                "credentials were rejected earlier in this session".into(),
            ));
        }

        if !self.quota.try_consume() {
            tracing::warn!(
                %key,
                limit = self.quota.limit(),
                "provider quota exhausted, not calling provider"
            );
            return SearchOutcome::QuotaExceeded;
        }

        match self.call_with_retry(query).await {
            Ok(postings) => {
                let mut postings = deduplicate(postings);
                postings.truncate(self.config.max_results);
                let entry = self.cache.put(key, postings).await;
                SearchOutcome::ServedFresh(entry)
            }
            Err(err) => {
                self.record_failure(&key, &err).await;
                SearchOutcome::ProviderFailed(err)
            }
        }
    }

    /// Call the provider, retrying once after a retryable failure.
    ///
    /// The first attempt's quota unit is already reserved; the retry
    /// reserves its own.
    async fn call_with_retry(
        &self,
        query: &SearchQuery,
    ) -> Result<Vec<NormalizedPosting>, ProviderError> {
        let err = match self.call_provider(query).await {
            Err(err) if err.is_retryable() => err,
            result => return result,
        };

        tracing::warn!(
            provider = self.provider.name(),
            error = %err,
            backoff_ms = self.config.retry_backoff_ms,
            "provider unavailable, retrying"
        );
        tokio::time::sleep(self.config.retry_backoff()).await;
        if !self.quota.try_consume() {
            tracing::warn!("no quota left for retry");
            return Err(err);
        }
        self.call_provider(query).await
    }

    /// One time-boxed provider call. A timeout counts as unavailability.
    async fn call_provider(
        &self,
        query: &SearchQuery,
    ) -> Result<Vec<NormalizedPosting>, ProviderError> {
        let timeout = self.config.timeout();
        match tokio::time::timeout(timeout, self.provider.search(query)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Unavailable(format!(
                "no response within {}s",
                timeout.as_secs()
            ))),
        }
    }

    async fn record_failure(&self, key: &CacheKey, err: &ProviderError) {
        let provider = self.provider.name();
        match err {
            ProviderError::Unavailable(_) => {
                tracing::warn!(provider, error = %err, "provider fetch failed");
            }
            ProviderError::InvalidResponse(_) => {
                tracing::error!(provider, error = %err, "provider contract violation");
            }
            ProviderError::Unauthorized(_) => {
                tracing::error!(
                    provider,
                    error = %err,
                    "provider rejected credentials, disabling provider calls for this session"
                );
                self.unauthorized.store(true, Ordering::Release);
            }
        }

        if self.config.invalidate_on_provider_error {
            self.cache.invalidate(key).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;

    use super::*;

    type Response = Result<Vec<NormalizedPosting>, ProviderError>;

    /// Provider that replays scripted responses and counts calls.
    #[derive(Default)]
    struct ScriptedProvider {
        responses: std::sync::Mutex<VecDeque<Response>>,
        calls: AtomicUsize,
        delay: Option<Duration>,
    }

    impl ScriptedProvider {
        fn new(responses: Vec<Response>) -> Self {
            Self {
                responses: std::sync::Mutex::new(responses.into()),
                ..Default::default()
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl JobProvider for ScriptedProvider {
        async fn search(&self, _query: &SearchQuery) -> Response {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let response = self
                .responses
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()));
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            response
        }

        fn name(&self) -> &'static str {
            "scripted"
        }
    }

    fn posting(id: &str) -> NormalizedPosting {
        NormalizedPosting {
            title: format!("Role {id}"),
            company: "Acme".into(),
            location: "Remote".into(),
            description: "Python and SQL".into(),
            url: format!("https://jobs.example.com/{id}"),
            posted_date: None,
            provider_id: id.into(),
        }
    }

    fn query() -> SearchQuery {
        SearchQuery::new("Software Engineer", Some("Austin")).expect("valid")
    }

    fn config() -> JobSearchConfig {
        JobSearchConfig {
            quota_limit: 10,
            retry_backoff_ms: 1_000,
            ..Default::default()
        }
    }

    fn unavailable() -> ProviderError {
        ProviderError::Unavailable("HTTP 503".into())
    }

    #[tokio::test]
    async fn miss_fetches_then_hit_serves_from_cache() {
        let provider = ScriptedProvider::new(vec![Ok(vec![posting("a"), posting("b")])]);
        let search = JobSearch::new(provider, config()).expect("valid config");

        let first = search.search(&query()).await;
        assert_eq!(first.kind(), OutcomeKind::ServedFresh);
        assert_eq!(first.postings().len(), 2);

        let second = search.search(&query()).await;
        assert_eq!(second.kind(), OutcomeKind::ServedFromCache);
        assert_eq!(second.postings(), first.postings());

        assert_eq!(search.provider().calls(), 1);
        assert_eq!(search.quota().snapshot().used, 1);
    }

    #[tokio::test]
    async fn cache_hit_consumes_no_quota() {
        let provider = ScriptedProvider::new(vec![]);
        let search = JobSearch::new(provider, config()).expect("valid config");
        search.cache().put(query().cache_key(), vec![posting("c")]).await;

        let outcome = search.search(&query()).await;

        assert_eq!(outcome.kind(), OutcomeKind::ServedFromCache);
        assert_eq!(search.provider().calls(), 0);
        assert_eq!(search.quota().remaining(), 10);
    }

    #[tokio::test]
    async fn normalised_queries_share_an_entry() {
        let provider = ScriptedProvider::new(vec![Ok(vec![posting("a")])]);
        let search = JobSearch::new(provider, config()).expect("valid config");

        let a = SearchQuery::new("Software Engineer", Some("Austin")).expect("valid");
        let b = SearchQuery::new(" software engineer ", Some("AUSTIN")).expect("valid");
        assert_eq!(search.search(&a).await.kind(), OutcomeKind::ServedFresh);
        assert_eq!(search.search(&b).await.kind(), OutcomeKind::ServedFromCache);
        assert_eq!(search.provider().calls(), 1);
    }

    #[tokio::test]
    async fn exhausted_quota_makes_no_call() {
        let provider = ScriptedProvider::new(vec![Ok(vec![posting("a")])]);
        let config = JobSearchConfig {
            quota_limit: 0,
            ..config()
        };
        let search = JobSearch::new(provider, config).expect("valid config");

        let outcome = search.search(&query()).await;

        assert_eq!(outcome.kind(), OutcomeKind::QuotaExceeded);
        assert!(outcome.postings().is_empty());
        assert_eq!(search.provider().calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn unavailable_is_retried_once() {
        let provider = ScriptedProvider::new(vec![Err(unavailable()), Ok(vec![posting("a")])]);
        let search = JobSearch::new(provider, config()).expect("valid config");

        let started = tokio::time::Instant::now();
        let outcome = search.search(&query()).await;

        assert_eq!(outcome.kind(), OutcomeKind::ServedFresh);
        assert_eq!(search.provider().calls(), 2);
        assert_eq!(search.quota().snapshot().used, 2);
        assert!(started.elapsed() >= Duration::from_millis(1_000));
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_unavailable_fails_without_touching_cache() {
        let provider = ScriptedProvider::new(vec![Err(unavailable()), Err(unavailable())]);
        let search = JobSearch::new(provider, config()).expect("valid config");

        let outcome = search.search(&query()).await;

        match outcome {
            SearchOutcome::ProviderFailed(ProviderError::Unavailable(_)) => {}
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(search.provider().calls(), 2);
        assert!(search.cache().get_stale(&query().cache_key()).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn unavailable_gets_exactly_one_retry() {
        let provider = ScriptedProvider::new(vec![
            Err(unavailable()),
            Err(unavailable()),
            Ok(vec![posting("late")]),
        ]);
        let search = JobSearch::new(provider, config()).expect("valid config");

        let outcome = search.search(&query()).await;

        assert_eq!(outcome.kind(), OutcomeKind::ProviderFailed);
        assert_eq!(search.provider().calls(), 2);
        assert_eq!(search.quota().snapshot().used, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_fetch_keeps_previous_expired_entry() {
        let provider = ScriptedProvider::new(vec![Err(unavailable()), Err(unavailable())]);
        let search = JobSearch::new(provider, config()).expect("valid config");
        search.cache().put(query().cache_key(), vec![posting("old")]).await;
        tokio::time::advance(Duration::from_secs(3_601)).await;

        let outcome = search.search(&query()).await;

        assert_eq!(outcome.kind(), OutcomeKind::ProviderFailed);
        let stale = search.stale(&query()).await.expect("old entry retained");
        assert_eq!(stale.postings[0].provider_id, "old");
        assert!(search.cache().get(&query().cache_key()).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn invalidate_on_provider_error_drops_entry() {
        let provider = ScriptedProvider::new(vec![Err(ProviderError::InvalidResponse(
            "garbage".into(),
        ))]);
        let config = JobSearchConfig {
            invalidate_on_provider_error: true,
            ..config()
        };
        let search = JobSearch::new(provider, config).expect("valid config");
        search.cache().put(query().cache_key(), vec![posting("old")]).await;
        tokio::time::advance(Duration::from_secs(3_601)).await;

        let outcome = search.search(&query()).await;

        assert_eq!(outcome.kind(), OutcomeKind::ProviderFailed);
        assert!(search.stale(&query()).await.is_none());
    }

    #[tokio::test]
    async fn invalid_response_is_not_retried() {
        let provider = ScriptedProvider::new(vec![Err(ProviderError::InvalidResponse(
            "missing jobs_results".into(),
        ))]);
        let search = JobSearch::new(provider, config()).expect("valid config");

        let outcome = search.search(&query()).await;

        assert_eq!(outcome.kind(), OutcomeKind::ProviderFailed);
        assert_eq!(search.provider().calls(), 1);
        assert_eq!(search.quota().snapshot().used, 1);
    }

    #[tokio::test]
    async fn unauthorized_disables_further_provider_calls() {
        let provider = ScriptedProvider::new(vec![
            Err(ProviderError::Unauthorized("Invalid API key".into())),
            Ok(vec![posting("a")]),
        ]);
        let search = JobSearch::new(provider, config()).expect("valid config");

        let first = search.search(&query()).await;
        assert!(matches!(
            first,
            SearchOutcome::ProviderFailed(ProviderError::Unauthorized(_))
        ));
        assert!(!search.is_authorized());

        let other = SearchQuery::new("Data Analyst", None).expect("valid");
        let second = search.search(&other).await;
        assert!(matches!(
            second,
            SearchOutcome::ProviderFailed(ProviderError::Unauthorized(_))
        ));
        assert_eq!(search.provider().calls(), 1);
        assert_eq!(search.quota().snapshot().used, 1);

        search.reset_authorization();
        let third = search.search(&other).await;
        assert_eq!(third.kind(), OutcomeKind::ServedFresh);
        assert_eq!(search.provider().calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn hung_provider_times_out_as_unavailable() {
        let provider = ScriptedProvider::new(vec![Ok(vec![posting("a")]), Ok(vec![posting("b")])])
            .with_delay(Duration::from_secs(60));
        let search = JobSearch::new(provider, config()).expect("valid config");

        let outcome = search.search(&query()).await;

        match outcome {
            SearchOutcome::ProviderFailed(ProviderError::Unavailable(msg)) => {
                assert!(msg.contains("10s"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(search.provider().calls(), 2);
        assert!(search.stale(&query()).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn retry_needs_its_own_quota_unit() {
        let provider = ScriptedProvider::new(vec![Err(unavailable()), Ok(vec![posting("a")])]);
        let config = JobSearchConfig {
            quota_limit: 1,
            ..config()
        };
        let search = JobSearch::new(provider, config).expect("valid config");

        let outcome = search.search(&query()).await;

        assert!(matches!(
            outcome,
            SearchOutcome::ProviderFailed(ProviderError::Unavailable(_))
        ));
        assert_eq!(search.provider().calls(), 1);
        assert_eq!(search.quota().remaining(), 0);
    }

    #[tokio::test]
    async fn fresh_results_are_deduplicated_and_capped() {
        let provider = ScriptedProvider::new(vec![Ok(vec![
            posting("a"),
            posting("a"),
            posting("b"),
            posting("c"),
            posting("d"),
        ])]);
        let config = JobSearchConfig {
            max_results: 3,
            ..config()
        };
        let search = JobSearch::new(provider, config).expect("valid config");

        let outcome = search.search(&query()).await;

        let ids: Vec<&str> = outcome
            .postings()
            .iter()
            .map(|p| p.provider_id.as_str())
            .collect();
        assert_eq!(ids, ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn refresh_bypasses_valid_cache_entry() {
        let provider = ScriptedProvider::new(vec![Ok(vec![posting("new")])]);
        let search = JobSearch::new(provider, config()).expect("valid config");
        search.cache().put(query().cache_key(), vec![posting("old")]).await;

        let outcome = search.refresh(&query()).await;

        assert_eq!(outcome.kind(), OutcomeKind::ServedFresh);
        assert_eq!(outcome.postings()[0].provider_id, "new");
        assert_eq!(search.quota().snapshot().used, 1);
        let cached = search.search(&query()).await;
        assert_eq!(cached.postings()[0].provider_id, "new");
    }

    #[tokio::test]
    async fn refresh_respects_quota() {
        let provider = ScriptedProvider::new(vec![Ok(vec![posting("new")])]);
        let config = JobSearchConfig {
            quota_limit: 0,
            ..config()
        };
        let search = JobSearch::new(provider, config).expect("valid config");

        assert_eq!(search.refresh(&query()).await.kind(), OutcomeKind::QuotaExceeded);
        assert_eq!(search.provider().calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_same_key_requests_collapse_to_one_call() {
        let provider = ScriptedProvider::new(vec![Ok(vec![posting("a")]), Ok(vec![posting("b")])])
            .with_delay(Duration::from_millis(200));
        let search = JobSearch::new(provider, config()).expect("valid config");

        let query = query();
        let requests = (0..8).map(|_| search.search(&query));
        let outcomes = futures::future::join_all(requests).await;

        assert_eq!(search.provider().calls(), 1);
        assert_eq!(search.quota().snapshot().used, 1);
        let fresh = outcomes
            .iter()
            .filter(|o| o.kind() == OutcomeKind::ServedFresh)
            .count();
        assert_eq!(fresh, 1);
        assert!(outcomes.iter().all(|o| o.postings()[0].provider_id == "a"));
    }

    #[tokio::test]
    async fn shared_quota_is_honoured_across_instances() {
        let quota = Arc::new(QuotaTracker::new(1, Duration::from_secs(3_600)));
        let first = JobSearch::from_parts(
            ScriptedProvider::new(vec![Ok(vec![posting("a")])]),
            JobCache::new(Duration::from_secs(3_600), 8),
            Arc::clone(&quota),
            config(),
        )
        .expect("valid config");
        let second = JobSearch::from_parts(
            ScriptedProvider::new(vec![Ok(vec![posting("b")])]),
            JobCache::new(Duration::from_secs(3_600), 8),
            Arc::clone(&quota),
            config(),
        )
        .expect("valid config");

        assert_eq!(first.search(&query()).await.kind(), OutcomeKind::ServedFresh);
        assert_eq!(second.search(&query()).await.kind(), OutcomeKind::QuotaExceeded);
        assert_eq!(second.provider().calls(), 0);
    }

    #[test]
    fn invalid_config_rejected() {
        let config = JobSearchConfig {
            timeout_seconds: 0,
            ..Default::default()
        };
        let result = JobSearch::new(ScriptedProvider::default(), config);
        assert!(matches!(result, Err(JobSearchError::Config(_))));
    }

    #[test]
    fn outcome_kind_display() {
        assert_eq!(OutcomeKind::ServedFromCache.to_string(), "ServedFromCache");
        assert_eq!(OutcomeKind::QuotaExceeded.to_string(), "QuotaExceeded");
    }
}
