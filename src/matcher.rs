//! Job matching facade: search, caller policy, ranking.
//!
//! [`JobMatcher`] runs one query through the quota-aware search engine,
//! decides whether expired cached postings may stand in when the quota is
//! gone, and ranks whatever postings it ends up with against the
//! candidate's profile.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use skillbuddy_jobs::{
    CacheEntry, JobProvider, JobSearch, MatchResult, NormalizedPosting, OutcomeKind,
    QuotaSnapshot, RankingEngine, SearchOutcome, SearchQuery, SerpApiProvider, SkillProfile,
};

use crate::config::AppConfig;
use crate::error::Result;

/// Quota usage as reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuotaStatus {
    pub used: u32,
    pub limit: u32,
    pub remaining: u32,
    pub resets_in_seconds: u64,
}

impl From<QuotaSnapshot> for QuotaStatus {
    fn from(snapshot: QuotaSnapshot) -> Self {
        Self {
            used: snapshot.used,
            limit: snapshot.limit,
            remaining: snapshot.remaining(),
            resets_in_seconds: snapshot.resets_in.as_secs(),
        }
    }
}

/// One ranked posting, owned so the report can outlive the cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedPosting {
    pub rank: usize,
    pub score: u8,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    #[serde(flatten)]
    pub posting: NormalizedPosting,
}

impl From<MatchResult<'_>> for RankedPosting {
    fn from(result: MatchResult<'_>) -> Self {
        Self {
            rank: result.rank,
            score: result.score,
            matched_skills: result.matched_skills,
            missing_skills: result.missing_skills,
            posting: result.posting.clone(),
        }
    }
}

/// Result of one matching request.
#[derive(Debug, Clone, Serialize)]
pub struct MatchReport {
    /// How the search engine answered the query.
    pub outcome: OutcomeKind,
    /// The postings came from an expired cache entry.
    pub stale: bool,
    /// Provider failure detail for `ProviderFailed` outcomes.
    pub error: Option<String>,
    /// When the ranked postings were fetched from the provider.
    pub fetched_at: Option<DateTime<Utc>>,
    pub quota: QuotaStatus,
    pub matches: Vec<RankedPosting>,
}

/// Composes the search engine and ranking engine for one candidate query.
pub struct JobMatcher<P = SerpApiProvider> {
    search: JobSearch<P>,
    ranking: RankingEngine,
    serve_stale_on_quota_exhausted: bool,
}

impl JobMatcher<SerpApiProvider> {
    /// Build a matcher backed by SerpAPI.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is missing or the search
    /// configuration is invalid.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let provider = SerpApiProvider::new(&config.search)?;
        let search = JobSearch::new(provider, config.search.clone())?;
        Ok(Self::new(
            search,
            RankingEngine::default(),
            config.serve_stale_on_quota_exhausted,
        ))
    }
}

impl<P: JobProvider> JobMatcher<P> {
    pub fn new(
        search: JobSearch<P>,
        ranking: RankingEngine,
        serve_stale_on_quota_exhausted: bool,
    ) -> Self {
        Self {
            search,
            ranking,
            serve_stale_on_quota_exhausted,
        }
    }

    /// The underlying search engine.
    pub fn search_engine(&self) -> &JobSearch<P> {
        &self.search
    }

    pub fn quota(&self) -> QuotaStatus {
        self.search.quota().snapshot().into()
    }

    /// Find and rank postings for `query` against `profile`.
    ///
    /// With `refresh`, a valid cache entry is ignored and the provider is
    /// asked again, still subject to the quota. When the quota is exhausted
    /// and stale serving is enabled, the last cached postings for the query
    /// are ranked and the report is marked stale.
    pub async fn find_matches(
        &self,
        query: &SearchQuery,
        profile: &SkillProfile,
        refresh: bool,
    ) -> MatchReport {
        let outcome = if refresh {
            self.search.refresh(query).await
        } else {
            self.search.search(query).await
        };

        let (entry, stale) = self.select_entry(query, &outcome).await;
        let matches = match &entry {
            Some(entry) => self
                .ranking
                .rank(&entry.postings, profile)
                .await
                .into_iter()
                .map(RankedPosting::from)
                .collect(),
            None => Vec::new(),
        };

        let error = match &outcome {
            SearchOutcome::ProviderFailed(err) => Some(err.to_string()),
            _ => None,
        };

        tracing::info!(
            outcome = %outcome.kind(),
            stale,
            matches = matches.len(),
            "job match finished"
        );

        MatchReport {
            outcome: outcome.kind(),
            stale,
            error,
            fetched_at: entry.map(|e| e.fetched_at),
            quota: self.quota(),
            matches,
        }
    }

    async fn select_entry(
        &self,
        query: &SearchQuery,
        outcome: &SearchOutcome,
    ) -> (Option<Arc<CacheEntry>>, bool) {
        match outcome {
            SearchOutcome::ServedFromCache(entry) | SearchOutcome::ServedFresh(entry) => {
                (Some(Arc::clone(entry)), false)
            }
            SearchOutcome::QuotaExceeded if self.serve_stale_on_quota_exhausted => {
                match self.search.stale(query).await {
                    Some(entry) => {
                        tracing::info!(
                            age_secs = entry.age().as_secs(),
                            "quota exhausted, serving stale postings"
                        );
                        (Some(entry), true)
                    }
                    None => (None, false),
                }
            }
            SearchOutcome::QuotaExceeded | SearchOutcome::ProviderFailed(_) => (None, false),
        }
    }
}
