//! # skillbuddy-jobs
//!
//! Quota-aware job search and skill-based ranking for SkillBuddy.
//!
//! Job listings come from a paid external provider (SerpAPI Google Jobs)
//! with a small monthly allowance. This crate keeps usage inside that
//! allowance while serving repeated queries from an in-memory cache, then
//! ranks the returned postings against a candidate's skill profile.
//!
//! ## Design
//!
//! - [`QuotaTracker`] bounds provider calls per rolling window
//! - [`JobCache`] holds normalised responses with a fixed TTL; expired
//!   entries remain available as stale data
//! - [`JobSearch`] composes both around a [`JobProvider`]: cache check,
//!   then quota check, then one time-boxed fetch with a single retry
//! - [`RankingEngine`] scores postings through a pluggable [`MatchScorer`]
//!   and assigns ranks
//!
//! All state is owned by the values you construct. Nothing is global, so
//! independent instances never interfere.
//!
//! ## Security
//!
//! - The API key is never logged, serialised or included in errors
//! - Search queries are logged only at trace level
//!
//! ## Example
//!
//! ```no_run
//! # async fn example() -> skillbuddy_jobs::Result<()> {
//! use skillbuddy_jobs::{
//!     JobSearch, JobSearchConfig, RankingEngine, SearchQuery, Seniority, SerpApiProvider,
//!     SkillProfile,
//! };
//!
//! let config = JobSearchConfig {
//!     api_key: Some("serpapi-key".into()),
//!     ..Default::default()
//! };
//! let search = JobSearch::new(SerpApiProvider::new(&config)?, config)?;
//!
//! let query = SearchQuery::new("Data Engineer", Some("Austin, TX"))?;
//! let outcome = search.search(&query).await;
//!
//! let profile = SkillProfile::new(["python", "sql"], ["Analyst"], Seniority::Mid)?;
//! for result in RankingEngine::default().rank(outcome.postings(), &profile).await {
//!     println!("{:>3} {}", result.score, result.posting.title);
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod orchestrator;
pub mod profile;
pub mod provider;
pub mod providers;
pub mod quota;
pub mod ranking;
pub mod types;

pub use cache::{CacheEntry, JobCache};
pub use config::JobSearchConfig;
pub use error::{JobSearchError, ProviderError, Result};
pub use orchestrator::{JobSearch, OutcomeKind, SearchOutcome};
pub use profile::{Seniority, SkillProfile};
pub use provider::JobProvider;
pub use providers::SerpApiProvider;
pub use quota::{QuotaSnapshot, QuotaTracker};
pub use ranking::{LexicalScorer, MatchResult, MatchScorer, RankingEngine};
pub use types::{CacheKey, NormalizedPosting, SearchQuery};
