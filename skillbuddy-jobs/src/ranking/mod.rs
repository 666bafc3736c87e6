//! Ranking of postings against a candidate's skill profile.
//!
//! The [`RankingEngine`] delegates per-posting scoring to a
//! [`MatchScorer`], enforces the scorer contract, then sorts and assigns
//! 1-based ranks.

pub mod engine;
pub mod scorer;
pub mod text;

pub use engine::{MatchResult, RankingEngine, MAX_SCORE};
pub use scorer::{overlap_score, LexicalScorer, MatchScorer};
