//! Pluggable posting scorers.
//!
//! [`LexicalScorer`] is the default: deterministic term overlap between
//! the profile's skills and the posting text. Any other [`MatchScorer`]
//! (for example a semantic one backed by a model) can be swapped in at
//! construction of the ranking engine.

use async_trait::async_trait;

use crate::profile::SkillProfile;
use crate::types::NormalizedPosting;

use super::text::{contains_term, posting_text};

/// Scores one posting against a skill profile.
///
/// Contract: `score` is an integer in `0..=100`, and whenever it is
/// positive `matched_skills` is non-empty. The ranking engine clamps and
/// repairs output that breaks the contract. Only [`LexicalScorer`] is
/// required to be deterministic.
#[async_trait]
pub trait MatchScorer: Send + Sync {
    /// Match score for `posting`.
    async fn score(&self, posting: &NormalizedPosting, profile: &SkillProfile) -> u32;

    /// Profile skills found in `posting`.
    async fn matched_skills(
        &self,
        posting: &NormalizedPosting,
        profile: &SkillProfile,
    ) -> Vec<String>;

    /// Short scorer name for logs.
    fn name(&self) -> &'static str;
}

/// Term-overlap scorer.
///
/// A skill matches when it appears as a whole term in the lower-cased
/// title + description. The score is the share of distinct profile skills
/// matched, scaled to 0-100 and rounded half up.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicalScorer;

impl LexicalScorer {
    /// Matched skills in profile order.
    pub fn matches(posting: &NormalizedPosting, profile: &SkillProfile) -> Vec<String> {
        let text = posting_text(posting);
        profile
            .skills()
            .iter()
            .filter(|skill| contains_term(&text, skill))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl MatchScorer for LexicalScorer {
    async fn score(&self, posting: &NormalizedPosting, profile: &SkillProfile) -> u32 {
        let matched = Self::matches(posting, profile).len();
        u32::from(overlap_score(matched, profile.skills().len()))
    }

    async fn matched_skills(
        &self,
        posting: &NormalizedPosting,
        profile: &SkillProfile,
    ) -> Vec<String> {
        Self::matches(posting, profile)
    }

    fn name(&self) -> &'static str {
        "lexical"
    }
}

/// `matched / total` as a 0-100 percentage, rounded half up.
///
/// Integer arithmetic keeps the result exact: 1 of 8 is 12.5, which
/// rounds to 13.
pub fn overlap_score(matched: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let matched = matched.min(total);
    let pct = (matched * 200 + total) / (2 * total);
    u8::try_from(pct).unwrap_or(100)
}
