//! Ranking engine: score every posting, sort, assign ranks.

use std::cmp::Ordering;
use std::sync::Arc;

use serde::Serialize;

use crate::profile::SkillProfile;
use crate::types::NormalizedPosting;

use super::scorer::{overlap_score, LexicalScorer, MatchScorer};

/// Highest score a posting can receive.
pub const MAX_SCORE: u8 = 100;

/// One ranked posting.
///
/// Borrows the posting from the batch passed to [`RankingEngine::rank`];
/// results live no longer than the request that produced them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchResult<'a> {
    pub posting: &'a NormalizedPosting,
    /// 0-100.
    pub score: u8,
    /// Profile skills found in the posting, in profile order for the
    /// lexical scorer.
    pub matched_skills: Vec<String>,
    /// Profile skills not in `matched_skills`, in profile order.
    pub missing_skills: Vec<String>,
    /// 1-based position after sorting.
    pub rank: usize,
}

/// Orders postings by how well they fit a [`SkillProfile`].
#[derive(Clone)]
pub struct RankingEngine {
    scorer: Arc<dyn MatchScorer>,
}

impl Default for RankingEngine {
    fn default() -> Self {
        Self::new(Arc::new(LexicalScorer))
    }
}

impl std::fmt::Debug for RankingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RankingEngine")
            .field("scorer", &self.scorer.name())
            .finish()
    }
}

impl RankingEngine {
    pub fn new(scorer: Arc<dyn MatchScorer>) -> Self {
        Self { scorer }
    }

    pub fn scorer_name(&self) -> &'static str {
        self.scorer.name()
    }

    /// Score, sort and rank `postings` against `profile`.
    ///
    /// Sorted by score descending. Equal scores put a posting with a more
    /// recent posted date ahead of an older one, and any dated posting ahead
    /// of an undated one; remaining ties go by title. The sort is stable,
    /// so fully equal postings keep their input order. Ranks run `1..=N`.
    pub async fn rank<'a>(
        &self,
        postings: &'a [NormalizedPosting],
        profile: &SkillProfile,
    ) -> Vec<MatchResult<'a>> {
        let scored = futures::future::join_all(
            postings
                .iter()
                .map(|posting| self.score_posting(posting, profile)),
        )
        .await;

        let mut results: Vec<MatchResult<'a>> = postings
            .iter()
            .zip(scored)
            .map(|(posting, (score, matched_skills))| MatchResult {
                posting,
                score,
                missing_skills: missing_skills(profile, &matched_skills),
                matched_skills,
                rank: 0,
            })
            .collect();

        results.sort_by(compare_results);
        for (idx, result) in results.iter_mut().enumerate() {
            result.rank = idx + 1;
        }

        tracing::debug!(
            scorer = self.scorer.name(),
            postings = results.len(),
            top_score = results.first().map(|r| r.score),
            "ranked postings"
        );
        results
    }

    async fn score_posting(
        &self,
        posting: &NormalizedPosting,
        profile: &SkillProfile,
    ) -> (u8, Vec<String>) {
        let (raw_score, matched) = futures::future::join(
            self.scorer.score(posting, profile),
            self.scorer.matched_skills(posting, profile),
        )
        .await;

        let score = match u8::try_from(raw_score) {
            Ok(score) if score <= MAX_SCORE => score,
            _ => {
                tracing::warn!(
                    scorer = self.scorer.name(),
                    posting = %posting.provider_id,
                    raw_score,
                    "scorer returned a score above 100, clamping"
                );
                MAX_SCORE
            }
        };

        if score > 0 && matched.is_empty() {
            tracing::warn!(
                scorer = self.scorer.name(),
                posting = %posting.provider_id,
                score,
                "scorer gave a positive score without matched skills, using lexical result"
            );
            let matched = LexicalScorer::matches(posting, profile);
            let score = overlap_score(matched.len(), profile.skills().len());
            return (score, matched);
        }

        (score, matched)
    }
}

fn missing_skills(profile: &SkillProfile, matched: &[String]) -> Vec<String> {
    profile
        .skills()
        .iter()
        .filter(|skill| !matched.contains(skill))
        .cloned()
        .collect()
}

fn compare_results(a: &MatchResult<'_>, b: &MatchResult<'_>) -> Ordering {
    b.score
        .cmp(&a.score)
        .then_with(|| match (a.posting.posted_date, b.posting.posted_date) {
            (Some(a_date), Some(b_date)) => b_date.cmp(&a_date),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.posting.title.cmp(&b.posting.title))
}
