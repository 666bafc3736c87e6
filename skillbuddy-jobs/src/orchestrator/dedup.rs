//! Posting deduplication by provider identifier.
//!
//! Providers occasionally repeat a listing within one response batch
//! (the same job syndicated through several boards). Duplicates are
//! collapsed keeping the **first** occurrence so provider order is
//! preserved.

use std::collections::HashSet;

use crate::types::NormalizedPosting;

/// Remove postings whose `provider_id` was already seen in this batch.
///
/// The relative order of the kept postings is unchanged.
pub fn deduplicate(postings: Vec<NormalizedPosting>) -> Vec<NormalizedPosting> {
    let mut seen: HashSet<String> = HashSet::with_capacity(postings.len());
    postings
        .into_iter()
        .filter(|posting| seen.insert(posting.provider_id.clone()))
        .collect()
}
