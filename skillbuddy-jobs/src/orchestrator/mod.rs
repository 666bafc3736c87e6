//! Search orchestrator: cache check, quota gate, provider fetch, dedup.
//!
//! Every query runs through [`search::JobSearch`], which serves valid
//! cached postings for free and otherwise spends one quota unit per
//! provider call before writing the fresh result back to the cache.

pub mod dedup;
pub mod search;

pub use search::{JobSearch, OutcomeKind, SearchOutcome};
