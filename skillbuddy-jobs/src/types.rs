//! Core types for job search queries, cache keys and normalised postings.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::JobSearchError;

/// A validated job search request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    role_title: String,
    location: Option<String>,
}

impl SearchQuery {
    /// Build a query from a role title and optional location.
    ///
    /// The role title is trimmed and must not be empty. A blank location
    /// is treated as no location.
    ///
    /// # Errors
    ///
    /// Returns [`JobSearchError::InvalidQuery`] if the role title is blank.
    pub fn new(role_title: &str, location: Option<&str>) -> Result<Self, JobSearchError> {
        let role_title = role_title.trim();
        if role_title.is_empty() {
            return Err(JobSearchError::InvalidQuery(
                "role title must not be empty".into(),
            ));
        }
        let location = location
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_owned);
        Ok(Self {
            role_title: role_title.to_owned(),
            location,
        })
    }

    /// The trimmed role title as entered.
    pub fn role_title(&self) -> &str {
        &self.role_title
    }

    /// The trimmed location, if any.
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    /// The cache key this query maps to.
    pub fn cache_key(&self) -> CacheKey {
        CacheKey::new(&self.role_title, self.location.as_deref())
    }
}

/// Stable identifier of a cached provider response.
///
/// A BLAKE3 digest of the normalised (role title, location) pair. Role and
/// location are trimmed, lowercased and have internal whitespace runs
/// collapsed, so `"Software Engineer"/"Austin"` and
/// `" software  engineer "/"AUSTIN"` share one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey(blake3::Hash);

impl CacheKey {
    /// Build a deterministic cache key from a role title and location.
    pub fn new(role_title: &str, location: Option<&str>) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(normalise_field(role_title).as_bytes());
        // Unit separator keeps ("ab", "c") and ("a", "bc") apart.
        hasher.update(&[0x1f]);
        hasher.update(normalise_field(location.unwrap_or_default()).as_bytes());
        Self(hasher.finalize())
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // A short prefix is enough to correlate log lines.
        f.write_str(&self.0.to_hex()[..16])
    }
}

fn normalise_field(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// A provider-agnostic job listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedPosting {
    /// Job title.
    pub title: String,
    /// Hiring company.
    pub company: String,
    /// Location as reported by the provider.
    pub location: String,
    /// Description or snippet text.
    pub description: String,
    /// Where to view or apply for the posting.
    pub url: String,
    /// Calendar date the posting went up, when the provider reports one.
    pub posted_date: Option<NaiveDate>,
    /// Provider identifier, unique within one response batch.
    pub provider_id: String,
}
