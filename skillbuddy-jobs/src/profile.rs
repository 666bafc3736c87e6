//! Validated candidate skill profile consumed by the ranking engine.
//!
//! Profiles come from resume analysis upstream. Construction normalises
//! the raw lists so ranking can treat them as ordered sets.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::JobSearchError;

/// Seniority estimated for a candidate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Seniority {
    Junior,
    Mid,
    Senior,
    #[default]
    Unspecified,
}

impl Seniority {
    /// Parse a free-form level label. Unknown labels map to `Unspecified`.
    pub fn parse(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "junior" | "jr" | "entry" | "entry-level" | "graduate" => Self::Junior,
            "mid" | "mid-level" | "intermediate" => Self::Mid,
            "senior" | "sr" | "lead" | "staff" | "principal" => Self::Senior,
            _ => Self::Unspecified,
        }
    }

    /// Lowercase label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Junior => "junior",
            Self::Mid => "mid",
            Self::Senior => "senior",
            Self::Unspecified => "unspecified",
        }
    }
}

impl fmt::Display for Seniority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable, validated candidate profile.
///
/// Skills are trimmed, lowercased and deduplicated keeping first
/// occurrence. Role titles are trimmed and deduplicated case-insensitively.
/// The skill set is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkillProfile {
    skills: Vec<String>,
    roles: Vec<String>,
    seniority: Seniority,
}

impl SkillProfile {
    /// Build a profile from raw extraction output.
    ///
    /// # Errors
    ///
    /// Returns [`JobSearchError::InvalidProfile`] if no non-blank skill remains
    /// after normalisation.
    pub fn new<S, R>(skills: S, roles: R, seniority: Seniority) -> Result<Self, JobSearchError>
    where
        S: IntoIterator,
        S::Item: AsRef<str>,
        R: IntoIterator,
        R::Item: AsRef<str>,
    {
        let skills = ordered_set(skills, |s| s.to_lowercase());
        if skills.is_empty() {
            return Err(JobSearchError::InvalidProfile("skill set is empty".into()));
        }

        let mut seen = Vec::new();
        let mut unique_roles = Vec::new();
        for role in roles {
            let role = role.as_ref().trim();
            if role.is_empty() {
                continue;
            }
            let folded = role.to_lowercase();
            if !seen.contains(&folded) {
                seen.push(folded);
                unique_roles.push(role.to_owned());
            }
        }

        Ok(Self {
            skills,
            roles: unique_roles,
            seniority,
        })
    }

    /// Normalised skills in first-seen order.
    pub fn skills(&self) -> &[String] {
        &self.skills
    }

    /// Prior role titles in first-seen order.
    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    pub fn seniority(&self) -> Seniority {
        self.seniority
    }
}

/// Raw profile shape as produced by the resume analyser.
#[derive(Debug, Deserialize)]
struct RawProfile {
    #[serde(default)]
    skills: Vec<String>,
    #[serde(default)]
    roles: Vec<String>,
    #[serde(default, alias = "seniority")]
    level: Option<String>,
}

impl<'de> Deserialize<'de> for SkillProfile {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = RawProfile::deserialize(deserializer)?;
        let seniority = raw
            .level
            .as_deref()
            .map_or(Seniority::Unspecified, Seniority::parse);
        SkillProfile::new(raw.skills, raw.roles, seniority).map_err(serde::de::Error::custom)
    }
}

fn ordered_set<I>(items: I, normalise: impl Fn(&str) -> String) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for item in items {
        let trimmed = item.as_ref().trim();
        if trimmed.is_empty() {
            continue;
        }
        let value = normalise(trimmed);
        if !out.contains(&value) {
            out.push(value);
        }
    }
    out
}
