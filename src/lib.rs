//! SkillBuddy job matching host.
//!
//! Wires the `skillbuddy-jobs` engine to application configuration and
//! exposes [`JobMatcher`], which turns a role query and a candidate's
//! skill profile into a ranked, quota-aware [`MatchReport`].

pub mod config;
pub mod error;
pub mod matcher;

pub use config::AppConfig;
pub use error::{AppError, Result};
pub use matcher::{JobMatcher, MatchReport, QuotaStatus, RankedPosting};
