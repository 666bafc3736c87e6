//! Error types for the SkillBuddy host.

use skillbuddy_jobs::JobSearchError;

/// Top-level error type for the job matching host.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Configuration file or environment override error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Job search engine error.
    #[error(transparent)]
    Search(#[from] JobSearchError),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, AppError>;
