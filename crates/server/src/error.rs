//! Engine error type.

use thiserror::Error;

/// Fatal outcomes of a turn.
///
/// Guard short-circuits (no survivors, nothing ranked) are not errors, and
/// an undecided router falls back to the filter stage instead of failing.
#[derive(Debug, Error)]
pub enum EngineError {
    /// First turn of a thread without a profile. Nothing is persisted.
    #[error("thread {thread_id} has no stored profile and none was supplied")]
    MissingProfile { thread_id: String },

    /// The candidate store could not be reached. Nothing is persisted.
    #[error("{dependency} unavailable: {reason}")]
    DependencyUnavailable { dependency: String, reason: String },

    /// The scoring oracle failed or answered malformed scores. Stages that
    /// completed earlier in the turn stay persisted.
    #[error("ranking failed: {0}")]
    RankingFailed(String),

    /// Detail lookups failed. Stages that completed earlier stay persisted.
    #[error("analysis failed: {0}")]
    AnalysisFailed(String),

    #[error("checkpoint error: {0}")]
    Checkpoint(String),

    /// A blocking task panicked or was cancelled.
    #[error("internal error: {0}")]
    Internal(String),
}

impl EngineError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingProfile { .. } => "missing_profile",
            Self::DependencyUnavailable { .. } => "dependency_unavailable",
            Self::RankingFailed(_) => "ranking_failed",
            Self::AnalysisFailed(_) => "analysis_failed",
            Self::Checkpoint(_) => "checkpoint_error",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Caller-facing reason. Carries no collaborator details.
    pub fn sanitized(&self) -> String {
        match self {
            Self::MissingProfile { .. } => {
                "A student profile is required on the first turn of a conversation.".to_string()
            }
            Self::DependencyUnavailable { dependency, .. } => {
                format!("The {dependency} is unavailable right now. Please try again later.")
            }
            Self::RankingFailed(_) => {
                "Ranking failed. Your eligible universities were kept; please try again.".to_string()
            }
            Self::AnalysisFailed(_) => {
                "The detailed analysis failed. Your ranking was kept; please try again.".to_string()
            }
            Self::Checkpoint(_) => "Conversation state could not be saved or loaded.".to_string(),
            Self::Internal(_) => "An internal error occurred.".to_string(),
        }
    }
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, EngineError>;
