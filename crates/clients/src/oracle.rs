//! Oracle seams used by the ranking, routing and analysis stages, and their
//! language-model implementation.

use std::sync::Arc;

use async_trait::async_trait;
use catalog::CandidateRef;
use pipeline::ScoredCandidate;
use serde::Deserialize;
use tracing::debug;

use crate::error::{ClientError, Result};
use crate::llm::{ChatBackend, ChatRequest};
use crate::prompts;
use crate::reference::ReferenceTables;

const SERVICE: &str = "scoring oracle";

// =============================================================================
// TRAITS
// =============================================================================

/// Scores candidates against free-text preferences and classifies turn intent.
#[async_trait]
pub trait ScoringOracle: Send + Sync {
    /// One verdict per candidate, in the oracle's order.
    ///
    /// # Errors
    /// Transport failures, and `MalformedResponse` when the answer does not
    /// parse or a score falls outside 0..=100.
    async fn score(
        &self,
        candidates: &[CandidateRef],
        preference_text: &str,
        tables: &ReferenceTables,
    ) -> Result<Vec<ScoredCandidate>>;

    /// Raw intent label for a follow-up turn. Callers validate the label.
    async fn classify_intent(&self, text: &str) -> Result<String>;
}

/// Best-effort external summary for a candidate. Never fails: any problem
/// yields `None`.
#[async_trait]
pub trait Enricher: Send + Sync {
    async fn fetch_summary(&self, name: &str, country: &str) -> Option<String>;
}

// =============================================================================
// LLM ORACLE
// =============================================================================

#[derive(Deserialize)]
struct ScoringResponse {
    scored_universities: Vec<ScoredCandidate>,
}

/// `ScoringOracle` backed by a chat model.
#[derive(Clone)]
pub struct LlmScoringOracle {
    chat: Arc<dyn ChatBackend>,
}

impl LlmScoringOracle {
    pub fn new(chat: Arc<dyn ChatBackend>) -> Self {
        Self { chat }
    }
}

#[async_trait]
impl ScoringOracle for LlmScoringOracle {
    async fn score(
        &self,
        candidates: &[CandidateRef],
        preference_text: &str,
        tables: &ReferenceTables,
    ) -> Result<Vec<ScoredCandidate>> {
        let request = ChatRequest::new(
            prompts::SCORING_SYSTEM_PROMPT,
            prompts::scoring_user_prompt(candidates, preference_text, tables),
        )
        .json();

        let content = self.chat.chat(&request).await?;
        let scored = parse_scoring_response(&content)?;
        debug!(
            "Oracle scored {} of {} candidates",
            scored.len(),
            candidates.len()
        );
        Ok(scored)
    }

    async fn classify_intent(&self, text: &str) -> Result<String> {
        let request = ChatRequest::new(
            prompts::ROUTER_SYSTEM_PROMPT,
            prompts::router_user_prompt(text),
        );
        self.chat.chat(&request).await
    }
}

/// Parse `{"scored_universities": [...]}`, tolerating a markdown code fence.
pub fn parse_scoring_response(content: &str) -> Result<Vec<ScoredCandidate>> {
    let body = strip_code_fence(content);
    let parsed: ScoringResponse =
        serde_json::from_str(body).map_err(|e| ClientError::malformed(SERVICE, e.to_string()))?;
    Ok(parsed.scored_universities)
}

pub(crate) fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
