//! Analysis stage: ranked list → formatted narrative.

use std::fmt::Write as _;
use std::sync::Arc;

use catalog::{CandidateDetail, CandidateRef, DetailStore};
use clients::Enricher;
use futures::future::join_all;
use tracing::{debug, info};

use crate::error::{EngineError, Result};

/// Text returned when the filter left nothing to rank.
pub const NO_MATCH_TEXT: &str = "No universities match your current criteria. \
Try relaxing your GPA, language, availability or Erasmus requirements.";

/// Text returned when analysis is requested before anything was ranked.
pub const NOTHING_TO_ANALYZE_TEXT: &str = "There are no ranked universities to analyze yet. \
Ask for recommendations first.";

#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub text: String,
    pub details_found: usize,
    pub summaries_found: usize,
}

struct CandidateFacts<'a> {
    candidate: &'a CandidateRef,
    reasoning: Option<&'a str>,
    detail: Option<CandidateDetail>,
    summary: Option<String>,
}

/// Gathers per-candidate details and summaries and formats them.
#[derive(Clone)]
pub struct AnalysisSynthesizer {
    details: Arc<dyn DetailStore>,
    enricher: Option<Arc<dyn Enricher>>,
}

impl AnalysisSynthesizer {
    pub fn new(details: Arc<dyn DetailStore>, enricher: Option<Arc<dyn Enricher>>) -> Self {
        Self { details, enricher }
    }

    /// Build the narrative for `ranked` (best first).
    ///
    /// Detail lookups and enrichment for different candidates run
    /// concurrently; output order follows `ranked`. A missing detail or
    /// summary is simply omitted.
    ///
    /// # Errors
    /// `AnalysisFailed` when the detail store errors for any candidate.
    pub async fn synthesize(&self, ranked: &[CandidateRef], reasoning: &[String]) -> Result<Analysis> {
        let lookups = ranked.iter().map(|candidate| async move {
            let summary = async {
                match &self.enricher {
                    Some(enricher) => enricher.fetch_summary(&candidate.name, &candidate.country).await,
                    None => None,
                }
            };
            tokio::join!(self.details.fetch(&candidate.name), summary)
        });
        let results = join_all(lookups).await;

        let mut facts = Vec::with_capacity(ranked.len());
        for (i, (candidate, (detail, summary))) in ranked.iter().zip(results).enumerate() {
            let detail = detail.map_err(|e| {
                EngineError::AnalysisFailed(format!("detail lookup for {} failed: {e}", candidate.name))
            })?;
            if detail.is_none() {
                debug!("No detail entry for {}", candidate.name);
            }
            facts.push(CandidateFacts {
                candidate,
                reasoning: reasoning.get(i).map(String::as_str).filter(|r| !r.trim().is_empty()),
                detail,
                summary,
            });
        }

        let details_found = facts.iter().filter(|f| f.detail.is_some()).count();
        let summaries_found = facts.iter().filter(|f| f.summary.is_some()).count();
        info!(
            "Analyzed {} candidates ({} details, {} summaries)",
            facts.len(),
            details_found,
            summaries_found
        );

        Ok(Analysis {
            text: render(&facts),
            details_found,
            summaries_found,
        })
    }
}

fn render(facts: &[CandidateFacts<'_>]) -> String {
    let mut text = format!("Top {} recommendations for you:\n", facts.len());

    for (i, fact) in facts.iter().enumerate() {
        let _ = write!(text, "\n{}. {}\n", i + 1, fact.candidate);
        if let Some(reasoning) = fact.reasoning {
            let _ = writeln!(text, "   Why it fits: {}", reasoning.trim());
        }
        if let Some(detail) = fact.detail.as_ref().filter(|d| !d.highlights.is_empty()) {
            text.push_str("   Key facts:\n");
            for highlight in &detail.highlights {
                let _ = writeln!(text, "   - {highlight}");
            }
        }
        if let Some(summary) = &fact.summary {
            let _ = writeln!(text, "   About: {}", summary.trim());
        }
    }

    text
}
