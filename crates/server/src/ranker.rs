//! Preference ranking stage: oracle scores → aggregated top-K list.

use std::collections::HashMap;
use std::sync::Arc;

use catalog::profile::normalize;
use catalog::CandidateRef;
use clients::{ReferenceTables, ScoringOracle};
use pipeline::{rank_candidates, CategoryWeights, Ranking, ScoredCandidate};
use tracing::{info, warn};

use crate::error::{EngineError, Result};

/// Wraps the scoring oracle with aggregation, ordering and truncation.
#[derive(Clone)]
pub struct PreferenceRanker {
    oracle: Arc<dyn ScoringOracle>,
    weights: CategoryWeights,
    tables: ReferenceTables,
    top_k: usize,
}

impl PreferenceRanker {
    pub fn new(oracle: Arc<dyn ScoringOracle>, weights: CategoryWeights, top_k: usize) -> Self {
        Self {
            oracle,
            weights,
            tables: ReferenceTables::standard(),
            top_k,
        }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Rank `survivors` against `preference_text`.
    ///
    /// ## Algorithm
    /// 1. One oracle call with all survivors and the reference tables
    /// 2. Keep verdicts that name a survivor (first verdict per survivor),
    ///    taking the country from the survivor
    /// 3. Aggregate, stable-sort descending, truncate to K
    ///
    /// # Errors
    /// `RankingFailed` when the oracle fails, or when none of its verdicts
    /// names a survivor. No retry happens at this layer.
    pub async fn rank(&self, survivors: &[CandidateRef], preference_text: &str) -> Result<Ranking> {
        let scored = self
            .oracle
            .score(survivors, preference_text, &self.tables)
            .await
            .map_err(|e| EngineError::RankingFailed(e.to_string()))?;

        let verdicts = scored.len();
        let matched = match_survivors(survivors, scored);
        if matched.is_empty() {
            return Err(EngineError::RankingFailed(format!(
                "oracle returned {verdicts} verdicts, none for the {} candidates sent",
                survivors.len()
            )));
        }
        if matched.len() < verdicts {
            warn!(
                "Dropped {} oracle verdicts for unknown or duplicate candidates",
                verdicts - matched.len()
            );
        }

        let ranking = rank_candidates(matched, &self.weights, self.top_k);
        info!(
            "Ranked {} candidates, kept top {}",
            survivors.len(),
            ranking.len()
        );
        Ok(ranking)
    }
}

fn match_survivors(survivors: &[CandidateRef], scored: Vec<ScoredCandidate>) -> Vec<ScoredCandidate> {
    let mut pending: HashMap<String, &CandidateRef> =
        survivors.iter().map(|s| (normalize(&s.name), s)).collect();

    scored
        .into_iter()
        .filter_map(|mut verdict| {
            let survivor = pending.remove(&normalize(&verdict.name))?;
            verdict.name = survivor.name.clone();
            verdict.country = survivor.country.clone();
            Some(verdict)
        })
        .collect()
}
