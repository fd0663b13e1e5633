//! Null-aware score aggregation and top-K ranking.
//!
//! The scoring oracle returns, per candidate, up to seven category scores
//! (each an integer 0..=100 or null) plus free-text reasoning. This module
//! folds those partial scores into one aggregate and orders the candidates.

use rayon::prelude::*;
use serde::de::{Deserializer, Error as DeError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// =============================================================================
// Categories
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreCategory {
    AcademicFit,
    LifestyleFit,
    SocialFit,
    LocationFit,
    FinancialFit,
    JewishIsraeliCommunityFit,
    OtherPreferencesFit,
}

impl ScoreCategory {
    pub const ALL: [ScoreCategory; 7] = [
        ScoreCategory::AcademicFit,
        ScoreCategory::LifestyleFit,
        ScoreCategory::SocialFit,
        ScoreCategory::LocationFit,
        ScoreCategory::FinancialFit,
        ScoreCategory::JewishIsraeliCommunityFit,
        ScoreCategory::OtherPreferencesFit,
    ];

    /// The key used in oracle responses.
    pub fn key(self) -> &'static str {
        match self {
            ScoreCategory::AcademicFit => "academic_fit",
            ScoreCategory::LifestyleFit => "lifestyle_fit",
            ScoreCategory::SocialFit => "social_fit",
            ScoreCategory::LocationFit => "location_fit",
            ScoreCategory::FinancialFit => "financial_fit",
            ScoreCategory::JewishIsraeliCommunityFit => "jewish_israeli_community_fit",
            ScoreCategory::OtherPreferencesFit => "other_preferences_fit",
        }
    }
}

impl fmt::Display for ScoreCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// =============================================================================
// Scores
// =============================================================================

/// Per-category scores for one candidate. `None` means the oracle had no
/// signal for that category; it is skipped during aggregation, not counted
/// as zero. Unknown keys in the oracle response are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryScores {
    #[serde(default, deserialize_with = "score")]
    pub academic_fit: Option<u8>,
    #[serde(default, deserialize_with = "score")]
    pub lifestyle_fit: Option<u8>,
    #[serde(default, deserialize_with = "score")]
    pub social_fit: Option<u8>,
    #[serde(default, deserialize_with = "score")]
    pub location_fit: Option<u8>,
    #[serde(default, deserialize_with = "score")]
    pub financial_fit: Option<u8>,
    #[serde(default, deserialize_with = "score")]
    pub jewish_israeli_community_fit: Option<u8>,
    #[serde(default, deserialize_with = "score")]
    pub other_preferences_fit: Option<u8>,
}

impl CategoryScores {
    pub fn get(&self, category: ScoreCategory) -> Option<u8> {
        match category {
            ScoreCategory::AcademicFit => self.academic_fit,
            ScoreCategory::LifestyleFit => self.lifestyle_fit,
            ScoreCategory::SocialFit => self.social_fit,
            ScoreCategory::LocationFit => self.location_fit,
            ScoreCategory::FinancialFit => self.financial_fit,
            ScoreCategory::JewishIsraeliCommunityFit => self.jewish_israeli_community_fit,
            ScoreCategory::OtherPreferencesFit => self.other_preferences_fit,
        }
    }

    /// Builder-style setter. Values above 100 are clamped.
    pub fn with(mut self, category: ScoreCategory, value: Option<u8>) -> Self {
        let value = value.map(|v| v.min(100));
        match category {
            ScoreCategory::AcademicFit => self.academic_fit = value,
            ScoreCategory::LifestyleFit => self.lifestyle_fit = value,
            ScoreCategory::SocialFit => self.social_fit = value,
            ScoreCategory::LocationFit => self.location_fit = value,
            ScoreCategory::FinancialFit => self.financial_fit = value,
            ScoreCategory::JewishIsraeliCommunityFit => self.jewish_israeli_community_fit = value,
            ScoreCategory::OtherPreferencesFit => self.other_preferences_fit = value,
        }
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (ScoreCategory, Option<u8>)> + '_ {
        ScoreCategory::ALL.into_iter().map(|c| (c, self.get(c)))
    }
}

/// Accepts an integer 0..=100 or null. Fractions, strings and out-of-range
/// numbers are rejected so a malformed oracle response fails loudly.
fn score<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(value) = Option::<f64>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if !value.is_finite() || value.fract() != 0.0 || !(0.0..=100.0).contains(&value) {
        return Err(D::Error::custom(format!(
            "category score must be an integer in 0..=100, got {value}"
        )));
    }
    Ok(Some(value as u8))
}

/// One oracle verdict for one candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    #[serde(alias = "university_name")]
    pub name: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub scores: CategoryScores,
    #[serde(default)]
    pub reasoning: String,
}

// =============================================================================
// Weights
// =============================================================================

/// Per-category weights for the aggregate. Categories without an explicit
/// weight count 1.0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryWeights {
    #[serde(default)]
    overrides: BTreeMap<ScoreCategory, f64>,
}

impl CategoryWeights {
    pub const DEFAULT_WEIGHT: f64 = 1.0;

    pub fn uniform() -> Self {
        Self::default()
    }

    /// Override one category's weight. Negative or non-finite weights are
    /// stored as 0.
    pub fn with_weight(mut self, category: ScoreCategory, weight: f64) -> Self {
        let weight = if weight.is_finite() { weight.max(0.0) } else { 0.0 };
        self.overrides.insert(category, weight);
        self
    }

    pub fn weight(&self, category: ScoreCategory) -> f64 {
        self.overrides
            .get(&category)
            .copied()
            .unwrap_or(Self::DEFAULT_WEIGHT)
    }
}

/// Weighted mean over the non-null categories, rounded half away from zero.
///
/// ## Algorithm
/// 1. Keep categories with a score
/// 2. `sum(w * s) / sum(w)` over those
/// 3. No scored category (or zero total weight) → 0
pub fn aggregate_score(scores: &CategoryScores, weights: &CategoryWeights) -> u32 {
    let (weighted, total) = scores
        .iter()
        .filter_map(|(category, value)| value.map(|v| (weights.weight(category), f64::from(v))))
        .fold((0.0, 0.0), |(weighted, total), (w, v)| (weighted + w * v, total + w));

    if total <= 0.0 {
        return 0;
    }
    (weighted / total).round() as u32
}

// =============================================================================
// Ranking
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCandidate {
    /// 1-based position in the ranking.
    pub rank: usize,
    pub name: String,
    pub country: String,
    pub aggregate: u32,
    pub reasoning: String,
}

/// Ordered top-K list, best first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ranking {
    pub entries: Vec<RankedCandidate>,
}

impl Ranking {
    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.name.clone()).collect()
    }

    /// Reasoning strings aligned index-for-index with `names()`.
    pub fn reasoning(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.reasoning.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Aggregate, order and truncate the oracle's verdicts.
///
/// ## Algorithm
/// 1. Compute every aggregate (in parallel, order preserved)
/// 2. Stable sort by aggregate descending, so ties keep oracle order
/// 3. Assign ranks 1..N and keep the first `top_k`
pub fn rank_candidates(
    scored: Vec<ScoredCandidate>,
    weights: &CategoryWeights,
    top_k: usize,
) -> Ranking {
    let aggregates: Vec<u32> = scored
        .par_iter()
        .map(|candidate| aggregate_score(&candidate.scores, weights))
        .collect();

    let mut paired: Vec<(u32, ScoredCandidate)> = aggregates.into_iter().zip(scored).collect();
    paired.sort_by(|a, b| b.0.cmp(&a.0));
    paired.truncate(top_k);

    let entries = paired
        .into_iter()
        .enumerate()
        .map(|(i, (aggregate, candidate))| RankedCandidate {
            rank: i + 1,
            name: candidate.name,
            country: candidate.country,
            aggregate,
            reasoning: candidate.reasoning,
        })
        .collect();

    Ranking { entries }
}
