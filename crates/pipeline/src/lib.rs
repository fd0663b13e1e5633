//! Deterministic stages of the exchange advisor: eligibility filtering and
//! preference ranking.
//!
//! This crate provides:
//! - `EligibilityRule` trait and the nine concrete rules under `rules`
//! - `EligibilityFilter` for composing rules into one conjunction with a trace
//! - null-aware score aggregation and top-K ranking under `ranking`
//!
//! ## Architecture
//! 1. The filter narrows candidate records against a normalized profile
//! 2. An external oracle scores the survivors per category
//! 3. `rank_candidates` folds those scores into an ordered top-K list
//!
//! ## Example Usage
//! ```ignore
//! use pipeline::{EligibilityFilter, rank_candidates, CategoryWeights};
//!
//! let filter = EligibilityFilter::standard();
//! let result = filter.apply(&profile.eligibility(), records);
//!
//! let ranking = rank_candidates(scored, &CategoryWeights::uniform(), 5);
//! ```

pub mod filter_pipeline;
pub mod ranking;
pub mod rules;
pub mod traits;

// Re-export main types
pub use filter_pipeline::{EligibilityFilter, FilterResult};
pub use ranking::{
    aggregate_score, rank_candidates, CategoryScores, CategoryWeights, RankedCandidate, Ranking,
    ScoreCategory, ScoredCandidate,
};
pub use traits::EligibilityRule;
