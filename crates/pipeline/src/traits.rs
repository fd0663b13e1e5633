//! Core traits for the eligibility pipeline.
//!
//! This module defines the `EligibilityRule` trait that lets the filter
//! compose independent, per-row predicates over candidate records.

use catalog::{CandidateRecord, EligibilityProfile};

/// One predicate of the eligibility filter.
///
/// ## Design Note
/// - `Send + Sync` lets the pipeline evaluate a rule across candidates in parallel
/// - `clause` decides *whether* the rule applies to a profile and, if so,
///   produces the human-readable trace line; `admits` is only called when
///   `clause` returned `Some`
pub trait EligibilityRule: Send + Sync {
    /// Returns the name of this rule (for logging/debugging)
    fn name(&self) -> &str;

    /// Trace line for this profile, or `None` when the rule does not apply.
    fn clause(&self, profile: &EligibilityProfile) -> Option<String>;

    /// Whether `candidate` survives this rule for `profile`.
    fn admits(&self, candidate: &CandidateRecord, profile: &EligibilityProfile) -> bool;
}
