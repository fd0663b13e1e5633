//! The EligibilityFilter chains eligibility rules.
//!
//! This module provides the `EligibilityFilter` that applies a fixed,
//! ordered list of rules to candidate records and records one trace line per
//! applied rule.

use crate::rules::{
    AvailabilityOverlapRule, EnglishOnlyRule, EnglishTestRule, ErasmusRule, LanguageCoverageRule,
    MinimumGpaRule, MinimumSemestersRule, MscAllowedRule, RestrictedMajorRule,
};
use crate::traits::EligibilityRule;
use catalog::{CandidateRecord, CandidateRef, EligibilityProfile};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Output of the filter: who survived, and which predicates were applied.
///
/// `trace` is returned to callers as an audit trail, one human-readable
/// clause per applied rule, in application order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterResult {
    pub survivors: Vec<CandidateRef>,
    pub trace: Vec<String>,
}

impl FilterResult {
    pub fn survivor_names(&self) -> Vec<&str> {
        self.survivors.iter().map(|s| s.name.as_str()).collect()
    }
}

/// Chains eligibility rules into one conjunction.
///
/// ## Usage
/// ```ignore
/// let filter = EligibilityFilter::standard();
/// let result = filter.apply(&profile.eligibility(), records);
/// ```
pub struct EligibilityFilter {
    rules: Vec<Box<dyn EligibilityRule>>,
}

impl EligibilityFilter {
    /// Create a new empty filter.
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// The nine rules in their fixed order.
    ///
    /// Rules are AND clauses, so the order only affects trace readability,
    /// never the surviving set.
    pub fn standard() -> Self {
        Self::new()
            .add_rule(MinimumGpaRule)
            .add_rule(MscAllowedRule)
            .add_rule(MinimumSemestersRule)
            .add_rule(EnglishOnlyRule)
            .add_rule(ErasmusRule)
            .add_rule(AvailabilityOverlapRule)
            .add_rule(EnglishTestRule)
            .add_rule(RestrictedMajorRule)
            .add_rule(LanguageCoverageRule)
    }

    /// Add a rule to the end of the chain (builder pattern).
    pub fn add_rule(mut self, rule: impl EligibilityRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Apply every applicable rule in sequence.
    ///
    /// ## Algorithm
    /// 1. Start with the input candidates
    /// 2. For each rule in order:
    ///    a. Ask the rule for its trace clause; skip it if `None`
    ///    b. Keep candidates the rule admits (order preserved)
    ///    c. Append the clause to the trace
    /// 3. Reduce survivors to `{name, country}`
    pub fn apply(
        &self,
        profile: &EligibilityProfile,
        candidates: Vec<CandidateRecord>,
    ) -> FilterResult {
        let mut current = candidates;
        let mut trace = Vec::new();

        for rule in &self.rules {
            let Some(clause) = rule.clause(profile) else {
                tracing::debug!("Skipping rule: {} (not applicable)", rule.name());
                continue;
            };

            let before = current.len();
            current = current
                .into_par_iter()
                .filter(|candidate| rule.admits(candidate, profile))
                .collect();
            tracing::debug!(
                "Rule applied: {} ({} -> {} candidates)",
                rule.name(),
                before,
                current.len()
            );

            trace.push(clause);
        }

        FilterResult {
            survivors: current.iter().map(CandidateRecord::to_ref).collect(),
            trace,
        }
    }
}

impl Default for EligibilityFilter {
    fn default() -> Self {
        Self::standard()
    }
}
