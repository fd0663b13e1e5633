//! Rules over the languages a student can study in.

use crate::traits::EligibilityRule;
use catalog::profile::normalize;
use catalog::{CandidateRecord, EligibilityProfile};
use std::collections::HashSet;

/// Students with no other language need an English-only track.
pub struct EnglishOnlyRule;

impl EligibilityRule for EnglishOnlyRule {
    fn name(&self) -> &str {
        "EnglishOnlyRule"
    }

    fn clause(&self, profile: &EligibilityProfile) -> Option<String> {
        profile
            .languages
            .is_empty()
            .then(|| "Filtered for English-only universities".to_string())
    }

    fn admits(&self, candidate: &CandidateRecord, _profile: &EligibilityProfile) -> bool {
        candidate.english_only_possible
    }
}

/// The student must cover every mandatory non-English language.
///
/// ## Algorithm
/// Every entry of the candidate's `other_languages` (normalized) must appear
/// in the student's language list (normalized). Candidates with no extra
/// language always pass.
pub struct LanguageCoverageRule;

impl EligibilityRule for LanguageCoverageRule {
    fn name(&self) -> &str {
        "LanguageCoverageRule"
    }

    fn clause(&self, profile: &EligibilityProfile) -> Option<String> {
        (!profile.languages.is_empty())
            .then(|| format!("Filtered by language match: {:?}", profile.languages))
    }

    fn admits(&self, candidate: &CandidateRecord, profile: &EligibilityProfile) -> bool {
        let spoken: HashSet<String> = profile.languages.iter().map(|l| normalize(l)).collect();
        candidate
            .other_languages
            .iter()
            .all(|required| spoken.contains(&normalize(required)))
    }
}
