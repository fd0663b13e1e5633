//! Rules over the academic part of the profile.

use crate::traits::EligibilityRule;
use catalog::profile::normalize;
use catalog::{CandidateRecord, EligibilityProfile, StudyLevel};

/// Keeps candidates whose minimum GPA the student meets.
pub struct MinimumGpaRule;

impl EligibilityRule for MinimumGpaRule {
    fn name(&self) -> &str {
        "MinimumGpaRule"
    }

    fn clause(&self, profile: &EligibilityProfile) -> Option<String> {
        profile.gpa.map(|gpa| format!("Filtered by min_gpa <= {gpa}"))
    }

    fn admits(&self, candidate: &CandidateRecord, profile: &EligibilityProfile) -> bool {
        profile.gpa.is_none_or(|gpa| candidate.admits_gpa(gpa))
    }
}

/// MSc students only see candidates that accept MSc exchanges.
pub struct MscAllowedRule;

impl EligibilityRule for MscAllowedRule {
    fn name(&self) -> &str {
        "MscAllowedRule"
    }

    fn clause(&self, profile: &EligibilityProfile) -> Option<String> {
        (profile.study_level == StudyLevel::Master).then(|| "Filtered by MSc allowed".to_string())
    }

    fn admits(&self, candidate: &CandidateRecord, _profile: &EligibilityProfile) -> bool {
        candidate.msc_allowed
    }
}

/// Keeps candidates whose semester minimum the student has completed.
pub struct MinimumSemestersRule;

impl EligibilityRule for MinimumSemestersRule {
    fn name(&self) -> &str {
        "MinimumSemestersRule"
    }

    fn clause(&self, profile: &EligibilityProfile) -> Option<String> {
        profile
            .semesters_completed
            .map(|n| format!("Filtered by min_semesters_completed <= {n}"))
    }

    fn admits(&self, candidate: &CandidateRecord, profile: &EligibilityProfile) -> bool {
        profile
            .semesters_completed
            .is_none_or(|n| candidate.admits_semesters(n))
    }
}

/// Drops candidates that list the student's major as restricted.
///
/// ## Algorithm
/// Case-insensitive, whitespace-trimmed equality against each entry of
/// `restricted_majors`.
pub struct RestrictedMajorRule;

impl EligibilityRule for RestrictedMajorRule {
    fn name(&self) -> &str {
        "RestrictedMajorRule"
    }

    fn clause(&self, profile: &EligibilityProfile) -> Option<String> {
        profile
            .major
            .as_ref()
            .map(|major| format!("Excluded restricted major: {major}"))
    }

    fn admits(&self, candidate: &CandidateRecord, profile: &EligibilityProfile) -> bool {
        let Some(major) = profile.major.as_deref().map(normalize) else {
            return true;
        };
        !candidate
            .restricted_majors
            .iter()
            .any(|restricted| normalize(restricted) == major)
    }
}
