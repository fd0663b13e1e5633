//! Filter on whether a semester overlaps the student's availability.

use crate::traits::EligibilityRule;
use catalog::{CandidateRecord, EligibilityProfile};

/// Keeps candidates with at least one semester overlapping the student's
/// availability window.
///
/// ## Algorithm
/// 1. Collect the candidate's fall and spring semesters that have both a
///    start and an end month
/// 2. No such semester → unknown schedule, keep the candidate
/// 3. Otherwise keep it iff some semester window overlaps the student's
///    window under (month, day) lexicographic comparison
pub struct AvailabilityOverlapRule;

impl EligibilityRule for AvailabilityOverlapRule {
    fn name(&self) -> &str {
        "AvailabilityOverlapRule"
    }

    fn clause(&self, profile: &EligibilityProfile) -> Option<String> {
        profile
            .availability
            .map(|w| format!("Filtered by availability: {} to {}", w.start, w.end))
    }

    fn admits(&self, candidate: &CandidateRecord, profile: &EligibilityProfile) -> bool {
        let Some(student) = profile.availability else {
            return true;
        };
        let semesters = candidate.semester_windows();
        semesters.is_empty() || semesters.iter().any(|s| s.overlaps(&student))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::{profile, record};

    #[test]
    fn test_clause_uses_defaulted_days() {
        let student = profile(r#"{"availability": {"start_month": 2, "end_month": 6, "end_day": 15}}"#);
        assert_eq!(
            AvailabilityOverlapRule.clause(&student).as_deref(),
            Some("Filtered by availability: 2/1 to 6/15")
        );
    }

    #[test]
    fn test_rule_needs_both_student_months() {
        let partial = profile(r#"{"availability": {"start_month": 2}}"#);
        assert!(AvailabilityOverlapRule.clause(&partial).is_none());
    }

    #[test]
    fn test_overlap_and_unknown_schedule() {
        let student = profile(r#"{"availability": {"start_month": 2, "end_month": 6}}"#);

        let spring = record(
            r#"{"name": "Spring", "spring_semester": {"start_month": 3, "end_month": 7}}"#,
        );
        let fall_only = record(
            r#"{"name": "Fall", "fall_semester": {"start_month": 9, "start_day": 15, "end_month": 12}}"#,
        );
        let unknown = record(r#"{"name": "Unknown", "fall_semester": {"start_month": 9}}"#);
        let touching = record(
            r#"{"name": "Touching", "fall_semester": {"start_month": 6, "start_day": 30, "end_month": 12}}"#,
        );

        assert!(AvailabilityOverlapRule.admits(&spring, &student));
        assert!(!AvailabilityOverlapRule.admits(&fall_only, &student));
        assert!(AvailabilityOverlapRule.admits(&unknown, &student));
        assert!(AvailabilityOverlapRule.admits(&touching, &student));
    }

    #[test]
    fn test_any_semester_is_enough() {
        let student = profile(r#"{"availability": {"start_month": 9, "end_month": 12}}"#);
        let both = record(
            r#"{"name": "Both",
                "fall_semester": {"start_month": 9, "end_month": 12},
                "spring_semester": {"start_month": 2, "end_month": 6}}"#,
        );
        assert!(AvailabilityOverlapRule.admits(&both, &student));
    }
}
