//! Integration tests for the pipeline.
//!
//! These tests run the full rule chain over a small realistic catalog and
//! check the properties the chain must keep for arbitrary inputs.

use catalog::{CandidateRecord, DateWindow, MonthDay, SemesterWindow, UserProfile};
use pipeline::rules::*;
use pipeline::{rank_candidates, CategoryScores, CategoryWeights, EligibilityFilter, ScoredCandidate};
use proptest::prelude::*;
use std::collections::HashSet;

fn catalog() -> Vec<CandidateRecord> {
    serde_json::from_str(
        r#"[
        {"name": "Czech Technical University", "country": "Czech Republic",
         "min_gpa": 75, "msc_allowed": true, "min_semesters_completed": 2,
         "english_only_possible": true, "erasmus_available": true,
         "english_test_type": ["IELTS", "TOEFL"], "english_test_level": "B2",
         "spring_semester": {"start_month": 2, "start_day": 15, "end_month": 6, "end_day": 30}},
        {"name": "TU Munich", "country": "Germany",
         "min_gpa": 88, "msc_allowed": true,
         "english_only_possible": true, "erasmus_available": true,
         "english_test_type": ["TOEFL"], "english_test_level": "C1",
         "fall_semester": {"start_month": 10, "end_month": 2}},
        {"name": "Sorbonne", "country": "France",
         "min_gpa": 70, "msc_allowed": false,
         "english_only_possible": false, "erasmus_available": true,
         "other_languages": ["French"]},
        {"name": "University of Tokyo", "country": "Japan",
         "min_gpa": 80, "msc_allowed": true,
         "english_only_possible": true, "erasmus_available": false,
         "english_test_required": false,
         "restricted_majors": ["Medicine"]},
        {"name": "KTH", "country": "Sweden",
         "min_gpa": null, "msc_allowed": true,
         "english_only_possible": true, "erasmus_available": true,
         "english_test_type": ["IELTS"], "english_test_level": "C1",
         "fall_semester": {"start_month": 8, "start_day": 20, "end_month": 1, "end_day": 15}}
    ]"#,
    )
    .unwrap()
}

fn profile(json: &str) -> UserProfile {
    serde_json::from_str(json).unwrap()
}

#[test]
fn test_ctu_profile_end_to_end() {
    let student = profile(
        r#"{
        "academic": {"gpa": 85, "major": "Computer Science", "study_level": "msc", "semesters_completed": 4},
        "language": {"non_english_languages": [], "english_test_type": ["ielts"], "english_test_level": "C1"},
        "availability": {"start_month": 2, "end_month": 6},
        "preferences": {"must_be_erasmus": true}
    }"#,
    );

    let result = EligibilityFilter::standard().apply(&student.eligibility(), catalog());

    // KTH passes every rule but its fall term (8/20..1/15) does not reach February
    assert_eq!(result.survivor_names(), vec!["Czech Technical University"]);
    assert_eq!(result.survivors[0].country, "Czech Republic");
    assert_eq!(
        result.trace,
        vec![
            "Filtered by min_gpa <= 85",
            "Filtered by MSc allowed",
            "Filtered by min_semesters_completed <= 4",
            "Filtered for English-only universities",
            "Filtered by Erasmus availability",
            "Filtered by availability: 2/1 to 6/31",
            r#"Filtered by English test: ["ielts"] CEFR >= C1"#,
            "Excluded restricted major: Computer Science",
        ]
    );
}

#[test]
fn test_french_speaker_skips_english_only_rule() {
    let student = profile(
        r#"{
        "academic": {"gpa": 72, "study_level": "bsc"},
        "language": {"non_english_languages": ["french"]}
    }"#,
    );

    let result = EligibilityFilter::standard().apply(&student.eligibility(), catalog());

    // KTH has no GPA floor and no mandatory second language
    assert_eq!(result.survivor_names(), vec!["Sorbonne", "KTH"]);
    assert_eq!(result.trace.last().unwrap(), r#"Filtered by language match: ["french"]"#);
}

#[test]
fn test_restricted_major_and_waiver() {
    let student = profile(
        r#"{
        "academic": {"gpa": 95, "major": " medicine "},
        "language": {"english_test_type": ["Duolingo"]}
    }"#,
    );

    let result = EligibilityFilter::standard().apply(&student.eligibility(), catalog());

    // Tokyo waives the test but excludes medicine; nobody else accepts Duolingo
    assert!(result.survivors.is_empty());
    assert_eq!(result.trace.len(), 4);
}

#[test]
fn test_filter_then_rank() {
    let student = profile(r#"{"academic": {"gpa": 90}}"#);
    let survivors = EligibilityFilter::standard()
        .apply(&student.eligibility(), catalog())
        .survivors;
    assert_eq!(survivors.len(), 4);

    let scored: Vec<ScoredCandidate> = survivors
        .iter()
        .zip([40u8, 90, 90, 10])
        .map(|(candidate, academic)| ScoredCandidate {
            name: candidate.name.clone(),
            country: candidate.country.clone(),
            scores: CategoryScores {
                academic_fit: Some(academic),
                ..CategoryScores::default()
            },
            reasoning: String::new(),
        })
        .collect();

    let ranking = rank_candidates(scored, &CategoryWeights::uniform(), 2);
    assert_eq!(ranking.names(), vec!["TU Munich", "University of Tokyo"]);
}

// =============================================================================
// Properties
// =============================================================================

fn arb_semester() -> impl Strategy<Value = Option<SemesterWindow>> {
    proptest::option::of((0u32..=13, 0u32..=32, 0u32..=13, 0u32..=32).prop_map(
        |(sm, sd, em, ed)| SemesterWindow {
            start_month: Some(sm),
            start_day: Some(sd),
            end_month: Some(em),
            end_day: Some(ed),
        },
    ))
}

fn arb_record() -> impl Strategy<Value = CandidateRecord> {
    (
        "[A-Z][a-z]{2,8}",
        proptest::option::of(50.0f64..100.0),
        any::<bool>(),
        any::<bool>(),
        any::<bool>(),
        proptest::option::of(0u32..8),
        arb_semester(),
        arb_semester(),
        proptest::sample::subsequence(vec!["French", "German", "Italian"], 0..=2),
    )
        .prop_map(
            |(name, min_gpa, msc, english_only, erasmus, semesters, fall, spring, languages)| {
                let mut record = CandidateRecord::new(name, "Testland");
                record.min_gpa = min_gpa;
                record.msc_allowed = msc;
                record.english_only_possible = english_only;
                record.erasmus_available = erasmus;
                record.min_semesters_completed = semesters;
                record.fall_semester = fall;
                record.spring_semester = spring;
                record.other_languages = languages.into_iter().map(String::from).collect();
                record
            },
        )
}

fn arb_window() -> impl Strategy<Value = DateWindow> {
    (1u32..=12, 1u32..=31, 1u32..=12, 1u32..=31)
        .prop_map(|(sm, sd, em, ed)| DateWindow::new(MonthDay::new(sm, sd), MonthDay::new(em, ed)))
}

fn names(result: &pipeline::FilterResult) -> HashSet<String> {
    result.survivors.iter().map(|s| s.name.clone()).collect()
}

proptest! {
    #[test]
    fn prop_more_rules_never_add_survivors(
        records in proptest::collection::vec(arb_record(), 0..30),
        gpa in 40.0f64..100.0,
        semesters in 0i64..8,
        erasmus in any::<bool>(),
        start_month in 1i64..=12,
        end_month in 1i64..=12,
    ) {
        let student: UserProfile = serde_json::from_value(serde_json::json!({
            "academic": {"gpa": gpa, "study_level": "msc", "semesters_completed": semesters},
            "availability": {"start_month": start_month, "end_month": end_month},
            "preferences": {"must_be_erasmus": erasmus}
        })).unwrap();
        let eligibility = student.eligibility();

        let partial = EligibilityFilter::new()
            .add_rule(MinimumGpaRule)
            .add_rule(MscAllowedRule)
            .apply(&eligibility, records.clone());
        let full = EligibilityFilter::standard().apply(&eligibility, records);

        prop_assert!(names(&full).is_subset(&names(&partial)));
        prop_assert!(full.trace.len() >= partial.trace.len());
    }

    #[test]
    fn prop_lower_gpa_never_adds_survivors(
        records in proptest::collection::vec(arb_record(), 0..30),
        high in 50.0f64..100.0,
        drop in 0.0f64..50.0,
    ) {
        let at = |gpa: f64| -> UserProfile {
            serde_json::from_value(serde_json::json!({"academic": {"gpa": gpa}})).unwrap()
        };
        let filter = EligibilityFilter::standard();
        let strong = filter.apply(&at(high).eligibility(), records.clone());
        let weak = filter.apply(&at(high - drop).eligibility(), records);

        prop_assert!(names(&weak).is_subset(&names(&strong)));
    }

    #[test]
    fn prop_overlap_is_symmetric(a in arb_window(), b in arb_window()) {
        prop_assert_eq!(a.overlaps(&b), b.overlaps(&a));
    }

    #[test]
    fn prop_unknown_schedule_survives_availability(
        record in arb_record(),
        window in arb_window(),
    ) {
        let mut record = record;
        record.fall_semester = Some(SemesterWindow { start_month: Some(window.start.month), ..SemesterWindow::default() });
        record.spring_semester = None;

        let student: UserProfile = serde_json::from_value(serde_json::json!({
            "availability": {"start_month": window.start.month, "end_month": window.end.month}
        })).unwrap();

        let result = EligibilityFilter::new()
            .add_rule(AvailabilityOverlapRule)
            .apply(&student.eligibility(), vec![record]);
        prop_assert_eq!(result.survivors.len(), 1);
    }
}
