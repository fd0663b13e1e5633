//! Core domain types for the university catalog.
//!
//! This module defines the records the rest of the workspace passes around:
//! - `CandidateRecord`: one university's eligibility facts, as stored
//! - `CandidateRef`: the `{name, country}` pair forwarded to later stages
//! - `CefrLevel`: ordinal language-proficiency scale
//! - `MonthDay` / `DateWindow`: calendar windows compared lexicographically
//! - `CandidateDetail`: the detail object handed to the analysis stage

use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// CEFR Levels
// =============================================================================

/// Common European Framework of Reference language levels, lowest first.
///
/// The derived ordering follows declaration order, so `A1 < A2 < ... < C2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CefrLevel {
    A1,
    A2,
    B1,
    B2,
    C1,
    C2,
}

impl CefrLevel {
    /// Ordinal value on the 1..=6 scale (A1 = 1, C2 = 6).
    pub fn ordinal(self) -> u8 {
        match self {
            CefrLevel::A1 => 1,
            CefrLevel::A2 => 2,
            CefrLevel::B1 => 3,
            CefrLevel::B2 => 4,
            CefrLevel::C1 => 5,
            CefrLevel::C2 => 6,
        }
    }
}

impl FromStr for CefrLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A1" => Ok(CefrLevel::A1),
            "A2" => Ok(CefrLevel::A2),
            "B1" => Ok(CefrLevel::B1),
            "B2" => Ok(CefrLevel::B2),
            "C1" => Ok(CefrLevel::C1),
            "C2" => Ok(CefrLevel::C2),
            other => Err(format!("unknown CEFR level: {other:?}")),
        }
    }
}

impl fmt::Display for CefrLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

// =============================================================================
// Calendar Windows
// =============================================================================

/// A (month, day) pair. Field order gives tuple-lexicographic `Ord`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MonthDay {
    pub month: u32,
    pub day: u32,
}

impl MonthDay {
    pub fn new(month: u32, day: u32) -> Self {
        Self { month, day }
    }

    /// Opening bound of a window. Missing or out-of-range day → 1,
    /// out-of-range month → 1.
    pub fn opening(month: u32, day: Option<u32>) -> Self {
        Self {
            month: clamp_or(month, 1, 12, 1),
            day: day.map_or(1, |d| clamp_or(d, 1, 31, 1)),
        }
    }

    /// Closing bound of a window. Missing or out-of-range day → 31,
    /// out-of-range month → 12.
    pub fn closing(month: u32, day: Option<u32>) -> Self {
        Self {
            month: clamp_or(month, 1, 12, 12),
            day: day.map_or(31, |d| clamp_or(d, 1, 31, 31)),
        }
    }
}

impl fmt::Display for MonthDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.month, self.day)
    }
}

fn clamp_or(value: u32, min: u32, max: u32, fallback: u32) -> u32 {
    if (min..=max).contains(&value) {
        value
    } else {
        fallback
    }
}

/// Closed calendar window `[start, end]` within a single year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: MonthDay,
    pub end: MonthDay,
}

impl DateWindow {
    pub fn new(start: MonthDay, end: MonthDay) -> Self {
        Self { start, end }
    }

    /// Interval overlap under lexicographic (month, day) comparison.
    ///
    /// `a.overlaps(&b) == b.overlaps(&a)` for every pair of windows.
    pub fn overlaps(&self, other: &DateWindow) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

/// A semester schedule as stored. Any field may be missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemesterWindow {
    #[serde(default, deserialize_with = "lenient_u32")]
    pub start_month: Option<u32>,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub start_day: Option<u32>,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub end_month: Option<u32>,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub end_day: Option<u32>,
}

impl SemesterWindow {
    /// Resolved window, or `None` when either month is missing (or zero).
    pub fn window(&self) -> Option<DateWindow> {
        let start_month = self.start_month.filter(|m| *m != 0)?;
        let end_month = self.end_month.filter(|m| *m != 0)?;
        Some(DateWindow::new(
            MonthDay::opening(start_month, self.start_day),
            MonthDay::closing(end_month, self.end_day),
        ))
    }
}

// =============================================================================
// Candidate Records
// =============================================================================

/// One university's eligibility facts, as held by the candidate store.
///
/// Every field except `name` and `country` may be absent or `null` in the
/// source data; absent booleans read as `false` and absent lists as empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub country: String,

    /// Minimum GPA on the 0..=100 scale. `None` means no minimum.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub min_gpa: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub msc_allowed: bool,
    /// `None` means no minimum.
    #[serde(default, deserialize_with = "lenient_u32")]
    pub min_semesters_completed: Option<u32>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub english_only_possible: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub erasmus_available: bool,

    #[serde(default, deserialize_with = "null_as_default")]
    pub english_test_type: Vec<String>,
    #[serde(default, deserialize_with = "lenient_cefr")]
    pub english_test_level: Option<CefrLevel>,
    /// Explicit "no English test needed" marker. `None` means unknown,
    /// which is treated as required.
    #[serde(default)]
    pub english_test_required: Option<bool>,
    /// The university waives its English test requirement on request.
    #[serde(default, deserialize_with = "null_as_default")]
    pub english_waiver_available: bool,

    #[serde(default, deserialize_with = "null_as_default")]
    pub restricted_majors: Vec<String>,
    /// Mandatory non-English languages of instruction.
    #[serde(default, deserialize_with = "null_as_default")]
    pub other_languages: Vec<String>,

    #[serde(default)]
    pub fall_semester: Option<SemesterWindow>,
    #[serde(default)]
    pub spring_semester: Option<SemesterWindow>,
}

impl CandidateRecord {
    pub fn new(name: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            country: country.into(),
            ..Self::default()
        }
    }

    pub fn admits_gpa(&self, gpa: f64) -> bool {
        self.min_gpa.is_none_or(|min| min <= gpa)
    }

    pub fn admits_semesters(&self, completed: u32) -> bool {
        self.min_semesters_completed.is_none_or(|min| min <= completed)
    }

    /// Semester windows that have both months set, fall first.
    pub fn semester_windows(&self) -> Vec<DateWindow> {
        [self.fall_semester, self.spring_semester]
            .iter()
            .flatten()
            .filter_map(SemesterWindow::window)
            .collect()
    }

    /// Whether the English test requirement can be skipped entirely.
    pub fn english_test_waived(&self) -> bool {
        self.english_waiver_available || self.english_test_required == Some(false)
    }

    pub fn to_ref(&self) -> CandidateRef {
        CandidateRef::new(self.name.clone(), self.country.clone())
    }
}

/// The only candidate fields forwarded past the filter stage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CandidateRef {
    pub name: String,
    pub country: String,
}

impl CandidateRef {
    pub fn new(name: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            country: country.into(),
        }
    }
}

impl fmt::Display for CandidateRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.country)
    }
}

// =============================================================================
// Candidate Details
// =============================================================================

/// Detail object returned by a `DetailStore` for the analysis stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateDetail {
    pub name: String,
    pub country: String,
    /// Short human-readable facts, already formatted.
    pub highlights: Vec<String>,
}

impl CandidateDetail {
    /// Summarize the eligibility facts of a record.
    pub fn from_record(record: &CandidateRecord) -> Self {
        let mut highlights = Vec::new();

        if let Some(min_gpa) = record.min_gpa {
            highlights.push(format!("Minimum GPA {min_gpa}"));
        }
        if let Some(min_semesters) = record.min_semesters_completed {
            highlights.push(format!("At least {min_semesters} semesters completed"));
        }
        if record.msc_allowed {
            highlights.push("Open to MSc students".to_string());
        }
        if record.erasmus_available {
            highlights.push("Erasmus exchange available".to_string());
        }
        if record.english_only_possible {
            highlights.push("Courses available in English only".to_string());
        }
        if !record.other_languages.is_empty() {
            highlights.push(format!(
                "Requires {}",
                record.other_languages.join(", ")
            ));
        }
        if record.english_test_waived() {
            highlights.push("English test can be waived".to_string());
        } else if !record.english_test_type.is_empty() {
            let level = record
                .english_test_level
                .map(|l| format!(" at {l} or above"))
                .unwrap_or_default();
            highlights.push(format!(
                "Accepts {}{level}",
                record.english_test_type.join(" / ")
            ));
        }
        for (label, semester) in [("Fall", record.fall_semester), ("Spring", record.spring_semester)] {
            if let Some(window) = semester.as_ref().and_then(SemesterWindow::window) {
                highlights.push(format!("{label} semester {} to {}", window.start, window.end));
            }
        }

        Self {
            name: record.name.clone(),
            country: record.country.clone(),
            highlights,
        }
    }
}

// =============================================================================
// Lenient Deserializers
// =============================================================================
// Source rows and LLM-produced profiles carry nulls, numeric strings and
// junk values; these helpers map them onto the typed fields above.

/// `null` → `T::default()`.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Number or numeric string → `Some(f64)`; anything else → `None`.
pub(crate) fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }))
}

/// Non-negative integer (or integral numeric string) → `Some(u32)`.
pub(crate) fn lenient_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = lenient_f64(deserializer)?;
    Ok(value
        .filter(|v| v.is_finite() && *v >= 0.0 && v.fract() == 0.0 && *v <= u32::MAX as f64)
        .map(|v| v as u32))
}

/// Known CEFR code → `Some(level)`; blanks and unknown codes → `None`.
pub(crate) fn lenient_cefr<'de, D>(deserializer: D) -> Result<Option<CefrLevel>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.and_then(|s| s.parse().ok()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cefr_ordering_and_parsing() {
        assert!(CefrLevel::B1 < CefrLevel::B2);
        assert_eq!(CefrLevel::A1.ordinal(), 1);
        assert_eq!(CefrLevel::C2.ordinal(), 6);
        assert_eq!(" c1 ".parse::<CefrLevel>(), Ok(CefrLevel::C1));
        assert!("D4".parse::<CefrLevel>().is_err());
    }

    #[test]
    fn test_month_day_defaults_and_clamping() {
        assert_eq!(MonthDay::opening(3, None), MonthDay::new(3, 1));
        assert_eq!(MonthDay::closing(6, None), MonthDay::new(6, 31));
        assert_eq!(MonthDay::opening(13, Some(40)), MonthDay::new(1, 1));
        assert_eq!(MonthDay::closing(0, Some(0)), MonthDay::new(12, 31));
    }

    #[test]
    fn test_overlap_is_symmetric() {
        let spring = DateWindow::new(MonthDay::new(2, 15), MonthDay::new(6, 30));
        let summer = DateWindow::new(MonthDay::new(6, 30), MonthDay::new(8, 31));
        let fall = DateWindow::new(MonthDay::new(9, 1), MonthDay::new(12, 20));

        assert!(spring.overlaps(&summer));
        assert!(summer.overlaps(&spring));
        assert!(!spring.overlaps(&fall));
        assert!(!fall.overlaps(&spring));
    }

    #[test]
    fn test_semester_window_requires_both_months() {
        let partial = SemesterWindow {
            start_month: Some(9),
            ..SemesterWindow::default()
        };
        assert!(partial.window().is_none());

        let full = SemesterWindow {
            start_month: Some(9),
            start_day: None,
            end_month: Some(12),
            end_day: Some(20),
        };
        assert_eq!(
            full.window(),
            Some(DateWindow::new(MonthDay::new(9, 1), MonthDay::new(12, 20)))
        );
    }

    #[test]
    fn test_record_deserializes_nulls_and_strings() {
        let json = r#"{
            "name": "CTU",
            "country": "Czech Republic",
            "min_gpa": "70",
            "msc_allowed": null,
            "english_test_type": null,
            "english_test_level": "b2",
            "other_languages": ["Czech"],
            "fall_semester": {"start_month": 9, "end_month": "12", "end_day": null}
        }"#;

        let record: CandidateRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.min_gpa, Some(70.0));
        assert!(!record.msc_allowed);
        assert!(record.english_test_type.is_empty());
        assert_eq!(record.english_test_level, Some(CefrLevel::B2));
        assert_eq!(record.semester_windows().len(), 1);
    }

    #[test]
    fn test_detail_from_record_lists_requirements() {
        let mut record = CandidateRecord::new("CTU", "Czech Republic");
        record.min_gpa = Some(70.0);
        record.erasmus_available = true;
        record.english_test_type = vec!["IELTS".to_string()];
        record.english_test_level = Some(CefrLevel::B2);

        let detail = CandidateDetail::from_record(&record);
        assert_eq!(detail.name, "CTU");
        assert!(detail.highlights.contains(&"Minimum GPA 70".to_string()));
        assert!(detail.highlights.contains(&"Accepts IELTS at B2 or above".to_string()));
    }
}
