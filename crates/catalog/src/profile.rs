//! Student profile types and their one-time normalization.
//!
//! `UserProfile` is the structured input as received (every field optional,
//! lenient about nulls, numeric strings and the legacy key names).
//! `EligibilityProfile` is the resolved form the filter rules consume: all
//! defaults applied, strings trimmed, levels parsed, the availability window
//! built. Normalization happens once, in `UserProfile::eligibility`.

use crate::types::{lenient_f64, null_as_default, CefrLevel, DateWindow, MonthDay};
use serde::de::Deserializer;
use serde::{Deserialize, Serialize};

// =============================================================================
// Raw Profile
// =============================================================================

/// Structured student input for a thread's first turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default, alias = "academic_profile", deserialize_with = "null_as_default")]
    pub academic: AcademicProfile,
    #[serde(default, alias = "language_profile", deserialize_with = "null_as_default")]
    pub language: LanguageProfile,
    #[serde(default, deserialize_with = "null_as_default")]
    pub availability: Availability,
    #[serde(default, deserialize_with = "null_as_default")]
    pub preferences: Preferences,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AcademicProfile {
    /// GPA on the 0..=100 scale.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub gpa: Option<f64>,
    #[serde(default)]
    pub major: Option<String>,
    /// `"msc"` or `"bsc"`; anything else is treated as unspecified.
    #[serde(default)]
    pub study_level: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub semesters_completed: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LanguageProfile {
    #[serde(default, deserialize_with = "null_as_default")]
    pub non_english_languages: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub english_test_type: Vec<String>,
    #[serde(default)]
    pub english_test_level: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Availability {
    #[serde(default, deserialize_with = "lenient_i64")]
    pub start_month: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub start_day: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub end_month: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub end_day: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(
        default,
        alias = "free_language_preferences",
        deserialize_with = "null_as_default"
    )]
    pub free_text_preferences: String,
    #[serde(default)]
    pub must_be_erasmus: Option<bool>,
}

impl UserProfile {
    /// The student's free-text preference description, trimmed.
    pub fn preference_text(&self) -> &str {
        self.preferences.free_text_preferences.trim()
    }

    /// Whether the profile carries any structured criteria at all.
    pub fn is_blank(&self) -> bool {
        *self == UserProfile::default()
    }

    /// Resolve every optional field into the form the filter rules consume.
    ///
    /// ## Defaults
    /// - GPA outside 0..=100 is ignored
    /// - negative semester counts are ignored
    /// - study level other than `msc`/`bsc` is `Unspecified`
    /// - unknown CEFR codes are ignored
    /// - availability requires both months (zero counts as missing);
    ///   days default to 1 (start) and 31 (end), out-of-range values clamp
    ///   to those defaults
    pub fn eligibility(&self) -> EligibilityProfile {
        let academic = &self.academic;
        let language = &self.language;

        let gpa = academic.gpa.filter(|g| (0.0..=100.0).contains(g));

        let study_level = match academic
            .study_level
            .as_deref()
            .map(normalize)
            .as_deref()
        {
            Some("msc") => StudyLevel::Master,
            Some("bsc") => StudyLevel::Bachelor,
            _ => StudyLevel::Unspecified,
        };

        let semesters_completed = academic
            .semesters_completed
            .and_then(|n| u32::try_from(n).ok());

        let major = academic
            .major
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string);

        let english_level = language
            .english_test_level
            .as_deref()
            .filter(|l| !l.trim().is_empty())
            .and_then(|l| l.parse::<CefrLevel>().ok());

        EligibilityProfile {
            gpa,
            study_level,
            semesters_completed,
            major,
            languages: trimmed_list(&language.non_english_languages),
            english_tests: trimmed_list(&language.english_test_type),
            english_level,
            availability: self.availability.window(),
            must_be_erasmus: self.preferences.must_be_erasmus == Some(true),
        }
    }
}

impl Availability {
    fn window(&self) -> Option<DateWindow> {
        let start_month = positive(self.start_month)?;
        let end_month = positive(self.end_month)?;
        Some(DateWindow::new(
            MonthDay::opening(start_month, self.start_day.and_then(|d| u32::try_from(d).ok())),
            MonthDay::closing(end_month, self.end_day.and_then(|d| u32::try_from(d).ok())),
        ))
    }
}

fn positive(value: Option<i64>) -> Option<u32> {
    value.filter(|v| *v > 0).and_then(|v| u32::try_from(v).ok())
}

fn trimmed_list(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

/// Trim + lowercase, the comparison key for majors, languages and tests.
pub fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = lenient_f64(deserializer)?;
    Ok(value
        .filter(|v| v.is_finite() && v.fract() == 0.0)
        .map(|v| v as i64))
}

// =============================================================================
// Normalized Profile
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StudyLevel {
    Bachelor,
    Master,
    Unspecified,
}

/// A profile with every default resolved. Built by `UserProfile::eligibility`.
#[derive(Debug, Clone, PartialEq)]
pub struct EligibilityProfile {
    pub gpa: Option<f64>,
    pub study_level: StudyLevel,
    pub semesters_completed: Option<u32>,
    /// Trimmed, original casing (compare with `normalize`).
    pub major: Option<String>,
    /// Non-English languages the student can study in, trimmed.
    pub languages: Vec<String>,
    /// English test types the student holds or can take, trimmed.
    pub english_tests: Vec<String>,
    pub english_level: Option<CefrLevel>,
    pub availability: Option<DateWindow>,
    pub must_be_erasmus: bool,
}
