//! Store seams consumed by the orchestration engine.
//!
//! `CandidateStore` answers the filter stage's query; `DetailStore` answers
//! the analysis stage's per-candidate lookups. Both are read-only.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::profile::{EligibilityProfile, StudyLevel};
use crate::types::{CandidateDetail, CandidateRecord};

/// Column predicates a store can evaluate itself.
///
/// These are the flat, per-row checks of the eligibility filter (GPA,
/// study level, semesters, English-only, Erasmus). Stores may apply them or
/// ignore them: the full filter runs in-process on whatever comes back, so
/// pushing them down only saves transfer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreQuery {
    /// Keep rows whose `min_gpa` is at most this value (or unset).
    pub gpa_at_least: Option<f64>,
    pub msc_only: bool,
    /// Keep rows whose `min_semesters_completed` is at most this value (or unset).
    pub semesters_at_least: Option<u32>,
    pub english_only: bool,
    pub erasmus_only: bool,
}

impl StoreQuery {
    /// Everything, no pushdown.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn from_profile(profile: &EligibilityProfile) -> Self {
        Self {
            gpa_at_least: profile.gpa,
            msc_only: profile.study_level == StudyLevel::Master,
            semesters_at_least: profile.semesters_completed,
            english_only: profile.languages.is_empty(),
            erasmus_only: profile.must_be_erasmus,
        }
    }

    pub fn matches(&self, record: &CandidateRecord) -> bool {
        self.gpa_at_least.is_none_or(|gpa| record.admits_gpa(gpa))
            && (!self.msc_only || record.msc_allowed)
            && self
                .semesters_at_least
                .is_none_or(|n| record.admits_semesters(n))
            && (!self.english_only || record.english_only_possible)
            && (!self.erasmus_only || record.erasmus_available)
    }
}

/// Source of candidate records for the filter stage.
#[async_trait]
pub trait CandidateStore: Send + Sync {
    /// Short label for logs and step traces.
    fn name(&self) -> &str;

    /// Fetch candidate records. Implementations may apply `query`.
    ///
    /// # Errors
    /// `CatalogError::Unavailable` when the store cannot be reached.
    async fn query(&self, query: &StoreQuery) -> Result<Vec<CandidateRecord>>;
}

/// Per-candidate detail lookups for the analysis stage.
#[async_trait]
pub trait DetailStore: Send + Sync {
    /// `Ok(None)` when the store has no entry for `name`.
    async fn fetch(&self, name: &str) -> Result<Option<CandidateDetail>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::UserProfile;

    #[test]
    fn test_query_from_profile() {
        let profile: UserProfile = serde_json::from_str(
            r#"{"academic": {"gpa": 85, "study_level": "msc"}, "preferences": {"must_be_erasmus": true}}"#,
        )
        .unwrap();
        let query = StoreQuery::from_profile(&profile.eligibility());

        assert_eq!(query.gpa_at_least, Some(85.0));
        assert!(query.msc_only);
        assert!(query.english_only);
        assert!(query.erasmus_only);
        assert_eq!(query.semesters_at_least, None);
    }

    #[test]
    fn test_query_matches_unset_minimums() {
        let query = StoreQuery {
            gpa_at_least: Some(60.0),
            semesters_at_least: Some(2),
            ..StoreQuery::all()
        };

        let open = CandidateRecord::new("Open", "Nowhere");
        let mut strict = CandidateRecord::new("Strict", "Nowhere");
        strict.min_gpa = Some(90.0);

        assert!(query.matches(&open));
        assert!(!query.matches(&strict));
    }
}
