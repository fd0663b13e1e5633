//! Rules over exchange-programme requirements.

use crate::traits::EligibilityRule;
use catalog::{CandidateRecord, EligibilityProfile};

/// Keeps Erasmus partners only, when the student requires Erasmus.
pub struct ErasmusRule;

impl EligibilityRule for ErasmusRule {
    fn name(&self) -> &str {
        "ErasmusRule"
    }

    fn clause(&self, profile: &EligibilityProfile) -> Option<String> {
        profile
            .must_be_erasmus
            .then(|| "Filtered by Erasmus availability".to_string())
    }

    fn admits(&self, candidate: &CandidateRecord, _profile: &EligibilityProfile) -> bool {
        candidate.erasmus_available
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::{profile, record};

    #[test]
    fn test_erasmus_rule() {
        let required = profile(r#"{"preferences": {"must_be_erasmus": true}}"#);
        let optional = profile(r#"{"preferences": {"must_be_erasmus": false}}"#);

        assert!(ErasmusRule.clause(&required).is_some());
        assert!(ErasmusRule.clause(&optional).is_none());
        assert!(ErasmusRule.admits(&record(r#"{"name": "A", "erasmus_available": true}"#), &required));
        assert!(!ErasmusRule.admits(&record(r#"{"name": "B"}"#), &required));
    }
}
