//! Rule implementations for the eligibility pipeline.
//!
//! This module contains the concrete rules that `EligibilityFilter`
//! composes, grouped by the part of the profile they read.

pub mod academic;
pub mod availability;
pub mod languages;
pub mod programme;

// Re-export for convenience
pub use academic::{MinimumGpaRule, MinimumSemestersRule, MscAllowedRule, RestrictedMajorRule};
pub use availability::AvailabilityOverlapRule;
pub use english_test::EnglishTestRule;
pub use languages::{EnglishOnlyRule, LanguageCoverageRule};
pub use programme::ErasmusRule;
