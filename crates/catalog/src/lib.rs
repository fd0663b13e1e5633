//! # Catalog Crate
//!
//! Domain types and data access for the exchange advisor.
//!
//! ## Main Components
//!
//! - **types**: candidate records, CEFR levels, calendar windows, detail objects
//! - **profile**: the student profile as received, and its normalized form
//! - **store**: the `CandidateStore` / `DetailStore` seams and pushdown query
//! - **parser**: JSON catalog files
//! - **index**: in-memory catalog implementing both stores
//! - **error**: error types for catalog access
//!
//! ## Example Usage
//!
//! ```ignore
//! use catalog::{CandidateIndex, CandidateStore, StoreQuery, UserProfile};
//! use std::path::Path;
//!
//! let index = CandidateIndex::load_from_file(Path::new("data/universities.json"))?;
//! let profile: UserProfile = serde_json::from_str(&profile_json)?;
//! let query = StoreQuery::from_profile(&profile.eligibility());
//! let rows = index.query(&query).await?;
//! ```

pub mod error;
pub mod index;
pub mod parser;
pub mod profile;
pub mod store;
pub mod types;

// Re-export commonly used types for convenience
pub use error::{CatalogError, Result};
pub use index::CandidateIndex;
pub use profile::{
    AcademicProfile, Availability, EligibilityProfile, LanguageProfile, Preferences, StudyLevel,
    UserProfile,
};
pub use store::{CandidateStore, DetailStore, StoreQuery};
pub use types::{
    CandidateDetail, CandidateRecord, CandidateRef, CefrLevel, DateWindow, MonthDay,
    SemesterWindow,
};
