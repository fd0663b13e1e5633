//! HTTP collaborators for the exchange advisor.
//!
//! This crate provides:
//! - `LlmClient`: chat-completions client with timeout and bounded retries
//! - `ScoringOracle` / `Enricher` seams and `LlmScoringOracle`
//! - `RestCandidateStore`: PostgREST candidate and detail store
//! - `WikipediaEnricher`: public page summaries for the analysis stage
//! - `ProfileExtractor`: free text → `UserProfile`
//! - the static reference tables used in scoring prompts
//!
//! Every error surfaced from here is sanitized: no URLs, headers or keys.

pub mod error;
pub mod llm;
pub mod oracle;
pub mod profile;
pub mod prompts;
pub mod reference;
pub mod retry;
pub mod supabase;
pub mod wikipedia;

// Re-export main types
pub use error::{ClientError, Result};
pub use llm::{ChatBackend, ChatRequest, LlmClient, LlmConfig};
pub use oracle::{Enricher, LlmScoringOracle, ScoringOracle};
pub use profile::{default_profile, ProfileExtractor};
pub use reference::ReferenceTables;
pub use retry::RetryPolicy;
pub use supabase::{RestCandidateStore, SupabaseConfig};
pub use wikipedia::WikipediaEnricher;
