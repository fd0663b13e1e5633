//! Server crate for the exchange advisor.
//!
//! This crate contains the orchestration engine that runs each
//! conversational turn through the filter → rank → analyze cascade, plus
//! the session state it checkpoints between turns.
//!
//! ## Modules
//! - **engine**: per-turn orchestration, checkpointing, per-thread locking
//! - **router**: entry-stage selection
//! - **ranker**: oracle scores → top-K ranking
//! - **analyzer**: ranked list → narrative
//! - **state**: session state, partial updates, checkpoint stores
//! - **config** / **bootstrap**: configuration and production wiring

pub mod analyzer;
pub mod bootstrap;
pub mod config;
pub mod engine;
pub mod error;
pub mod ranker;
pub mod router;
pub mod state;

pub use analyzer::{Analysis, AnalysisSynthesizer, NOTHING_TO_ANALYZE_TEXT, NO_MATCH_TEXT};
pub use bootstrap::build_engine;
pub use config::EngineConfig;
pub use engine::{Collaborators, OrchestrationEngine, TurnOutput};
pub use error::{EngineError, Result};
pub use ranker::PreferenceRanker;
pub use router::{Router, Stage};
pub use state::{
    CheckpointStore, FileCheckpointStore, InMemoryCheckpointStore, SessionState, StageModule,
    StateUpdate, StepLog,
};
