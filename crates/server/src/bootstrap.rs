//! Wiring of the production collaborators.

use std::sync::Arc;

use anyhow::{Context, Result};
use catalog::{CandidateIndex, CandidateStore, DetailStore};
use clients::{Enricher, LlmClient, LlmScoringOracle, RestCandidateStore, WikipediaEnricher};
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::engine::{Collaborators, OrchestrationEngine};
use crate::state::{CheckpointStore, FileCheckpointStore, InMemoryCheckpointStore};

/// Build an engine from `config` and the environment.
///
/// - catalog: local file when `catalog_path` is set, the hosted store
///   (`SUPABASE_*`) otherwise
/// - oracle: chat-completions client from `LLMOD_*`
/// - enrichment: Wikipedia; left out if its client cannot be built
/// - checkpoints: one file per thread under `checkpoint_dir`, in memory
///   when unset
pub async fn build_engine(config: &EngineConfig) -> Result<OrchestrationEngine> {
    let (candidates, details): (Arc<dyn CandidateStore>, Arc<dyn DetailStore>) =
        match &config.catalog_path {
            Some(path) => {
                let index = Arc::new(
                    CandidateIndex::load_from_file(path)
                        .with_context(|| format!("loading catalog from {}", path.display()))?,
                );
                info!("Loaded {} candidates from {}", index.len(), path.display());
                (index.clone() as Arc<dyn CandidateStore>, index as Arc<dyn DetailStore>)
            }
            None => {
                let store = Arc::new(
                    RestCandidateStore::from_env().context("configuring the candidate store")?,
                );
                info!("Using hosted candidate store");
                (store.clone() as Arc<dyn CandidateStore>, store as Arc<dyn DetailStore>)
            }
        };

    let llm = LlmClient::from_env().context("configuring the language model client")?;
    info!("Scoring with model {}", llm.model());
    let oracle = Arc::new(LlmScoringOracle::new(Arc::new(llm)));

    let enricher: Option<Arc<dyn Enricher>> = match WikipediaEnricher::new() {
        Ok(enricher) => Some(Arc::new(enricher)),
        Err(err) => {
            warn!("Summaries disabled: {}", err);
            None
        }
    };

    let checkpoints: Arc<dyn CheckpointStore> = match &config.checkpoint_dir {
        Some(dir) => Arc::new(
            FileCheckpointStore::new(dir.clone())
                .await
                .with_context(|| format!("opening checkpoint directory {}", dir.display()))?,
        ),
        None => Arc::new(InMemoryCheckpointStore::new()),
    };

    Ok(OrchestrationEngine::new(
        Collaborators {
            candidates,
            details,
            oracle,
            enricher,
            checkpoints,
        },
        config,
    ))
}
