//! # Orchestration Engine
//!
//! Runs one conversational turn:
//! 1. Serialize on the thread id and load its session state
//! 2. Record the turn (first turn must carry a profile)
//! 3. Ask the router where to enter the cascade
//! 4. Run filter → rank → analyze from that point, checkpointing after
//!    every completed stage
//! 5. Return the analysis text and the full step trace
//!
//! Stages run sequentially within a turn. Turns on different threads run
//! in parallel; turns on the same thread queue behind a per-thread lock.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use catalog::{CandidateRef, CandidateStore, DetailStore, StoreQuery, UserProfile};
use clients::{Enricher, ScoringOracle};
use pipeline::EligibilityFilter;
use serde::Serialize;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::analyzer::{AnalysisSynthesizer, NOTHING_TO_ANALYZE_TEXT, NO_MATCH_TEXT};
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::ranker::PreferenceRanker;
use crate::router::{Router, Stage};
use crate::state::{CheckpointStore, SessionState, StageModule, StateUpdate, StepLog};

/// External collaborators the engine is wired with.
#[derive(Clone)]
pub struct Collaborators {
    pub candidates: Arc<dyn CandidateStore>,
    pub details: Arc<dyn DetailStore>,
    pub oracle: Arc<dyn ScoringOracle>,
    pub enricher: Option<Arc<dyn Enricher>>,
    pub checkpoints: Arc<dyn CheckpointStore>,
}

/// Result of one turn.
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutput {
    pub thread_id: String,
    pub turn_count: u64,
    pub entry_stage: Stage,
    pub analysis: String,
    pub steps: Vec<StepLog>,
}

/// Mutable view of the turn in progress.
struct TurnContext<'a> {
    thread_id: &'a str,
    state: SessionState,
    /// The profile has not been written to the checkpoint store yet.
    profile_pending: bool,
}

#[derive(Clone)]
pub struct OrchestrationEngine {
    candidates: Arc<dyn CandidateStore>,
    checkpoints: Arc<dyn CheckpointStore>,
    filter: Arc<EligibilityFilter>,
    router: Router,
    ranker: PreferenceRanker,
    analyzer: AnalysisSynthesizer,
    thread_locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl OrchestrationEngine {
    pub fn new(collaborators: Collaborators, config: &EngineConfig) -> Self {
        let Collaborators {
            candidates,
            details,
            oracle,
            enricher,
            checkpoints,
        } = collaborators;

        Self {
            candidates,
            checkpoints,
            filter: Arc::new(EligibilityFilter::standard()),
            router: Router::new(oracle.clone()),
            ranker: PreferenceRanker::new(oracle, config.weights.clone(), config.top_k),
            analyzer: AnalysisSynthesizer::new(details, enricher),
            thread_locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Persisted state of a thread, if any.
    pub async fn session(&self, thread_id: &str) -> Result<Option<SessionState>> {
        self.checkpoints.get(thread_id).await
    }

    /// Run one turn on `thread_id`.
    ///
    /// `profile` is required on a thread's first turn and ignored afterwards
    /// (the stored profile is immutable).
    ///
    /// # Errors
    /// - `MissingProfile`: first turn without a profile; nothing persisted
    /// - `DependencyUnavailable`: candidate store unreachable; nothing
    ///   persisted for this turn
    /// - `RankingFailed` / `AnalysisFailed`: stages completed earlier in the
    ///   turn, and the turn itself, stay persisted
    pub async fn run(
        &self,
        turn_text: &str,
        profile: Option<UserProfile>,
        thread_id: &str,
    ) -> Result<TurnOutput> {
        let lock = self.thread_lock(thread_id).await;
        let result = {
            let _guard = lock.lock().await;
            self.run_locked(turn_text, profile, thread_id).await
        };
        self.release_thread_lock(thread_id, lock).await;
        result
    }

    /// Number of threads with a turn in flight or queued.
    pub async fn active_threads(&self) -> usize {
        self.thread_locks.lock().await.len()
    }

    async fn run_locked(
        &self,
        turn_text: &str,
        profile: Option<UserProfile>,
        thread_id: &str,
    ) -> Result<TurnOutput> {
        let start_time = Instant::now();

        let (state, profile_pending) = match self.checkpoints.get(thread_id).await? {
            Some(state) => {
                if profile.is_some() {
                    debug!("Thread {} already has a profile; ignoring the new one", thread_id);
                }
                (state, false)
            }
            None => {
                let Some(profile) = profile else {
                    return Err(EngineError::MissingProfile {
                        thread_id: thread_id.to_string(),
                    });
                };
                (SessionState::new(profile), true)
            }
        };

        let mut ctx = TurnContext {
            thread_id,
            state,
            profile_pending,
        };
        ctx.state.begin_turn(turn_text);
        info!("Thread {} turn {} started", thread_id, ctx.state.turn_count);

        let entry_stage = self.router.choose_entry_stage(&ctx.state, turn_text).await;

        let mut next = Some(entry_stage);
        while let Some(stage) = next {
            let outcome = match stage {
                Stage::Filter => self.run_filter(&mut ctx).await.map(|_| true),
                Stage::Rank => self.run_rank(&mut ctx).await,
                Stage::Analyze => self.run_analyze(&mut ctx).await.map(|_| true),
            };

            match outcome {
                Ok(true) => next = stage.next(),
                Ok(false) => next = None,
                Err(err) => {
                    self.persist_after_failure(&mut ctx, &err).await;
                    return Err(err);
                }
            }
        }

        info!(
            "Thread {} turn {} finished in {:.2?} (entered at {})",
            thread_id,
            ctx.state.turn_count,
            start_time.elapsed(),
            entry_stage
        );

        Ok(TurnOutput {
            thread_id: thread_id.to_string(),
            turn_count: ctx.state.turn_count,
            entry_stage,
            analysis: ctx.state.analysis_text.clone(),
            steps: ctx.state.step_trace.clone(),
        })
    }

    async fn thread_lock(&self, thread_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.thread_locks.lock().await;
        locks.entry(thread_id.to_string()).or_default().clone()
    }

    /// Drop the thread's lock entry once no other turn holds or awaits it.
    ///
    /// Clones are only taken under the outer lock, so the count cannot grow
    /// while it is checked here.
    async fn release_thread_lock(&self, thread_id: &str, lock: Arc<Mutex<()>>) {
        let mut locks = self.thread_locks.lock().await;
        // The map's copy plus ours.
        if Arc::strong_count(&lock) == 2 {
            locks.remove(thread_id);
        }
    }

    // =========================================================================
    // Stages
    // =========================================================================

    async fn run_filter(&self, ctx: &mut TurnContext<'_>) -> Result<()> {
        let eligibility = ctx.state.profile.eligibility();
        let query = StoreQuery::from_profile(&eligibility);

        let records = self.candidates.query(&query).await.map_err(|e| {
            EngineError::DependencyUnavailable {
                dependency: self.candidates.name().to_string(),
                reason: e.to_string(),
            }
        })?;
        let fetched = records.len();

        let filter = self.filter.clone();
        let result = tokio::task::spawn_blocking(move || filter.apply(&eligibility, records))
            .await
            .map_err(|e| EngineError::Internal(format!("filter task failed: {e}")))?;

        info!(
            "Filter kept {} of {} candidates ({} rules applied)",
            result.survivors.len(),
            fetched,
            result.trace.len()
        );

        ctx.state.step_trace.push(StepLog::new(
            StageModule::Filter,
            json!({
                "action": "query candidate store",
                "store": self.candidates.name(),
                "criteria": ctx.state.profile,
            }),
            json!({
                "fetched": fetched,
                "survivors": result.survivor_names(),
                "trace": result.trace,
            }),
        ));
        self.commit(ctx, StateUpdate::default().with_survivors(result.survivors))
            .await
    }

    /// Returns `false` when the empty-survivor guard ends the turn.
    async fn run_rank(&self, ctx: &mut TurnContext<'_>) -> Result<bool> {
        if ctx.state.survivors.is_empty() {
            info!("No eligible candidates; skipping ranking");
            ctx.state
                .step_trace
                .push(StepLog::skipped(StageModule::Ranker, "no eligible candidates"));
            self.commit(
                ctx,
                StateUpdate::default()
                    .with_ranking(Vec::new(), Vec::new())
                    .with_analysis(NO_MATCH_TEXT),
            )
            .await?;
            return Ok(false);
        }

        let preference_text = ctx.state.preference_text();
        let ranking = self
            .ranker
            .rank(&ctx.state.survivors, &preference_text)
            .await?;

        let ranked: Vec<CandidateRef> = ranking
            .entries
            .iter()
            .map(|e| CandidateRef::new(e.name.clone(), e.country.clone()))
            .collect();
        let aggregates: Vec<u32> = ranking.entries.iter().map(|e| e.aggregate).collect();

        ctx.state.step_trace.push(StepLog::new(
            StageModule::Ranker,
            json!({
                "action": "score with oracle",
                "candidates": ctx.state.survivors.len(),
                "preferences": preference_text,
                "top_k": self.ranker.top_k(),
            }),
            json!({
                "top_universities": ranking.names(),
                "aggregate_scores": aggregates,
            }),
        ));
        self.commit(
            ctx,
            StateUpdate::default().with_ranking(ranked, ranking.reasoning()),
        )
        .await?;
        Ok(true)
    }

    async fn run_analyze(&self, ctx: &mut TurnContext<'_>) -> Result<()> {
        if ctx.state.ranked.is_empty() {
            info!("Nothing ranked yet; skipping analysis");
            ctx.state
                .step_trace
                .push(StepLog::skipped(StageModule::Analyzer, "nothing ranked"));
            return self
                .commit(ctx, StateUpdate::default().with_analysis(NOTHING_TO_ANALYZE_TEXT))
                .await;
        }

        let analysis = self
            .analyzer
            .synthesize(&ctx.state.ranked, &ctx.state.reasoning)
            .await?;

        let targets: Vec<&str> = ctx.state.ranked.iter().map(|c| c.name.as_str()).collect();
        let step = StepLog::new(
            StageModule::Analyzer,
            json!({ "action": "gather details", "targets": targets }),
            json!({
                "details_found": analysis.details_found,
                "summaries_found": analysis.summaries_found,
            }),
        );
        ctx.state.step_trace.push(step);
        self.commit(ctx, StateUpdate::default().with_analysis(analysis.text))
            .await
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Apply a stage's update locally and write it, with the turn
    /// bookkeeping and step trace, to the checkpoint store.
    async fn commit(&self, ctx: &mut TurnContext<'_>, update: StateUpdate) -> Result<()> {
        ctx.state.apply(update.clone());

        let mut full = StateUpdate {
            survivors: update.survivors,
            ranking: update.ranking,
            analysis_text: update.analysis_text,
            ..StateUpdate::bookkeeping(&ctx.state)
        };
        if ctx.profile_pending {
            full = full.with_profile(ctx.state.profile.clone());
        }

        self.checkpoints.put(ctx.thread_id, full).await?;
        ctx.profile_pending = false;
        Ok(())
    }

    /// Keep the turn (and anything completed before the failure) when a
    /// later stage fails. Store outages leave the checkpoint untouched.
    async fn persist_after_failure(&self, ctx: &mut TurnContext<'_>, err: &EngineError) {
        warn!(
            "Thread {} turn {} failed: {}",
            ctx.thread_id, ctx.state.turn_count, err
        );
        if !matches!(
            err,
            EngineError::RankingFailed(_) | EngineError::AnalysisFailed(_)
        ) {
            return;
        }
        if let Err(persist_err) = self.commit(ctx, StateUpdate::default()).await {
            warn!("Could not checkpoint failed turn: {}", persist_err);
        }
    }
}
