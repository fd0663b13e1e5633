//! Per-thread session state and the checkpoint stores that persist it.
//!
//! A `SessionState` is created on a thread's first turn and then only ever
//! updated through `StateUpdate`s: each stage replaces the fields it owns and
//! nothing else.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use catalog::{CandidateRef, UserProfile};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::error::{EngineError, Result};

/// Current on-disk layout of `SessionState`.
pub const SESSION_STATE_VERSION: u32 = 1;

// =============================================================================
// Step Trace
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StageModule {
    Filter,
    Ranker,
    Analyzer,
}

/// One stage invocation, as shown to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepLog {
    pub module: StageModule,
    pub request_summary: Value,
    pub response_summary: Value,
}

impl StepLog {
    pub fn new(module: StageModule, request_summary: Value, response_summary: Value) -> Self {
        Self {
            module,
            request_summary,
            response_summary,
        }
    }

    /// A stage that was entered but short-circuited by a guard.
    pub fn skipped(module: StageModule, reason: &str) -> Self {
        Self::new(
            module,
            serde_json::json!({ "action": "skipped" }),
            serde_json::json!({ "skipped": true, "reason": reason }),
        )
    }

    pub fn is_skipped(&self) -> bool {
        self.response_summary
            .get("skipped")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

// =============================================================================
// Session State
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub version: u32,
    pub profile: UserProfile,
    pub turn_history: Vec<String>,
    pub turn_count: u64,
    /// Filter output, `{name, country}` only.
    pub survivors: Vec<CandidateRef>,
    /// Ranker output, best first.
    pub ranked: Vec<CandidateRef>,
    /// Aligned index-for-index with `ranked`.
    pub reasoning: Vec<String>,
    pub analysis_text: String,
    pub step_trace: Vec<StepLog>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            version: SESSION_STATE_VERSION,
            profile: UserProfile::default(),
            turn_history: Vec::new(),
            turn_count: 0,
            survivors: Vec::new(),
            ranked: Vec::new(),
            reasoning: Vec::new(),
            analysis_text: String::new(),
            step_trace: Vec::new(),
        }
    }
}

impl SessionState {
    pub fn new(profile: UserProfile) -> Self {
        Self {
            profile,
            ..Self::default()
        }
    }

    /// Record a new turn.
    pub fn begin_turn(&mut self, turn_text: &str) {
        self.turn_count += 1;
        self.turn_history.push(turn_text.to_string());
    }

    /// Text the ranker scores against: the profile's preferences plus every
    /// follow-up turn after the first.
    pub fn preference_text(&self) -> String {
        let base = self.profile.preference_text();
        let follow_ups: Vec<&str> = self
            .turn_history
            .iter()
            .skip(1)
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect();

        if follow_ups.is_empty() {
            return base.to_string();
        }
        let listed: String = follow_ups.iter().map(|t| format!("\n- {t}")).collect();
        if base.is_empty() {
            format!("Follow-up requests:{listed}")
        } else {
            format!("{base}\n\nFollow-up requests:{listed}")
        }
    }

    pub fn apply(&mut self, update: StateUpdate) {
        let StateUpdate {
            profile,
            turn_history,
            turn_count,
            survivors,
            ranking,
            analysis_text,
            step_trace,
        } = update;

        if let Some(profile) = profile {
            self.profile = profile;
        }
        if let Some(history) = turn_history {
            self.turn_history = history;
        }
        if let Some(count) = turn_count {
            self.turn_count = count;
        }
        if let Some(survivors) = survivors {
            self.survivors = survivors;
        }
        if let Some((ranked, reasoning)) = ranking {
            self.ranked = ranked;
            self.reasoning = reasoning;
        }
        if let Some(text) = analysis_text {
            self.analysis_text = text;
        }
        if let Some(trace) = step_trace {
            self.step_trace = trace;
        }
        self.version = SESSION_STATE_VERSION;
    }
}

/// Partial update. `None` leaves the field untouched.
///
/// `ranking` carries the ranked list and its reasoning together so they
/// cannot drift out of alignment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateUpdate {
    pub profile: Option<UserProfile>,
    pub turn_history: Option<Vec<String>>,
    pub turn_count: Option<u64>,
    pub survivors: Option<Vec<CandidateRef>>,
    pub ranking: Option<(Vec<CandidateRef>, Vec<String>)>,
    pub analysis_text: Option<String>,
    pub step_trace: Option<Vec<StepLog>>,
}

impl StateUpdate {
    /// Turn bookkeeping plus the step trace, taken from `state`.
    pub fn bookkeeping(state: &SessionState) -> Self {
        Self {
            turn_history: Some(state.turn_history.clone()),
            turn_count: Some(state.turn_count),
            step_trace: Some(state.step_trace.clone()),
            ..Self::default()
        }
    }

    pub fn with_profile(mut self, profile: UserProfile) -> Self {
        self.profile = Some(profile);
        self
    }

    pub fn with_survivors(mut self, survivors: Vec<CandidateRef>) -> Self {
        self.survivors = Some(survivors);
        self
    }

    pub fn with_ranking(mut self, ranked: Vec<CandidateRef>, reasoning: Vec<String>) -> Self {
        self.ranking = Some((ranked, reasoning));
        self
    }

    pub fn with_analysis(mut self, text: impl Into<String>) -> Self {
        self.analysis_text = Some(text.into());
        self
    }
}

// =============================================================================
// Checkpoint Stores
// =============================================================================

/// Key-value persistence of session state, keyed by thread id.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    async fn get(&self, thread_id: &str) -> Result<Option<SessionState>>;

    /// Merge `update` into the stored state (or a fresh one) and return
    /// the result.
    async fn put(&self, thread_id: &str, update: StateUpdate) -> Result<SessionState>;
}

/// Process-local store for tests and the harness.
#[derive(Default)]
pub struct InMemoryCheckpointStore {
    states: RwLock<HashMap<String, SessionState>>,
}

impl InMemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn thread_count(&self) -> usize {
        self.states.read().await.len()
    }
}

#[async_trait]
impl CheckpointStore for InMemoryCheckpointStore {
    async fn get(&self, thread_id: &str) -> Result<Option<SessionState>> {
        Ok(self.states.read().await.get(thread_id).cloned())
    }

    async fn put(&self, thread_id: &str, update: StateUpdate) -> Result<SessionState> {
        let mut states = self.states.write().await;
        let state = states.entry(thread_id.to_string()).or_default();
        state.apply(update);
        Ok(state.clone())
    }
}

/// One JSON document per thread under a directory.
///
/// Writes go to a temporary file first and are renamed into place.
pub struct FileCheckpointStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FileCheckpointStore {
    pub async fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| EngineError::Checkpoint(format!("cannot create checkpoint directory: {e}")))?;
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, thread_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", encode_thread_id(thread_id)))
    }

    async fn load(&self, path: &Path) -> Result<Option<SessionState>> {
        let contents = match tokio::fs::read_to_string(path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(EngineError::Checkpoint(format!("cannot read checkpoint: {e}"))),
        };

        let state: SessionState = serde_json::from_str(&contents)
            .map_err(|e| EngineError::Checkpoint(format!("corrupt checkpoint: {e}")))?;
        if state.version > SESSION_STATE_VERSION {
            return Err(EngineError::Checkpoint(format!(
                "checkpoint version {} is newer than supported version {}",
                state.version, SESSION_STATE_VERSION
            )));
        }
        Ok(Some(state))
    }
}

/// File stem for a thread id.
///
/// `[a-z0-9-]` pass through; every other byte of the UTF-8 encoding
/// (including `_` and upper-case letters) becomes `_XX` in upper-case hex.
/// The mapping is injective, also on case-insensitive file systems.
fn encode_thread_id(thread_id: &str) -> String {
    let mut encoded = String::with_capacity(thread_id.len());
    for byte in thread_id.bytes() {
        if byte.is_ascii_lowercase() || byte.is_ascii_digit() || byte == b'-' {
            encoded.push(char::from(byte));
        } else {
            let _ = write!(encoded, "_{byte:02X}");
        }
    }
    encoded
}

#[async_trait]
impl CheckpointStore for FileCheckpointStore {
    async fn get(&self, thread_id: &str) -> Result<Option<SessionState>> {
        self.load(&self.path_for(thread_id)).await
    }

    async fn put(&self, thread_id: &str, update: StateUpdate) -> Result<SessionState> {
        let _guard = self.write_lock.lock().await;
        let path = self.path_for(thread_id);

        let mut state = self.load(&path).await?.unwrap_or_default();
        state.apply(update);

        let json = serde_json::to_string_pretty(&state)
            .map_err(|e| EngineError::Checkpoint(format!("cannot encode checkpoint: {e}")))?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| EngineError::Checkpoint(format!("cannot write checkpoint: {e}")))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| EngineError::Checkpoint(format!("cannot replace checkpoint: {e}")))?;

        debug!("Checkpointed thread {} (turn {})", thread_id, state.turn_count);
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile_with_preferences(text: &str) -> UserProfile {
        let mut profile = UserProfile::default();
        profile.preferences.free_text_preferences = text.to_string();
        profile
    }

    #[test]
    fn test_update_replaces_only_given_fields() {
        let mut state = SessionState::new(profile_with_preferences("beach"));
        state.survivors = vec![CandidateRef::new("A", "X")];

        state.apply(
            StateUpdate::default()
                .with_ranking(vec![CandidateRef::new("A", "X")], vec!["good".to_string()]),
        );

        assert_eq!(state.survivors.len(), 1);
        assert_eq!(state.ranked[0].name, "A");
        assert_eq!(state.reasoning, vec!["good".to_string()]);
        assert_eq!(state.profile.preference_text(), "beach");
    }

    #[test]
    fn test_preference_text_appends_follow_ups() {
        let mut state = SessionState::new(profile_with_preferences("party vibe"));
        state.begin_turn("first");
        assert_eq!(state.preference_text(), "party vibe");

        state.begin_turn("cheaper please");
        state.begin_turn("  ");
        assert_eq!(
            state.preference_text(),
            "party vibe\n\nFollow-up requests:\n- cheaper please"
        );
        assert_eq!(state.turn_count, 3);
    }

    #[test]
    fn test_skipped_step() {
        let step = StepLog::skipped(StageModule::Ranker, "no survivors");
        assert!(step.is_skipped());
        assert!(!StepLog::new(StageModule::Filter, Value::Null, Value::Null).is_skipped());
    }

    #[tokio::test]
    async fn test_in_memory_store_partitions_threads() {
        let store = InMemoryCheckpointStore::new();
        store
            .put("a", StateUpdate::default().with_analysis("for a"))
            .await
            .unwrap();

        assert_eq!(store.get("a").await.unwrap().unwrap().analysis_text, "for a");
        assert!(store.get("b").await.unwrap().is_none());
        assert_eq!(store.thread_count().await, 1);
    }

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCheckpointStore::new(dir.path()).await.unwrap();

        let mut state = SessionState::new(profile_with_preferences("lakes"));
        state.begin_turn("hello");
        store
            .put(
                "user/42",
                StateUpdate::bookkeeping(&state).with_profile(state.profile.clone()),
            )
            .await
            .unwrap();

        let reopened = FileCheckpointStore::new(dir.path()).await.unwrap();
        let loaded = reopened.get("user/42").await.unwrap().unwrap();
        assert_eq!(loaded.turn_count, 1);
        assert_eq!(loaded.profile.preference_text(), "lakes");
        assert!(dir.path().join("user_2F42.json").exists());
    }

    #[test]
    fn test_thread_id_encoding() {
        assert_eq!(encode_thread_id("alice-1"), "alice-1");
        assert_eq!(encode_thread_id("alice/1"), "alice_2F1");
        assert_eq!(encode_thread_id("alice_1"), "alice_5F1");
        assert_eq!(encode_thread_id("alice.1"), "alice_2E1");
        assert_eq!(encode_thread_id("Alice"), "_41lice");
        assert_eq!(encode_thread_id("é"), "_C3_A9");
    }

    #[tokio::test]
    async fn test_file_store_keeps_similar_ids_apart() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCheckpointStore::new(dir.path()).await.unwrap();

        store
            .put("alice/1", StateUpdate::default().with_analysis("slash"))
            .await
            .unwrap();
        store
            .put("alice.1", StateUpdate::default().with_analysis("dot"))
            .await
            .unwrap();

        assert_eq!(store.get("alice/1").await.unwrap().unwrap().analysis_text, "slash");
        assert_eq!(store.get("alice.1").await.unwrap().unwrap().analysis_text, "dot");
        assert!(store.get("alice_1").await.unwrap().is_none());
        assert!(store.get("alice 1").await.unwrap().is_none());
        assert!(store.get("Alice/1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_store_rejects_newer_versions() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCheckpointStore::new(dir.path()).await.unwrap();

        let mut future = serde_json::to_value(SessionState::default()).unwrap();
        future["version"] = serde_json::json!(SESSION_STATE_VERSION + 1);
        std::fs::write(dir.path().join("t.json"), future.to_string()).unwrap();

        let err = store.get("t").await.unwrap_err();
        assert_eq!(err.code(), "checkpoint_error");
    }
}
