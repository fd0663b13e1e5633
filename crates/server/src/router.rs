//! Entry-stage selection for each turn.

use std::fmt;
use std::sync::Arc;

use clients::ScoringOracle;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::state::SessionState;

/// The three pipeline stages, in cascade order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Filter,
    Rank,
    Analyze,
}

impl Stage {
    /// Map a classifier label to a stage.
    ///
    /// Case, surrounding whitespace and punctuation are ignored
    /// (`" Rank."` → `Rank`); anything else is `None`.
    pub fn from_label(label: &str) -> Option<Stage> {
        let cleaned: String = label
            .trim()
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .collect::<String>()
            .to_ascii_lowercase();

        match cleaned.as_str() {
            "filter" => Some(Stage::Filter),
            "rank" => Some(Stage::Rank),
            "analyze" => Some(Stage::Analyze),
            _ => None,
        }
    }

    /// The stage the cascade continues with, `None` after analyze.
    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::Filter => Some(Stage::Rank),
            Stage::Rank => Some(Stage::Analyze),
            Stage::Analyze => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Filter => "filter",
            Stage::Rank => "rank",
            Stage::Analyze => "analyze",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Chooses where the cascade starts.
#[derive(Clone)]
pub struct Router {
    classifier: Arc<dyn ScoringOracle>,
}

impl Router {
    pub fn new(classifier: Arc<dyn ScoringOracle>) -> Self {
        Self { classifier }
    }

    /// Pick the entry stage for this turn. Never fails.
    ///
    /// ## Algorithm
    /// 1. First turn of a thread → `Filter`
    /// 2. Otherwise ask the classifier for a label
    /// 3. Classifier error or unknown label → `Filter` (logged as
    ///    undecided)
    pub async fn choose_entry_stage(&self, state: &SessionState, turn_text: &str) -> Stage {
        if state.turn_count <= 1 {
            return Stage::Filter;
        }

        match self.classifier.classify_intent(turn_text).await {
            Ok(label) => match Stage::from_label(&label) {
                Some(stage) => {
                    info!("Router chose {} for turn {}", stage, state.turn_count);
                    stage
                }
                None => {
                    warn!("RouterUndecided: unrecognized label {:?}, falling back to filter", label);
                    Stage::Filter
                }
            },
            Err(err) => {
                warn!("RouterUndecided: classifier failed ({}), falling back to filter", err.code());
                Stage::Filter
            }
        }
    }
}
