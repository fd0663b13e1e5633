//! Engine configuration.

use std::path::PathBuf;

use pipeline::{CategoryWeights, ScoreCategory};
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Length of the ranked list.
    pub top_k: usize,

    /// Per-category weights for the aggregate score.
    pub weights: CategoryWeights,

    /// Directory for durable checkpoints; in-memory when unset.
    pub checkpoint_dir: Option<PathBuf>,

    /// Local catalog file; the hosted store is used when unset.
    pub catalog_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            weights: CategoryWeights::uniform(),
            checkpoint_dir: None,
            catalog_path: None,
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by `ADVISOR_TOP_K`, `ADVISOR_WEIGHTS`,
    /// `ADVISOR_CHECKPOINT_DIR` and `ADVISOR_CATALOG_PATH`.
    ///
    /// Unparseable values are logged and ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(raw) = std::env::var("ADVISOR_TOP_K") {
            match raw.trim().parse::<usize>() {
                Ok(k) if k > 0 => config.top_k = k,
                _ => warn!("Ignoring invalid ADVISOR_TOP_K={:?}", raw),
            }
        }
        if let Ok(raw) = std::env::var("ADVISOR_WEIGHTS") {
            config.weights = parse_weights(&raw);
        }
        if let Ok(dir) = std::env::var("ADVISOR_CHECKPOINT_DIR") {
            config.checkpoint_dir = Some(PathBuf::from(dir));
        }
        if let Ok(path) = std::env::var("ADVISOR_CATALOG_PATH") {
            config.catalog_path = Some(PathBuf::from(path));
        }

        config
    }
}

/// Parse `category=weight` pairs separated by commas, e.g.
/// `financial_fit=2,academic_fit=0.5`. Bad pairs are skipped.
pub fn parse_weights(raw: &str) -> CategoryWeights {
    let mut weights = CategoryWeights::uniform();

    for pair in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let parsed = pair.split_once('=').and_then(|(key, value)| {
            let category = ScoreCategory::ALL
                .into_iter()
                .find(|c| c.key() == key.trim())?;
            let weight = value.trim().parse::<f64>().ok()?;
            Some((category, weight))
        });

        match parsed {
            Some((category, weight)) => weights = weights.with_weight(category, weight),
            None => warn!("Ignoring invalid weight {:?}", pair),
        }
    }

    weights
}
