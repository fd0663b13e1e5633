//! Simple test harness for the orchestration engine.
//!
//! Runs one turn for a sample student profile and logs the step trace and
//! the final analysis. Needs `LLMOD_*` set, plus either
//! `ADVISOR_CATALOG_PATH` or the `SUPABASE_*` variables.

use anyhow::{Context, Result};
use catalog::UserProfile;
use tracing::info;
use tracing_subscriber::EnvFilter;

use server::{build_engine, EngineConfig};

const SAMPLE_PROFILE: &str = r#"{
    "academic": {"gpa": 88, "major": "Computer Science", "study_level": "msc", "semesters_completed": 5},
    "language": {"non_english_languages": ["German"], "english_test_type": ["TOEFL"], "english_test_level": "C1"},
    "availability": {"start_month": 2, "end_month": 7},
    "preferences": {"free_text_preferences": "affordable city, strong AI research, lively student life"}
}"#;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,server=debug,pipeline=debug")),
        )
        .init();

    info!("Starting exchange advisor test harness");

    let mut config = EngineConfig::from_env();
    if config.catalog_path.is_none() && std::env::var("SUPABASE_URL").is_err() {
        config.catalog_path = Some("data/universities.json".into());
    }

    let engine = build_engine(&config).await.context("building the engine")?;
    let profile: UserProfile =
        serde_json::from_str(SAMPLE_PROFILE).context("parsing the sample profile")?;

    let thread_id = "harness";
    let output = engine
        .run("Recommend exchange universities for me", Some(profile), thread_id)
        .await
        .context("running the first turn")?;

    info!(
        "Turn {} on {} entered at {} with {} steps",
        output.turn_count,
        output.thread_id,
        output.entry_stage,
        output.steps.len()
    );
    for step in &output.steps {
        info!("{:?}: {}", step.module, step.response_summary);
    }
    info!("\n{}", output.analysis);

    Ok(())
}
