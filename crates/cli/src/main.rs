use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use colored::Colorize;
use catalog::{CandidateIndex, UserProfile};
use clients::{LlmClient, ProfileExtractor};
use pipeline::EligibilityFilter;
use server::{
    CheckpointStore, EngineConfig, FileCheckpointStore, OrchestrationEngine, TurnOutput,
    build_engine,
};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, BufReader};

const DEFAULT_CATALOG: &str = "data/universities.json";

/// Exchange Advisor - university exchange recommendations
#[derive(Parser)]
#[command(name = "exchange-advisor")]
#[command(about = "Filter, rank and explain exchange universities for a student", long_about = None)]
struct Cli {
    /// Local catalog file (JSON). The hosted store is used when unset.
    #[arg(long, global = true, env = "ADVISOR_CATALOG_PATH")]
    catalog: Option<PathBuf>,

    /// Directory holding one checkpoint file per conversation thread
    #[arg(
        long,
        global = true,
        env = "ADVISOR_CHECKPOINT_DIR",
        default_value = ".advisor-checkpoints"
    )]
    checkpoint_dir: PathBuf,

    /// Number of universities in the ranked list
    #[arg(long, global = true, env = "ADVISOR_TOP_K")]
    top_k: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Talk to the advisor: one turn, or an interactive session without a message
    Chat {
        /// Conversation thread id
        #[arg(long, default_value = "default")]
        thread: String,

        /// Student profile: a JSON file, inline JSON, or free text
        #[arg(long)]
        profile: Option<String>,

        /// Print every step of the turn
        #[arg(long)]
        explain: bool,

        /// Message for a single turn
        message: Vec<String>,
    },

    /// Run the eligibility filter offline against a catalog file
    Filter {
        /// Student profile: a JSON file or inline JSON
        #[arg(long)]
        profile: String,
    },

    /// Show the stored state of a conversation thread
    Inspect {
        /// Conversation thread id
        #[arg(long, default_value = "default")]
        thread: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = EngineConfig::from_env();
    config.checkpoint_dir = Some(cli.checkpoint_dir.clone());
    if let Some(catalog) = &cli.catalog {
        config.catalog_path = Some(catalog.clone());
    }
    if let Some(top_k) = cli.top_k.filter(|k| *k > 0) {
        config.top_k = top_k;
    }

    match cli.command {
        Commands::Chat {
            thread,
            profile,
            explain,
            message,
        } => handle_chat(&config, &thread, profile, explain, message).await?,
        Commands::Filter { profile } => handle_filter(&config, &profile)?,
        Commands::Inspect { thread } => handle_inspect(&cli.checkpoint_dir, &thread).await?,
    }

    Ok(())
}

/// Handle the 'chat' command
async fn handle_chat(
    config: &EngineConfig,
    thread: &str,
    profile: Option<String>,
    explain: bool,
    message: Vec<String>,
) -> Result<()> {
    let engine = build_engine(config).await?;

    let profile = match profile {
        Some(raw) => Some(resolve_profile(&raw).await?),
        None => None,
    };

    let message = message.join(" ");
    if !message.trim().is_empty() {
        let start = Instant::now();
        let output = engine
            .run(&message, profile, thread)
            .await
            .map_err(|e| anyhow::anyhow!(e.sanitized()))?;
        print_turn(&output, explain);
        println!("{} Finished in {:.2?}", "✓".green(), start.elapsed());
        return Ok(());
    }

    println!(
        "{}",
        format!("Exchange advisor, thread '{thread}'. Type 'exit' to leave.").bold().blue()
    );
    let mut conversation = Conversation::new(&engine, thread, profile);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} ", ">".cyan());
        std::io::stdout().flush().ok();

        let Some(line) = lines.next_line().await.context("reading from stdin")? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line, "exit" | "quit") {
            break;
        }

        match conversation.send(line).await {
            Ok(output) => print_turn(&output, explain),
            Err(reason) => println!("{} {}", "✗".red(), reason),
        }
    }

    Ok(())
}

/// An interactive session on one thread.
///
/// The profile is offered with every turn until one succeeds, so a first
/// turn that failed before anything was stored can be retried.
struct Conversation<'a> {
    engine: &'a OrchestrationEngine,
    thread: &'a str,
    pending_profile: Option<UserProfile>,
}

impl<'a> Conversation<'a> {
    fn new(engine: &'a OrchestrationEngine, thread: &'a str, profile: Option<UserProfile>) -> Self {
        Self {
            engine,
            thread,
            pending_profile: profile,
        }
    }

    async fn send(&mut self, text: &str) -> std::result::Result<TurnOutput, String> {
        let output = self
            .engine
            .run(text, self.pending_profile.clone(), self.thread)
            .await
            .map_err(|e| e.sanitized())?;
        self.pending_profile = None;
        Ok(output)
    }
}

/// Handle the 'filter' command
fn handle_filter(config: &EngineConfig, profile: &str) -> Result<()> {
    let path = config
        .catalog_path
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CATALOG));
    let index = CandidateIndex::load_from_file(&path)
        .with_context(|| format!("Failed to load catalog from {}", path.display()))?;

    let text = read_profile_source(profile)?;
    let profile: UserProfile =
        serde_json::from_str(&text).context("Profile must be JSON for offline filtering")?;

    let result = EligibilityFilter::standard().apply(&profile.eligibility(), index.records().to_vec());

    println!("{}", "Applied filters:".bold().blue());
    for clause in &result.trace {
        println!("{}{}", "• ".green(), clause);
    }
    println!(
        "{}",
        format!("Eligible universities ({} of {}):", result.survivors.len(), index.len())
            .bold()
            .blue()
    );
    for survivor in &result.survivors {
        println!("  - {}", survivor);
    }

    Ok(())
}

/// Handle the 'inspect' command
async fn handle_inspect(checkpoint_dir: &Path, thread: &str) -> Result<()> {
    let store = FileCheckpointStore::new(checkpoint_dir)
        .await
        .with_context(|| format!("Failed to open {}", checkpoint_dir.display()))?;

    let Some(state) = store.get(thread).await? else {
        println!("No conversation stored for thread '{}'", thread);
        return Ok(());
    };

    println!("{}", format!("Thread '{}':", thread).bold().blue());
    println!("{}Turns: {}", "• ".green(), state.turn_count);
    for (i, turn) in state.turn_history.iter().enumerate() {
        println!("    {}. {}", i + 1, turn);
    }
    println!(
        "{}Eligible: {}",
        "• ".green(),
        state
            .survivors
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("{}Ranked:", "• ".green());
    for (i, (candidate, reasoning)) in state.ranked.iter().zip(&state.reasoning).enumerate() {
        println!("    {}. {} - {}", i + 1, candidate, reasoning);
    }
    println!("{}Steps recorded: {}", "• ".cyan(), state.step_trace.len());
    if !state.analysis_text.is_empty() {
        println!("\n{}", state.analysis_text);
    }

    Ok(())
}

/// Turn a `--profile` value into a profile, asking the language model when
/// the value is free text.
async fn resolve_profile(raw: &str) -> Result<UserProfile> {
    let text = read_profile_source(raw)?;
    if let Ok(profile) = serde_json::from_str::<UserProfile>(&text) {
        if !profile.is_blank() {
            return Ok(profile);
        }
    }

    let llm = LlmClient::from_env().context("Free-text profiles need the language model")?;
    let extractor = ProfileExtractor::new(Arc::new(llm));
    Ok(extractor.extract(&text).await)
}

/// The contents of `value` when it names a file, else `value` itself.
fn read_profile_source(value: &str) -> Result<String> {
    let path = Path::new(value);
    if path.is_file() {
        return std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read profile from {}", path.display()));
    }
    if value.trim().is_empty() {
        bail!("Profile is empty");
    }
    Ok(value.to_string())
}

/// Helper function to print one turn
fn print_turn(output: &TurnOutput, explain: bool) {
    println!(
        "{}",
        format!(
            "Turn {} on thread '{}' (entered at {})",
            output.turn_count, output.thread_id, output.entry_stage
        )
        .bold()
        .blue()
    );

    if explain {
        for step in &output.steps {
            println!("{}{:?}", "• ".green(), step.module);
            println!("    request:  {}", step.request_summary);
            println!("    response: {}", step.response_summary);
        }
    }

    println!("\n{}", output.analysis);
}
