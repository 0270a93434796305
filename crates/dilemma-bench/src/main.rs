//! Prisoner's dilemma benchmark: LLM players against classical strategies.
//!
//! API keys are read from `ANTHROPIC_API_KEY`, `OPENAI_API_KEY` and
//! `GEMINI_API_KEY`. Log verbosity follows `RUST_LOG` (default `info`).
//!
//! # Examples
//!
//! ```sh
//! dilemma-bench --iterations 5 --turns 200
//! dilemma-bench --iterations 1 --turns 30 --skip-grounding --forfeit-on-error
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use dilemma_bench::{BenchConfig, RunMetadata, build_roster, format_outcomes, format_summary};
use dilemma_rs::catalog::ProviderFamily;
use dilemma_rs::provider::{Credentials, PromptRunner, ProviderGateway};
use dilemma_rs::tournament::{FailurePolicy, IterationOutcome, Tournament, summarize};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Run iterated prisoner's dilemma tournaments between LLMs and classical strategies.
#[derive(Parser)]
#[command(name = "dilemma-bench", version)]
struct Cli {
    /// Number of tournament iterations.
    #[arg(long)]
    iterations: u32,

    /// Turns per match.
    #[arg(long)]
    turns: u32,

    /// Base random seed; iteration i uses seed + i.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Leave out models without grounding.
    #[arg(long)]
    skip_regular: bool,

    /// Leave out grounding-enabled models.
    #[arg(long)]
    skip_grounding: bool,

    /// Leave out the classical strategy lineup.
    #[arg(long)]
    no_classic: bool,

    /// Maximum tokens per LLM reply.
    #[arg(long, default_value_t = 1024)]
    max_tokens: u32,

    /// Sampling temperature.
    #[arg(long, default_value_t = 1.0)]
    temperature: f32,

    /// Turns shown by the recent-history prompts.
    #[arg(long, default_value_t = 5)]
    history_window: usize,

    /// Percent chance per turn that the game ends, as told to probabilistic-end prompts.
    #[arg(long, default_value_t = 10.0)]
    end_probability: f64,

    /// JSON model catalog to use instead of the builtin one.
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Refresh these families' model lists from the vendor listing endpoints.
    #[arg(long, num_args = 1..)]
    refresh_catalog: Vec<ProviderFamily>,

    /// Matches played concurrently within an iteration.
    #[arg(long, default_value_t = 1)]
    match_concurrency: usize,

    /// Forfeit a failing match instead of abandoning the whole iteration.
    #[arg(long)]
    forfeit_on_error: bool,

    /// Per-request HTTP timeout in seconds.
    #[arg(long, default_value_t = 120)]
    timeout_secs: u64,
}

impl Cli {
    fn into_config(self) -> BenchConfig {
        BenchConfig {
            iterations: self.iterations,
            turns: self.turns,
            seed: self.seed,
            include_regular: !self.skip_regular,
            include_grounding: !self.skip_grounding,
            include_classic: !self.no_classic,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            history_window: self.history_window,
            end_probability: self.end_probability,
            match_concurrency: self.match_concurrency,
            failure_policy: if self.forfeit_on_error {
                FailurePolicy::ForfeitMatch
            } else {
                FailurePolicy::AbortIteration
            },
            timeout: Duration::from_secs(self.timeout_secs),
            catalog_path: self.catalog,
            refresh_families: self.refresh_catalog,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Cli::parse().into_config();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    config.validate()?;

    let credentials = Credentials::from_env();
    for family in ProviderFamily::PRIORITY {
        if !credentials.has(family) {
            warn!("{} is not set; {family} players will fail", family.api_key_var());
        }
    }

    let catalog = config.load_catalog().context("failed to load model catalog")?;
    let mut gateway = ProviderGateway::with_timeout(catalog, credentials.clone(), config.timeout)?;
    if !config.refresh_families.is_empty() {
        let refreshed = gateway
            .refresh_catalog(&config.refresh_families)
            .await
            .context("failed to refresh model catalog")?;
        info!(
            "Catalog refreshed to v{} ({} models)",
            refreshed.version,
            refreshed.model_count()
        );
        gateway = ProviderGateway::with_timeout(refreshed, credentials, config.timeout)?;
    }
    let gateway = Arc::new(gateway);
    let catalog = gateway.catalog().clone();

    let runner: Arc<dyn PromptRunner> = gateway.clone();
    let roster = build_roster(&config, &catalog, runner)?;
    RunMetadata::new(&config, roster.classic_count, roster.llm_count, catalog.version).log();

    let mut outcomes = Vec::with_capacity(config.iterations as usize);
    for index in 0..config.iterations {
        let iteration = index + 1;
        let seed = config.iteration_seed(index);
        let tournament = Tournament::new(roster.players.clone(), config.tournament_config(index));
        info!(
            "Iteration {iteration}/{} (seed {seed}, {} matches)",
            config.iterations,
            tournament.match_count()
        );
        match tournament.play(iteration).await {
            Ok(result) => {
                info!(
                    "Iteration {iteration} finished in {:.1}s, winner {}",
                    result.duration_secs,
                    result.ranked_names.first().map_or("-", String::as_str)
                );
                outcomes.push(IterationOutcome::Completed(result));
            }
            Err(e) => {
                warn!("Iteration {iteration} failed: {e}");
                outcomes.push(IterationOutcome::Failed {
                    iteration,
                    seed,
                    error: e.to_string(),
                });
            }
        }
    }

    print!("{}", format_outcomes(&outcomes));
    let summaries = summarize(&outcomes);
    if summaries.is_empty() {
        warn!("No iteration completed");
    } else {
        println!();
        print!("{}", format_summary(&summaries));
    }

    let usage = gateway.usage();
    if !usage.is_empty() {
        info!("Usage: {}", usage.summary());
    }
    Ok(())
}
