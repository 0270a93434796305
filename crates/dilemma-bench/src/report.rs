//! Console reporting for a finished benchmark.

use chrono::{DateTime, Local};
use dilemma_rs::tournament::{IterationOutcome, PlayerSummary};
use std::fmt::Write;
use tracing::info;

use crate::config::BenchConfig;

/// Facts about the run as a whole.
#[derive(Debug, Clone)]
pub struct RunMetadata {
    pub started_at: DateTime<Local>,
    pub iterations: u32,
    pub turns_per_match: u32,
    pub base_seed: u64,
    pub total_players: usize,
    pub classic_players: usize,
    pub llm_players: usize,
    pub include_regular: bool,
    pub include_grounding: bool,
    pub max_tokens: u32,
    pub temperature: f32,
    pub catalog_version: u32,
}

impl RunMetadata {
    pub fn new(
        config: &BenchConfig,
        classic_players: usize,
        llm_players: usize,
        catalog_version: u32,
    ) -> Self {
        Self {
            started_at: Local::now(),
            iterations: config.iterations,
            turns_per_match: config.turns,
            base_seed: config.seed,
            total_players: classic_players + llm_players,
            classic_players,
            llm_players,
            include_regular: config.include_regular,
            include_grounding: config.include_grounding,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            catalog_version,
        }
    }

    /// Log the run header at info level.
    pub fn log(&self) {
        info!("Benchmark started {}", self.started_at.to_rfc3339());
        info!(
            "  iterations={}, turns/match={}, base seed={}",
            self.iterations, self.turns_per_match, self.base_seed
        );
        info!(
            "  players: {} total ({} classic, {} LLM)",
            self.total_players, self.classic_players, self.llm_players
        );
        info!(
            "  regular models: {}, grounding models: {}, catalog v{}",
            self.include_regular, self.include_grounding, self.catalog_version
        );
        info!(
            "  max tokens: {}, temperature: {}",
            self.max_tokens, self.temperature
        );
    }
}

/// Render the cross-iteration summary as a fixed-width table.
pub fn format_summary(summaries: &[PlayerSummary]) -> String {
    let name_width = summaries
        .iter()
        .map(|s| s.name.chars().count())
        .max()
        .unwrap_or(0)
        .max("Player".len());

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>4}  {:<name_width$}  {:>9}  {:>7}  {:>7}  {:>8}  {:>5}  {:>6}",
        "#", "Player", "Avg score", "Min", "Max", "Avg rank", "Wins", "Coop %"
    );
    let _ = writeln!(out, "{}", "-".repeat(name_width + 66));
    for (pos, s) in summaries.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>4}  {:<name_width$}  {:>9.1}  {:>7}  {:>7}  {:>8.2}  {:>5}  {:>6.1}",
            pos + 1,
            s.name,
            s.avg_score,
            s.min_score,
            s.max_score,
            s.avg_rank,
            s.total_wins,
            s.avg_cooperation_rate * 100.0
        );
    }
    out
}

/// One line per iteration: completed with its leader, or failed with the error.
pub fn format_outcomes(outcomes: &[IterationOutcome]) -> String {
    let mut out = String::new();
    for outcome in outcomes {
        let _ = match outcome {
            IterationOutcome::Completed(r) => writeln!(
                out,
                "Iteration {} (seed {}): completed in {:.1}s, winner {}, {} forfeit(s)",
                r.iteration,
                r.seed,
                r.duration_secs,
                r.ranked_names.first().map_or("-", String::as_str),
                r.forfeits.len()
            ),
            IterationOutcome::Failed {
                iteration,
                seed,
                error,
            } => writeln!(out, "Iteration {iteration} (seed {seed}): FAILED: {error}"),
        };
    }
    out
}
