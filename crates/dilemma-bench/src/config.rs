//! Benchmark configuration with sensible defaults.
//!
//! [`BenchConfig`] captures one benchmark run and converts it into
//! dilemma-rs types via [`tournament_config`](BenchConfig::tournament_config)
//! and [`agent_config`](BenchConfig::agent_config).

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

use dilemma_rs::agent::AgentConfig;
use dilemma_rs::catalog::{ModelCatalog, ModelSpec, ProviderFamily};
use dilemma_rs::tournament::{FailurePolicy, TournamentConfig};

use crate::prompts::{GameHorizon, PromptVariant};

/// Configuration for a benchmark run.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchConfig {
    /// Number of tournament iterations. Default: `1`.
    pub iterations: u32,
    /// Turns per match. Default: `200`.
    pub turns: u32,
    /// Base seed; iteration `i` (0-based) uses `seed + i`. Default: `42`.
    pub seed: u64,
    /// Field LLM players without grounding. Default: `true`.
    pub include_regular: bool,
    /// Field grounding-enabled LLM players. Default: `true`.
    pub include_grounding: bool,
    /// Field the classical strategy lineup. Default: `true`.
    pub include_classic: bool,
    /// Maximum tokens per LLM reply. Default: `1024`.
    pub max_tokens: u32,
    /// Sampling temperature. Default: `1.0`.
    pub temperature: f32,
    /// Turns shown by the recent-history prompts. Default: `5`.
    pub history_window: usize,
    /// Percent chance of ending per turn, for probabilistic-end prompts. Default: `10`.
    pub end_probability: f64,
    /// Matches in flight at once. Default: `1`.
    pub match_concurrency: usize,
    pub failure_policy: FailurePolicy,
    /// Per-request HTTP timeout. Default: `120` seconds.
    pub timeout: Duration,
    /// JSON catalog to load instead of the builtin table.
    pub catalog_path: Option<PathBuf>,
    /// Families whose model lists are refreshed from the vendor at startup.
    pub refresh_families: Vec<ProviderFamily>,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            iterations: 1,
            turns: 200,
            seed: 42,
            include_regular: true,
            include_grounding: true,
            include_classic: true,
            max_tokens: dilemma_rs::agent::DEFAULT_MAX_OUTPUT_TOKENS,
            temperature: dilemma_rs::agent::DEFAULT_TEMPERATURE,
            history_window: 5,
            end_probability: 10.0,
            match_concurrency: 1,
            failure_policy: FailurePolicy::AbortIteration,
            timeout: dilemma_rs::provider::DEFAULT_TIMEOUT,
            catalog_path: None,
            refresh_families: Vec::new(),
        }
    }
}

impl BenchConfig {
    /// Reject combinations that cannot produce a meaningful run.
    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.include_regular && !self.include_grounding {
            anyhow::bail!("cannot skip both regular and grounding models");
        }
        if self.iterations == 0 {
            anyhow::bail!("--iterations must be at least 1");
        }
        if self.turns == 0 {
            anyhow::bail!("--turns must be at least 1");
        }
        if !(0.0..=100.0).contains(&self.end_probability) {
            anyhow::bail!(
                "--end-probability must be a percentage in [0, 100], got {}",
                self.end_probability
            );
        }
        Ok(())
    }

    /// Load the configured catalog, or the builtin table.
    pub fn load_catalog(&self) -> dilemma_rs::Result<ModelCatalog> {
        match &self.catalog_path {
            Some(path) => ModelCatalog::from_json_file(path),
            None => Ok(ModelCatalog::builtin()),
        }
    }

    /// Seed for 0-based iteration `index`.
    pub fn iteration_seed(&self, index: u32) -> u64 {
        self.seed.wrapping_add(u64::from(index))
    }

    pub fn tournament_config(&self, index: u32) -> TournamentConfig {
        TournamentConfig::new(self.turns, self.iteration_seed(index))
            .with_match_concurrency(self.match_concurrency)
            .with_failure_policy(self.failure_policy)
    }

    /// Model specs to field, regular first, honoring the include flags.
    pub fn model_specs(&self, catalog: &ModelCatalog) -> Vec<ModelSpec> {
        let mut specs = Vec::new();
        if self.include_regular {
            specs.extend(catalog.regular_specs());
        }
        if self.include_grounding {
            specs.extend(catalog.grounding_specs());
        }
        specs
    }

    /// Build the agent settings for one model and prompt variant.
    pub fn agent_config(&self, model: ModelSpec, variant: &PromptVariant) -> AgentConfig {
        let name = player_name(&model, variant);
        let window = if variant.windowed {
            NonZeroUsize::new(self.history_window)
        } else {
            None
        };
        let (total_turns, end_probability) = match variant.horizon {
            GameHorizon::Unstated => (None, None),
            GameHorizon::FixedTurns => (Some(self.turns), None),
            GameHorizon::ProbabilisticEnd => (None, Some(self.end_probability)),
        };

        AgentConfig::new(name, model, variant.template)
            .with_max_output_tokens(self.max_tokens)
            .with_temperature(self.temperature)
            .with_history_window(window)
            .with_total_turns(total_turns)
            .with_end_probability(end_probability)
    }
}

/// `<model>_<suffix>`, or `<model>_GROUNDING_<suffix>` for grounded models.
pub fn player_name(model: &ModelSpec, variant: &PromptVariant) -> String {
    if model.supports_grounding {
        format!("{}_GROUNDING_{}", model.model_id, variant.name_suffix)
    } else {
        format!("{}_{}", model.model_id, variant.name_suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompts::prompt_variants;

    #[test]
    fn defaults_match_cli_defaults() {
        let config = BenchConfig::default();
        assert_eq!(config.seed, 42);
        assert_eq!(config.max_tokens, 1024);
        assert!((config.temperature - 1.0).abs() < f32::EPSILON);
        assert_eq!(config.history_window, 5);
        assert_eq!(config.end_probability, 10.0);
        assert_eq!(config.failure_policy, FailurePolicy::AbortIteration);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn skipping_both_model_kinds_is_rejected() {
        let config = BenchConfig {
            include_regular: false,
            include_grounding: false,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("both"));
    }

    #[test]
    fn iteration_seeds_are_consecutive() {
        let config = BenchConfig::default();
        assert_eq!(config.iteration_seed(0), 42);
        assert_eq!(config.tournament_config(3).seed, 45);
    }

    #[test]
    fn agent_config_follows_variant() {
        let config = BenchConfig {
            turns: 50,
            ..Default::default()
        };
        let variants = prompt_variants();
        let spec = ModelSpec::new(ProviderFamily::OpenAi, "gpt-4o");

        let full = config.agent_config(spec.clone(), &variants[0]);
        assert_eq!(full.display_name, "gpt-4o_FullHist");
        assert_eq!(full.history_window, None);
        assert_eq!(full.total_turns, None);

        let predet = config.agent_config(spec.clone(), &variants[3]);
        assert_eq!(predet.history_window, NonZeroUsize::new(5));
        assert_eq!(predet.total_turns, Some(50));

        let grounded = ModelSpec::grounded(ProviderFamily::OpenAi, "gpt-4o");
        let prob = config.agent_config(grounded, &variants[4]);
        assert_eq!(prob.display_name, "gpt-4o_GROUNDING_ProbEndFullHist");
        assert_eq!(prob.end_probability, Some(10.0));
    }

    #[test]
    fn model_specs_honor_flags() {
        let catalog = ModelCatalog::builtin();
        let regular_only = BenchConfig {
            include_grounding: false,
            ..Default::default()
        };
        let specs = regular_only.model_specs(&catalog);
        assert!(!specs.is_empty());
        assert!(specs.iter().all(|s| !s.supports_grounding));

        let grounding_only = BenchConfig {
            include_regular: false,
            ..Default::default()
        };
        assert!(
            grounding_only
                .model_specs(&catalog)
                .iter()
                .all(|s| s.supports_grounding)
        );
    }
}
