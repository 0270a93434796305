//! Player pool generation.

use std::sync::Arc;

use dilemma_rs::agent::Agent;
use dilemma_rs::catalog::ModelCatalog;
use dilemma_rs::player::Player;
use dilemma_rs::provider::PromptRunner;
use dilemma_rs::strategy::classic_lineup;
use tracing::debug;

use crate::config::BenchConfig;
use crate::prompts::prompt_variants;

/// The full set of tournament participants.
pub struct Roster {
    pub players: Vec<Arc<dyn Player>>,
    pub classic_count: usize,
    pub llm_count: usize,
}

impl Roster {
    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

/// One agent per (model spec, prompt variant), sharing `runner`.
///
/// Fails on the first template/config mismatch so a bad prompt is caught
/// before any tournament starts.
pub fn llm_players(
    config: &BenchConfig,
    catalog: &ModelCatalog,
    runner: &Arc<dyn PromptRunner>,
) -> dilemma_rs::Result<Vec<Agent>> {
    let variants = prompt_variants();
    let mut agents = Vec::new();
    for spec in config.model_specs(catalog) {
        for variant in &variants {
            let agent_config = config.agent_config(spec.clone(), variant);
            debug!("Adding LLM player {}", agent_config.display_name);
            agents.push(Agent::new(agent_config, Arc::clone(runner))?);
        }
    }
    Ok(agents)
}

/// Classical lineup (unless disabled) followed by every LLM player.
pub fn build_roster(
    config: &BenchConfig,
    catalog: &ModelCatalog,
    runner: Arc<dyn PromptRunner>,
) -> dilemma_rs::Result<Roster> {
    let mut players: Vec<Arc<dyn Player>> = Vec::new();
    if config.include_classic {
        players.extend(
            classic_lineup()
                .into_iter()
                .map(|p| Arc::new(p) as Arc<dyn Player>),
        );
    }
    let classic_count = players.len();

    let agents = llm_players(config, catalog, &runner)?;
    let llm_count = agents.len();
    players.extend(agents.into_iter().map(|a| Arc::new(a) as Arc<dyn Player>));

    Ok(Roster {
        players,
        classic_count,
        llm_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dilemma_rs::catalog::{FamilyCatalog, ProviderFamily};
    use dilemma_rs::provider::{PromptFuture, PromptRequest};

    struct AlwaysCooperate;

    impl PromptRunner for AlwaysCooperate {
        fn run_prompt<'a>(&'a self, _request: &'a PromptRequest) -> PromptFuture<'a> {
            Box::pin(async { Ok("C".to_string()) })
        }
    }

    fn small_catalog() -> ModelCatalog {
        ModelCatalog::from_json_str(
            r#"{"version": 1, "families": {
                "openai": {"models": ["gpt-4o", "gpt-4o-mini"], "grounding": ["gpt-4o"]}
            }}"#,
        )
        .unwrap()
    }

    fn runner() -> Arc<dyn PromptRunner> {
        Arc::new(AlwaysCooperate)
    }

    #[test]
    fn six_players_per_model_spec() {
        let roster = build_roster(&BenchConfig::default(), &small_catalog(), runner()).unwrap();
        // 2 regular + 1 grounded spec, 6 prompt variants each.
        assert_eq!(roster.llm_count, 18);
        assert_eq!(roster.classic_count, classic_lineup().len());
        assert_eq!(roster.len(), roster.llm_count + roster.classic_count);

        let names: Vec<&str> = roster.players.iter().map(|p| p.name()).collect();
        assert!(names.contains(&"gpt-4o-mini_LastTurns"));
        assert!(names.contains(&"gpt-4o_GROUNDING_PredetLastTurns"));
        assert!(!names.contains(&"gpt-4o-mini_GROUNDING_FullHist"));
    }

    #[test]
    fn no_classic_leaves_only_llm_players() {
        let config = BenchConfig {
            include_classic: false,
            include_grounding: false,
            ..Default::default()
        };
        let roster = build_roster(&config, &small_catalog(), runner()).unwrap();
        assert_eq!(roster.classic_count, 0);
        assert_eq!(roster.len(), 12);
    }

    #[test]
    fn empty_catalog_yields_classics_only() {
        let mut catalog = small_catalog();
        catalog
            .families
            .insert(ProviderFamily::OpenAi, FamilyCatalog::default());
        let roster = build_roster(&BenchConfig::default(), &catalog, runner()).unwrap();
        assert_eq!(roster.llm_count, 0);
        assert!(!roster.is_empty());
    }

    #[tokio::test]
    async fn roster_plays_a_tournament() {
        use dilemma_rs::tournament::Tournament;

        let config = BenchConfig {
            turns: 3,
            include_grounding: false,
            ..Default::default()
        };
        let roster = build_roster(&config, &small_catalog(), runner()).unwrap();
        let result = Tournament::new(roster.players, config.tournament_config(0))
            .play(1)
            .await
            .unwrap();
        let llm = result
            .player_results
            .iter()
            .find(|p| p.name == "gpt-4o_FullHist")
            .unwrap();
        assert_eq!(llm.cooperation_rate, 1.0);
    }
}
