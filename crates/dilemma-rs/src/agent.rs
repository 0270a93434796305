//! LLM-backed player.
//!
//! An [`Agent`] is immutable configuration plus a shared [`PromptRunner`].
//! Each decision renders the template against the current histories, sends
//! it as a single user message, and parses the reply as one move code.
//! Nothing carries over between decisions.

use crate::catalog::ModelSpec;
use crate::error::{Error, Result};
use crate::game::{Action, History};
use crate::player::{DecisionFuture, Player, PlayerClassifier, Turn};
use crate::prompt::PromptContext;
use crate::provider::{ChatMessage, PromptRequest, PromptRunner};
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::{debug, trace};

pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 1024;
pub const DEFAULT_TEMPERATURE: f32 = 1.0;

/// Settings for one LLM player.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentConfig {
    pub display_name: String,
    pub model: ModelSpec,
    pub max_output_tokens: u32,
    pub temperature: f32,
    pub prompt_template: String,
    pub history_window: Option<NonZeroUsize>,
    pub total_turns: Option<u32>,
    pub end_probability: Option<f64>,
}

impl AgentConfig {
    pub fn new(
        display_name: impl Into<String>,
        model: ModelSpec,
        prompt_template: impl Into<String>,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            model,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            prompt_template: prompt_template.into(),
            history_window: None,
            total_turns: None,
            end_probability: None,
        }
    }

    pub fn with_max_output_tokens(mut self, tokens: u32) -> Self {
        self.max_output_tokens = tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_history_window(mut self, window: Option<NonZeroUsize>) -> Self {
        self.history_window = window;
        self
    }

    pub fn with_total_turns(mut self, turns: Option<u32>) -> Self {
        self.total_turns = turns;
        self
    }

    pub fn with_end_probability(mut self, probability: Option<f64>) -> Self {
        self.end_probability = probability;
        self
    }
}

pub struct Agent {
    config: AgentConfig,
    runner: Arc<dyn PromptRunner>,
}

impl Agent {
    /// Build an agent, rejecting templates that could never render with
    /// this configuration.
    pub fn new(config: AgentConfig, runner: Arc<dyn PromptRunner>) -> Result<Self> {
        PromptContext::validate(
            &config.prompt_template,
            config.total_turns,
            config.end_probability,
        )?;
        Ok(Self { config, runner })
    }

    /// Render the prompt this agent would send for the given histories.
    pub fn render_prompt(&self, own: &History, opponent: &History) -> Result<String> {
        PromptContext::new(&self.config.prompt_template, own, opponent)
            .with_history_window(self.config.history_window)
            .with_total_turns(self.config.total_turns)
            .with_end_probability(self.config.end_probability)
            .render()
    }

    /// Choose the next move from the two histories.
    pub async fn decide(&self, own: &History, opponent: &History) -> Result<Action> {
        let prompt = self.render_prompt(own, opponent)?;
        trace!("Prompt for {}:\n{prompt}", self.config.display_name);

        let request = PromptRequest {
            model_id: self.config.model.model_id.clone(),
            max_output_tokens: self.config.max_output_tokens,
            temperature: self.config.temperature,
            messages: vec![ChatMessage::user(prompt)],
            enable_grounding: self.config.model.supports_grounding,
        };
        let reply = self.runner.run_prompt(&request).await?;
        let action = parse_move(&reply)?;

        debug!(
            "{} chose {} at turn {}",
            self.config.display_name,
            action,
            own.len() + 1
        );
        Ok(action)
    }
}

impl Player for Agent {
    fn name(&self) -> &str {
        &self.config.display_name
    }

    fn classifier(&self) -> PlayerClassifier {
        PlayerClassifier::stochastic(self.config.history_window.map(NonZeroUsize::get))
    }

    fn play<'a>(&'a self, turn: Turn<'a>) -> DecisionFuture<'a> {
        Box::pin(self.decide(turn.own, turn.opponent))
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent").field("config", &self.config).finish()
    }
}

/// Parse a model reply as exactly one move code, ignoring surrounding
/// whitespace. Case-sensitive.
pub fn parse_move(text: &str) -> Result<Action> {
    let trimmed = text.trim();
    let mut chars = trimmed.chars();
    match (chars.next(), chars.next()) {
        (Some(code), None) => {
            Action::from_code(code).ok_or_else(|| Error::InvalidMove(text.to_string()))
        }
        _ => Err(Error::InvalidMove(text.to_string())),
    }
}
