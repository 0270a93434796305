//! LLM agents versus classical strategies in iterated prisoner's dilemma
//! tournaments.
//!
//! `dilemma-rs` wires language models from three vendors (Anthropic, OpenAI,
//! Google Gemini) into a round-robin tournament as ordinary players. Each
//! decision renders a prompt from the two move histories, sends it through
//! the [`ProviderGateway`](provider::ProviderGateway), and parses the reply as
//! a single move code. Classical strategies play the same tournament through
//! the same [`Player`](player::Player) trait.
//!
//! # Getting started
//!
//! ```ignore
//! use dilemma_rs::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> dilemma_rs::Result<()> {
//!     let gateway = Arc::new(ProviderGateway::new(
//!         ModelCatalog::builtin(),
//!         Credentials::from_env(),
//!     )?);
//!
//!     let agent = Agent::new(
//!         AgentConfig::new(
//!             "gpt-4o-mini (basic)",
//!             ModelSpec::new(ProviderFamily::OpenAi, "gpt-4o-mini"),
//!             "History: you {ownHistoryText}, them {opponentHistoryText}. Reply C or D.",
//!         ),
//!         gateway,
//!     )?;
//!
//!     let mut players: Vec<Arc<dyn Player>> = vec![Arc::new(agent)];
//!     players.extend(classic_lineup().into_iter().map(|p| Arc::new(p) as Arc<dyn Player>));
//!
//!     let result = Tournament::new(players, TournamentConfig::new(20, 42))
//!         .play(1)
//!         .await?;
//!     println!("{:?}", result.ranked_names);
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`game`] | [`Action`], [`History`], payoff matrix |
//! | [`prompt`] | [`PromptContext`](prompt::PromptContext) template rendering and windowing |
//! | [`catalog`] | Versioned [`ModelCatalog`](catalog::ModelCatalog) of model ids per provider family |
//! | [`provider`] | [`ProviderGateway`](provider::ProviderGateway), vendor adapters, usage tracking |
//! | [`player`] | The [`Player`](player::Player) trait the engine drives |
//! | [`agent`] | LLM-backed [`Agent`](agent::Agent) and its move parser |
//! | [`strategy`] | Classical strategies and the default lineup |
//! | [`tournament`] | Round-robin engine, failure policies, result aggregation |
//!
//! Nothing is retried. Every failure is an [`Error`] value and the
//! tournament's [`FailurePolicy`](tournament::FailurePolicy) decides whether
//! it ends the iteration or forfeits one match.

pub mod agent;
pub mod catalog;
pub mod error;
pub mod game;
pub mod player;
pub mod prelude;
pub mod prompt;
pub mod provider;
pub mod strategy;
pub mod tournament;

pub use error::{Error, Result};
pub use game::{Action, History};
