//! Benchmark runner built on dilemma-rs.
//!
//! `dilemma-bench` fields every catalogued model under six prompt variants
//! against the classical strategy lineup, runs the requested number of
//! round-robin iterations and prints a cross-iteration summary.
//!
//! # Library usage
//!
//! ```ignore
//! use dilemma_bench::{BenchConfig, build_roster};
//! use dilemma_rs::prelude::*;
//! use std::sync::Arc;
//!
//! let config = BenchConfig { iterations: 2, turns: 50, ..Default::default() };
//! let catalog = config.load_catalog()?;
//! let gateway = Arc::new(ProviderGateway::new(catalog.clone(), Credentials::from_env())?);
//! let roster = build_roster(&config, &catalog, gateway)?;
//! let result = Tournament::new(roster.players, config.tournament_config(0)).play(1).await?;
//! ```
//!
//! # Binary
//!
//! ```sh
//! dilemma-bench --iterations 3 --turns 100
//! dilemma-bench --iterations 1 --turns 20 --skip-grounding --refresh-catalog openai
//! ```

pub mod config;
pub mod prompts;
pub mod report;
pub mod roster;

pub use config::{BenchConfig, player_name};
pub use prompts::{GameHorizon, PromptVariant, prompt_variants};
pub use report::{RunMetadata, format_outcomes, format_summary};
pub use roster::{Roster, build_roster, llm_players};
