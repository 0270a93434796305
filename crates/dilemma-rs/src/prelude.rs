//! Convenience re-exports for common `dilemma-rs` types.
//!
//! ```ignore
//! use dilemma_rs::prelude::*;
//! ```
//!
//! Vendor request/response types and usage internals are left out; import
//! those from [`provider`](crate::provider) directly.

// ── Core types ──────────────────────────────────────────────────────
pub use crate::game::{Action, History, payoff};
pub use crate::{Error, Result};

// ── Models and providers ────────────────────────────────────────────
pub use crate::catalog::{ModelCatalog, ModelSpec, ProviderFamily};
pub use crate::provider::{
    ChatMessage, Credentials, PromptRequest, PromptRunner, ProviderEndpoints, ProviderGateway,
    UsageTracker,
};

// ── Players ─────────────────────────────────────────────────────────
pub use crate::agent::{Agent, AgentConfig, parse_move};
pub use crate::player::{DecisionFuture, Player, PlayerClassifier, Turn};
pub use crate::prompt::PromptContext;
pub use crate::strategy::{ClassicPlayer, Strategy, classic_lineup};

// ── Tournament ──────────────────────────────────────────────────────
pub use crate::tournament::{
    FailurePolicy, IterationOutcome, IterationResult, PlayerSummary, Tournament,
    TournamentConfig, summarize,
};
