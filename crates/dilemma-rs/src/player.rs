//! The contract between the tournament engine and its participants.
//!
//! Anything that can pick a move implements [`Player`]: classical strategies
//! ([`ClassicPlayer`](crate::strategy::ClassicPlayer)) and LLM-backed
//! [`Agent`](crate::agent::Agent)s alike. Players never own game state; the
//! engine passes read-only histories in a [`Turn`] and records the result.

use crate::error::Result;
use crate::game::{Action, History};
use serde::Serialize;
use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by [`Player::play`].
pub type DecisionFuture<'a> = Pin<Box<dyn Future<Output = Result<Action>> + Send + 'a>>;

/// What a player sees when asked for its next move.
#[derive(Debug, Clone, Copy)]
pub struct Turn<'a> {
    pub own: &'a History,
    pub opponent: &'a History,
    /// Seed for this side of this turn. Stochastic players build their RNG
    /// from it so a fixed tournament seed reproduces every decision.
    pub seed: u64,
}

/// Static traits of a player, reported alongside results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlayerClassifier {
    pub stochastic: bool,
    /// How many past turns the player looks at. `None` means unbounded.
    pub memory_depth: Option<usize>,
}

impl PlayerClassifier {
    pub const fn deterministic(memory_depth: Option<usize>) -> Self {
        Self {
            stochastic: false,
            memory_depth,
        }
    }

    pub const fn stochastic(memory_depth: Option<usize>) -> Self {
        Self {
            stochastic: true,
            memory_depth,
        }
    }
}

pub trait Player: Send + Sync {
    fn name(&self) -> &str;

    fn classifier(&self) -> PlayerClassifier;

    fn play<'a>(&'a self, turn: Turn<'a>) -> DecisionFuture<'a>;
}
