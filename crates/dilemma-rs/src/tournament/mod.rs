//! Round-robin tournament engine.
//!
//! Every unordered pair of distinct players meets once per iteration for a
//! fixed number of turns. The engine owns all [`History`] buffers; players
//! see them through [`Turn`] and never write them. Both sides of a turn are
//! asked concurrently since moves are simultaneous, and up to
//! `match_concurrency` matches can be in flight at once, each with its own
//! buffers.
//!
//! Seeds are derived, not drawn: an iteration seed yields one seed per match,
//! which yields one per turn and side. A fixed seed therefore reproduces
//! every stochastic decision regardless of match scheduling.

mod results;

pub use results::{
    Forfeit, IterationMeta, IterationOutcome, IterationResult, MatchRecord, PlayerResult,
    PlayerSummary, ScoreStatistics, summarize,
};

use crate::error::{Error, Result};
use crate::game::{History, payoff};
use crate::player::{Player, PlayerClassifier, Turn};
use chrono::Utc;
use futures::StreamExt;
use futures::stream;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// What to do when a player's decision fails mid-match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop the iteration and return the error.
    #[default]
    AbortIteration,
    /// Drop the failing match from scoring, record a [`Forfeit`], continue.
    ForfeitMatch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TournamentConfig {
    pub turns: u32,
    pub seed: u64,
    pub match_concurrency: usize,
    pub failure_policy: FailurePolicy,
}

impl TournamentConfig {
    pub fn new(turns: u32, seed: u64) -> Self {
        Self {
            turns,
            seed,
            match_concurrency: 1,
            failure_policy: FailurePolicy::default(),
        }
    }

    pub fn with_match_concurrency(mut self, concurrency: usize) -> Self {
        self.match_concurrency = concurrency.max(1);
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }
}

/// Mix `stream` into `seed` (splitmix64 finaliser).
pub fn derive_seed(seed: u64, stream: u64) -> u64 {
    let mut z = seed ^ stream.wrapping_add(1).wrapping_mul(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// All unordered pairs `(i, j)` with `i < j`, in a fixed order.
pub fn round_robin_pairs(players: usize) -> Vec<(usize, usize)> {
    (0..players)
        .flat_map(|i| (i + 1..players).map(move |j| (i, j)))
        .collect()
}

struct MatchFailure {
    match_index: usize,
    player: usize,
    opponent: usize,
    turn: u32,
    error: Error,
}

pub struct Tournament {
    players: Vec<Arc<dyn Player>>,
    config: TournamentConfig,
}

impl Tournament {
    pub fn new(players: Vec<Arc<dyn Player>>, config: TournamentConfig) -> Self {
        Self { players, config }
    }

    /// Matches in one round robin: every unordered pair, no self-play.
    pub fn match_count(&self) -> usize {
        let n = self.players.len();
        n * n.saturating_sub(1) / 2
    }

    /// Play one full round robin.
    ///
    /// Under [`FailurePolicy::AbortIteration`] the first failed decision is
    /// returned as the error and in-flight matches are dropped.
    pub async fn play(&self, iteration: u32) -> Result<IterationResult> {
        let started = Instant::now();
        let timestamp = Utc::now();
        let pairs = round_robin_pairs(self.players.len());
        info!(
            "Iteration {iteration}: {} players, {} matches, {} turns, seed {}",
            self.players.len(),
            pairs.len(),
            self.config.turns,
            self.config.seed
        );

        let mut in_flight = stream::iter(
            pairs
                .into_iter()
                .enumerate()
                .map(|(index, (a, b))| self.play_match(index, a, b)),
        )
        .buffer_unordered(self.config.match_concurrency.max(1));

        let mut matches = Vec::new();
        let mut failures = Vec::new();
        while let Some(outcome) = in_flight.next().await {
            match outcome {
                Ok(record) => matches.push(record),
                Err(failure) => {
                    warn!(
                        "Match {} ({} vs {}) failed on turn {}: {}",
                        failure.match_index,
                        self.players[failure.player].name(),
                        self.players[failure.opponent].name(),
                        failure.turn,
                        failure.error
                    );
                    match self.config.failure_policy {
                        FailurePolicy::AbortIteration => return Err(failure.error),
                        FailurePolicy::ForfeitMatch => failures.push(failure),
                    }
                }
            }
        }

        matches.sort_by_key(|m| m.index);
        failures.sort_by_key(|f| f.match_index);
        let forfeits = failures
            .into_iter()
            .map(|f| Forfeit {
                player: self.players[f.player].name().to_string(),
                opponent: self.players[f.opponent].name().to_string(),
                turn: f.turn,
                reason: f.error.to_string(),
            })
            .collect();

        let roster: Vec<(String, PlayerClassifier)> = self
            .players
            .iter()
            .map(|p| (p.name().to_string(), p.classifier()))
            .collect();
        let meta = IterationMeta {
            iteration,
            timestamp,
            duration_secs: started.elapsed().as_secs_f64(),
            turns: self.config.turns,
            seed: self.config.seed,
        };
        let result = IterationResult::from_matches(meta, &roster, &matches, forfeits);
        info!(
            "Iteration {iteration} finished in {:.1}s; leader: {}",
            result.duration_secs,
            result.ranked_names.first().map_or("-", String::as_str)
        );
        Ok(result)
    }

    async fn play_match(
        &self,
        index: usize,
        a: usize,
        b: usize,
    ) -> std::result::Result<MatchRecord, MatchFailure> {
        let (player_a, player_b) = (&self.players[a], &self.players[b]);
        let turns = self.config.turns;
        let match_seed = derive_seed(self.config.seed, index as u64);
        let mut moves_a = History::with_capacity(turns as usize);
        let mut moves_b = History::with_capacity(turns as usize);
        let (mut score_a, mut score_b) = (0u64, 0u64);

        debug!("Match {index}: {} vs {}", player_a.name(), player_b.name());

        for turn in 0..turns {
            let turn_seed = derive_seed(match_seed, u64::from(turn));
            let (decision_a, decision_b) = futures::join!(
                player_a.play(Turn {
                    own: &moves_a,
                    opponent: &moves_b,
                    seed: derive_seed(turn_seed, 0),
                }),
                player_b.play(Turn {
                    own: &moves_b,
                    opponent: &moves_a,
                    seed: derive_seed(turn_seed, 1),
                }),
            );

            let fail = |player, opponent, error| MatchFailure {
                match_index: index,
                player,
                opponent,
                turn: turn + 1,
                error,
            };
            let action_a = decision_a.map_err(|e| fail(a, b, e))?;
            let action_b = decision_b.map_err(|e| fail(b, a, e))?;

            let (pa, pb) = payoff(action_a, action_b);
            score_a += u64::from(pa);
            score_b += u64::from(pb);
            moves_a.push(action_a);
            moves_b.push(action_b);
        }

        debug!(
            "Match {index}: {} {} - {} {}",
            player_a.name(),
            score_a,
            score_b,
            player_b.name()
        );
        Ok(MatchRecord {
            index,
            a,
            b,
            moves_a,
            moves_b,
            score_a,
            score_b,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Action;
    use crate::player::DecisionFuture;
    use crate::strategy::{ClassicPlayer, Strategy, classic_lineup};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn classic(strategies: &[Strategy]) -> Vec<Arc<dyn Player>> {
        strategies
            .iter()
            .map(|s| Arc::new(ClassicPlayer::new(*s)) as Arc<dyn Player>)
            .collect()
    }

    /// Cooperates until `fail_on_turn` (1-based), then errors.
    struct Flaky {
        fail_on_turn: usize,
        calls: AtomicUsize,
    }

    impl Player for Flaky {
        fn name(&self) -> &str {
            "Flaky"
        }

        fn classifier(&self) -> PlayerClassifier {
            PlayerClassifier::stochastic(None)
        }

        fn play<'a>(&'a self, turn: Turn<'a>) -> DecisionFuture<'a> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let result = if turn.own.len() + 1 == self.fail_on_turn {
                Err(Error::InvalidMove("maybe".into()))
            } else {
                Ok(Action::Cooperate)
            };
            Box::pin(async move { result })
        }
    }

    #[test]
    fn pairs_exclude_self_play() {
        assert_eq!(round_robin_pairs(3), vec![(0, 1), (0, 2), (1, 2)]);
        assert!(round_robin_pairs(1).is_empty());
        assert_eq!(round_robin_pairs(9).len(), 36);
    }

    #[test]
    fn match_count_covers_every_pair() {
        let players = classic(&[Strategy::Cooperator, Strategy::Defector, Strategy::Grudger]);
        let tournament = Tournament::new(players, TournamentConfig::new(1, 0));
        assert_eq!(tournament.match_count(), 3);
        assert_eq!(Tournament::new(vec![], TournamentConfig::new(1, 0)).match_count(), 0);
    }

    #[test]
    fn derived_seeds_differ_per_stream() {
        let seeds: Vec<u64> = (0..64).map(|s| derive_seed(42, s)).collect();
        let mut unique = seeds.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), seeds.len());
        assert_eq!(derive_seed(42, 3), derive_seed(42, 3));
        assert_ne!(derive_seed(42, 3), derive_seed(43, 3));
    }

    #[tokio::test]
    async fn tit_for_tat_against_defector() {
        let players = classic(&[Strategy::TitForTat, Strategy::Defector]);
        let result = Tournament::new(players, TournamentConfig::new(10, 1))
            .play(1)
            .await
            .unwrap();
        // TFT loses turn one (0 vs 5), then both defect for nine turns.
        assert_eq!(result.scores, vec![9, 14]);
        assert_eq!(result.wins, vec![0, 1]);
        assert_eq!(result.ranked_names, vec!["Defector", "Tit For Tat"]);
        assert_eq!(result.match_lengths[0][1], 10);
        assert_eq!(result.cooperation_rates[0], 0.1);
    }

    #[tokio::test]
    async fn mutual_cooperation_ties() {
        let players = classic(&[Strategy::TitForTat, Strategy::Cooperator]);
        let result = Tournament::new(players, TournamentConfig::new(5, 1))
            .play(1)
            .await
            .unwrap();
        assert_eq!(result.scores, vec![15, 15]);
        assert_eq!(result.wins, vec![0, 0]);
        assert_eq!(result.payoff_matrix[0][1], 3.0);
    }

    #[tokio::test]
    async fn results_are_reproducible_for_a_seed() {
        let lineup = || {
            classic_lineup()
                .into_iter()
                .map(|p| Arc::new(p) as Arc<dyn Player>)
                .collect::<Vec<_>>()
        };
        let config = TournamentConfig::new(50, 7);
        let first = Tournament::new(lineup(), config.clone()).play(1).await.unwrap();
        let second = Tournament::new(lineup(), config.with_match_concurrency(4))
            .play(1)
            .await
            .unwrap();
        assert_eq!(first.scores, second.scores);
        assert_eq!(first.ranked_names, second.ranked_names);
        assert_eq!(first.cooperation_rates, second.cooperation_rates);
    }

    #[tokio::test]
    async fn abort_policy_returns_first_error() {
        let mut players = classic(&[Strategy::Cooperator]);
        players.push(Arc::new(Flaky {
            fail_on_turn: 3,
            calls: AtomicUsize::new(0),
        }));
        let err = Tournament::new(players, TournamentConfig::new(10, 1))
            .play(1)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidMove(_)));
    }

    #[tokio::test]
    async fn forfeit_policy_drops_only_the_failing_match() {
        let flaky = Arc::new(Flaky {
            fail_on_turn: 3,
            calls: AtomicUsize::new(0),
        });
        let mut players = classic(&[Strategy::Cooperator, Strategy::Defector]);
        players.push(flaky.clone());

        let config =
            TournamentConfig::new(4, 1).with_failure_policy(FailurePolicy::ForfeitMatch);
        let result = Tournament::new(players, config).play(1).await.unwrap();

        // Flaky fails in both of its matches; only Cooperator vs Defector is scored.
        assert_eq!(result.forfeits.len(), 2);
        assert!(result.forfeits.iter().all(|f| f.player == "Flaky" && f.turn == 3));
        assert_eq!(result.forfeits[0].opponent, "Cooperator");
        assert_eq!(result.scores, vec![0, 20, 0]);
        assert_eq!(result.match_lengths[0][2], 0);
        assert_eq!(result.match_lengths[0][1], 4);
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 6);
    }

    #[tokio::test]
    async fn single_player_has_no_matches() {
        let result = Tournament::new(classic(&[Strategy::Grudger]), TournamentConfig::new(5, 1))
            .play(1)
            .await
            .unwrap();
        assert_eq!(result.scores, vec![0]);
        assert_eq!(result.ranked_names, vec!["Grudger"]);
    }
}
