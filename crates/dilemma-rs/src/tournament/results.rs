//! Per-iteration aggregates and the cross-iteration summary.

use crate::game::History;
use crate::player::PlayerClassifier;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One fully played match between players `a` and `b` (roster indices).
#[derive(Debug, Clone, PartialEq)]
pub struct MatchRecord {
    pub index: usize,
    pub a: usize,
    pub b: usize,
    pub moves_a: History,
    pub moves_b: History,
    pub score_a: u64,
    pub score_b: u64,
}

impl MatchRecord {
    pub fn turns(&self) -> u32 {
        self.moves_a.len() as u32
    }
}

/// A match dropped from scoring under the forfeit failure policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Forfeit {
    /// The player whose decision failed.
    pub player: String,
    pub opponent: String,
    /// 1-based turn on which the failure happened.
    pub turn: u32,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Default)]
pub struct ScoreStatistics {
    pub mean: f64,
    pub median: f64,
    /// Population standard deviation.
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

impl ScoreStatistics {
    pub fn from_scores(scores: &[f64]) -> Self {
        if scores.is_empty() {
            return Self::default();
        }
        let n = scores.len() as f64;
        let mean = scores.iter().sum::<f64>() / n;
        let variance = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;

        let mut sorted = scores.to_vec();
        sorted.sort_by(f64::total_cmp);
        let mid = sorted.len() / 2;
        let median = if sorted.len() % 2 == 0 {
            (sorted[mid - 1] + sorted[mid]) / 2.0
        } else {
            sorted[mid]
        };

        Self {
            mean,
            median,
            std: variance.sqrt(),
            min: sorted[0],
            max: sorted[sorted.len() - 1],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerResult {
    pub name: String,
    pub classifier: PlayerClassifier,
    pub score: u64,
    /// Points per turn played.
    pub normalised_score: f64,
    /// 1-based position in `ranked_names`.
    pub rank: usize,
    pub wins: u32,
    pub cooperation_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IterationResult {
    pub iteration: u32,
    pub timestamp: DateTime<Utc>,
    pub duration_secs: f64,
    pub turns: u32,
    pub seed: u64,
    pub player_names: Vec<String>,
    pub scores: Vec<u64>,
    pub ranked_names: Vec<String>,
    pub wins: Vec<u32>,
    pub match_lengths: Vec<Vec<u32>>,
    pub cooperation_rates: Vec<f64>,
    pub payoff_matrix: Vec<Vec<f64>>,
    pub score_statistics: ScoreStatistics,
    pub player_results: Vec<PlayerResult>,
    pub forfeits: Vec<Forfeit>,
}

/// Inputs to [`IterationResult::from_matches`] that are not match data.
#[derive(Debug, Clone)]
pub struct IterationMeta {
    pub iteration: u32,
    pub timestamp: DateTime<Utc>,
    pub duration_secs: f64,
    pub turns: u32,
    pub seed: u64,
}

impl IterationResult {
    /// Aggregate scored matches. `players` gives each roster entry's name
    /// and classifier in roster order.
    pub fn from_matches(
        meta: IterationMeta,
        players: &[(String, PlayerClassifier)],
        matches: &[MatchRecord],
        forfeits: Vec<Forfeit>,
    ) -> Self {
        let n = players.len();
        let mut scores = vec![0u64; n];
        let mut wins = vec![0u32; n];
        let mut turns_played = vec![0u64; n];
        let mut cooperations = vec![0usize; n];
        let mut match_lengths = vec![vec![0u32; n]; n];
        let mut payoff_matrix = vec![vec![0.0f64; n]; n];

        for m in matches {
            let turns = m.turns();
            scores[m.a] += m.score_a;
            scores[m.b] += m.score_b;
            turns_played[m.a] += u64::from(turns);
            turns_played[m.b] += u64::from(turns);
            cooperations[m.a] += m.moves_a.cooperations();
            cooperations[m.b] += m.moves_b.cooperations();

            match m.score_a.cmp(&m.score_b) {
                std::cmp::Ordering::Greater => wins[m.a] += 1,
                std::cmp::Ordering::Less => wins[m.b] += 1,
                std::cmp::Ordering::Equal => {}
            }

            match_lengths[m.a][m.b] = turns;
            match_lengths[m.b][m.a] = turns;
            if turns > 0 {
                payoff_matrix[m.a][m.b] = m.score_a as f64 / f64::from(turns);
                payoff_matrix[m.b][m.a] = m.score_b as f64 / f64::from(turns);
            }
        }

        let normalised: Vec<f64> = (0..n)
            .map(|i| ratio(scores[i] as f64, turns_played[i] as f64))
            .collect();
        let cooperation_rates: Vec<f64> = (0..n)
            .map(|i| ratio(cooperations[i] as f64, turns_played[i] as f64))
            .collect();

        // Stable sort keeps roster order among ties.
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&x, &y| normalised[y].total_cmp(&normalised[x]));
        let mut rank = vec![0usize; n];
        for (pos, &idx) in order.iter().enumerate() {
            rank[idx] = pos + 1;
        }

        let player_names: Vec<String> = players.iter().map(|(name, _)| name.clone()).collect();
        let ranked_names = order.iter().map(|&i| player_names[i].clone()).collect();
        let score_statistics =
            ScoreStatistics::from_scores(&scores.iter().map(|&s| s as f64).collect::<Vec<_>>());

        let player_results = players
            .iter()
            .enumerate()
            .map(|(i, (name, classifier))| PlayerResult {
                name: name.clone(),
                classifier: *classifier,
                score: scores[i],
                normalised_score: normalised[i],
                rank: rank[i],
                wins: wins[i],
                cooperation_rate: cooperation_rates[i],
            })
            .collect();

        Self {
            iteration: meta.iteration,
            timestamp: meta.timestamp,
            duration_secs: meta.duration_secs,
            turns: meta.turns,
            seed: meta.seed,
            player_names,
            scores,
            ranked_names,
            wins,
            match_lengths,
            cooperation_rates,
            payoff_matrix,
            score_statistics,
            player_results,
            forfeits,
        }
    }
}

fn ratio(num: f64, den: f64) -> f64 {
    if den > 0.0 { num / den } else { 0.0 }
}

/// What happened to one iteration of the benchmark.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum IterationOutcome {
    Completed(IterationResult),
    Failed {
        iteration: u32,
        seed: u64,
        error: String,
    },
}

impl IterationOutcome {
    pub fn iteration(&self) -> u32 {
        match self {
            IterationOutcome::Completed(r) => r.iteration,
            IterationOutcome::Failed { iteration, .. } => *iteration,
        }
    }

    pub fn completed(&self) -> Option<&IterationResult> {
        match self {
            IterationOutcome::Completed(r) => Some(r),
            IterationOutcome::Failed { .. } => None,
        }
    }
}

/// One player's results across all completed iterations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerSummary {
    pub name: String,
    pub iterations: usize,
    pub avg_score: f64,
    pub min_score: u64,
    pub max_score: u64,
    pub avg_rank: f64,
    pub best_rank: usize,
    pub worst_rank: usize,
    pub total_wins: u32,
    pub avg_wins: f64,
    pub avg_cooperation_rate: f64,
}

/// Combine completed iterations per player name, sorted by average score
/// descending. Failed iterations are skipped.
pub fn summarize(outcomes: &[IterationOutcome]) -> Vec<PlayerSummary> {
    let mut summaries: Vec<PlayerSummary> = Vec::new();
    let mut coop_sums: Vec<f64> = Vec::new();
    let mut score_sums: Vec<f64> = Vec::new();
    let mut rank_sums: Vec<f64> = Vec::new();

    for result in outcomes.iter().filter_map(IterationOutcome::completed) {
        for pr in &result.player_results {
            let idx = match summaries.iter().position(|s| s.name == pr.name) {
                Some(idx) => idx,
                None => {
                    summaries.push(PlayerSummary {
                        name: pr.name.clone(),
                        iterations: 0,
                        avg_score: 0.0,
                        min_score: u64::MAX,
                        max_score: 0,
                        avg_rank: 0.0,
                        best_rank: usize::MAX,
                        worst_rank: 0,
                        total_wins: 0,
                        avg_wins: 0.0,
                        avg_cooperation_rate: 0.0,
                    });
                    coop_sums.push(0.0);
                    score_sums.push(0.0);
                    rank_sums.push(0.0);
                    summaries.len() - 1
                }
            };
            let s = &mut summaries[idx];
            s.iterations += 1;
            s.min_score = s.min_score.min(pr.score);
            s.max_score = s.max_score.max(pr.score);
            s.best_rank = s.best_rank.min(pr.rank);
            s.worst_rank = s.worst_rank.max(pr.rank);
            s.total_wins += pr.wins;
            score_sums[idx] += pr.score as f64;
            rank_sums[idx] += pr.rank as f64;
            coop_sums[idx] += pr.cooperation_rate;
        }
    }

    for (idx, s) in summaries.iter_mut().enumerate() {
        let n = s.iterations as f64;
        s.avg_score = score_sums[idx] / n;
        s.avg_rank = rank_sums[idx] / n;
        s.avg_wins = f64::from(s.total_wins) / n;
        s.avg_cooperation_rate = coop_sums[idx] / n;
    }

    summaries.sort_by(|a, b| b.avg_score.total_cmp(&a.avg_score));
    summaries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Action;
    use crate::game::Action::{Cooperate as C, Defect as D};

    fn meta(iteration: u32) -> IterationMeta {
        IterationMeta {
            iteration,
            timestamp: Utc::now(),
            duration_secs: 0.0,
            turns: 2,
            seed: 42,
        }
    }

    fn roster(names: &[&str]) -> Vec<(String, PlayerClassifier)> {
        names
            .iter()
            .map(|n| (n.to_string(), PlayerClassifier::deterministic(Some(1))))
            .collect()
    }

    fn record(
        index: usize,
        a: usize,
        b: usize,
        moves_a: &[Action],
        moves_b: &[Action],
    ) -> MatchRecord {
        let (score_a, score_b) = moves_a
            .iter()
            .zip(moves_b)
            .map(|(x, y)| crate::game::payoff(*x, *y))
            .fold((0u64, 0u64), |(sa, sb), (pa, pb)| {
                (sa + u64::from(pa), sb + u64::from(pb))
            });
        MatchRecord {
            index,
            a,
            b,
            moves_a: History::from(moves_a.to_vec()),
            moves_b: History::from(moves_b.to_vec()),
            score_a,
            score_b,
        }
    }

    #[test]
    fn statistics_of_known_scores() {
        let stats = ScoreStatistics::from_scores(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_eq!(stats.mean, 5.0);
        assert_eq!(stats.median, 4.5);
        assert_eq!(stats.std, 2.0);
        assert_eq!(stats.min, 2.0);
        assert_eq!(stats.max, 9.0);
        assert_eq!(ScoreStatistics::from_scores(&[]), ScoreStatistics::default());
    }

    #[test]
    fn aggregates_three_player_round_robin() {
        // 0 = always D, 1 = always C, 2 = always C.
        let matches = vec![
            record(0, 0, 1, &[D, D], &[C, C]),
            record(1, 0, 2, &[D, D], &[C, C]),
            record(2, 1, 2, &[C, C], &[C, C]),
        ];
        let result =
            IterationResult::from_matches(meta(1), &roster(&["d", "c1", "c2"]), &matches, vec![]);

        assert_eq!(result.scores, vec![20, 6, 6]);
        assert_eq!(result.wins, vec![2, 0, 0]);
        assert_eq!(result.ranked_names, vec!["d", "c1", "c2"]);
        assert_eq!(result.cooperation_rates, vec![0.0, 1.0, 1.0]);
        assert_eq!(result.payoff_matrix[0][1], 5.0);
        assert_eq!(result.payoff_matrix[1][0], 0.0);
        assert_eq!(result.payoff_matrix[1][2], 3.0);
        assert_eq!(result.match_lengths[2][1], 2);
        assert_eq!(result.match_lengths[0][0], 0);
        assert_eq!(result.player_results[2].rank, 3);
        assert_eq!(result.score_statistics.max, 20.0);
    }

    #[test]
    fn totals_beyond_u32_do_not_wrap() {
        let big = u64::from(u32::MAX);
        let mut first = record(0, 0, 1, &[D], &[C]);
        first.score_a = big;
        let mut second = record(1, 0, 2, &[D], &[C]);
        second.score_a = big;

        let result = IterationResult::from_matches(
            meta(1),
            &roster(&["d", "c1", "c2"]),
            &[first, second],
            vec![],
        );
        assert_eq!(result.scores[0], 2 * big);
        assert_eq!(result.player_results[0].normalised_score, big as f64);

        let summary = summarize(&[IterationOutcome::Completed(result)]);
        assert_eq!(summary[0].max_score, 2 * big);
    }

    #[test]
    fn ranking_uses_points_per_turn() {
        // Player 1's match with 2 was forfeited, so it played fewer turns
        // but earned more per turn than player 0.
        let matches = vec![
            record(0, 0, 1, &[C, C], &[D, D]),
            record(1, 0, 2, &[C, C], &[C, C]),
        ];
        let result =
            IterationResult::from_matches(meta(1), &roster(&["a", "b", "c"]), &matches, vec![]);
        assert_eq!(result.scores, vec![6, 10, 6]);
        assert_eq!(result.ranked_names, vec!["b", "c", "a"]);
    }

    #[test]
    fn summary_skips_failures_and_sorts_by_average() {
        let one = IterationResult::from_matches(
            meta(1),
            &roster(&["x", "y"]),
            &[record(0, 0, 1, &[D, D], &[C, C])],
            vec![],
        );
        let two = IterationResult::from_matches(
            meta(2),
            &roster(&["x", "y"]),
            &[record(0, 0, 1, &[C, C], &[D, C])],
            vec![],
        );
        let outcomes = vec![
            IterationOutcome::Completed(one),
            IterationOutcome::Failed {
                iteration: 3,
                seed: 44,
                error: "boom".into(),
            },
            IterationOutcome::Completed(two),
        ];

        let summary = summarize(&outcomes);
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].name, "x");
        assert_eq!(summary[0].iterations, 2);
        assert_eq!(summary[0].avg_score, 6.5);
        assert_eq!(summary[0].min_score, 3);
        assert_eq!(summary[0].max_score, 10);
        assert_eq!(summary[0].best_rank, 1);
        assert_eq!(summary[0].worst_rank, 2);
        assert_eq!(summary[0].total_wins, 1);
        assert_eq!(summary[1].name, "y");
        assert_eq!(summary[1].avg_cooperation_rate, 0.75);
    }

    #[test]
    fn summary_of_only_failures_is_empty() {
        let outcomes = vec![IterationOutcome::Failed {
            iteration: 1,
            seed: 42,
            error: "unknown model".into(),
        }];
        assert!(summarize(&outcomes).is_empty());
        assert_eq!(outcomes[0].iteration(), 1);
    }
}
