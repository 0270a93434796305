//! Classical algorithmic strategies.

use crate::error::Result;
use crate::game::{Action, History, payoff};
use crate::player::{DecisionFuture, Player, PlayerClassifier, Turn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Strategy {
    /// Always cooperate.
    Cooperator,
    /// Always defect.
    Defector,
    /// Copy the opponent's last move. Start with cooperate.
    TitForTat,
    /// Tit-for-Tat, but start with defect.
    SuspiciousTitForTat,
    /// Cooperate until the opponent defects once, then always defect.
    Grudger,
    /// Defect only if the opponent defected twice in a row.
    TitForTwoTats,
    /// Repeat the last move after scoring 3 or more, otherwise switch.
    WinStayLoseShift,
    /// C, D, C, D, ...
    Alternator,
    /// Cooperate with the given probability each turn.
    Random(f64),
}

impl Strategy {
    /// Pick the next move. Only [`Strategy::Random`] reads `seed`.
    pub fn decide(&self, own: &History, opponent: &History, seed: u64) -> Action {
        match *self {
            Strategy::Cooperator => Action::Cooperate,
            Strategy::Defector => Action::Defect,
            Strategy::TitForTat => opponent.last().unwrap_or(Action::Cooperate),
            Strategy::SuspiciousTitForTat => opponent.last().unwrap_or(Action::Defect),
            Strategy::Grudger => {
                if opponent.defections() > 0 {
                    Action::Defect
                } else {
                    Action::Cooperate
                }
            }
            Strategy::TitForTwoTats => match opponent.window(std::num::NonZeroUsize::new(2)) {
                [Action::Defect, Action::Defect] => Action::Defect,
                _ => Action::Cooperate,
            },
            Strategy::WinStayLoseShift => match (own.last(), opponent.last()) {
                (Some(mine), Some(theirs)) => {
                    let (score, _) = payoff(mine, theirs);
                    if score >= 3 { mine } else { mine.flip() }
                }
                _ => Action::Cooperate,
            },
            Strategy::Alternator => own.last().map_or(Action::Cooperate, Action::flip),
            Strategy::Random(p) => {
                let p = if p.is_nan() { 0.5 } else { p.clamp(0.0, 1.0) };
                if StdRng::seed_from_u64(seed).gen_bool(p) {
                    Action::Cooperate
                } else {
                    Action::Defect
                }
            }
        }
    }

    pub fn classifier(&self) -> PlayerClassifier {
        match self {
            Strategy::Cooperator | Strategy::Defector => PlayerClassifier::deterministic(Some(0)),
            Strategy::TitForTat
            | Strategy::SuspiciousTitForTat
            | Strategy::WinStayLoseShift
            | Strategy::Alternator => PlayerClassifier::deterministic(Some(1)),
            Strategy::TitForTwoTats => PlayerClassifier::deterministic(Some(2)),
            Strategy::Grudger => PlayerClassifier::deterministic(None),
            Strategy::Random(_) => PlayerClassifier::stochastic(Some(0)),
        }
    }

    pub fn default_name(&self) -> String {
        match self {
            Strategy::Cooperator => "Cooperator".into(),
            Strategy::Defector => "Defector".into(),
            Strategy::TitForTat => "Tit For Tat".into(),
            Strategy::SuspiciousTitForTat => "Suspicious Tit For Tat".into(),
            Strategy::Grudger => "Grudger".into(),
            Strategy::TitForTwoTats => "Tit For 2 Tats".into(),
            Strategy::WinStayLoseShift => "Win-Stay Lose-Shift".into(),
            Strategy::Alternator => "Alternator".into(),
            Strategy::Random(p) => format!("Random: {p}"),
        }
    }
}

/// A [`Strategy`] with a display name, playable in a tournament.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassicPlayer {
    name: String,
    strategy: Strategy,
}

impl ClassicPlayer {
    pub fn new(strategy: Strategy) -> Self {
        Self {
            name: strategy.default_name(),
            strategy,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl Player for ClassicPlayer {
    fn name(&self) -> &str {
        &self.name
    }

    fn classifier(&self) -> PlayerClassifier {
        self.strategy.classifier()
    }

    fn play<'a>(&'a self, turn: Turn<'a>) -> DecisionFuture<'a> {
        let action: Result<Action> = Ok(self.strategy.decide(turn.own, turn.opponent, turn.seed));
        Box::pin(futures::future::ready(action))
    }
}

/// The default pool of classical opponents.
pub fn classic_lineup() -> Vec<ClassicPlayer> {
    [
        Strategy::Cooperator,
        Strategy::Defector,
        Strategy::TitForTat,
        Strategy::SuspiciousTitForTat,
        Strategy::Grudger,
        Strategy::TitForTwoTats,
        Strategy::WinStayLoseShift,
        Strategy::Alternator,
        Strategy::Random(0.5),
    ]
    .into_iter()
    .map(ClassicPlayer::new)
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use Action::{Cooperate as C, Defect as D};

    fn h(actions: &[Action]) -> History {
        History::from(actions.to_vec())
    }

    fn decide(strategy: Strategy, own: &[Action], opp: &[Action]) -> Action {
        strategy.decide(&h(own), &h(opp), 0)
    }

    #[test]
    fn constant_strategies() {
        let opponents: [&[Action]; 3] = [&[], &[D, D], &[C]];
        for opp in opponents {
            assert_eq!(decide(Strategy::Cooperator, &[], opp), C);
            assert_eq!(decide(Strategy::Defector, &[], opp), D);
        }
    }

    #[test]
    fn tit_for_tat_opens_nice_and_mirrors() {
        assert_eq!(decide(Strategy::TitForTat, &[], &[]), C);
        assert_eq!(decide(Strategy::TitForTat, &[C], &[D]), D);
        assert_eq!(decide(Strategy::TitForTat, &[D, D], &[D, C]), C);
    }

    #[test]
    fn suspicious_tit_for_tat_opens_with_defect() {
        assert_eq!(decide(Strategy::SuspiciousTitForTat, &[], &[]), D);
        assert_eq!(decide(Strategy::SuspiciousTitForTat, &[D], &[C]), C);
    }

    #[test]
    fn grudger_never_forgives() {
        assert_eq!(decide(Strategy::Grudger, &[C, C], &[C, C]), C);
        assert_eq!(decide(Strategy::Grudger, &[C, C, D], &[D, C, C]), D);
    }

    #[test]
    fn tit_for_two_tats_needs_consecutive_defections() {
        assert_eq!(decide(Strategy::TitForTwoTats, &[], &[D]), C);
        assert_eq!(decide(Strategy::TitForTwoTats, &[C, C, C], &[D, C, D]), C);
        assert_eq!(decide(Strategy::TitForTwoTats, &[C, C, C], &[C, D, D]), D);
    }

    #[test]
    fn win_stay_lose_shift() {
        assert_eq!(decide(Strategy::WinStayLoseShift, &[], &[]), C);
        // (C,C) scores 3: stay.
        assert_eq!(decide(Strategy::WinStayLoseShift, &[C], &[C]), C);
        // (C,D) scores 0: shift.
        assert_eq!(decide(Strategy::WinStayLoseShift, &[C], &[D]), D);
        // (D,C) scores 5: stay.
        assert_eq!(decide(Strategy::WinStayLoseShift, &[D], &[C]), D);
        // (D,D) scores 1: shift.
        assert_eq!(decide(Strategy::WinStayLoseShift, &[D], &[D]), C);
    }

    #[test]
    fn alternator_flips_own_last_move() {
        assert_eq!(decide(Strategy::Alternator, &[], &[]), C);
        assert_eq!(decide(Strategy::Alternator, &[C], &[D]), D);
        assert_eq!(decide(Strategy::Alternator, &[C, D], &[D, D]), C);
    }

    #[test]
    fn random_is_reproducible_per_seed() {
        let empty = History::new();
        let s = Strategy::Random(0.5);
        let first: Vec<_> = (0..32).map(|seed| s.decide(&empty, &empty, seed)).collect();
        let second: Vec<_> = (0..32).map(|seed| s.decide(&empty, &empty, seed)).collect();
        assert_eq!(first, second);
        assert!(first.contains(&C) && first.contains(&D));
    }

    #[test]
    fn random_extremes_and_out_of_range() {
        let empty = History::new();
        for seed in 0..20 {
            assert_eq!(Strategy::Random(1.0).decide(&empty, &empty, seed), C);
            assert_eq!(Strategy::Random(0.0).decide(&empty, &empty, seed), D);
            assert_eq!(Strategy::Random(7.0).decide(&empty, &empty, seed), C);
            assert_eq!(Strategy::Random(-1.0).decide(&empty, &empty, seed), D);
        }
    }

    #[test]
    fn classifiers() {
        assert!(!Strategy::TitForTat.classifier().stochastic);
        assert!(Strategy::Random(0.3).classifier().stochastic);
        assert_eq!(Strategy::Grudger.classifier().memory_depth, None);
        assert_eq!(Strategy::TitForTwoTats.classifier().memory_depth, Some(2));
    }

    #[test]
    fn lineup_has_unique_names() {
        let lineup = classic_lineup();
        let mut names: Vec<_> = lineup.iter().map(|p| p.name().to_string()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), lineup.len());
        assert!(names.contains(&"Random: 0.5".to_string()));
    }

    #[tokio::test]
    async fn plays_through_player_trait() {
        let player = ClassicPlayer::new(Strategy::TitForTat).with_name("TFT");
        let own = h(&[C]);
        let opp = h(&[D]);
        let action = player
            .play(Turn {
                own: &own,
                opponent: &opp,
                seed: 1,
            })
            .await
            .unwrap();
        assert_eq!(player.name(), "TFT");
        assert_eq!(action, D);
    }
}
