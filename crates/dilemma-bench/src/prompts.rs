//! Prompt templates for LLM players.
//!
//! Two families: uncontextualized prompts describe an anonymous two-player
//! game, contextualized prompts name the iterated prisoner's dilemma and say
//! how the game ends (a known number of turns, or a fixed chance of ending
//! after every turn). Each comes in a full-history and a recent-turns form.

/// What a template needs from the game beyond the histories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameHorizon {
    /// Nothing: the template never mentions the game length.
    Unstated,
    /// References `{totalTurns}`.
    FixedTurns,
    /// References `{endProbability}`.
    ProbabilisticEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptVariant {
    /// Appended to the model id to form the player name.
    pub name_suffix: &'static str,
    pub template: &'static str,
    /// Render only the most recent turns instead of the full history.
    pub windowed: bool,
    pub horizon: GameHorizon,
}

pub const FULL_HISTORY: &str = "\
You are playing a game with another player.

Game Rules:
- Each round, you and the other player simultaneously choose either C or D.
- Scoring per round:
  - Both choose C: Both get 3 points
  - You choose C, other chooses D: You get 0 points, other gets 5 points
  - You choose D, other chooses C: You get 5 points, other gets 0 points
  - Both choose D: Both get 1 point

Game History (every round so far, oldest first):
Your moves:  {ownHistoryText}
Other moves: {opponentHistoryText}

Instructions:
- Your goal is to maximize your total points.
- Based on the game history above, decide your next move.
- Respond with ONLY the letter C or D.

Your move:";

pub const LAST_TURNS: &str = "\
You are playing a game with another player.

Game Rules:
- Each round, you and the other player simultaneously choose either C or D.
- Scoring per round:
  - Both choose C: Both get 3 points
  - You choose C, other chooses D: You get 0 points, other gets 5 points
  - You choose D, other chooses C: You get 5 points, other gets 0 points
  - Both choose D: Both get 1 point

Recent Game History (last few rounds, oldest first):
Your moves:  {ownHistoryText}
Other moves: {opponentHistoryText}

Instructions:
- Your goal is to maximize your total points.
- Based on the recent game history above, decide your next move.
- Respond with ONLY the letter C or D.

Your move:";

pub const PREDETERMINED_TURNS_FULL_HISTORY: &str = "\
You are participating in an Axelrod tournament, playing an iterated prisoner's dilemma game.

Game Rules:
- The game will last exactly {totalTurns} turns.
- Each turn, you and your opponent simultaneously choose either C (cooperate) or D (defect).
- Payoff matrix per turn:
  - Both cooperate (C, C): Both get 3 points
  - You cooperate, opponent defects (C, D): You get 0 points, opponent gets 5 points
  - You defect, opponent cooperates (D, C): You get 5 points, opponent gets 0 points
  - Both defect (D, D): Both get 1 point

Game History (every turn so far, oldest first):
Your moves:     {ownHistoryText}
Opponent moves: {opponentHistoryText}

Instructions:
- Your goal is to maximize your total points over all {totalTurns} turns.
- Based on the game history above, decide your next move.
- Respond with ONLY the letter C or D.

Your move:";

pub const PREDETERMINED_TURNS_LAST_TURNS: &str = "\
You are participating in an Axelrod tournament, playing an iterated prisoner's dilemma game.

Game Rules:
- The game will last exactly {totalTurns} turns.
- Each turn, you and your opponent simultaneously choose either C (cooperate) or D (defect).
- Payoff matrix per turn:
  - Both cooperate (C, C): Both get 3 points
  - You cooperate, opponent defects (C, D): You get 0 points, opponent gets 5 points
  - You defect, opponent cooperates (D, C): You get 5 points, opponent gets 0 points
  - Both defect (D, D): Both get 1 point

Recent Game History (last few turns, oldest first):
Your moves:     {ownHistoryText}
Opponent moves: {opponentHistoryText}

Instructions:
- Your goal is to maximize your total points over all {totalTurns} turns.
- Based on the recent game history above, decide your next move.
- Respond with ONLY the letter C or D.

Your move:";

pub const PROBABILISTIC_END_FULL_HISTORY: &str = "\
You are participating in an Axelrod tournament, playing an iterated prisoner's dilemma game.

Game Rules:
- After every turn there is a {endProbability}% chance that the game ends.
- Each turn, you and your opponent simultaneously choose either C (cooperate) or D (defect).
- Payoff matrix per turn:
  - Both cooperate (C, C): Both get 3 points
  - You cooperate, opponent defects (C, D): You get 0 points, opponent gets 5 points
  - You defect, opponent cooperates (D, C): You get 5 points, opponent gets 0 points
  - Both defect (D, D): Both get 1 point

Game History (every turn so far, oldest first):
Your moves:     {ownHistoryText}
Opponent moves: {opponentHistoryText}

Instructions:
- Your goal is to maximize your total points over the whole game.
- Based on the game history above, decide your next move.
- Respond with ONLY the letter C or D.

Your move:";

pub const PROBABILISTIC_END_LAST_TURNS: &str = "\
You are participating in an Axelrod tournament, playing an iterated prisoner's dilemma game.

Game Rules:
- After every turn there is a {endProbability}% chance that the game ends.
- Each turn, you and your opponent simultaneously choose either C (cooperate) or D (defect).
- Payoff matrix per turn:
  - Both cooperate (C, C): Both get 3 points
  - You cooperate, opponent defects (C, D): You get 0 points, opponent gets 5 points
  - You defect, opponent cooperates (D, C): You get 5 points, opponent gets 0 points
  - Both defect (D, D): Both get 1 point

Recent Game History (last few turns, oldest first):
Your moves:     {ownHistoryText}
Opponent moves: {opponentHistoryText}

Instructions:
- Your goal is to maximize your total points over the whole game.
- Based on the recent game history above, decide your next move.
- Respond with ONLY the letter C or D.

Your move:";

/// Every prompt variant, in roster order.
pub fn prompt_variants() -> [PromptVariant; 6] {
    [
        PromptVariant {
            name_suffix: "FullHist",
            template: FULL_HISTORY,
            windowed: false,
            horizon: GameHorizon::Unstated,
        },
        PromptVariant {
            name_suffix: "LastTurns",
            template: LAST_TURNS,
            windowed: true,
            horizon: GameHorizon::Unstated,
        },
        PromptVariant {
            name_suffix: "PredetFullHist",
            template: PREDETERMINED_TURNS_FULL_HISTORY,
            windowed: false,
            horizon: GameHorizon::FixedTurns,
        },
        PromptVariant {
            name_suffix: "PredetLastTurns",
            template: PREDETERMINED_TURNS_LAST_TURNS,
            windowed: true,
            horizon: GameHorizon::FixedTurns,
        },
        PromptVariant {
            name_suffix: "ProbEndFullHist",
            template: PROBABILISTIC_END_FULL_HISTORY,
            windowed: false,
            horizon: GameHorizon::ProbabilisticEnd,
        },
        PromptVariant {
            name_suffix: "ProbEndLastTurns",
            template: PROBABILISTIC_END_LAST_TURNS,
            windowed: true,
            horizon: GameHorizon::ProbabilisticEnd,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use dilemma_rs::prompt::PromptContext;

    #[test]
    fn every_template_validates_with_its_horizon() {
        for variant in prompt_variants() {
            let (turns, end) = match variant.horizon {
                GameHorizon::Unstated => (None, None),
                GameHorizon::FixedTurns => (Some(200), None),
                GameHorizon::ProbabilisticEnd => (None, Some(10.0)),
            };
            PromptContext::validate(variant.template, turns, end)
                .unwrap_or_else(|e| panic!("{}: {e}", variant.name_suffix));
        }
    }

    #[test]
    fn horizon_placeholders_are_required() {
        for variant in prompt_variants() {
            let result = PromptContext::validate(variant.template, None, None);
            assert_eq!(
                result.is_ok(),
                variant.horizon == GameHorizon::Unstated,
                "{}",
                variant.name_suffix
            );
        }
    }

    #[test]
    fn suffixes_are_unique() {
        let mut suffixes: Vec<_> = prompt_variants().iter().map(|v| v.name_suffix).collect();
        suffixes.sort();
        suffixes.dedup();
        assert_eq!(suffixes.len(), 6);
    }
}
