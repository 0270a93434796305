//! Moves, per-player histories, and the prisoner's dilemma payoff matrix.

use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;

/// A single turn's choice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Cooperate,
    Defect,
}

impl Action {
    /// The fixed single-character code used in prompts and model replies.
    pub const fn code(self) -> char {
        match self {
            Action::Cooperate => 'C',
            Action::Defect => 'D',
        }
    }

    /// Inverse of [`Action::code`]. Case-sensitive.
    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'C' => Some(Action::Cooperate),
            'D' => Some(Action::Defect),
            _ => None,
        }
    }

    pub const fn flip(self) -> Self {
        match self {
            Action::Cooperate => Action::Defect,
            Action::Defect => Action::Cooperate,
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Points awarded to `(a, b)` for one turn.
pub fn payoff(a: Action, b: Action) -> (u32, u32) {
    match (a, b) {
        (Action::Cooperate, Action::Cooperate) => (3, 3),
        (Action::Cooperate, Action::Defect) => (0, 5),
        (Action::Defect, Action::Cooperate) => (5, 0),
        (Action::Defect, Action::Defect) => (1, 1),
    }
}

/// Chronological, append-only record of one participant's moves in a match.
///
/// The tournament engine owns every `History` and is the only writer.
/// Players receive shared references and can only read them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct History(Vec<Action>);

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(turns: usize) -> Self {
        Self(Vec::with_capacity(turns))
    }

    pub fn push(&mut self, action: Action) {
        self.0.push(action);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<Action> {
        self.0.last().copied()
    }

    pub fn as_slice(&self) -> &[Action] {
        &self.0
    }

    /// The trailing `window` entries, oldest first. `None` means the whole
    /// history; a window larger than the history yields all of it.
    pub fn window(&self, window: Option<NonZeroUsize>) -> &[Action] {
        match window {
            Some(n) => {
                let start = self.0.len().saturating_sub(n.get());
                &self.0[start..]
            }
            None => &self.0,
        }
    }

    pub fn cooperations(&self) -> usize {
        self.0.iter().filter(|a| **a == Action::Cooperate).count()
    }

    pub fn defections(&self) -> usize {
        self.0.len() - self.cooperations()
    }

    pub fn iter(&self) -> impl Iterator<Item = Action> + '_ {
        self.0.iter().copied()
    }
}

impl From<Vec<Action>> for History {
    fn from(actions: Vec<Action>) -> Self {
        Self(actions)
    }
}

impl FromIterator<Action> for History {
    fn from_iter<I: IntoIterator<Item = Action>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Render actions as their character codes, oldest first, no separators.
pub fn history_text(actions: &[Action]) -> String {
    actions.iter().map(|a| a.code()).collect()
}
