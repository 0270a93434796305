//! Per-decision prompt rendering.
//!
//! A [`PromptContext`] is built fresh for every decision from the player's
//! template and the two current histories, rendered once, and dropped.
//!
//! Templates use brace placeholders. Every placeholder is optional:
//!
//! | Placeholder | Value |
//! |-------------|-------|
//! | `{totalTurns}` | known game length |
//! | `{endProbability}` | per-turn stopping chance |
//! | `{ownHistoryText}` | this player's moves, e.g. `CCD` |
//! | `{opponentHistoryText}` | the opponent's moves |
//!
//! `{{` and `}}` produce literal braces. Any other name is a
//! [`Error::Template`]; a numeric placeholder whose value is not configured
//! is an [`Error::Config`].

use crate::error::{Error, Result};
use crate::game::{History, history_text};
use std::num::NonZeroUsize;

pub const TOTAL_TURNS: &str = "totalTurns";
pub const END_PROBABILITY: &str = "endProbability";
pub const OWN_HISTORY: &str = "ownHistoryText";
pub const OPPONENT_HISTORY: &str = "opponentHistoryText";

/// Snapshot of everything a template can see on one turn.
#[derive(Debug, Clone, Copy)]
pub struct PromptContext<'a> {
    pub template: &'a str,
    pub own_history: &'a History,
    pub opponent_history: &'a History,
    pub history_window: Option<NonZeroUsize>,
    pub total_turns: Option<u32>,
    pub end_probability: Option<f64>,
}

impl<'a> PromptContext<'a> {
    pub fn new(template: &'a str, own_history: &'a History, opponent_history: &'a History) -> Self {
        Self {
            template,
            own_history,
            opponent_history,
            history_window: None,
            total_turns: None,
            end_probability: None,
        }
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

    /// Render the template into the final prompt text.
    pub fn render(&self) -> Result<String> {
        let mut out = String::with_capacity(self.template.len() + 64);
        let mut chars = self.template.char_indices().peekable();

        while let Some((pos, ch)) = chars.next() {
            match ch {
                '{' if chars.peek().map(|(_, c)| *c) == Some('{') => {
                    chars.next();
                    out.push('{');
                }
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for (_, c) in chars.by_ref() {
                        if c == '}' {
                            closed = true;
                            break;
                        }
                        name.push(c);
                    }
                    if !closed {
                        return Err(Error::template(format!(
                            "unclosed placeholder starting at byte {pos}"
                        )));
                    }
                    out.push_str(&self.value_of(&name)?);
                }
                '}' if chars.peek().map(|(_, c)| *c) == Some('}') => {
                    chars.next();
                    out.push('}');
                }
                '}' => {
                    return Err(Error::template(format!(
                        "unmatched `}}` at byte {pos} (use `}}}}` for a literal brace)"
                    )));
                }
                other => out.push(other),
            }
        }

        Ok(out)
    }

    fn value_of(&self, name: &str) -> Result<String> {
        match name {
            TOTAL_TURNS => self.total_turns.map(|t| t.to_string()).ok_or(Error::Config {
                placeholder: TOTAL_TURNS.into(),
            }),
            END_PROBABILITY => self
                .end_probability
                .map(|p| p.to_string())
                .ok_or(Error::Config {
                    placeholder: END_PROBABILITY.into(),
                }),
            OWN_HISTORY => Ok(history_text(self.own_history.window(self.history_window))),
            OPPONENT_HISTORY => Ok(history_text(
                self.opponent_history.window(self.history_window),
            )),
            other => Err(Error::template(format!(
                "unsupported placeholder `{{{other}}}`"
            ))),
        }
    }

    /// Check a template against a player's settings without any game state.
    ///
    /// Renders against empty histories, so it reports exactly the
    /// template/config mismatches that rendering mid-tournament would.
    pub fn validate(
        template: &str,
        total_turns: Option<u32>,
        end_probability: Option<f64>,
    ) -> Result<()> {
        let empty = History::new();
        PromptContext::new(template, &empty, &empty)
            .with_total_turns(total_turns)
            .with_end_probability(end_probability)
            .render()
            .map(|_| ())
    }
}
