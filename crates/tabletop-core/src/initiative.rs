//! Turn order derived from token initiative values.
//!
//! The combatant list is never stored: it is recomputed from the live token set
//! every time it is needed. The tracker only keeps a positional turn index and the
//! round counter, so adding or removing a combatant mid-round shifts whoever sits
//! at the current index. That can skip or repeat a turn and is intentional.

use crate::token::{Token, TokenId};
use serde::{Deserialize, Serialize};

/// Tokens with an initiative, highest first. Ties keep their order in `tokens`.
pub fn combatants(tokens: &[Token]) -> Vec<&Token> {
    let mut combatants: Vec<&Token> = tokens.iter().filter(|t| t.is_combatant()).collect();
    // `sort_by` is stable, so equal initiatives keep array order
    combatants.sort_by(|a, b| b.initiative.cmp(&a.initiative));
    combatants
}

/// Turn and round counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitiativeTracker {
    current_turn_index: usize,
    round: u32,
}

impl Default for InitiativeTracker {
    fn default() -> Self {
        Self {
            current_turn_index: 0,
            round: 1,
        }
    }
}

impl InitiativeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_turn_index(&self) -> usize {
        self.current_turn_index
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    /// Token whose turn it is, if the index points at a combatant.
    pub fn active_combatant<'a>(&self, tokens: &'a [Token]) -> Option<&'a Token> {
        combatants(tokens).get(self.current_turn_index).copied()
    }

    /// Advance to the next combatant, wrapping into a new round.
    ///
    /// Returns the newly active token, or `None` when nobody has initiative.
    pub fn next_turn(&mut self, tokens: &[Token]) -> Option<TokenId> {
        let order = combatants(tokens);
        if order.is_empty() {
            return None;
        }
        if self.current_turn_index >= order.len() - 1 {
            self.current_turn_index = 0;
            self.round += 1;
        } else {
            self.current_turn_index += 1;
        }
        log::debug!(
            "turn advanced to index {} in round {}",
            self.current_turn_index,
            self.round
        );
        Some(order[self.current_turn_index].id())
    }

    /// Step back to the previous combatant. The round never drops below 1.
    pub fn prev_turn(&mut self, tokens: &[Token]) -> Option<TokenId> {
        let order = combatants(tokens);
        if order.is_empty() {
            return None;
        }
        if self.current_turn_index == 0 {
            self.current_turn_index = order.len() - 1;
            self.round = self.round.saturating_sub(1).max(1);
        } else {
            self.current_turn_index = (self.current_turn_index - 1).min(order.len() - 1);
        }
        Some(order[self.current_turn_index].id())
    }

    /// Back to the first combatant of round 1. Token data is untouched.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;

    fn token(initiative: Option<i32>) -> Token {
        let token = Token::new(Point::ZERO);
        match initiative {
            Some(value) => token.with_initiative(value),
            None => token,
        }
    }

    #[test]
    fn test_order_descending() {
        let tokens = vec![token(Some(10)), token(Some(15)), token(Some(5)), token(None)];
        let order: Vec<i32> = combatants(&tokens)
            .iter()
            .filter_map(|t| t.initiative)
            .collect();
        assert_eq!(order, vec![15, 10, 5]);
    }

    #[test]
    fn test_tokens_without_initiative_are_excluded() {
        let tokens = vec![token(None), token(None)];
        assert!(combatants(&tokens).is_empty());

        let mut tracker = InitiativeTracker::new();
        assert_eq!(tracker.next_turn(&tokens), None);
        assert_eq!(tracker.prev_turn(&tokens), None);
        assert_eq!(tracker, InitiativeTracker::new());
    }

    #[test]
    fn test_full_cycle_increments_round_once() {
        let tokens = vec![token(Some(10)), token(Some(15)), token(Some(5))];
        let mut tracker = InitiativeTracker::new();

        tracker.next_turn(&tokens);
        tracker.next_turn(&tokens);
        assert_eq!(tracker.round(), 1);
        let active = tracker.next_turn(&tokens);

        assert_eq!(tracker.current_turn_index(), 0);
        assert_eq!(tracker.round(), 2);
        // Index 0 is the 15
        assert_eq!(active, Some(tokens[1].id()));
    }

    #[test]
    fn test_round_never_below_one() {
        let tokens = vec![token(Some(3)), token(Some(2))];
        let mut tracker = InitiativeTracker::new();

        for _ in 0..5 {
            tracker.prev_turn(&tokens);
            assert!(tracker.round() >= 1);
        }
        assert_eq!(tracker.round(), 1);
    }

    #[test]
    fn test_prev_wraps_and_decrements_round() {
        let tokens = vec![token(Some(3)), token(Some(2))];
        let mut tracker = InitiativeTracker::new();

        tracker.next_turn(&tokens);
        tracker.next_turn(&tokens);
        assert_eq!((tracker.current_turn_index(), tracker.round()), (0, 2));

        let active = tracker.prev_turn(&tokens);
        assert_eq!((tracker.current_turn_index(), tracker.round()), (1, 1));
        assert_eq!(active, Some(tokens[1].id()));
    }

    #[test]
    fn test_ties_keep_array_order() {
        let tokens = vec![
            token(Some(20)).with_label("first"),
            token(Some(20)).with_label("second"),
            token(Some(1)).with_label("third"),
        ];
        let order: Vec<_> = combatants(&tokens).iter().map(|t| t.id()).collect();
        assert_eq!(order, vec![tokens[0].id(), tokens[1].id(), tokens[2].id()]);

        let mut tracker = InitiativeTracker::new();
        tracker.next_turn(&tokens);
        assert_eq!(tracker.current_turn_index(), 1);

        let active = tracker.next_turn(&tokens);
        assert_eq!(tracker.current_turn_index(), 2);
        assert_eq!(tracker.round(), 1);
        assert_eq!(active, Some(tokens[2].id()));
    }

    #[test]
    fn test_reset() {
        let tokens = vec![token(Some(3)), token(Some(2))];
        let mut tracker = InitiativeTracker::new();
        tracker.next_turn(&tokens);
        tracker.next_turn(&tokens);
        tracker.next_turn(&tokens);
        tracker.reset();

        assert_eq!(tracker.current_turn_index(), 0);
        assert_eq!(tracker.round(), 1);
        assert_eq!(tokens[0].initiative, Some(3));
    }

    #[test]
    fn test_index_is_positional_across_roster_change() {
        let mut tokens = vec![token(Some(20)), token(Some(10)), token(Some(5))];
        let mut tracker = InitiativeTracker::new();
        tracker.next_turn(&tokens);
        assert_eq!(tracker.active_combatant(&tokens).unwrap().id(), tokens[1].id());

        // A new combatant slots in ahead; the index stays put and now names the 12
        tokens.push(token(Some(12)));
        assert_eq!(tracker.current_turn_index(), 1);
        assert_eq!(tracker.active_combatant(&tokens).unwrap().id(), tokens[3].id());
    }

    #[test]
    fn test_shrunk_roster_wraps_on_next() {
        let mut tokens = vec![token(Some(20)), token(Some(10)), token(Some(5))];
        let mut tracker = InitiativeTracker::new();
        tracker.next_turn(&tokens);
        tracker.next_turn(&tokens);
        assert_eq!(tracker.current_turn_index(), 2);

        tokens[2].initiative = None;
        tokens[1].initiative = None;
        assert!(tracker.active_combatant(&tokens).is_none());

        tracker.next_turn(&tokens);
        assert_eq!((tracker.current_turn_index(), tracker.round()), (0, 2));
    }
}
