//! Bet slip store
//!
//! Holds the user's pending selections. Selections are keyed by
//! (game id, selected side); adding a selection whose key is already present
//! removes it instead, so a second click on the same price cancels the pick.
//!
//! The potential win is derived on every read:
//!     total = Σ effective_stake × odds
//! where a missing stake counts as one unit.

use crate::error::{validate_odds, validate_stake, ValidationError};
use crate::models::{Selection, SelectionKey, DEFAULT_STAKE};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// What `add_selection` did to the slip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlipChange {
    Added,
    Removed,
}

/// Ordered set of selections awaiting checkout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BetSlip {
    selections: Vec<Selection>,
}

impl BetSlip {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle a selection in or out of the slip
    ///
    /// Odds are only validated when the selection is being added; an invalid
    /// stake is dropped so the pick falls back to the unit stake.
    pub fn add_selection(
        &mut self,
        mut selection: Selection,
    ) -> Result<SlipChange, ValidationError> {
        let key = selection.key();
        if let Some(pos) = self.position(&key) {
            self.selections.remove(pos);
            debug!("Toggled off selection {}", key);
            return Ok(SlipChange::Removed);
        }

        validate_odds(selection.odds)?;
        if let Some(stake) = selection.stake {
            if validate_stake(stake).is_err() {
                debug!("Ignoring invalid stake {} for {}", stake, key);
                selection.stake = None;
            }
        }

        self.selections.push(selection);
        debug!("Added selection {}", key);
        Ok(SlipChange::Added)
    }

    /// Remove a selection; returns false when it was not in the slip
    pub fn remove_selection(&mut self, key: &SelectionKey) -> bool {
        match self.position(key) {
            Some(pos) => {
                self.selections.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Replace the stake of a selection; returns false when it was not in the slip
    ///
    /// Non-finite or non-positive stakes are replaced with the unit stake.
    pub fn update_stake(&mut self, key: &SelectionKey, stake: f64) -> bool {
        let stake = if validate_stake(stake).is_ok() {
            stake
        } else {
            debug!("Stake {} for {} replaced by default", stake, key);
            DEFAULT_STAKE
        };

        match self.selections.iter_mut().find(|s| s.matches(key)) {
            Some(selection) => {
                selection.stake = Some(stake);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.selections.clear();
    }

    /// Replace the slip contents with `selections`, applied in order through
    /// `add_selection`. Nothing changes if any selection is rejected.
    pub fn load<I>(&mut self, selections: I) -> Result<(), ValidationError>
    where
        I: IntoIterator<Item = Selection>,
    {
        let mut fresh = BetSlip::new();
        for selection in selections {
            fresh.add_selection(selection)?;
        }
        *self = fresh;
        Ok(())
    }

    pub fn selections(&self) -> &[Selection] {
        &self.selections
    }

    pub fn get(&self, key: &SelectionKey) -> Option<&Selection> {
        self.selections.iter().find(|s| s.matches(key))
    }

    pub fn contains(&self, key: &SelectionKey) -> bool {
        self.position(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.selections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }

    pub fn total_stake(&self) -> f64 {
        self.selections.iter().map(Selection::effective_stake).sum()
    }

    pub fn total_potential_win(&self) -> f64 {
        self.selections.iter().map(Selection::potential_win).sum()
    }

    fn position(&self, key: &SelectionKey) -> Option<usize> {
        self.selections.iter().position(|s| s.matches(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn home() -> Selection {
        Selection::new("g1", "Lakers", "Celtics", "Home", 1.8)
    }

    fn away() -> Selection {
        Selection::new("g1", "Lakers", "Celtics", "Away", 2.1).with_stake(5.0)
    }

    fn assert_total_matches(slip: &BetSlip) {
        let expected: f64 = slip
            .selections()
            .iter()
            .map(|s| s.stake.unwrap_or(1.0) * s.odds)
            .sum();
        assert!((slip.total_potential_win() - expected).abs() < EPS);
    }

    #[test]
    fn test_toggle_scenario() {
        let mut slip = BetSlip::new();

        assert_eq!(slip.add_selection(home()).unwrap(), SlipChange::Added);
        assert!((slip.total_potential_win() - 1.8).abs() < EPS);

        assert_eq!(slip.add_selection(away()).unwrap(), SlipChange::Added);
        assert!((slip.total_potential_win() - 12.3).abs() < EPS);

        // Same key again removes the first pick
        assert_eq!(slip.add_selection(home()).unwrap(), SlipChange::Removed);
        assert_eq!(slip.len(), 1);
        assert!((slip.total_potential_win() - 10.5).abs() < EPS);
    }

    #[test]
    fn test_toggle_twice_restores_state() {
        let mut slip = BetSlip::new();
        slip.add_selection(away()).unwrap();
        let before = slip.selections().to_vec();

        slip.add_selection(home()).unwrap();
        slip.add_selection(home()).unwrap();

        assert_eq!(slip.selections(), before.as_slice());
    }

    #[test]
    fn test_toggle_ignores_price_changes() {
        let mut slip = BetSlip::new();
        slip.add_selection(home()).unwrap();

        let mut repriced = home();
        repriced.odds = 1.95;
        assert_eq!(slip.add_selection(repriced).unwrap(), SlipChange::Removed);
        assert!(slip.is_empty());
    }

    #[test]
    fn test_insertion_order_kept() {
        let mut slip = BetSlip::new();
        slip.add_selection(Selection::new("g2", "A", "B", "A", 1.5)).unwrap();
        slip.add_selection(home()).unwrap();
        slip.add_selection(away()).unwrap();

        let ids: Vec<String> = slip.selections().iter().map(|s| s.key().to_string()).collect();
        assert_eq!(ids, vec!["g2-A", "g1-Home", "g1-Away"]);
    }

    #[test]
    fn test_add_rejects_invalid_odds() {
        let mut slip = BetSlip::new();
        let bad = Selection::new("g1", "A", "B", "A", 0.5);
        assert_eq!(
            slip.add_selection(bad),
            Err(ValidationError::InvalidOdds(0.5))
        );
        assert!(slip.is_empty());
    }

    #[test]
    fn test_add_drops_invalid_stake() {
        let mut slip = BetSlip::new();
        slip.add_selection(home().with_stake(-3.0)).unwrap();
        assert_eq!(slip.selections()[0].stake, None);
        assert!((slip.total_potential_win() - 1.8).abs() < EPS);
    }

    #[test]
    fn test_remove_selection() {
        let mut slip = BetSlip::new();
        slip.add_selection(home()).unwrap();
        slip.add_selection(away()).unwrap();

        assert!(slip.remove_selection(&home().key()));
        assert_eq!(slip.len(), 1);
        assert!(!slip.contains(&home().key()));

        // Absent key is a no-op
        assert!(!slip.remove_selection(&SelectionKey::new("zz", "Home")));
        assert_eq!(slip.len(), 1);
        assert_total_matches(&slip);
    }

    #[test]
    fn test_update_stake() {
        let mut slip = BetSlip::new();
        slip.add_selection(home()).unwrap();

        assert!(slip.update_stake(&home().key(), 10.0));
        assert_eq!(slip.get(&home().key()).unwrap().stake, Some(10.0));
        assert!((slip.total_potential_win() - 18.0).abs() < EPS);
        assert_total_matches(&slip);
    }

    #[test]
    fn test_update_stake_missing_is_noop() {
        let mut slip = BetSlip::new();
        slip.add_selection(home()).unwrap();
        slip.add_selection(away()).unwrap();
        let total = slip.total_potential_win();

        assert!(!slip.update_stake(&SelectionKey::new("nope", "Home"), 50.0));
        assert_eq!(slip.len(), 2);
        assert_eq!(slip.total_potential_win(), total);
    }

    #[test]
    fn test_update_stake_invalid_falls_back_to_unit() {
        let mut slip = BetSlip::new();
        slip.add_selection(away()).unwrap();

        assert!(slip.update_stake(&away().key(), 0.0));
        assert_eq!(slip.selections()[0].stake, Some(1.0));

        assert!(slip.update_stake(&away().key(), f64::NAN));
        assert_eq!(slip.selections()[0].stake, Some(1.0));
    }

    #[test]
    fn test_clear() {
        let mut slip = BetSlip::new();
        slip.add_selection(home()).unwrap();
        slip.add_selection(away()).unwrap();

        slip.clear();
        assert!(slip.is_empty());
        assert!(slip.selections().is_empty());
        assert_eq!(slip.total_potential_win(), 0.0);

        // Clearing an empty slip is fine too
        slip.clear();
        assert!(slip.is_empty());
    }

    #[test]
    fn test_total_stake() {
        let mut slip = BetSlip::new();
        slip.add_selection(home()).unwrap();
        slip.add_selection(away()).unwrap();
        assert!((slip.total_stake() - 6.0).abs() < EPS);
    }

    #[test]
    fn test_total_tracks_mixed_operations() {
        let mut slip = BetSlip::new();
        slip.add_selection(home()).unwrap();
        assert_total_matches(&slip);
        slip.add_selection(away()).unwrap();
        assert_total_matches(&slip);
        slip.update_stake(&home().key(), 4.0);
        assert_total_matches(&slip);
        slip.remove_selection(&away().key());
        assert_total_matches(&slip);
        slip.add_selection(Selection::new("g3", "X", "Y", "Draw", 3.4)).unwrap();
        assert_total_matches(&slip);
        slip.clear();
        assert_total_matches(&slip);
    }

    #[test]
    fn test_load_replaces_contents() {
        let mut slip = BetSlip::new();
        slip.add_selection(Selection::new("old", "A", "B", "A", 2.0)).unwrap();

        slip.load(vec![home(), away()]).unwrap();
        assert_eq!(slip.len(), 2);
        assert!(!slip.contains(&SelectionKey::new("old", "A")));
    }

    #[test]
    fn test_load_is_all_or_nothing() {
        let mut slip = BetSlip::new();
        slip.add_selection(home()).unwrap();

        let result = slip.load(vec![away(), Selection::new("g9", "A", "B", "A", 0.2)]);
        assert!(result.is_err());
        assert_eq!(slip.len(), 1);
        assert!(slip.contains(&home().key()));
    }
}
