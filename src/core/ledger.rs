//! Placed bet ledger
//!
//! Placed bets are copied by value out of the slip at checkout, get a
//! ledger-assigned id, and start out `Pending`. Status changes only through
//! `set_status`; nothing here decides a result.

use crate::models::{BetId, BetStatus, PlacedBet, Selection};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BetLedger {
    bets: Vec<PlacedBet>,
    next_id: u64,
}

impl BetLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert selections into pending bets and append them in one step
    ///
    /// Returns the ids of the new bets, in input order.
    pub fn place_bets(&mut self, selections: &[Selection]) -> Vec<BetId> {
        let start = self.next_id;
        let new_bets: Vec<PlacedBet> = selections
            .iter()
            .zip(start..)
            .map(|(selection, seq)| PlacedBet {
                id: BetId(seq + 1),
                selection: selection.key(),
                home_team: selection.home_team.clone(),
                away_team: selection.away_team.clone(),
                selected_team: selection.selected_team.clone(),
                odds: selection.odds,
                stake: selection.effective_stake(),
                status: BetStatus::Pending,
            })
            .collect();

        let ids: Vec<BetId> = new_bets.iter().map(|b| b.id).collect();
        self.next_id = start + new_bets.len() as u64;
        self.bets.extend(new_bets);

        debug!("Placed {} bets, ledger size {}", ids.len(), self.bets.len());
        ids
    }

    /// Remove a bet; returns false when the id is unknown
    pub fn remove_bet(&mut self, id: BetId) -> bool {
        let before = self.bets.len();
        self.bets.retain(|b| b.id != id);
        self.bets.len() != before
    }

    /// Drop every bet. Ids keep counting up so they are never reused.
    pub fn clear_bets(&mut self) {
        self.bets.clear();
    }

    /// Record a settlement result from an external process
    pub fn set_status(&mut self, id: BetId, status: BetStatus) -> bool {
        match self.bets.iter_mut().find(|b| b.id == id) {
            Some(bet) => {
                debug!("Bet {} status {} -> {}", id, bet.status, status);
                bet.status = status;
                true
            }
            None => false,
        }
    }

    pub fn bets(&self) -> &[PlacedBet] {
        &self.bets
    }

    pub fn get(&self, id: BetId) -> Option<&PlacedBet> {
        self.bets.iter().find(|b| b.id == id)
    }

    pub fn len(&self) -> usize {
        self.bets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bets.is_empty()
    }

    /// Accumulator odds: product of all prices (1.0 when empty)
    pub fn combined_odds(&self) -> f64 {
        self.bets.iter().map(|b| b.odds).product()
    }

    pub fn total_staked(&self) -> f64 {
        self.bets.iter().map(|b| b.stake).sum()
    }

    pub fn total_potential_win(&self) -> f64 {
        self.bets.iter().map(PlacedBet::potential_win).sum()
    }

    pub fn count_by_status(&self, status: BetStatus) -> usize {
        self.bets.iter().filter(|b| b.status == status).count()
    }
}
