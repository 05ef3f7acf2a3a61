//! Checkout: slip -> ledger
//!
//! 1. Read the slip. Empty slip: nothing happens.
//! 2. Hand the selections to the persistence sink.
//! 3. Sink ok: convert into the ledger, then clear the slip.
//! 4. Sink error: slip and ledger are untouched, the error is returned and
//!    the caller may retry.
//!
//! A sink that fails part way (some bets recorded upstream) still leaves the
//! slip intact, so a retry can record those bets twice. Placement is
//! at-least-once.

use super::bet_slip::BetSlip;
use super::ledger::BetLedger;
use crate::backend::TransactionLedgerService;
use crate::error::{BackendError, CheckoutError};
use crate::models::{BetId, Selection, TransactionKind};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// External persistence step of checkout
#[async_trait]
pub trait BetSink: Send + Sync {
    async fn record(&self, selections: &[Selection]) -> Result<(), BackendError>;
}

/// Sink for the in-memory design: nothing leaves the process
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

#[async_trait]
impl BetSink for NoopSink {
    async fn record(&self, _selections: &[Selection]) -> Result<(), BackendError> {
        Ok(())
    }
}

/// Books one negative `bet` transaction per selection for a user
pub struct TransactionSink {
    service: Arc<dyn TransactionLedgerService>,
    user_id: String,
}

impl TransactionSink {
    pub fn new(service: Arc<dyn TransactionLedgerService>, user_id: impl Into<String>) -> Self {
        Self {
            service,
            user_id: user_id.into(),
        }
    }
}

#[async_trait]
impl BetSink for TransactionSink {
    async fn record(&self, selections: &[Selection]) -> Result<(), BackendError> {
        for selection in selections {
            self.service
                .create_transaction(
                    &self.user_id,
                    TransactionKind::Bet,
                    -selection.effective_stake(),
                )
                .await?;
        }
        Ok(())
    }
}

/// Summary of a successful placement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutReceipt {
    pub bet_ids: Vec<BetId>,
    pub total_stake: f64,
    pub total_potential_win: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CheckoutOutcome {
    /// Slip was empty; nothing was sent or changed
    Empty,
    Placed(CheckoutReceipt),
}

/// Place every selection in the slip
pub async fn checkout<S>(
    slip: &mut BetSlip,
    ledger: &mut BetLedger,
    sink: &S,
) -> Result<CheckoutOutcome, CheckoutError>
where
    S: BetSink + ?Sized,
{
    if slip.is_empty() {
        return Ok(CheckoutOutcome::Empty);
    }

    let selections = slip.selections().to_vec();
    let total_stake = slip.total_stake();
    let total_potential_win = slip.total_potential_win();

    if let Err(e) = sink.record(&selections).await {
        warn!("Bet placement failed, keeping {} selections: {}", selections.len(), e);
        return Err(CheckoutError::Persistence(e));
    }

    let bet_ids = ledger.place_bets(&selections);
    slip.clear();
    info!(
        "Placed {} bets, stake {:.2}, potential win {:.2}",
        bet_ids.len(),
        total_stake,
        total_potential_win
    );

    Ok(CheckoutOutcome::Placed(CheckoutReceipt {
        bet_ids,
        total_stake,
        total_potential_win,
    }))
}
