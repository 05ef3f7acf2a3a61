//! Sportsbook - bet slip and wallet core for a sports betting front-end
//!
//! This library provides:
//! - Bet slip with toggle selection and derived potential win
//! - Placed bet ledger and the checkout that moves slip entries into it
//! - Odds feed client (the-odds-api.com) with explicit fetch outcomes
//! - Identity and transaction backends (Supabase or in-memory)
//! - Session and wallet state for deposits and withdrawals
//!
//! # Example
//!
//! ```
//! use sportsbook::core::{BetLedger, BetSlip};
//! use sportsbook::models::Selection;
//!
//! let mut slip = BetSlip::new();
//! slip.add_selection(Selection::new("g1", "Lakers", "Celtics", "Lakers", 1.8)).unwrap();
//! let pick = Selection::new("g2", "Heat", "Bulls", "Bulls", 2.1).with_stake(5.0);
//! slip.add_selection(pick).unwrap();
//! assert!((slip.total_potential_win() - 12.3).abs() < 1e-9);
//!
//! let mut ledger = BetLedger::new();
//! ledger.place_bets(slip.selections());
//! slip.clear();
//! assert_eq!(ledger.len(), 2);
//! ```

pub mod backend;
pub mod config;
pub mod context;
pub mod core;
pub mod error;
pub mod models;
pub mod odds;
pub mod session;
pub mod wallet;

// Re-export commonly used types
pub use context::AppContext;
pub use crate::core::{BetLedger, BetSlip, CheckoutOutcome};
pub use models::{
    BetId, BetStatus, Game, PlacedBet, Selection, SelectionKey, Sport, Transaction,
    TransactionKind, User,
};
pub use odds::{Fetch, OddsProvider};
