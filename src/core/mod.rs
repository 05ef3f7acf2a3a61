//! Core betting state: slip, ledger and checkout

pub mod bet_slip;
pub mod checkout;
pub mod ledger;

// Re-export commonly used types
pub use bet_slip::{BetSlip, SlipChange};
pub use checkout::{
    checkout, BetSink, CheckoutOutcome, CheckoutReceipt, NoopSink, TransactionSink,
};
pub use ledger::BetLedger;
