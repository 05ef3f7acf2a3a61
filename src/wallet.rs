//! Deposits, withdrawals and balance history
//!
//! The balance shown is always one read back from the transaction service
//! after a successful write; a failed write leaves it exactly as it was.

use crate::backend::TransactionLedgerService;
use crate::error::{validate_amount, ValidationError, WalletError};
use crate::models::{Transaction, TransactionKind, DEFAULT_STAKE};
use std::sync::Arc;
use tracing::{info, warn};

const DEPOSIT_FAILED: &str = "Failed to process deposit. Please try again.";
const WITHDRAWAL_FAILED: &str = "Failed to process withdrawal. Please try again.";

/// Balance controller for one user at a time
pub struct Wallet {
    service: Arc<dyn TransactionLedgerService>,
    balance: Option<f64>,
    transactions: Vec<Transaction>,
    error: Option<String>,
}

impl Wallet {
    pub fn new(service: Arc<dyn TransactionLedgerService>) -> Self {
        Self {
            service,
            balance: None,
            transactions: Vec::new(),
            error: None,
        }
    }

    /// Last balance read; `None` before the first refresh
    pub fn balance(&self) -> Option<f64> {
        self.balance
    }

    /// History, newest first
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Forget everything (on sign-out)
    pub fn reset(&mut self) {
        self.balance = None;
        self.transactions.clear();
        self.error = None;
    }

    /// Load balance and history for a user
    pub async fn refresh(&mut self, user_id: &str) {
        let (balance, transactions) = tokio::join!(
            self.service.get_balance(user_id),
            self.service.list_transactions(user_id)
        );
        self.balance = Some(balance);
        self.transactions = transactions;
    }

    pub async fn deposit(
        &mut self,
        user_id: &str,
        amount: f64,
    ) -> Result<Transaction, WalletError> {
        validate_amount(amount)?;
        self.apply(user_id, TransactionKind::Deposit, amount, DEPOSIT_FAILED)
            .await
    }

    /// Withdraw up to the last known balance
    pub async fn withdraw(
        &mut self,
        user_id: &str,
        amount: f64,
    ) -> Result<Transaction, WalletError> {
        validate_amount(amount)?;
        match self.balance {
            Some(balance) if amount <= balance => {}
            _ => {
                self.error = Some(WalletError::InsufficientFunds.to_string());
                return Err(WalletError::InsufficientFunds);
            }
        }
        self.apply(user_id, TransactionKind::Withdrawal, -amount, WITHDRAWAL_FAILED)
            .await
    }

    async fn apply(
        &mut self,
        user_id: &str,
        kind: TransactionKind,
        signed_amount: f64,
        failure_message: &str,
    ) -> Result<Transaction, WalletError> {
        self.error = None;

        let result = self
            .service
            .create_transaction(user_id, kind, signed_amount)
            .await;

        match result {
            Ok(tx) => {
                info!("{} of {:.2} recorded as {}", kind, signed_amount.abs(), tx.id);
                self.refresh(user_id).await;
                Ok(tx)
            }
            Err(e) => {
                warn!("{} failed: {}", kind, e);
                self.error = Some(failure_message.to_string());
                Err(WalletError::Backend(e))
            }
        }
    }
}

/// Parse an amount typed by the user
pub fn parse_amount(text: &str) -> Result<f64, WalletError> {
    let amount = text
        .trim()
        .parse::<f64>()
        .map_err(|_| ValidationError::InvalidAmount(f64::NAN))?;
    validate_amount(amount)?;
    Ok(amount)
}

/// Parse a stake typed by the user, falling back to one unit
pub fn parse_stake(text: &str) -> f64 {
    match text.trim().parse::<f64>() {
        Ok(stake) if stake.is_finite() && stake > 0.0 => stake,
        _ => DEFAULT_STAKE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InMemoryBackend;

    fn setup() -> (Arc<InMemoryBackend>, Wallet) {
        let backend = Arc::new(InMemoryBackend::new());
        let wallet = Wallet::new(backend.clone());
        (backend, wallet)
    }

    #[tokio::test]
    async fn test_deposit_updates_balance_and_history() {
        let (_backend, mut wallet) = setup();
        wallet.refresh("u1").await;
        assert_eq!(wallet.balance(), Some(0.0));

        wallet.deposit("u1", 100.0).await.unwrap();
        assert_eq!(wallet.balance(), Some(100.0));
        assert_eq!(wallet.transactions().len(), 1);
        assert_eq!(wallet.transactions()[0].kind, TransactionKind::Deposit);
        assert!(wallet.error().is_none());
    }

    #[tokio::test]
    async fn test_failed_deposit_keeps_balance() {
        let (backend, mut wallet) = setup();
        wallet.deposit("u1", 40.0).await.unwrap();
        let before = wallet.balance();

        backend.fail_next_transactions(1);
        let err = wallet.deposit("u1", 25.0).await.unwrap_err();

        assert!(matches!(err, WalletError::Backend(_)));
        assert_eq!(wallet.balance(), before);
        assert_eq!(wallet.error(), Some(DEPOSIT_FAILED));
        assert_eq!(wallet.transactions().len(), 1);
    }

    #[tokio::test]
    async fn test_withdraw_signed_negative() {
        let (backend, mut wallet) = setup();
        wallet.deposit("u1", 50.0).await.unwrap();

        let tx = wallet.withdraw("u1", 20.0).await.unwrap();
        assert_eq!(tx.amount, -20.0);
        assert_eq!(wallet.balance(), Some(30.0));
        assert_eq!(backend.get_balance("u1").await, 30.0);
    }

    #[tokio::test]
    async fn test_withdraw_insufficient_funds() {
        let (backend, mut wallet) = setup();
        wallet.deposit("u1", 10.0).await.unwrap();

        let err = wallet.withdraw("u1", 10.5).await.unwrap_err();
        assert!(matches!(err, WalletError::InsufficientFunds));
        assert_eq!(wallet.error(), Some("Insufficient funds"));
        assert_eq!(backend.list_transactions("u1").await.len(), 1);
    }

    #[tokio::test]
    async fn test_withdraw_before_refresh_is_rejected() {
        let (_backend, mut wallet) = setup();
        assert!(matches!(
            wallet.withdraw("u1", 1.0).await,
            Err(WalletError::InsufficientFunds)
        ));
    }

    #[tokio::test]
    async fn test_failed_withdrawal_message() {
        let (backend, mut wallet) = setup();
        wallet.deposit("u1", 10.0).await.unwrap();
        backend.fail_next_transactions(1);

        assert!(wallet.withdraw("u1", 5.0).await.is_err());
        assert_eq!(wallet.balance(), Some(10.0));
        assert_eq!(wallet.error(), Some(WITHDRAWAL_FAILED));
    }

    #[tokio::test]
    async fn test_invalid_amounts_rejected() {
        let (backend, mut wallet) = setup();
        assert!(matches!(
            wallet.deposit("u1", 0.0).await,
            Err(WalletError::Validation(_))
        ));
        assert!(wallet.deposit("u1", -5.0).await.is_err());
        assert!(backend.list_transactions("u1").await.is_empty());
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount(" 12.50 ").unwrap(), 12.5);
        assert!(parse_amount("abc").is_err());
        assert!(parse_amount("0").is_err());
        assert!(parse_amount("-3").is_err());
    }

    #[test]
    fn test_parse_stake_defaults() {
        assert_eq!(parse_stake("7.5"), 7.5);
        assert_eq!(parse_stake(""), 1.0);
        assert_eq!(parse_stake("ten"), 1.0);
        assert_eq!(parse_stake("0"), 1.0);
        assert_eq!(parse_stake("-2"), 1.0);
        assert_eq!(parse_stake("NaN"), 1.0);
    }
}
