//! In-process backend

use super::{IdentityProvider, TransactionLedgerService};
use crate::error::BackendError;
use crate::models::{Transaction, TransactionKind, TransactionStatus, User};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct MemoryState {
    /// email -> (user, password)
    accounts: HashMap<String, (User, String)>,
    current: Option<User>,
    transactions: Vec<Transaction>,
    next_user: u64,
    next_tx: u64,
    failures_pending: u32,
}

/// Identity and transaction backend kept entirely in memory
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    state: Mutex<MemoryState>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` transaction creations fail
    pub fn fail_next_transactions(&self, count: u32) {
        self.lock().failures_pending = count;
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn check_credentials(email: &str, password: &str) -> Result<(), BackendError> {
    if email.trim().is_empty() || password.is_empty() {
        return Err(BackendError::Auth(
            "Email and password are required".to_string(),
        ));
    }
    Ok(())
}

#[async_trait]
impl IdentityProvider for InMemoryBackend {
    async fn current_user(&self) -> Result<Option<User>, BackendError> {
        Ok(self.lock().current.clone())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<User, BackendError> {
        check_credentials(email, password)?;
        let mut state = self.lock();
        let user = match state.accounts.get(email) {
            Some((user, stored)) if stored == password => user.clone(),
            _ => return Err(BackendError::Auth("Invalid login credentials".to_string())),
        };
        state.current = Some(user.clone());
        Ok(user)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<User, BackendError> {
        check_credentials(email, password)?;
        let mut state = self.lock();
        if state.accounts.contains_key(email) {
            return Err(BackendError::Auth("User already registered".to_string()));
        }
        state.next_user += 1;
        let user = User {
            id: format!("local-{}", state.next_user),
            email: email.to_string(),
        };
        state
            .accounts
            .insert(email.to_string(), (user.clone(), password.to_string()));
        state.current = Some(user.clone());
        Ok(user)
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        self.lock().current = None;
        Ok(())
    }
}

#[async_trait]
impl TransactionLedgerService for InMemoryBackend {
    async fn get_balance(&self, user_id: &str) -> f64 {
        self.lock()
            .transactions
            .iter()
            .filter(|t| t.user_id == user_id && t.status == TransactionStatus::Completed)
            .map(|t| t.amount)
            .sum()
    }

    async fn create_transaction(
        &self,
        user_id: &str,
        kind: TransactionKind,
        amount: f64,
    ) -> Result<Transaction, BackendError> {
        let mut state = self.lock();
        if state.failures_pending > 0 {
            state.failures_pending -= 1;
            return Err(BackendError::TransactionFailed);
        }

        state.next_tx += 1;
        let tx = Transaction {
            id: format!("tx-{}", state.next_tx),
            user_id: user_id.to_string(),
            kind,
            amount,
            status: TransactionStatus::Completed,
            created_at: Utc::now(),
        };
        state.transactions.push(tx.clone());
        Ok(tx)
    }

    async fn list_transactions(&self, user_id: &str) -> Vec<Transaction> {
        // Insertion order is creation order, so reversing gives newest first
        self.lock()
            .transactions
            .iter()
            .rev()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect()
    }
}
