//! Identity and transaction backends
//!
//! Two implementations of each seam:
//! - `SupabaseClient` talks to a Supabase project over its REST and auth APIs
//! - `InMemoryBackend` keeps everything in process (offline mode and tests)

mod memory;
mod supabase;

pub use memory::InMemoryBackend;
pub use supabase::SupabaseClient;

use crate::error::BackendError;
use crate::models::{Transaction, TransactionKind, User};
use async_trait::async_trait;

/// Sign-in, sign-up and sign-out against an identity service
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// User of the current session, if any
    async fn current_user(&self) -> Result<Option<User>, BackendError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<User, BackendError>;

    async fn sign_up(&self, email: &str, password: &str) -> Result<User, BackendError>;

    async fn sign_out(&self) -> Result<(), BackendError>;
}

/// Persisted balance movements for a user
#[async_trait]
pub trait TransactionLedgerService: Send + Sync {
    /// Current balance; lookup failures read as zero
    async fn get_balance(&self, user_id: &str) -> f64;

    /// Record a movement with a signed amount. Fails explicitly.
    async fn create_transaction(
        &self,
        user_id: &str,
        kind: TransactionKind,
        amount: f64,
    ) -> Result<Transaction, BackendError>;

    /// History, newest first; lookup failures read as empty
    async fn list_transactions(&self, user_id: &str) -> Vec<Transaction>;
}
