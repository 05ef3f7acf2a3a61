//! Application context
//!
//! Every store and service is built exactly once here and handed to callers
//! by reference. Nothing in the crate keeps process-wide state.

use crate::backend::{IdentityProvider, InMemoryBackend, SupabaseClient, TransactionLedgerService};
use crate::config::AppConfig;
use crate::core::{checkout, BetLedger, BetSlip, CheckoutOutcome, NoopSink, TransactionSink};
use crate::error::{BackendError, CheckoutError, StartupError, WalletError};
use crate::models::Transaction;
use crate::odds::{OddsApiClient, OddsProvider};
use crate::session::Session;
use crate::wallet::Wallet;
use std::sync::Arc;
use tracing::{info, warn};

/// Stores and collaborators of one running front-end
pub struct AppContext {
    pub odds: Arc<dyn OddsProvider>,
    pub slip: BetSlip,
    pub ledger: BetLedger,
    pub session: Session,
    pub wallet: Wallet,
    transactions: Arc<dyn TransactionLedgerService>,
}

impl AppContext {
    pub fn new(
        odds: Arc<dyn OddsProvider>,
        identity: Arc<dyn IdentityProvider>,
        transactions: Arc<dyn TransactionLedgerService>,
    ) -> Self {
        Self {
            odds,
            slip: BetSlip::new(),
            ledger: BetLedger::new(),
            session: Session::new(identity),
            wallet: Wallet::new(transactions.clone()),
            transactions,
        }
    }

    /// Context with identity and transactions kept in process
    pub fn offline(odds: Arc<dyn OddsProvider>) -> Self {
        let backend = Arc::new(InMemoryBackend::new());
        Self::new(odds, backend.clone(), backend)
    }

    /// Build from configuration, falling back to the in-memory backend when
    /// no Supabase project is configured
    pub fn from_config(config: &AppConfig) -> Result<Self, StartupError> {
        let odds: Arc<dyn OddsProvider> = Arc::new(OddsApiClient::new(config.odds.clone())?);

        match &config.supabase {
            Some(supabase) => {
                info!("Using Supabase backend at {}", supabase.url);
                let client = Arc::new(SupabaseClient::new(supabase.clone())?);
                Ok(Self::new(odds, client.clone(), client))
            }
            None => {
                warn!("SUPABASE_URL/SUPABASE_ANON_KEY not set. Using in-memory backend.");
                Ok(Self::offline(odds))
            }
        }
    }

    /// Restore the session and, if signed in, load the wallet
    pub async fn start(&mut self) {
        self.session.restore().await;
        self.refresh_wallet().await;
    }

    pub async fn refresh_wallet(&mut self) {
        if let Some(user_id) = self.session.user_id().map(str::to_string) {
            self.wallet.refresh(&user_id).await;
        }
    }

    /// Check out the slip
    ///
    /// Signed-in users get a `bet` transaction per selection; anonymous
    /// sessions only update the local ledger.
    pub async fn place_bets(&mut self) -> Result<CheckoutOutcome, CheckoutError> {
        let user_id = self.session.user_id().map(str::to_string);
        let outcome = match &user_id {
            Some(user_id) => {
                let sink = TransactionSink::new(self.transactions.clone(), user_id.as_str());
                checkout(&mut self.slip, &mut self.ledger, &sink).await?
            }
            None => checkout(&mut self.slip, &mut self.ledger, &NoopSink).await?,
        };

        if matches!(outcome, CheckoutOutcome::Placed(_)) {
            self.refresh_wallet().await;
        }
        Ok(outcome)
    }

    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<(), BackendError> {
        self.session.sign_in(email, password).await?;
        self.refresh_wallet().await;
        Ok(())
    }

    pub async fn sign_up(&mut self, email: &str, password: &str) -> Result<(), BackendError> {
        self.session.sign_up(email, password).await?;
        self.refresh_wallet().await;
        Ok(())
    }

    pub async fn sign_out(&mut self) -> Result<(), BackendError> {
        let result = self.session.sign_out().await;
        self.wallet.reset();
        result
    }

    pub async fn deposit(&mut self, amount: f64) -> Result<Transaction, WalletError> {
        let user_id = self.signed_in_user()?;
        self.wallet.deposit(&user_id, amount).await
    }

    pub async fn withdraw(&mut self, amount: f64) -> Result<Transaction, WalletError> {
        let user_id = self.signed_in_user()?;
        self.wallet.withdraw(&user_id, amount).await
    }

    fn signed_in_user(&self) -> Result<String, WalletError> {
        self.session
            .user_id()
            .map(str::to_string)
            .ok_or(WalletError::NotSignedIn)
    }
}
