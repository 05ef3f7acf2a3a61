//! Session state over an identity provider

use crate::backend::IdentityProvider;
use crate::error::BackendError;
use crate::models::User;
use std::sync::Arc;
use tracing::{info, warn};

const AUTH_FALLBACK_MESSAGE: &str = "An error occurred during authentication";

/// Current user, loading flag and last authentication error
pub struct Session {
    provider: Arc<dyn IdentityProvider>,
    user: Option<User>,
    loading: bool,
    error: Option<String>,
}

impl Session {
    /// New session; `is_loading` stays true until `restore` has run
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self {
            provider,
            user: None,
            loading: true,
            error: None,
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.id.as_str())
    }

    pub fn is_signed_in(&self) -> bool {
        self.user.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Message from the last failed operation
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Pick up whatever session the provider already holds
    pub async fn restore(&mut self) {
        match self.provider.current_user().await {
            Ok(user) => self.user = user,
            Err(e) => {
                warn!("Failed to restore session: {}", e);
                self.user = None;
            }
        }
        self.loading = false;
    }

    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<&User, BackendError> {
        let result = self.provider.sign_in(email, password).await;
        self.accept(result)
    }

    pub async fn sign_up(&mut self, email: &str, password: &str) -> Result<&User, BackendError> {
        let result = self.provider.sign_up(email, password).await;
        self.accept(result)
    }

    /// Sign out; the user is dropped locally even when the provider fails
    pub async fn sign_out(&mut self) -> Result<(), BackendError> {
        let result = self.provider.sign_out().await;
        self.user = None;
        match result {
            Ok(()) => {
                self.error = None;
                Ok(())
            }
            Err(e) => {
                warn!("Sign-out failed, local session dropped: {}", e);
                self.error = Some(auth_message(&e));
                Err(e)
            }
        }
    }

    fn accept(&mut self, result: Result<User, BackendError>) -> Result<&User, BackendError> {
        self.loading = false;
        match result {
            Ok(user) => {
                info!("Signed in as {}", user.email);
                self.error = None;
                Ok(self.user.insert(user))
            }
            Err(e) => {
                self.error = Some(auth_message(&e));
                Err(e)
            }
        }
    }
}

/// User-facing text for an authentication failure
fn auth_message(err: &BackendError) -> String {
    match err {
        BackendError::Auth(msg) if !msg.trim().is_empty() => msg.clone(),
        BackendError::ConfirmationRequired => err.to_string(),
        _ => AUTH_FALLBACK_MESSAGE.to_string(),
    }
}
