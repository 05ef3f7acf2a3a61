//! Supabase REST and auth client

use super::{IdentityProvider, TransactionLedgerService};
use crate::config::SupabaseConfig;
use crate::error::BackendError;
use crate::models::{Transaction, TransactionKind, User};
use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
struct AuthSession {
    access_token: String,
    user: User,
}

#[derive(Debug, Deserialize)]
struct BalanceRow {
    #[serde(default)]
    balance: Option<f64>,
}

/// Client for one Supabase project
pub struct SupabaseClient {
    client: reqwest::Client,
    config: SupabaseConfig,
    /// Access token and user of the signed-in session
    session: Mutex<Option<(String, User)>>,
}

impl SupabaseClient {
    pub fn new(config: SupabaseConfig) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            config,
            session: Mutex::new(None),
        })
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.config.url, path)
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.config.url, table)
    }

    /// Attach the project key and the session token (anon key when signed out)
    async fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let bearer = match self.session.lock().await.as_ref() {
            Some((token, _)) => token.clone(),
            None => self.config.anon_key.clone(),
        };
        request
            .header("apikey", &self.config.anon_key)
            .header("Authorization", format!("Bearer {}", bearer))
    }

    async fn auth_request(
        &self,
        path: &str,
        email: &str,
        password: &str,
    ) -> Result<Value, BackendError> {
        let request = self
            .client
            .post(self.auth_url(path))
            .header("apikey", &self.config.anon_key)
            .json(&json!({ "email": email, "password": password }));

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(BackendError::Auth(read_error_message(response).await));
        }
        response
            .json::<Value>()
            .await
            .map_err(|e| BackendError::Unexpected(e.to_string()))
    }

    async fn store_session(&self, session: AuthSession) -> User {
        let user = session.user.clone();
        *self.session.lock().await = Some((session.access_token, session.user));
        user
    }

    async fn fetch_balance(&self, user_id: &str) -> Result<f64, BackendError> {
        let request = self
            .client
            .get(self.rest_url("user_balances"))
            .query(&[("select", "balance".to_string()), ("user_id", format!("eq.{}", user_id))]);
        let response = self.authorize(request).await.send().await?;
        if !response.status().is_success() {
            return Err(BackendError::Unexpected(read_error_message(response).await));
        }

        let rows: Vec<BalanceRow> = response.json().await?;
        Ok(rows.first().and_then(|r| r.balance).unwrap_or(0.0))
    }

    async fn fetch_transactions(&self, user_id: &str) -> Result<Vec<Transaction>, BackendError> {
        let request = self.client.get(self.rest_url("transactions")).query(&[
            ("select", "*".to_string()),
            ("user_id", format!("eq.{}", user_id)),
            ("order", "created_at.desc".to_string()),
        ]);
        let response = self.authorize(request).await.send().await?;
        if !response.status().is_success() {
            return Err(BackendError::Unexpected(read_error_message(response).await));
        }
        Ok(response.json().await?)
    }
}

/// Pull a human-readable message out of an error response
async fn read_error_message(response: Response) -> String {
    let status = response.status();
    match response.json::<Value>().await {
        Ok(body) => error_message(&body)
            .unwrap_or_else(|| format!("Request failed with status {}", status)),
        Err(_) => format!("Request failed with status {}", status),
    }
}

/// Session from a sign-up response
///
/// Projects with email confirmation answer with the bare user and no token;
/// that user is not signed in until the address is confirmed.
fn signup_session(body: Value) -> Result<AuthSession, BackendError> {
    if body.get("access_token").is_none() {
        return Err(BackendError::ConfirmationRequired);
    }
    serde_json::from_value(body).map_err(|e| BackendError::Unexpected(e.to_string()))
}

fn error_message(body: &Value) -> Option<String> {
    ["error_description", "msg", "message", "error"]
        .iter()
        .find_map(|field| body.get(field).and_then(Value::as_str))
        .map(str::to_string)
}

#[async_trait]
impl IdentityProvider for SupabaseClient {
    async fn current_user(&self) -> Result<Option<User>, BackendError> {
        let token = match self.session.lock().await.as_ref() {
            Some((token, _)) => token.clone(),
            None => return Ok(None),
        };

        let response = self
            .client
            .get(self.auth_url("user"))
            .header("apikey", &self.config.anon_key)
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await?;

        if response.status().is_success() {
            Ok(Some(response.json::<User>().await?))
        } else {
            warn!("Stored session rejected with status {}", response.status());
            *self.session.lock().await = None;
            Ok(None)
        }
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<User, BackendError> {
        info!("Signing in {}", email);
        let body = self
            .auth_request("token?grant_type=password", email, password)
            .await?;
        let session: AuthSession =
            serde_json::from_value(body).map_err(|e| BackendError::Unexpected(e.to_string()))?;
        Ok(self.store_session(session).await)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<User, BackendError> {
        info!("Signing up {}", email);
        let body = self.auth_request("signup", email, password).await?;
        let session = signup_session(body)?;
        Ok(self.store_session(session).await)
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        let session = self.session.lock().await.take();
        let Some((token, user)) = session else {
            return Ok(());
        };

        // The local session is gone from here on; a failed revoke leaves the
        // server token to expire on its own
        info!("Signing out {}", user.email);
        let result = self
            .client
            .post(self.auth_url("logout"))
            .header("apikey", &self.config.anon_key)
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await;

        match result {
            Ok(response) if !response.status().is_success() => {
                warn!("Logout returned status {}", response.status());
            }
            Ok(_) => {}
            Err(e) => warn!("Logout request failed: {}", e),
        }
        Ok(())
    }
}

#[async_trait]
impl TransactionLedgerService for SupabaseClient {
    async fn get_balance(&self, user_id: &str) -> f64 {
        match self.fetch_balance(user_id).await {
            Ok(balance) => balance,
            Err(e) => {
                warn!("Error fetching balance: {}", e);
                0.0
            }
        }
    }

    async fn create_transaction(
        &self,
        user_id: &str,
        kind: TransactionKind,
        amount: f64,
    ) -> Result<Transaction, BackendError> {
        info!("Creating {} transaction of {:.2} for {}", kind, amount, user_id);
        let request = self
            .client
            .post(self.rest_url("transactions"))
            .header("Prefer", "return=representation")
            .json(&json!({
                "user_id": user_id,
                "type": kind,
                "amount": amount,
                "status": "pending",
            }));

        let response = self
            .authorize(request)
            .await
            .send()
            .await
            .map_err(|e| {
                warn!("Transaction request failed: {}", e);
                BackendError::TransactionFailed
            })?;

        if !response.status().is_success() {
            warn!("Transaction rejected: {}", read_error_message(response).await);
            return Err(BackendError::TransactionFailed);
        }

        let rows: Vec<Transaction> = response.json().await.map_err(|e| {
            warn!("Transaction response unreadable: {}", e);
            BackendError::TransactionFailed
        })?;
        rows.into_iter().next().ok_or(BackendError::TransactionFailed)
    }

    async fn list_transactions(&self, user_id: &str) -> Vec<Transaction> {
        match self.fetch_transactions(user_id).await {
            Ok(transactions) => transactions,
            Err(e) => {
                warn!("Error fetching transactions: {}", e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> SupabaseClient {
        SupabaseClient::new(SupabaseConfig::new("https://proj.supabase.co/", "anon")).unwrap()
    }

    #[test]
    fn test_urls() {
        let client = client();
        assert_eq!(
            client.auth_url("token?grant_type=password"),
            "https://proj.supabase.co/auth/v1/token?grant_type=password"
        );
        assert_eq!(
            client.rest_url("transactions"),
            "https://proj.supabase.co/rest/v1/transactions"
        );
    }

    #[test]
    fn test_error_message_fields() {
        let body = json!({
            "error": "invalid_grant",
            "error_description": "Invalid login credentials"
        });
        assert_eq!(error_message(&body).unwrap(), "Invalid login credentials");

        let body = json!({"code": 422, "msg": "User already registered"});
        assert_eq!(error_message(&body).unwrap(), "User already registered");

        assert!(error_message(&json!({"code": 500})).is_none());
    }

    #[test]
    fn test_auth_session_decode() {
        let body = json!({
            "access_token": "jwt",
            "token_type": "bearer",
            "user": {"id": "8d0f", "email": "a@b.c", "aud": "authenticated"}
        });
        let session: AuthSession = serde_json::from_value(body).unwrap();
        assert_eq!(session.access_token, "jwt");
        assert_eq!(session.user.id, "8d0f");
    }

    #[test]
    fn test_signup_with_session() {
        let body = json!({
            "access_token": "jwt",
            "user": {"id": "8d0f", "email": "a@b.c"}
        });
        let session = signup_session(body).unwrap();
        assert_eq!(session.user.email, "a@b.c");
    }

    #[test]
    fn test_signup_awaiting_confirmation() {
        let body = json!({
            "id": "u-unconfirmed",
            "email": "a@b.c",
            "confirmation_sent_at": "2024-05-01T10:00:00Z"
        });
        assert!(matches!(
            signup_session(body),
            Err(BackendError::ConfirmationRequired)
        ));
    }

    #[tokio::test]
    async fn test_sign_out_drops_session_when_logout_unreachable() {
        let config = SupabaseConfig::new("http://127.0.0.1:1", "anon");
        let client = SupabaseClient::new(config).unwrap();
        let user = User {
            id: "8d0f".to_string(),
            email: "a@b.c".to_string(),
        };
        *client.session.lock().await = Some(("jwt".to_string(), user));

        assert!(client.sign_out().await.is_ok());
        assert!(client.session.lock().await.is_none());
        assert_eq!(client.current_user().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_signed_out_by_default() {
        let client = client();
        assert_eq!(client.current_user().await.unwrap(), None);
        // Nothing to revoke, so no request is made
        assert!(client.sign_out().await.is_ok());
    }
}
