//! HTTP client for the-odds-api.com (v4)

use super::{Fetch, OddsProvider};
use crate::config::OddsApiConfig;
use crate::error::OddsError;
use crate::models::{Game, Sport};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// Odds API client
pub struct OddsApiClient {
    client: reqwest::Client,
    config: OddsApiConfig,
}

impl OddsApiClient {
    /// Create a new client with the given configuration
    pub fn new(config: OddsApiConfig) -> Result<Self, OddsError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self { client, config })
    }

    fn sports_url(&self) -> String {
        format!("{}/sports", self.config.base_url)
    }

    /// Build URL for a sport's odds page
    fn odds_url(&self, sport: &str) -> Result<String, OddsError> {
        let sport = sport.trim();
        if sport.is_empty() || !sport.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(OddsError::InvalidRequest(format!(
                "invalid sport key {:?}",
                sport
            )));
        }
        Ok(format!("{}/sports/{}/odds", self.config.base_url, sport))
    }

    /// Query parameters for an odds request
    fn odds_query(
        &self,
        window: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("apiKey", self.config.api_key.clone()),
            ("regions", self.config.regions.clone()),
            ("markets", self.config.markets.clone()),
            ("oddsFormat", self.config.odds_format.clone()),
        ];
        if let Some((from, to)) = window {
            // The API rejects sub-second precision
            params.push(("commenceTimeFrom", from.to_rfc3339_opts(SecondsFormat::Secs, true)));
            params.push(("commenceTimeTo", to.to_rfc3339_opts(SecondsFormat::Secs, true)));
        }
        params
    }

    fn check_api_key(&self) -> Result<(), OddsError> {
        if self.config.api_key.trim().is_empty() {
            return Err(OddsError::InvalidRequest("API key is not configured".to_string()));
        }
        Ok(())
    }

    /// GET a JSON list
    async fn fetch_list<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&'static str, String)],
    ) -> Result<Vec<T>, OddsError> {
        let response = self.client.get(url).query(query).send().await?;
        let status = response.status();

        if let Some(remaining) = response.headers().get("x-requests-remaining") {
            tracing::debug!("Odds API requests remaining: {:?}", remaining);
        }

        let body = response.text().await?;
        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
                .unwrap_or_else(|| "Failed to fetch odds data".to_string());
            return Err(OddsError::Status {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| OddsError::Decode(e.to_string()))
    }

    async fn fetch_games(
        &self,
        sport: &str,
        window: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> Fetch<Game> {
        let url = match self.check_api_key().and_then(|_| self.odds_url(sport)) {
            Ok(url) => url,
            Err(e) => return Fetch::Failed(e),
        };
        tracing::info!("Fetching odds: {}", url);

        match self.fetch_list(&url, &self.odds_query(window)).await {
            Ok(games) => Fetch::Loaded(games),
            Err(e) => {
                tracing::warn!("Error fetching odds: {}", e);
                Fetch::Masked(e)
            }
        }
    }
}

#[async_trait]
impl OddsProvider for OddsApiClient {
    async fn list_sports(&self) -> Fetch<Sport> {
        if let Err(e) = self.check_api_key() {
            return Fetch::Failed(e);
        }
        let url = self.sports_url();
        tracing::info!("Fetching sports: {}", url);

        let query = [("apiKey", self.config.api_key.clone())];
        match self.fetch_list(&url, &query).await {
            Ok(sports) => Fetch::Loaded(sports),
            Err(e) => {
                tracing::warn!("Error fetching sports: {}", e);
                Fetch::Masked(e)
            }
        }
    }

    async fn list_games(&self, sport: &str) -> Fetch<Game> {
        self.fetch_games(sport, None).await
    }

    async fn list_games_between(
        &self,
        sport: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Fetch<Game> {
        if from > to {
            return Fetch::Failed(OddsError::InvalidRequest(format!(
                "window starts after it ends ({} > {})",
                from, to
            )));
        }
        self.fetch_games(sport, Some((from, to))).await
    }
}
