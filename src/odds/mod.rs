//! Odds feed: sports, upcoming games and bookmaker prices
//!
//! Listing calls never propagate errors to the board; a failed fetch shows up
//! as an empty list. `Fetch` keeps the reason around so callers and tests can
//! tell "no games scheduled" from "the request failed".
//!
//! # Example
//!
//! ```no_run
//! use sportsbook::config::OddsApiConfig;
//! use sportsbook::odds::{OddsApiClient, OddsProvider};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = OddsApiClient::new(OddsApiConfig {
//!         api_key: "your-key".to_string(),
//!         ..Default::default()
//!     })?;
//!
//!     let games = client.list_games("upcoming").await.into_items();
//!     println!("Found {} games", games.len());
//!     Ok(())
//! }
//! ```

mod client;

pub use client::OddsApiClient;

use crate::error::OddsError;
use crate::models::{Game, Sport};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Sport key the feed uses for "next games across all sports"
pub const UPCOMING: &str = "upcoming";

/// Result of a listing call
#[derive(Debug)]
pub enum Fetch<T> {
    /// Request succeeded; the list may legitimately be empty
    Loaded(Vec<T>),
    /// Request was sent but failed (transport, status or decoding)
    Masked(OddsError),
    /// Request could not be made at all
    Failed(OddsError),
}

impl<T> Fetch<T> {
    /// Items, with every failure collapsed to an empty list
    pub fn into_items(self) -> Vec<T> {
        match self {
            Fetch::Loaded(items) => items,
            Fetch::Masked(_) | Fetch::Failed(_) => Vec::new(),
        }
    }

    pub fn into_result(self) -> Result<Vec<T>, OddsError> {
        match self {
            Fetch::Loaded(items) => Ok(items),
            Fetch::Masked(e) | Fetch::Failed(e) => Err(e),
        }
    }

    pub fn items(&self) -> &[T] {
        match self {
            Fetch::Loaded(items) => items,
            _ => &[],
        }
    }

    pub fn error(&self) -> Option<&OddsError> {
        match self {
            Fetch::Loaded(_) => None,
            Fetch::Masked(e) | Fetch::Failed(e) => Some(e),
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Fetch::Loaded(_))
    }

    pub fn is_masked(&self) -> bool {
        matches!(self, Fetch::Masked(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Fetch::Failed(_))
    }

    /// Keep only items matching `predicate`; failures pass through
    pub fn filter<P>(self, predicate: P) -> Self
    where
        P: FnMut(&T) -> bool,
    {
        match self {
            Fetch::Loaded(items) => Fetch::Loaded(items.into_iter().filter(predicate).collect()),
            other => other,
        }
    }
}

/// Source of sports and games
#[async_trait]
pub trait OddsProvider: Send + Sync {
    async fn list_sports(&self) -> Fetch<Sport>;

    /// Games with prices for a sport key (`UPCOMING` for all sports)
    async fn list_games(&self, sport: &str) -> Fetch<Game>;

    /// Games starting inside `[from, to]`
    async fn list_games_between(
        &self,
        sport: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Fetch<Game>;

    /// Sports currently in season
    async fn active_sports(&self) -> Fetch<Sport> {
        self.list_sports().await.filter(|s| s.active)
    }
}
