//! Environment-driven configuration

use crate::error::ConfigError;
use tracing::Level;

const DEFAULT_ODDS_BASE_URL: &str = "https://api.the-odds-api.com/v4";

/// Odds API client configuration
#[derive(Debug, Clone)]
pub struct OddsApiConfig {
    pub base_url: String,
    pub api_key: String,
    /// Bookmaker regions, comma separated (e.g., "eu" or "uk,eu")
    pub regions: String,
    pub markets: String,
    pub odds_format: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for OddsApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_ODDS_BASE_URL.to_string(),
            api_key: String::new(),
            regions: "eu".to_string(),
            markets: "h2h".to_string(),
            odds_format: "decimal".to_string(),
            timeout_secs: 30,
            user_agent: concat!("sportsbook/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Supabase project configuration
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: String,
    pub timeout_secs: u64,
}

impl SupabaseConfig {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            timeout_secs: 30,
        }
    }
}

/// Whole-application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub odds: OddsApiConfig,
    /// `None` runs against the in-memory backend
    pub supabase: Option<SupabaseConfig>,
    pub log_level: Level,
}

impl AppConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let defaults = OddsApiConfig::default();
        let odds = OddsApiConfig {
            base_url: non_empty("ODDS_API_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            api_key: non_empty("ODDS_API_KEY").ok_or(ConfigError::Missing("ODDS_API_KEY"))?,
            regions: non_empty("ODDS_REGIONS").unwrap_or(defaults.regions),
            ..defaults
        };

        let supabase = match (non_empty("SUPABASE_URL"), non_empty("SUPABASE_ANON_KEY")) {
            (Some(url), Some(key)) => Some(SupabaseConfig::new(url, key)),
            _ => None,
        };

        let log_level = match non_empty("LOG_LEVEL") {
            Some(value) => parse_level(&value)?,
            None => Level::INFO,
        };

        Ok(Self {
            odds,
            supabase,
            log_level,
        })
    }
}

/// Parse a log level name such as "debug" or "WARN"
pub fn parse_level(value: &str) -> Result<Level, ConfigError> {
    value.trim().parse::<Level>().map_err(|_| ConfigError::Invalid {
        name: "LOG_LEVEL",
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_odds_config_default() {
        let config = OddsApiConfig::default();
        assert_eq!(config.base_url, "https://api.the-odds-api.com/v4");
        assert_eq!(config.regions, "eu");
        assert_eq!(config.markets, "h2h");
        assert_eq!(config.odds_format, "decimal");
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_from_lookup_minimal() {
        let config = AppConfig::from_lookup(lookup(&[("ODDS_API_KEY", "k")])).unwrap();
        assert_eq!(config.odds.api_key, "k");
        assert!(config.supabase.is_none());
        assert_eq!(config.log_level, Level::INFO);
    }

    #[test]
    fn test_from_lookup_missing_key() {
        let err = AppConfig::from_lookup(lookup(&[])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("ODDS_API_KEY"));
    }

    #[test]
    fn test_from_lookup_full() {
        let config = AppConfig::from_lookup(lookup(&[
            ("ODDS_API_KEY", "k"),
            ("ODDS_API_BASE_URL", "http://localhost:9000/v4/"),
            ("ODDS_REGIONS", "uk,eu"),
            ("SUPABASE_URL", "https://proj.supabase.co/"),
            ("SUPABASE_ANON_KEY", "anon"),
            ("LOG_LEVEL", "debug"),
        ]))
        .unwrap();

        assert_eq!(config.odds.base_url, "http://localhost:9000/v4");
        assert_eq!(config.odds.regions, "uk,eu");
        let supabase = config.supabase.unwrap();
        assert_eq!(supabase.url, "https://proj.supabase.co");
        assert_eq!(supabase.anon_key, "anon");
        assert_eq!(config.log_level, Level::DEBUG);
    }

    #[test]
    fn test_supabase_requires_both_vars() {
        let config = AppConfig::from_lookup(lookup(&[
            ("ODDS_API_KEY", "k"),
            ("SUPABASE_URL", "https://proj.supabase.co"),
        ]))
        .unwrap();
        assert!(config.supabase.is_none());
    }

    #[test]
    fn test_invalid_log_level() {
        let err = AppConfig::from_lookup(lookup(&[("ODDS_API_KEY", "k"), ("LOG_LEVEL", "loud")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "LOG_LEVEL", .. }));
    }
}
