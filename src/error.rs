use thiserror::Error;

/// Rejected user input
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Odds must be a finite decimal price of at least 1.0, got {0}")]
    InvalidOdds(f64),

    #[error("Stake must be a finite positive number, got {0}")]
    InvalidStake(f64),

    #[error("Amount must be a finite positive number, got {0}")]
    InvalidAmount(f64),
}

/// Odds feed errors
#[derive(Debug, Error)]
pub enum OddsError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Odds API returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Failed to decode odds response: {0}")]
    Decode(String),

    #[error("Invalid odds request: {0}")]
    InvalidRequest(String),
}

/// Identity and transaction backend errors
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("{0}")]
    Auth(String),

    #[error("Check your email to confirm your account")]
    ConfirmationRequired,

    #[error("Failed to create transaction")]
    TransactionFailed,

    #[error("Unexpected backend response: {0}")]
    Unexpected(String),
}

/// Deposit and withdrawal errors
#[derive(Debug, Error)]
pub enum WalletError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Insufficient funds")]
    InsufficientFunds,

    #[error("Not signed in")]
    NotSignedIn,

    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Bet placement errors; the slip is left untouched whenever one is returned
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Failed to place bets: {0}")]
    Persistence(#[from] BackendError),
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Missing environment variable {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Errors while wiring the application together
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Failed to create odds client: {0}")]
    Odds(#[from] OddsError),

    #[error("Failed to create backend client: {0}")]
    Backend(#[from] BackendError),
}

/// Validation functions
pub fn validate_odds(odds: f64) -> Result<(), ValidationError> {
    if !odds.is_finite() || odds < 1.0 {
        return Err(ValidationError::InvalidOdds(odds));
    }
    Ok(())
}

pub fn validate_stake(stake: f64) -> Result<(), ValidationError> {
    if !stake.is_finite() || stake <= 0.0 {
        return Err(ValidationError::InvalidStake(stake));
    }
    Ok(())
}

pub fn validate_amount(amount: f64) -> Result<(), ValidationError> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(ValidationError::InvalidAmount(amount));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_odds_valid() {
        assert!(validate_odds(1.0).is_ok());
        assert!(validate_odds(1.8).is_ok());
        assert!(validate_odds(150.0).is_ok());
    }

    #[test]
    fn test_validate_odds_invalid() {
        assert!(validate_odds(0.99).is_err());
        assert!(validate_odds(-2.0).is_err());
        assert!(validate_odds(f64::NAN).is_err());
        assert!(validate_odds(f64::INFINITY).is_err());
    }

    #[test]
    fn test_validate_stake() {
        assert!(validate_stake(0.5).is_ok());
        assert!(validate_stake(10.0).is_ok());
        assert_eq!(validate_stake(0.0), Err(ValidationError::InvalidStake(0.0)));
        assert!(validate_stake(-1.0).is_err());
        assert!(validate_stake(f64::NAN).is_err());
    }

    #[test]
    fn test_validate_amount() {
        assert!(validate_amount(20.0).is_ok());
        assert!(validate_amount(0.0).is_err());
        assert!(validate_amount(-5.0).is_err());
    }

    #[test]
    fn test_error_display() {
        assert_eq!(WalletError::InsufficientFunds.to_string(), "Insufficient funds");
        assert_eq!(
            BackendError::TransactionFailed.to_string(),
            "Failed to create transaction"
        );
        assert_eq!(
            BackendError::ConfirmationRequired.to_string(),
            "Check your email to confirm your account"
        );
        let err = CheckoutError::from(BackendError::TransactionFailed);
        assert!(err.to_string().contains("Failed to place bets"));
    }

    #[test]
    fn test_status_error_message() {
        let err = OddsError::Status {
            status: 401,
            message: "API key is missing".to_string(),
        };
        assert_eq!(err.to_string(), "Odds API returned 401: API key is missing");
    }
}
