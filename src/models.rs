use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stake used whenever a selection carries none.
pub const DEFAULT_STAKE: f64 = 1.0;

/// Composite identity of a bet-slip entry: one pick per (game, side)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SelectionKey {
    pub game_id: String,
    pub side: String,
}

impl SelectionKey {
    pub fn new(game_id: impl Into<String>, side: impl Into<String>) -> Self {
        Self {
            game_id: game_id.into(),
            side: side.into(),
        }
    }
}

impl fmt::Display for SelectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.game_id, self.side)
    }
}

/// Unconfirmed pick held in the bet slip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub game_id: String,
    pub home_team: String,
    pub away_team: String,
    pub selected_team: String,
    /// Decimal odds (e.g., 1.80 returns 1.80 per unit staked)
    pub odds: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stake: Option<f64>,
}

impl Selection {
    pub fn new(
        game_id: impl Into<String>,
        home_team: impl Into<String>,
        away_team: impl Into<String>,
        selected_team: impl Into<String>,
        odds: f64,
    ) -> Self {
        Self {
            game_id: game_id.into(),
            home_team: home_team.into(),
            away_team: away_team.into(),
            selected_team: selected_team.into(),
            odds,
            stake: None,
        }
    }

    pub fn with_stake(mut self, stake: f64) -> Self {
        self.stake = Some(stake);
        self
    }

    /// Build a selection from a price on the game board, staked at one unit
    pub fn from_outcome(game: &Game, outcome: &Outcome) -> Self {
        Self::new(
            &game.id,
            &game.home_team,
            &game.away_team,
            &outcome.name,
            outcome.price,
        )
        .with_stake(DEFAULT_STAKE)
    }

    pub fn key(&self) -> SelectionKey {
        SelectionKey::new(&self.game_id, &self.selected_team)
    }

    pub fn effective_stake(&self) -> f64 {
        self.stake.unwrap_or(DEFAULT_STAKE)
    }

    pub fn potential_win(&self) -> f64 {
        self.effective_stake() * self.odds
    }

    pub(crate) fn matches(&self, key: &SelectionKey) -> bool {
        self.game_id == key.game_id && self.selected_team == key.side
    }
}

/// Ledger-assigned identifier of a placed bet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BetId(pub u64);

impl fmt::Display for BetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Settlement status of a placed bet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BetStatus {
    #[default]
    Pending,
    Won,
    Lost,
}

impl fmt::Display for BetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BetStatus::Pending => "Pending",
            BetStatus::Won => "Won",
            BetStatus::Lost => "Lost",
        };
        f.write_str(label)
    }
}

/// Submitted wager
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedBet {
    pub id: BetId,
    pub selection: SelectionKey,
    pub home_team: String,
    pub away_team: String,
    pub selected_team: String,
    pub odds: f64,
    pub stake: f64,
    pub status: BetStatus,
}

impl PlacedBet {
    pub fn potential_win(&self) -> f64 {
        self.stake * self.odds
    }
}

/// Sport listing from the odds feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sport {
    pub key: String,
    #[serde(default)]
    pub group: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub active: bool,
    #[serde(default)]
    pub has_outrights: bool,
}

/// Priced outcome within a market
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub name: String,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Market {
    pub key: String,
    pub outcomes: Vec<Outcome>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bookmaker {
    pub key: String,
    pub title: String,
    pub markets: Vec<Market>,
}

/// Upcoming game with bookmaker prices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: String,
    #[serde(default)]
    pub sport_key: String,
    pub sport_title: String,
    pub commence_time: DateTime<Utc>,
    pub home_team: String,
    pub away_team: String,
    #[serde(default)]
    pub bookmakers: Vec<Bookmaker>,
}

impl Game {
    /// First market of the first bookmaker, the row shown on the game board
    pub fn main_market(&self) -> Option<&Market> {
        self.bookmakers.first()?.markets.first()
    }
}

/// Kind of balance movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
    Bet,
    Win,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TransactionKind::Deposit => "deposit",
            TransactionKind::Withdrawal => "withdrawal",
            TransactionKind::Bet => "bet",
            TransactionKind::Win => "win",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
}

/// Persisted balance movement; `amount` is signed (withdrawals and bets are negative)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub amount: f64,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
}

/// Signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: String,
}

impl User {
    /// Local part of the email address
    pub fn display_name(&self) -> &str {
        self.email.split('@').next().unwrap_or(&self.email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_game() -> Game {
        serde_json::from_str(
            r#"{
                "id": "abc123",
                "sport_key": "basketball_nba",
                "sport_title": "NBA",
                "commence_time": "2024-11-02T23:10:00Z",
                "home_team": "Boston Celtics",
                "away_team": "Miami Heat",
                "bookmakers": [{
                    "key": "unibet_eu",
                    "title": "Unibet",
                    "markets": [{
                        "key": "h2h",
                        "outcomes": [
                            {"name": "Boston Celtics", "price": 1.45},
                            {"name": "Miami Heat", "price": 2.75}
                        ]
                    }]
                }]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_selection_key_display() {
        let key = SelectionKey::new("g1", "Home");
        assert_eq!(key.to_string(), "g1-Home");
    }

    #[test]
    fn test_selection_defaults_to_unit_stake() {
        let sel = Selection::new("g1", "A", "B", "A", 1.8);
        assert_eq!(sel.stake, None);
        assert_eq!(sel.effective_stake(), 1.0);
        assert!((sel.potential_win() - 1.8).abs() < 1e-9);
    }

    #[test]
    fn test_selection_from_outcome() {
        let game = sample_game();
        let market = game.main_market().unwrap();
        let sel = Selection::from_outcome(&game, &market.outcomes[1]);

        assert_eq!(sel.game_id, "abc123");
        assert_eq!(sel.selected_team, "Miami Heat");
        assert_eq!(sel.odds, 2.75);
        assert_eq!(sel.stake, Some(1.0));
        assert_eq!(sel.key(), SelectionKey::new("abc123", "Miami Heat"));
    }

    #[test]
    fn test_main_market_missing() {
        let mut game = sample_game();
        game.bookmakers.clear();
        assert!(game.main_market().is_none());
    }

    #[test]
    fn test_transaction_wire_format() {
        let json = r#"{
            "id": "t1",
            "user_id": "u1",
            "type": "withdrawal",
            "amount": -25.0,
            "status": "pending",
            "created_at": "2024-11-02T10:00:00Z"
        }"#;
        let tx: Transaction = serde_json::from_str(json).unwrap();
        assert_eq!(tx.kind, TransactionKind::Withdrawal);
        assert_eq!(tx.status, TransactionStatus::Pending);
        assert_eq!(tx.amount, -25.0);

        let back = serde_json::to_value(&tx).unwrap();
        assert_eq!(back["type"], "withdrawal");
    }

    #[test]
    fn test_bet_status_serializes_capitalized() {
        assert_eq!(serde_json::to_string(&BetStatus::Won).unwrap(), "\"Won\"");
        assert_eq!(BetStatus::default(), BetStatus::Pending);
    }

    #[test]
    fn test_user_display_name() {
        let user = User {
            id: "u1".to_string(),
            email: "alice@example.com".to_string(),
        };
        assert_eq!(user.display_name(), "alice");
    }
}
