//! Sportsbook CLI - browse odds, build a bet slip, place bets, manage a balance

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate, TimeDelta, TimeZone, Utc};
use clap::{Parser, Subcommand};
use colored::Colorize;
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Password, Select};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tokio::runtime::Runtime;
use tracing_subscriber::FmtSubscriber;

use sportsbook::config::{parse_level, AppConfig};
use sportsbook::core::SlipChange;
use sportsbook::odds::UPCOMING;
use sportsbook::wallet::{parse_amount, parse_stake};
use sportsbook::{AppContext, BetStatus, CheckoutOutcome, Fetch, Game, Selection};

#[derive(Parser)]
#[command(name = "sportsbook")]
#[command(author, version, about = "Sports betting terminal", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Run in interactive mode
    #[arg(short, long)]
    interactive: bool,

    /// Log level (overrides LOG_LEVEL)
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List sports offered by the odds feed
    Sports {
        /// Include sports that are out of season
        #[arg(long)]
        all: bool,
    },

    /// List games with head-to-head prices
    Games {
        /// Sport key (e.g. basketball_nba)
        #[arg(short, long, default_value = UPCOMING)]
        sport: String,

        /// Only games starting on or after this date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,

        /// Window length in days when --date is given
        #[arg(long, default_value = "1")]
        days: i64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::from_env().context("Failed to load configuration")?;
    let level = match &cli.log_level {
        Some(value) => parse_level(value)?,
        None => config.log_level,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;

    let mut ctx = AppContext::from_config(&config)?;

    println!("{}", format!("Sportsbook v{}", env!("CARGO_PKG_VERSION")).cyan().bold());
    println!();

    if cli.interactive {
        rt.block_on(ctx.start());
        run_interactive(&rt, &mut ctx)?;
    } else if let Some(command) = cli.command {
        match command {
            Commands::Sports { all } => list_sports(&rt, &ctx, all)?,
            Commands::Games { sport, date, days } => {
                list_games(&rt, &ctx, &sport, date.as_deref(), days)?;
            }
        }
    } else {
        println!("Use --help for usage or -i for interactive mode.");
    }

    Ok(())
}

fn spinner(message: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

/// Print a fetch failure, or a note when the list is genuinely empty
fn report_fetch<T>(fetch: &Fetch<T>, empty_message: &str) {
    match fetch {
        Fetch::Loaded(items) if items.is_empty() => println!("{}", empty_message.yellow()),
        Fetch::Loaded(_) => {}
        Fetch::Masked(e) => println!("{}: {}", "Could not load odds".red(), e),
        Fetch::Failed(e) => println!("{}: {}", "Request not sent".red(), e),
    }
}

fn list_sports(rt: &Runtime, ctx: &AppContext, all: bool) -> Result<()> {
    let pb = spinner("Loading sports...")?;
    let fetch = rt.block_on(async {
        if all {
            ctx.odds.list_sports().await
        } else {
            ctx.odds.active_sports().await
        }
    });
    pb.finish_and_clear();

    report_fetch(&fetch, "No sports available.");
    let sports = fetch.items();
    if sports.is_empty() {
        return Ok(());
    }

    println!("{:<36} {:<28} {:>6}", "Key", "Title", "Active");
    println!("{}", "-".repeat(72));
    for sport in sports {
        println!(
            "{:<36} {:<28} {:>6}",
            sport.key,
            truncate(&sport.title, 28),
            if sport.active { "yes" } else { "no" }
        );
    }
    Ok(())
}

/// Commence-time window starting at midnight UTC of `date`
fn game_window(date: &str, days: i64) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let day = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .with_context(|| format!("Invalid date {:?}, expected YYYY-MM-DD", date))?;
    let from = Utc.from_utc_datetime(&day.and_hms_opt(0, 0, 0).context("Invalid date")?);
    let to = TimeDelta::try_days(days.max(1))
        .and_then(|span| from.checked_add_signed(span))
        .with_context(|| format!("--days {} is out of range", days))?;
    Ok((from, to))
}

fn list_games(
    rt: &Runtime,
    ctx: &AppContext,
    sport: &str,
    date: Option<&str>,
    days: i64,
) -> Result<()> {
    let window = date.map(|date| game_window(date, days)).transpose()?;

    let pb = spinner(&format!("Loading {} games...", sport))?;
    let fetch = match window {
        Some((from, to)) => rt.block_on(ctx.odds.list_games_between(sport, from, to)),
        None => rt.block_on(ctx.odds.list_games(sport)),
    };
    pb.finish_and_clear();

    report_fetch(&fetch, "No games scheduled.");
    for game in fetch.items() {
        print_game(game);
    }
    Ok(())
}

fn print_game(game: &Game) {
    println!(
        "{} {} vs {}  {}",
        format!("[{}]", game.sport_title).blue(),
        game.home_team.bold(),
        game.away_team.bold(),
        game.commence_time
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M")
            .to_string()
            .dimmed()
    );
    match game.main_market() {
        Some(market) => {
            let prices: Vec<String> = market
                .outcomes
                .iter()
                .map(|o| format!("{} @ {:.2}", o.name, o.price))
                .collect();
            println!("    {}", prices.join("   "));
        }
        None => println!("    {}", "No prices yet".dimmed()),
    }
}

fn run_interactive(rt: &Runtime, ctx: &mut AppContext) -> Result<()> {
    println!("{}", "Interactive mode".green().bold());
    if let Some(user) = ctx.session.user() {
        println!("Signed in as {}", user.email.cyan());
    }
    println!();

    let theme = ColorfulTheme::default();

    loop {
        let slip_label = format!("Bet slip ({})", ctx.slip.len());
        let options = vec![
            "Browse games",
            slip_label.as_str(),
            "Checkout",
            "My bets",
            "Account",
            "Quit",
        ];

        let selection = Select::with_theme(&theme)
            .with_prompt("What would you like to do?")
            .items(&options)
            .default(0)
            .interact()?;

        println!();
        match selection {
            0 => browse_games(rt, ctx, &theme)?,
            1 => edit_slip(ctx, &theme)?,
            2 => run_checkout(rt, ctx, &theme)?,
            3 => show_bets(ctx),
            4 => account(rt, ctx, &theme)?,
            5 => {
                println!("Goodbye!");
                break;
            }
            _ => {}
        }
        println!();
    }

    Ok(())
}

fn browse_games(rt: &Runtime, ctx: &mut AppContext, theme: &ColorfulTheme) -> Result<()> {
    let pb = spinner("Loading sports...")?;
    let sports = rt.block_on(ctx.odds.active_sports()).into_items();
    pb.finish_and_clear();

    let mut labels = vec!["All upcoming".to_string()];
    labels.extend(sports.iter().map(|s| s.title.clone()));
    let choice = Select::with_theme(theme)
        .with_prompt("Sport")
        .items(&labels)
        .default(0)
        .interact()?;
    let sport_key = match choice {
        0 => UPCOMING.to_string(),
        n => sports[n - 1].key.clone(),
    };

    let pb = spinner("Loading games...")?;
    let fetch = rt.block_on(ctx.odds.list_games(&sport_key));
    pb.finish_and_clear();
    report_fetch(&fetch, "No games scheduled.");
    let games = fetch.into_items();
    if games.is_empty() {
        return Ok(());
    }

    loop {
        let mut labels: Vec<String> = games
            .iter()
            .map(|g| format!("{} vs {} ({})", g.home_team, g.away_team, g.sport_title))
            .collect();
        labels.push("Back".to_string());

        let choice = Select::with_theme(theme)
            .with_prompt("Game")
            .items(&labels)
            .default(0)
            .interact()?;
        let Some(game) = games.get(choice) else {
            return Ok(());
        };

        print_game(game);
        let Some(market) = game.main_market() else {
            continue;
        };

        let mut prices: Vec<String> = market
            .outcomes
            .iter()
            .map(|o| {
                let key = Selection::from_outcome(game, o).key();
                let marker = if ctx.slip.contains(&key) { " (on slip)" } else { "" };
                format!("{} @ {:.2}{}", o.name, o.price, marker)
            })
            .collect();
        prices.push("Back".to_string());

        let pick = Select::with_theme(theme)
            .with_prompt("Pick an outcome (again to remove)")
            .items(&prices)
            .default(0)
            .interact()?;
        if let Some(outcome) = market.outcomes.get(pick) {
            match ctx.slip.add_selection(Selection::from_outcome(game, outcome)) {
                Ok(SlipChange::Added) => println!("{} {}", "Added".green(), outcome.name),
                Ok(SlipChange::Removed) => println!("{} {}", "Removed".yellow(), outcome.name),
                Err(e) => println!("{}: {}", "Rejected".red(), e),
            }
            println!(
                "Slip: {} selections, potential win {:.2}",
                ctx.slip.len(),
                ctx.slip.total_potential_win()
            );
        }
    }
}

fn print_slip(ctx: &AppContext) {
    for (i, sel) in ctx.slip.selections().iter().enumerate() {
        println!(
            "{:>2}. {} vs {}: {} @ {:.2}  stake {:.2}  win {:.2}",
            i + 1,
            sel.home_team,
            sel.away_team,
            sel.selected_team.bold(),
            sel.odds,
            sel.effective_stake(),
            sel.potential_win()
        );
    }
    println!("{}", "-".repeat(60));
    println!(
        "Bets: {}  Total stake: {:.2}  Total potential win: {}",
        ctx.slip.len(),
        ctx.slip.total_stake(),
        format!("{:.2}", ctx.slip.total_potential_win()).green()
    );
}

fn edit_slip(ctx: &mut AppContext, theme: &ColorfulTheme) -> Result<()> {
    loop {
        if ctx.slip.is_empty() {
            println!("{}", "Your bet slip is empty.".yellow());
            return Ok(());
        }
        print_slip(ctx);

        let action = Select::with_theme(theme)
            .with_prompt("Bet slip")
            .items(&["Change stake", "Remove selection", "Clear slip", "Back"])
            .default(0)
            .interact()?;
        if action == 3 {
            return Ok(());
        }
        if action == 2 {
            ctx.slip.clear();
            continue;
        }

        let labels: Vec<String> = ctx
            .slip
            .selections()
            .iter()
            .map(|s| format!("{} @ {:.2}", s.selected_team, s.odds))
            .collect();
        let idx = Select::with_theme(theme)
            .with_prompt("Selection")
            .items(&labels)
            .default(0)
            .interact()?;
        let key = ctx.slip.selections()[idx].key();

        if action == 0 {
            let text: String = Input::with_theme(theme)
                .with_prompt("Stake")
                .default("1".to_string())
                .interact_text()?;
            ctx.slip.update_stake(&key, parse_stake(&text));
        } else {
            ctx.slip.remove_selection(&key);
        }
    }
}

fn run_checkout(rt: &Runtime, ctx: &mut AppContext, theme: &ColorfulTheme) -> Result<()> {
    if ctx.slip.is_empty() {
        println!("{}", "No active bets. Your bet slip is empty.".yellow());
        return Ok(());
    }
    print_slip(ctx);

    if !Confirm::with_theme(theme)
        .with_prompt("Place these bets?")
        .default(true)
        .interact()?
    {
        return Ok(());
    }

    match rt.block_on(ctx.place_bets()) {
        Ok(CheckoutOutcome::Placed(receipt)) => {
            println!(
                "{} {} bets placed, potential win {:.2}",
                "Success:".green().bold(),
                receipt.bet_ids.len(),
                receipt.total_potential_win
            );
        }
        Ok(CheckoutOutcome::Empty) => println!("{}", "Nothing to place.".yellow()),
        Err(e) => println!("{} {} Your slip was kept.", "Failed:".red().bold(), e),
    }
    Ok(())
}

fn show_bets(ctx: &AppContext) {
    if ctx.ledger.is_empty() {
        println!("{}", "No bets placed yet.".yellow());
        return;
    }

    for bet in ctx.ledger.bets() {
        let status = match bet.status {
            BetStatus::Pending => bet.status.to_string().normal(),
            BetStatus::Won => bet.status.to_string().green(),
            BetStatus::Lost => bet.status.to_string().red(),
        };
        println!(
            "{:>4} {} vs {}: {} @ {:.2}  stake {:.2}  win {:.2}  [{}]",
            bet.id.to_string(),
            bet.home_team,
            bet.away_team,
            bet.selected_team.bold(),
            bet.odds,
            bet.stake,
            bet.potential_win(),
            status
        );
    }
    println!("{}", "-".repeat(60));
    println!(
        "Staked: {:.2}  Potential win: {:.2}  Combined odds: {:.2}",
        ctx.ledger.total_staked(),
        ctx.ledger.total_potential_win(),
        ctx.ledger.combined_odds()
    );
}

fn account(rt: &Runtime, ctx: &mut AppContext, theme: &ColorfulTheme) -> Result<()> {
    if !ctx.session.is_signed_in() {
        let choice = Select::with_theme(theme)
            .with_prompt("Account")
            .items(&["Sign in", "Sign up", "Back"])
            .default(0)
            .interact()?;
        if choice == 2 {
            return Ok(());
        }

        let email: String = Input::with_theme(theme).with_prompt("Email").interact_text()?;
        let password = Password::with_theme(theme).with_prompt("Password").interact()?;
        let result = if choice == 0 {
            rt.block_on(ctx.sign_in(&email, &password))
        } else {
            rt.block_on(ctx.sign_up(&email, &password))
        };
        if result.is_err() {
            let message = ctx.session.error().unwrap_or("Authentication failed");
            println!("{}: {}", "Error".red(), message);
            return Ok(());
        }
    }

    loop {
        let Some(user) = ctx.session.user() else {
            return Ok(());
        };
        println!("{} ({})", user.display_name().bold(), user.email);
        println!(
            "Balance: {}",
            format!("{:.2}", ctx.wallet.balance().unwrap_or(0.0)).green().bold()
        );

        let choice = Select::with_theme(theme)
            .with_prompt("Account")
            .items(&["Deposit", "Withdraw", "History", "Sign out", "Back"])
            .default(0)
            .interact()?;

        match choice {
            0 | 1 => {
                let text: String = Input::with_theme(theme).with_prompt("Amount").interact_text()?;
                let amount = match parse_amount(&text) {
                    Ok(amount) => amount,
                    Err(e) => {
                        println!("{}: {}", "Error".red(), e);
                        continue;
                    }
                };
                let result = if choice == 0 {
                    rt.block_on(ctx.deposit(amount))
                } else {
                    rt.block_on(ctx.withdraw(amount))
                };
                match result {
                    Ok(_) => println!("{}", "Transaction successful!".green()),
                    Err(e) => {
                        let message = ctx
                            .wallet
                            .error()
                            .map(str::to_string)
                            .unwrap_or_else(|| e.to_string());
                        println!("{}: {}", "Error".red(), message);
                    }
                }
            }
            2 => {
                if ctx.wallet.transactions().is_empty() {
                    println!("{}", "No transactions yet.".yellow());
                }
                for tx in ctx.wallet.transactions() {
                    let amount = format!("{:+.2}", tx.amount);
                    let amount = if tx.amount >= 0.0 { amount.green() } else { amount.red() };
                    println!(
                        "{}  {:<10} {:>10}  {:?}",
                        tx.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
                        tx.kind.to_string(),
                        amount,
                        tx.status
                    );
                }
            }
            3 => {
                match rt.block_on(ctx.sign_out()) {
                    Ok(()) => println!("Signed out."),
                    Err(e) => println!("Signed out locally ({})", e),
                }
                return Ok(());
            }
            _ => return Ok(()),
        }
        println!();
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}
