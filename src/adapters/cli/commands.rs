//! CLI Command Handlers
//!
//! Implementation of all CLI commands for the NASDANQ leaderboard.

use std::io::{BufRead, IsTerminal};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use tokio::sync::{mpsc, watch};

use crate::adapters::dexscreener::{DexScreenerClient, DexScreenerConfig};
use crate::application::{
    Aggregator, AggregatorConfig, LeaderboardPoller, LeaderboardState, PollerConfig, PollerError,
    PollerHandle,
};
use crate::config::Config;
use crate::domain::{Period, SearchState, SortDirection, SortKey, SortState, TableView};
use super::render;

/// NASDANQ - Solana token leaderboard
#[derive(Parser, Debug)]
#[command(
    name = "nasdanq",
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
    about = "Ranked, searchable Solana token leaderboard",
    long_about = "NASDANQ ranks Solana tokens by market cap or volume using DexScreener \
                  market data, with stat cards and an auto-refreshing watch mode."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the ranked leaderboard once
    Top(TopCmd),

    /// Print market stat cards
    Stats(StatsCmd),

    /// Live leaderboard that refreshes on an interval
    Watch(WatchCmd),

    /// Show details for one token
    Token(TokenCmd),

    /// Print the effective configuration
    Config,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Table options shared by `top` and `watch`
#[derive(Parser, Debug, Clone)]
pub struct TableArgs {
    /// Ranking window: recent (market cap) or volume
    #[arg(short, long, value_name = "PERIOD")]
    pub period: Option<Period>,

    /// Maximum rows
    #[arg(short, long, value_name = "N")]
    pub limit: Option<usize>,

    /// Sort column (rank, name, symbol, price, change, volume, mcap, ...)
    #[arg(short, long, value_name = "KEY")]
    pub sort: Option<SortKey>,

    /// Sort ascending instead of descending
    #[arg(long)]
    pub asc: bool,

    /// Filter by name, symbol or address
    #[arg(long, value_name = "TEXT")]
    pub search: Option<String>,
}

impl TableArgs {
    fn table_view(&self) -> TableView {
        let direction = if self.asc {
            SortDirection::Ascending
        } else {
            SortDirection::Descending
        };
        let key = self.sort.unwrap_or(SortState::default().key);
        TableView::new(
            SortState::new(key, direction),
            SearchState::new(self.search.clone().unwrap_or_default()),
        )
    }
}

#[derive(Parser, Debug)]
pub struct TopCmd {
    #[command(flatten)]
    pub table: TableArgs,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Parser, Debug)]
pub struct StatsCmd {
    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Parser, Debug)]
pub struct WatchCmd {
    #[command(flatten)]
    pub table: TableArgs,

    /// Seconds between refreshes (overrides polling.interval_secs)
    #[arg(short, long, value_name = "SECS")]
    pub interval: Option<u64>,
}

#[derive(Parser, Debug)]
pub struct TokenCmd {
    /// Token mint address
    #[arg(value_name = "ADDRESS")]
    pub address: String,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Interactive commands accepted on stdin in watch mode
#[derive(Debug, Clone, PartialEq)]
pub enum WatchInput {
    Period(Period),
    Sort(SortKey),
    Search(String),
    Retry,
    Refresh,
    Help,
    Quit,
}

pub const WATCH_HELP: &str = "Commands: period <recent|volume>, sort <key>, search [text], \
                              retry, refresh, help, quit";

/// Parse one line typed in watch mode. Empty lines yield `None`.
pub fn parse_watch_input(line: &str) -> Result<Option<WatchInput>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let input = match verb.to_ascii_lowercase().as_str() {
        "period" | "p" => WatchInput::Period(rest.parse()?),
        "sort" | "s" => WatchInput::Sort(rest.parse()?),
        "search" | "/" => WatchInput::Search(rest.to_string()),
        "retry" | "r" => WatchInput::Retry,
        "refresh" => WatchInput::Refresh,
        "help" | "h" | "?" => WatchInput::Help,
        "quit" | "q" | "exit" => WatchInput::Quit,
        other => return Err(format!("unknown command '{}'", other)),
    };
    Ok(Some(input))
}

/// Execute the CLI command
pub async fn execute(app: CliApp, config: Config) -> Result<()> {
    match app.command {
        Command::Top(cmd) => top_command(cmd, &config).await,
        Command::Stats(cmd) => stats_command(cmd, &config).await,
        Command::Watch(cmd) => watch_command(cmd, &config).await,
        Command::Token(cmd) => token_command(cmd, &config).await,
        Command::Config => config_command(&config),
    }
}

fn build_aggregator(config: &Config) -> Result<Aggregator<DexScreenerClient>> {
    let client = DexScreenerClient::with_config(DexScreenerConfig::from(config))
        .context("Failed to create DexScreener client")?;
    Ok(Aggregator::new(client, AggregatorConfig::from(config)))
}

/// Handle top command
async fn top_command(cmd: TopCmd, config: &Config) -> Result<()> {
    let aggregator = build_aggregator(config)?;
    let period = cmd.table.period.unwrap_or(config.leaderboard.default_period);
    let limit = cmd.table.limit.unwrap_or(config.leaderboard.default_limit);
    let view = cmd.table.table_view();

    tracing::info!("Fetching leaderboard: period {}, limit {}", period, limit);

    let snapshot = aggregator
        .get_ranked(period, limit)
        .await
        .context("Failed to load leaderboard")?;
    let rows = view.apply(&snapshot);

    match cmd.format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "period": snapshot.period,
                "fetchedAt": snapshot.fetched_at,
                "condition": snapshot.condition,
                "tokens": rows,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => {
            println!("NASDANQ Leaderboard - {}", period.label());
            if snapshot.is_no_data() {
                println!("No tokens found");
            } else if rows.is_empty() {
                println!("No tokens match '{}'", view.search().query());
            } else {
                print!("{}", render::render_table(&rows, view.sort()));
            }
        }
    }

    Ok(())
}

/// Handle stats command
async fn stats_command(cmd: StatsCmd, config: &Config) -> Result<()> {
    let aggregator = build_aggregator(config)?;
    let summary = aggregator
        .get_summary()
        .await
        .context("Failed to load market stats")?;

    match cmd.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputFormat::Text => print!("{}", render::render_stats(Some(&summary))),
    }

    Ok(())
}

/// Handle token command
async fn token_command(cmd: TokenCmd, config: &Config) -> Result<()> {
    let aggregator = build_aggregator(config)?;
    let token = aggregator
        .get_token(&cmd.address)
        .await
        .with_context(|| format!("Failed to load token {}", cmd.address))?;

    tracing::info!("Fetched {}", render::token_label(&token));

    match cmd.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&token)?),
        OutputFormat::Text => print!("{}", render::render_token(&token, Utc::now())),
    }

    Ok(())
}

/// Handle config command
fn config_command(config: &Config) -> Result<()> {
    print!("{}", config.to_toml_string()?);
    Ok(())
}

/// Handle watch command
async fn watch_command(cmd: WatchCmd, config: &Config) -> Result<()> {
    let aggregator = Arc::new(build_aggregator(config)?);

    let mut poller_config = PollerConfig::from(config);
    if let Some(period) = cmd.table.period {
        poller_config.period = period;
    }
    if let Some(limit) = cmd.table.limit {
        poller_config.limit = limit;
    }
    if let Some(secs) = cmd.interval {
        anyhow::ensure!(secs > 0, "--interval must be > 0");
        poller_config.interval = Duration::from_secs(secs);
    }

    let mut view = cmd.table.table_view();
    let handle = LeaderboardPoller::new(aggregator, poller_config).spawn();
    let mut states = handle.subscribe();
    let mut input = spawn_stdin_reader();
    let mut stdin_open = true;
    let clear = std::io::stdout().is_terminal();

    draw(&view, &states, clear);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown signal received");
                break;
            }
            changed = states.changed() => {
                if changed.is_err() {
                    tracing::warn!("Poller stopped unexpectedly");
                    break;
                }
                draw(&view, &states, clear);
            }
            line = input.recv(), if stdin_open => {
                let Some(line) = line else {
                    stdin_open = false;
                    continue;
                };

                match parse_watch_input(&line) {
                    Ok(Some(command)) => match apply_watch_input(command, &handle, &mut view).await? {
                        WatchAction::Quit => break,
                        WatchAction::Redraw => draw(&view, &states, clear),
                        WatchAction::ShowHelp => println!("{}", WATCH_HELP),
                        WatchAction::Wait => {}
                    },
                    Ok(None) => {}
                    Err(e) => println!("{} ({})", e, WATCH_HELP),
                }
            }
        }
    }

    handle.shutdown().await?;
    tracing::info!("Watch mode stopped");
    Ok(())
}

/// What the watch screen does after a command was applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchAction {
    /// Poller was told to fetch; the next published state redraws
    Wait,
    Redraw,
    ShowHelp,
    Quit,
}

/// Route one watch command to the poller or the table view
pub async fn apply_watch_input(
    input: WatchInput,
    handle: &PollerHandle,
    view: &mut TableView,
) -> Result<WatchAction, PollerError> {
    let action = match input {
        WatchInput::Period(period) => {
            handle.set_period(period).await?;
            WatchAction::Wait
        }
        WatchInput::Retry => {
            handle.retry().await?;
            WatchAction::Wait
        }
        WatchInput::Refresh => {
            handle.refresh().await?;
            WatchAction::Wait
        }
        WatchInput::Sort(key) => {
            view.toggle_sort(key);
            WatchAction::Redraw
        }
        WatchInput::Search(query) => {
            view.set_search(query);
            WatchAction::Redraw
        }
        WatchInput::Help => WatchAction::ShowHelp,
        WatchInput::Quit => WatchAction::Quit,
    };
    Ok(action)
}

fn draw(view: &TableView, states: &watch::Receiver<LeaderboardState>, clear: bool) {
    if clear {
        print!("\x1B[2J\x1B[H");
    }
    let state = states.borrow().clone();
    print!("{}", render::render_state(&state, view, Utc::now()));
    println!("{}", WATCH_HELP);
}

/// Forward stdin lines from a detached thread
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{PollPhase, RetryPolicy};
    use crate::domain::Token;
    use crate::ports::{ProviderError, ScriptedProvider};

    #[test]
    fn test_cli_app_parse_top() {
        let args = vec!["nasdanq", "top", "--period", "volume", "--limit", "10", "--sort", "mcap", "--asc"];
        let app = CliApp::try_parse_from(args).unwrap();

        match app.command {
            Command::Top(cmd) => {
                assert_eq!(cmd.table.period, Some(Period::Volume));
                assert_eq!(cmd.table.limit, Some(10));
                assert_eq!(cmd.format, OutputFormat::Text);

                let view = cmd.table.table_view();
                assert_eq!(view.sort(), SortState::new(SortKey::MarketCap, SortDirection::Ascending));
            }
            _ => panic!("Expected Top command"),
        }
    }

    #[test]
    fn test_cli_app_parse_defaults() {
        let app = CliApp::try_parse_from(vec!["nasdanq", "top"]).unwrap();

        assert!(app.config.is_none());
        assert!(!app.verbose);
        match app.command {
            Command::Top(cmd) => {
                assert!(cmd.table.period.is_none());
                assert_eq!(cmd.table.table_view(), TableView::default());
            }
            _ => panic!("Expected Top command"),
        }
    }

    #[test]
    fn test_cli_app_global_flags() {
        let args = vec!["nasdanq", "stats", "--format", "json", "-c", "custom.toml", "--debug"];
        let app = CliApp::try_parse_from(args).unwrap();

        assert_eq!(app.config, Some(PathBuf::from("custom.toml")));
        assert!(app.debug);
        match app.command {
            Command::Stats(cmd) => assert_eq!(cmd.format, OutputFormat::Json),
            _ => panic!("Expected Stats command"),
        }
    }

    #[test]
    fn test_cli_app_parse_watch() {
        let args = vec!["nasdanq", "watch", "--interval", "10", "--search", "bonk"];
        let app = CliApp::try_parse_from(args).unwrap();

        match app.command {
            Command::Watch(cmd) => {
                assert_eq!(cmd.interval, Some(10));
                assert_eq!(cmd.table.search.as_deref(), Some("bonk"));
            }
            _ => panic!("Expected Watch command"),
        }
    }

    #[test]
    fn test_cli_app_parse_token() {
        let app = CliApp::try_parse_from(vec!["nasdanq", "token", "mint123"]).unwrap();
        match app.command {
            Command::Token(cmd) => assert_eq!(cmd.address, "mint123"),
            _ => panic!("Expected Token command"),
        }
    }

    #[test]
    fn test_cli_rejects_bad_values() {
        assert!(CliApp::try_parse_from(vec!["nasdanq", "top", "--period", "30d"]).is_err());
        assert!(CliApp::try_parse_from(vec!["nasdanq", "top", "--sort", "vibes"]).is_err());
        assert!(CliApp::try_parse_from(vec!["nasdanq", "token"]).is_err());
    }

    #[test]
    fn test_parse_watch_input() {
        assert_eq!(parse_watch_input("period volume"), Ok(Some(WatchInput::Period(Period::Volume))));
        assert_eq!(parse_watch_input("  p 24h "), Ok(Some(WatchInput::Period(Period::Recent))));
        assert_eq!(parse_watch_input("sort symbol"), Ok(Some(WatchInput::Sort(SortKey::Symbol))));
        assert_eq!(parse_watch_input("search Moon Dog"), Ok(Some(WatchInput::Search("Moon Dog".into()))));
        assert_eq!(parse_watch_input("search"), Ok(Some(WatchInput::Search(String::new()))));
        assert_eq!(parse_watch_input("RETRY"), Ok(Some(WatchInput::Retry)));
        assert_eq!(parse_watch_input("q"), Ok(Some(WatchInput::Quit)));
        assert_eq!(parse_watch_input(""), Ok(None));
    }

    #[test]
    fn test_parse_watch_input_errors() {
        assert!(parse_watch_input("period 30d").is_err());
        assert!(parse_watch_input("sort").is_err());
        assert!(parse_watch_input("dance").unwrap_err().contains("dance"));
    }

    fn watch_poller(provider: ScriptedProvider) -> PollerHandle {
        let aggregator = Aggregator::new(
            provider,
            AggregatorConfig {
                retry: RetryPolicy::none(),
                ..AggregatorConfig::default()
            },
        );
        LeaderboardPoller::new(Arc::new(aggregator), PollerConfig::default()).spawn()
    }

    fn listed(symbol: &str) -> Token {
        Token::new(format!("{}-mint", symbol), symbol, symbol)
            .with_market_cap(5_000.0)
            .with_volume(500.0)
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_period_switch_refetches() {
        let provider = ScriptedProvider::always(vec![listed("AAA")]);
        let handle = watch_poller(provider.clone());
        let mut states = handle.subscribe();
        states.wait_for(|s| s.phase == PollPhase::Ready).await.unwrap();
        let calls = provider.calls();

        let mut view = TableView::default();
        let action = apply_watch_input(WatchInput::Period(Period::Volume), &handle, &mut view)
            .await
            .unwrap();
        assert_eq!(action, WatchAction::Wait);

        let state = states
            .wait_for(|s| s.phase == PollPhase::Ready && s.period == Period::Volume)
            .await
            .unwrap()
            .clone();
        assert!(state.cycle >= 2);
        assert!(provider.calls() > calls);
        assert_eq!(view, TableView::default());
    }

    #[tokio::test]
    async fn test_watch_sort_and_search_update_view() {
        let handle = watch_poller(ScriptedProvider::new());
        let mut view = TableView::default();

        let action = apply_watch_input(WatchInput::Sort(SortKey::Symbol), &handle, &mut view)
            .await
            .unwrap();
        assert_eq!(action, WatchAction::Redraw);
        assert_eq!(view.sort(), SortState::new(SortKey::Symbol, SortDirection::Descending));

        apply_watch_input(WatchInput::Sort(SortKey::Symbol), &handle, &mut view)
            .await
            .unwrap();
        assert_eq!(view.sort().direction, SortDirection::Ascending);

        apply_watch_input(WatchInput::Search("bon".into()), &handle, &mut view)
            .await
            .unwrap();
        assert_eq!(view.search().query(), "bon");

        assert_eq!(
            apply_watch_input(WatchInput::Help, &handle, &mut view).await,
            Ok(WatchAction::ShowHelp)
        );
        assert_eq!(
            apply_watch_input(WatchInput::Quit, &handle, &mut view).await,
            Ok(WatchAction::Quit)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_retry_after_error() {
        let provider = ScriptedProvider::always(vec![listed("AAA")])
            .with_error(ProviderError::Network("connection reset".into()));
        let handle = watch_poller(provider);
        let mut states = handle.subscribe();
        states.wait_for(|s| s.phase == PollPhase::Error).await.unwrap();

        let mut view = TableView::default();
        let action = apply_watch_input(WatchInput::Retry, &handle, &mut view)
            .await
            .unwrap();
        assert_eq!(action, WatchAction::Wait);

        let state = states
            .wait_for(|s| s.phase == PollPhase::Ready)
            .await
            .unwrap()
            .clone();
        assert_eq!(state.tokens()[0].symbol, "AAA");
        assert!(state.error.is_none());
    }
}
