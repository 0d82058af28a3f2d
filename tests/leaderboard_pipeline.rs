//! Leaderboard Pipeline Integration Tests
//!
//! Verify the components work together end to end:
//! 1. DexScreenerClient -> Aggregator ranking, filtering and summaries
//! 2. LeaderboardPoller over live HTTP, including failure and retry
//! 3. Config file -> client/aggregator/poller wiring
//! 4. TableView over poller snapshots
//!
//! All tests run against a local HTTP responder; no real network calls.

use std::collections::VecDeque;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::watch;

use nasdanq::adapters::dexscreener::{DexScreenerClient, DexScreenerConfig, WRAPPED_SOL_MINT};
use nasdanq::application::{
    Aggregator, AggregatorConfig, LeaderboardPoller, LeaderboardState, PollPhase, PollerConfig,
    RetryPolicy,
};
use nasdanq::config::load_config;
use nasdanq::domain::{Period, SortDirection, SortKey, SortState, TableView};
use nasdanq::ports::ProviderError;

// ============================================================================
// Test Fixtures
// ============================================================================

/// Local DexScreener stand-in: replays queued responses, then the fallback
#[derive(Clone)]
struct MockDexServer {
    base_url: String,
    queue: Arc<Mutex<VecDeque<(u16, String)>>>,
    fallback: Arc<Mutex<(u16, String)>>,
    paths: Arc<Mutex<Vec<String>>>,
    hits: Arc<AtomicUsize>,
}

impl MockDexServer {
    async fn start(fallback: Value) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let server = MockDexServer {
            base_url: format!("http://{}", listener.local_addr().unwrap()),
            queue: Arc::new(Mutex::new(VecDeque::new())),
            fallback: Arc::new(Mutex::new((200, fallback.to_string()))),
            paths: Arc::new(Mutex::new(Vec::new())),
            hits: Arc::new(AtomicUsize::new(0)),
        };

        let state = server.clone();
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else { break };
                let state = state.clone();
                tokio::spawn(async move {
                    let mut buf = vec![0u8; 8192];
                    let n = socket.read(&mut buf).await.unwrap_or(0);
                    let request = String::from_utf8_lossy(&buf[..n]).to_string();
                    let path = request.split_whitespace().nth(1).unwrap_or("").to_string();
                    state.paths.lock().unwrap().push(path);
                    state.hits.fetch_add(1, Ordering::SeqCst);

                    let next = state.queue.lock().unwrap().pop_front();
                    let (status, body) = next.unwrap_or_else(|| state.fallback.lock().unwrap().clone());
                    let reason = if status == 200 { "OK" } else { "Error" };
                    let response = format!(
                        "HTTP/1.1 {} {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                        status,
                        reason,
                        body.len(),
                        body
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        server
    }

    fn push(&self, status: u16, body: &str) {
        self.queue.lock().unwrap().push_back((status, body.to_string()));
    }

    fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    fn last_path(&self) -> Option<String> {
        self.paths.lock().unwrap().last().cloned()
    }
}

fn pair(chain: &str, dex: &str, mint: &str, symbol: &str, market_cap: Value, volume: Value, change: f64) -> Value {
    json!({
        "chainId": chain,
        "dexId": dex,
        "url": format!("https://dexscreener.com/solana/{}", mint),
        "baseToken": { "address": mint, "name": format!("{} Token", symbol), "symbol": symbol },
        "quoteToken": { "address": WRAPPED_SOL_MINT, "name": "Wrapped SOL", "symbol": "SOL" },
        "priceUsd": "0.5",
        "volume": { "h24": volume },
        "priceChange": { "h24": change },
        "liquidity": { "usd": 10000 },
        "marketCap": market_cap
    })
}

/// Three viable tokens plus one of every kind of pair that must be dropped
fn market() -> Value {
    json!({
        "schemaVersion": "1.0.0",
        "pairs": [
            pair("solana", "raydium", "BonkMint", "BONK", json!(900000), json!(50000), 12.0),
            pair("solana", "pumpfun", "WifMint", "WIF", json!(400000), json!(120000), -8.0),
            pair("solana", "raydium", "DustMint", "DUST", json!(500), json!(20), 500.0),
            pair("solana", "orca", "OrcaMint", "ORCA", json!(5000000), json!(900000), 1.0),
            pair("ethereum", "raydium", "EthMint", "PEPE", json!(5000000), json!(900000), 1.0),
            pair("solana", "raydium", WRAPPED_SOL_MINT, "SOL", json!(90000000), json!(9000000), 1.0),
            pair("solana", "raydium", "BonkMint", "BONK", json!(1), json!(1), 99.0),
            pair("solana", "pumpfun", "PopMint", "POPCAT", json!("650000"), json!("80000"), 3.0),
            "garbage"
        ]
    })
}

fn aggregator(server: &MockDexServer) -> Aggregator<DexScreenerClient> {
    let client = DexScreenerClient::with_config(DexScreenerConfig {
        base_url: server.base_url.clone(),
        timeout: Duration::from_secs(5),
        ..DexScreenerConfig::default()
    })
    .unwrap();

    Aggregator::new(
        client,
        AggregatorConfig {
            retry: RetryPolicy::none(),
            ..AggregatorConfig::default()
        },
    )
}

fn symbols(tokens: &[nasdanq::domain::Token]) -> Vec<&str> {
    tokens.iter().map(|t| t.symbol.as_str()).collect()
}

async fn wait_for(
    rx: &mut watch::Receiver<LeaderboardState>,
    predicate: impl FnMut(&LeaderboardState) -> bool,
) -> LeaderboardState {
    tokio::time::timeout(Duration::from_secs(10), rx.wait_for(predicate))
        .await
        .expect("timed out waiting for poller state")
        .expect("poller stopped")
        .clone()
}

// ============================================================================
// Aggregator over HTTP
// ============================================================================

#[tokio::test]
async fn test_recent_leaderboard_from_http() {
    let server = MockDexServer::start(market()).await;
    let snapshot = aggregator(&server).get_ranked(Period::Recent, 10).await.unwrap();

    assert_eq!(symbols(&snapshot.tokens), vec!["BONK", "POPCAT", "WIF"]);
    let ranks: Vec<u32> = snapshot.tokens.iter().map(|t| t.rank).collect();
    assert_eq!(ranks, vec![1, 2, 3]);
    assert_eq!(snapshot.tokens[0].market_cap, 900_000.0);
    assert_eq!(
        server.last_path().as_deref(),
        Some(format!("/dex/tokens/{}", WRAPPED_SOL_MINT).as_str())
    );
}

#[tokio::test]
async fn test_volume_leaderboard_with_limit() {
    let server = MockDexServer::start(market()).await;
    let snapshot = aggregator(&server).get_ranked(Period::Volume, 2).await.unwrap();

    assert_eq!(symbols(&snapshot.tokens), vec!["WIF", "POPCAT"]);
    assert_eq!(snapshot.period, Period::Volume);
}

#[tokio::test]
async fn test_summary_from_http() {
    let server = MockDexServer::start(market()).await;
    let summary = aggregator(&server).get_summary().await.unwrap();

    assert_eq!(summary.active_tokens, 3);
    assert_eq!(summary.total_volume_24h, 250_000.0);
    assert_eq!(summary.top_gainer.unwrap().symbol, "BONK");
    assert_eq!(summary.top_loser.unwrap().symbol, "WIF");
}

#[tokio::test]
async fn test_null_pairs_is_no_data() {
    let server = MockDexServer::start(json!({ "schemaVersion": "1.0.0", "pairs": null })).await;
    let snapshot = aggregator(&server).get_ranked(Period::Recent, 10).await.unwrap();

    assert!(snapshot.is_no_data());
    assert!(snapshot.tokens.is_empty());
}

#[tokio::test]
async fn test_server_error_surfaces_status() {
    let server = MockDexServer::start(market()).await;
    server.push(503, "maintenance");

    let err = aggregator(&server).get_ranked(Period::Recent, 10).await.unwrap_err();
    assert_eq!(err, ProviderError::status(503, "maintenance"));
}

#[tokio::test]
async fn test_default_retry_recovers_from_transient_error() {
    let server = MockDexServer::start(market()).await;
    server.push(502, "bad gateway");

    let client = DexScreenerClient::with_config(DexScreenerConfig {
        base_url: server.base_url.clone(),
        ..DexScreenerConfig::default()
    })
    .unwrap();
    let aggregator = Aggregator::new(
        client,
        AggregatorConfig {
            retry: RetryPolicy {
                max_attempts: 2,
                backoff: Duration::from_millis(10),
            },
            ..AggregatorConfig::default()
        },
    );

    let snapshot = aggregator.get_ranked(Period::Recent, 10).await.unwrap();
    assert_eq!(snapshot.tokens.len(), 3);
    assert_eq!(server.hits(), 2);
}

#[tokio::test]
async fn test_token_details_from_http() {
    let body = json!({ "pairs": [pair("solana", "orca", "WifMint", "WIF", json!(400000), json!(120000), -8.0)] });
    let server = MockDexServer::start(body).await;

    let token = aggregator(&server).get_token("WifMint").await.unwrap();
    assert_eq!(token.symbol, "WIF");
    assert_eq!(token.liquidity, Some(10_000.0));
    assert_eq!(server.last_path().as_deref(), Some("/dex/tokens/WifMint"));

    let missing = aggregator(&server).get_token("OtherMint").await;
    assert!(matches!(missing, Err(ProviderError::NotFound(_))));
}

// ============================================================================
// Poller over HTTP
// ============================================================================

fn poller_config() -> PollerConfig {
    PollerConfig {
        interval: Duration::from_secs(60),
        limit: 10,
        period: Period::Recent,
    }
}

#[tokio::test]
async fn test_poller_error_then_retry_over_http() {
    let server = MockDexServer::start(market()).await;
    server.push(500, "upstream exploded");

    let handle = LeaderboardPoller::new(Arc::new(aggregator(&server)), poller_config()).spawn();
    let mut rx = handle.subscribe();

    let state = wait_for(&mut rx, |s| s.phase == PollPhase::Error).await;
    assert!(state.error.as_deref().unwrap().contains("500"));
    assert!(state.tokens().is_empty());

    handle.retry().await.unwrap();
    let state = wait_for(&mut rx, |s| s.phase == PollPhase::Ready).await;
    assert_eq!(symbols(state.tokens()), vec!["BONK", "POPCAT", "WIF"]);
    assert_eq!(state.summary.as_ref().map(|s| s.active_tokens), Some(3));
    assert!(state.error.is_none());

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_poller_period_switch_and_table_view() {
    let server = MockDexServer::start(market()).await;
    let handle = LeaderboardPoller::new(Arc::new(aggregator(&server)), poller_config()).spawn();
    let mut rx = handle.subscribe();

    wait_for(&mut rx, |s| s.phase == PollPhase::Ready).await;
    handle.set_period(Period::Volume).await.unwrap();

    let state = wait_for(&mut rx, |s| {
        s.phase == PollPhase::Ready && s.snapshot.as_ref().map(|snap| snap.period) == Some(Period::Volume)
    })
    .await;
    assert_eq!(symbols(state.tokens()), vec!["WIF", "POPCAT", "BONK"]);

    // Sort and search survive independently of the snapshot
    let snapshot = state.snapshot.as_deref().unwrap();
    let mut view = TableView::default();
    view.set_sort(SortState::new(SortKey::Symbol, SortDirection::Ascending));
    assert_eq!(symbols(&view.apply(snapshot)), vec!["BONK", "POPCAT", "WIF"]);

    view.set_search("pop");
    let rows = view.apply(snapshot);
    assert_eq!(symbols(&rows), vec!["POPCAT"]);
    assert_eq!(rows[0].rank, 2);

    handle.shutdown().await.unwrap();
    assert_eq!(rx.borrow().phase, PollPhase::Idle);
}

// ============================================================================
// Config wiring
// ============================================================================

#[tokio::test]
async fn test_config_file_drives_pipeline() {
    let server = MockDexServer::start(market()).await;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[provider]
base_url = "{}"
dex_ids = ["pumpfun"]

[leaderboard]
default_period = "volume"
default_limit = 5
max_attempts = 1
"#,
        server.base_url
    )
    .unwrap();

    let config = load_config(file.path()).unwrap();
    let client = DexScreenerClient::with_config(DexScreenerConfig::from(&config)).unwrap();
    let aggregator = Aggregator::new(client, AggregatorConfig::from(&config));
    let poller = PollerConfig::from(&config);

    assert_eq!(poller.period, Period::Volume);
    assert_eq!(poller.limit, 5);

    let snapshot = aggregator.get_ranked_default(poller.period).await.unwrap();
    assert_eq!(symbols(&snapshot.tokens), vec!["WIF", "POPCAT"]);
}
