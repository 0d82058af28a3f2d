//! Leaderboard Poller
//!
//! Owns the periodic refresh cycle. One tokio task runs fetch cycles
//! serially; commands come in over an mpsc channel and every state change
//! is published wholesale on a watch channel.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::domain::{MarketSummary, Period, Snapshot, Token};
use crate::ports::market_data::{ProviderError, TokenProvider};
use super::aggregator::{Aggregator, DEFAULT_LIMIT};

/// Default time between automatic refreshes
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

const COMMAND_BUFFER: usize = 16;

#[derive(Debug, Error, PartialEq)]
pub enum PollerError {
    #[error("Poller has stopped")]
    Stopped,
    #[error("Poller task failed: {0}")]
    Task(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PollerConfig {
    pub interval: Duration,
    pub limit: usize,
    pub period: Period,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            limit: DEFAULT_LIMIT,
            period: Period::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollPhase {
    /// Not running
    #[default]
    Idle,
    /// A fetch cycle is in flight
    Loading,
    Ready,
    /// Last cycle failed; see `LeaderboardState::error`
    Error,
}

/// Everything a render surface needs, replaced wholesale on each change
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LeaderboardState {
    pub phase: PollPhase,
    pub period: Period,
    pub snapshot: Option<Arc<Snapshot>>,
    pub summary: Option<MarketSummary>,
    pub error: Option<String>,
    /// Number of completed cycles (success or failure)
    pub cycle: u64,
    pub updated_at: Option<DateTime<Utc>>,
}

impl LeaderboardState {
    fn loading(period: Period) -> Self {
        Self {
            phase: PollPhase::Loading,
            period,
            ..Self::default()
        }
    }

    pub fn is_loading(&self) -> bool {
        self.phase == PollPhase::Loading
    }

    pub fn is_error(&self) -> bool {
        self.phase == PollPhase::Error
    }

    /// Ready, but the provider had nothing to rank
    pub fn is_no_data(&self) -> bool {
        self.phase == PollPhase::Ready && self.snapshot.as_ref().map_or(true, |s| s.is_no_data())
    }

    /// Ranked tokens of the current snapshot, empty when there is none
    pub fn tokens(&self) -> &[Token] {
        match self.snapshot.as_deref() {
            Some(snapshot) => &snapshot.tokens,
            None => &[],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum PollCommand {
    SetPeriod(Period),
    Refresh,
    Retry,
    Shutdown,
}

/// What started a cycle
#[derive(Debug, Clone, Copy)]
enum Trigger {
    Tick,
    Command(PollCommand),
}

struct CycleOutcome {
    ranked: Result<Snapshot, ProviderError>,
    summary: Option<MarketSummary>,
}

/// Periodic leaderboard refresher; `spawn` moves it onto its own task
pub struct LeaderboardPoller<P> {
    aggregator: Arc<Aggregator<P>>,
    config: PollerConfig,
}

impl<P: TokenProvider + 'static> LeaderboardPoller<P> {
    pub fn new(aggregator: Arc<Aggregator<P>>, config: PollerConfig) -> Self {
        Self { aggregator, config }
    }

    /// Start polling. The first cycle runs immediately.
    pub fn spawn(self) -> PollerHandle {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (state_tx, state_rx) = watch::channel(LeaderboardState::loading(self.config.period));

        let task = tokio::spawn(self.run(command_rx, state_tx));

        PollerHandle {
            commands: command_tx,
            state: state_rx,
            task: Some(task),
        }
    }

    async fn run(self, mut commands: mpsc::Receiver<PollCommand>, state: watch::Sender<LeaderboardState>) {
        let mut period = self.config.period;
        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut pending: Option<PollCommand> = None;

        tracing::info!(
            "Starting leaderboard poller - period: {}, limit: {}, interval: {:?}",
            period,
            self.config.limit,
            self.config.interval
        );

        loop {
            let trigger = match pending.take() {
                Some(command) => Trigger::Command(command),
                None => tokio::select! {
                    biased;
                    command = commands.recv() => match command {
                        Some(PollCommand::Shutdown) | None => break,
                        Some(command) => Trigger::Command(command),
                    },
                    _ = ticker.tick() => Trigger::Tick,
                },
            };

            if let Trigger::Command(command) = trigger {
                if let PollCommand::SetPeriod(next) = command {
                    period = next;
                }
                // Manual cycles restart the countdown
                ticker.reset();
                tracing::debug!("Cycle triggered by {:?}", command);
            }

            state.send_modify(|s| {
                s.phase = PollPhase::Loading;
                // Rows ranked for another period must not show under the new label
                if s.period != period {
                    s.snapshot = None;
                }
                s.period = period;
            });

            tokio::select! {
                biased;
                command = commands.recv() => match command {
                    Some(PollCommand::Shutdown) | None => break,
                    Some(command) => {
                        tracing::debug!("In-flight cycle superseded by {:?}", command);
                        pending = Some(command);
                    }
                },
                outcome = self.run_cycle(period) => {
                    state.send_modify(|s| apply_outcome(s, outcome));
                }
            }
        }

        state.send_modify(|s| s.phase = PollPhase::Idle);
        tracing::info!("Leaderboard poller stopped");
    }

    async fn run_cycle(&self, period: Period) -> CycleOutcome {
        let ranked = self.aggregator.get_ranked(period, self.config.limit).await;
        if ranked.is_err() {
            return CycleOutcome { ranked, summary: None };
        }

        let summary = match self.aggregator.get_summary().await {
            Ok(summary) => Some(summary),
            Err(e) => {
                tracing::warn!("Market summary unavailable: {}", e);
                None
            }
        };

        CycleOutcome { ranked, summary }
    }
}

fn apply_outcome(state: &mut LeaderboardState, outcome: CycleOutcome) {
    state.cycle += 1;
    state.updated_at = Some(Utc::now());

    match outcome.ranked {
        Ok(snapshot) => {
            tracing::info!(
                "Leaderboard refreshed - period: {}, tokens: {}",
                snapshot.period,
                snapshot.len()
            );
            state.phase = PollPhase::Ready;
            state.snapshot = Some(Arc::new(snapshot));
            state.summary = outcome.summary;
            state.error = None;
        }
        Err(e) => {
            tracing::error!("Leaderboard refresh failed: {}", e);
            state.phase = PollPhase::Error;
            state.snapshot = None;
            state.summary = None;
            state.error = Some(e.to_string());
        }
    }
}

/// Control surface for a running poller. Dropping it aborts the task.
pub struct PollerHandle {
    commands: mpsc::Sender<PollCommand>,
    state: watch::Receiver<LeaderboardState>,
    task: Option<JoinHandle<()>>,
}

impl PollerHandle {
    /// Receiver that observes every published state
    pub fn subscribe(&self) -> watch::Receiver<LeaderboardState> {
        self.state.clone()
    }

    pub fn current(&self) -> LeaderboardState {
        self.state.borrow().clone()
    }

    /// Switch ranking window and fetch immediately
    pub async fn set_period(&self, period: Period) -> Result<(), PollerError> {
        self.send(PollCommand::SetPeriod(period)).await
    }

    pub async fn refresh(&self) -> Result<(), PollerError> {
        self.send(PollCommand::Refresh).await
    }

    /// Re-fetch after a failure
    pub async fn retry(&self) -> Result<(), PollerError> {
        self.send(PollCommand::Retry).await
    }

    /// Stop polling and wait for the task to finish
    pub async fn shutdown(mut self) -> Result<(), PollerError> {
        // Already-stopped tasks have dropped their receiver; nothing to signal
        let _ = self.commands.send(PollCommand::Shutdown).await;

        match self.task.take() {
            Some(task) => task.await.map_err(|e| PollerError::Task(e.to_string())),
            None => Ok(()),
        }
    }

    async fn send(&self, command: PollCommand) -> Result<(), PollerError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| PollerError::Stopped)
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
