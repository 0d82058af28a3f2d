pub mod aggregator;
pub mod poller;

pub use aggregator::{
    sort_for_period, Aggregator, AggregatorConfig, RetryPolicy, ViabilityThresholds,
    DEFAULT_LIMIT, DEFAULT_MIN_MARKET_CAP_USD, DEFAULT_MIN_VOLUME_24H_USD,
};
pub use poller::{
    LeaderboardPoller, LeaderboardState, PollPhase, PollerConfig, PollerError, PollerHandle,
    DEFAULT_POLL_INTERVAL,
};
