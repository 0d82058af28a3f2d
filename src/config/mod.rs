//! Configuration Module
//!
//! Loads and validates configuration from TOML files and the environment.

pub mod loader;

pub use loader::{
    Config, ConfigError, LeaderboardSection, LoggingSection, PollingSection, ProviderSection,
    load_config, load_config_or_default, DEFAULT_CONFIG_PATH, ENV_PREFIX,
};
