//! Domain Layer - Core leaderboard types and pure logic
//!
//! This module contains pure domain types and logic with no I/O.
//! All external interactions happen through the ports layer.
//!
//! - `token`: Canonical token record, snapshots and market summaries
//! - `table`: Sort/search view model for the leaderboard table
//! - `format`: Display formatting for prices, volumes and addresses

pub mod token;
pub mod table;
pub mod format;

pub use token::{assign_ranks, DataCondition, MarketSummary, Period, Snapshot, Token, TopMover};
pub use table::{view, SearchState, SortDirection, SortKey, SortState, TableView};
