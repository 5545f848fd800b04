//! Adapters Layer - External System Implementations
//!
//! This module contains implementations of the port traits:
//! - Memory: in-process account store and fixed price table
//! - Rest quotes: league API stock detail client
//! - Snapshot: TOML league files loaded into the memory adapters
//! - CLI: Command-line interface handlers

pub mod memory;
pub mod rest_quotes;
pub mod snapshot;
pub mod cli;

pub use memory::{LedgerError, MemoryAccountStore, StaticQuoteSource};
pub use rest_quotes::RestQuoteClient;
pub use snapshot::{load_snapshot, Snapshot, SnapshotError};
pub use cli::CliApp;
