//! Ports Layer - Trait definitions for external dependencies
//!
//! Following hexagonal architecture, these traits abstract the two
//! collaborators the standings core reads from:
//! - Account store (leagues, rosters, accounts)
//! - Quote source (current prices)

pub mod account_store;
pub mod quote_source;

pub use account_store::{AccountStore, StoreError};
pub use quote_source::{Quote, QuoteError, QuoteSource};
