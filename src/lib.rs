//! league-standings - Fantasy stock league valuation library
//!
//! Values member portfolios against current quotes and ranks each league
//! by return, tolerating per-member and per-quote failures.
//!
//! # Modules
//!
//! - `domain`: Core business logic (Account, League, valuation, ranking)
//! - `ports`: Trait abstractions (AccountStore, QuoteSource)
//! - `adapters`: External implementations (in-memory store, REST quotes, snapshot, CLI)
//! - `config`: Configuration loading and validation
//! - `application`: Valuator, roster aggregator and standings service

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod config;
pub mod application;
