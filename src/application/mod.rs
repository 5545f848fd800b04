//! Application Layer - standings use cases
//!
//! - `valuator`: one account against live quotes
//! - `roster`: concurrent valuation of a whole league
//! - `standings`: the public service and its error type

pub mod valuator;
pub mod roster;
pub mod standings;

pub use valuator::PortfolioValuator;
pub use roster::RosterAggregator;
pub use standings::{StandingsError, StandingsService, ValuationSettings};
