//! Configuration Module
//!
//! Loads and validates configuration from TOML files.

pub mod loader;

pub use loader::{
    Config, ConfigError, LoggingSection, QuotesSection, StoreSection, ValuationSection,
    load_config,
};
