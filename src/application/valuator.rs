//! Portfolio Valuator
//!
//! Loads an account, prices every holding concurrently and hands the result
//! to the pure valuation math. Quotes that fail or time out leave their
//! holding unpriced; they never fail the valuation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use rust_decimal::Decimal;

use super::standings::StandingsError;
use crate::domain::{valuate_account, Account, AccountId, PortfolioValuation};
use crate::ports::{AccountStore, QuoteError, QuoteSource};

#[derive(Clone)]
pub struct PortfolioValuator {
    store: Arc<dyn AccountStore>,
    quotes: Arc<dyn QuoteSource>,
    quote_timeout: Duration,
}

impl PortfolioValuator {
    pub fn new(
        store: Arc<dyn AccountStore>,
        quotes: Arc<dyn QuoteSource>,
        quote_timeout: Duration,
    ) -> Self {
        Self {
            store,
            quotes,
            quote_timeout,
        }
    }

    /// Value one account against current quotes
    pub async fn valuate(&self, id: AccountId) -> Result<PortfolioValuation, StandingsError> {
        let account = self.store.get_account(id).await?;
        let prices = self.fetch_prices(&account).await;
        let valuation = valuate_account(&account, &prices)?;

        if valuation.is_partial() {
            tracing::warn!(
                "Partial valuation for {}: no quote for {:?}",
                id,
                valuation.missing_quotes
            );
        }
        tracing::debug!(
            "Valued {}: total {} ({}%)",
            id,
            valuation.total_asset,
            valuation.return_pct
        );
        Ok(valuation)
    }

    async fn fetch_prices(&self, account: &Account) -> HashMap<String, Decimal> {
        let lookups = account.holdings().map(|holding| async move {
            let symbol = holding.symbol.as_str();
            let lookup = self.quotes.get_quote(symbol);
            let result = match tokio::time::timeout(self.quote_timeout, lookup).await {
                Ok(result) => result,
                Err(_) => Err(QuoteError::Timeout(symbol.to_string())),
            };
            (symbol, result)
        });

        join_all(lookups)
            .await
            .into_iter()
            .filter_map(|(symbol, result)| match result {
                Ok(quote) => Some((symbol.to_string(), quote.price)),
                Err(e) => {
                    tracing::debug!("Quote lookup failed for {}: {}", symbol, e);
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{MemoryAccountStore, StaticQuoteSource};
    use crate::domain::Holding;
    use crate::ports::account_store::MockAccountStore;
    use crate::ports::StoreError;
    use rust_decimal_macros::dec;

    async fn store_with(account: Account) -> Arc<MemoryAccountStore> {
        let store = MemoryAccountStore::new();
        store.insert_account(account).await;
        Arc::new(store)
    }

    fn reference_account() -> Account {
        Account::with_state(
            AccountId::new(7, 1),
            dec!(100000),
            dec!(40000),
            vec![Holding::new("AAPL", dec!(10), dec!(150)).unwrap()],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_valuate_reference_account() {
        let store = store_with(reference_account()).await;
        let quotes = Arc::new(StaticQuoteSource::new().with_price("AAPL", dec!(172.32)));
        let valuator = PortfolioValuator::new(store, quotes.clone(), Duration::from_secs(1));

        let valuation = valuator.valuate(AccountId::new(7, 1)).await.unwrap();
        assert_eq!(valuation.total_asset, dec!(41723.20));
        assert_eq!(valuation.return_pct, dec!(-58.28));
        assert_eq!(quotes.get_calls(), vec!["AAPL"]);
    }

    #[tokio::test]
    async fn test_missing_account_is_not_found() {
        let store = Arc::new(MemoryAccountStore::new());
        let valuator = PortfolioValuator::new(
            store,
            Arc::new(StaticQuoteSource::new()),
            Duration::from_secs(1),
        );

        let result = valuator.valuate(AccountId::new(1, 1)).await;
        assert!(matches!(result, Err(StandingsError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_store_outage_surfaces() {
        let mut store = MockAccountStore::new();
        store
            .expect_get_account()
            .returning(|_| Err(StoreError::Unavailable("connection refused".to_string())));
        let valuator = PortfolioValuator::new(
            Arc::new(store),
            Arc::new(StaticQuoteSource::new()),
            Duration::from_secs(1),
        );

        let result = valuator.valuate(AccountId::new(1, 1)).await;
        assert!(matches!(result, Err(StandingsError::StoreUnavailable(_))));
    }

    #[tokio::test]
    async fn test_failed_quote_leaves_holding_unpriced() {
        let account = Account::with_state(
            AccountId::new(7, 1),
            dec!(1000),
            dec!(100),
            vec![
                Holding::new("AAPL", dec!(2), dec!(100)).unwrap(),
                Holding::new("MSFT", dec!(1), dec!(300)).unwrap(),
            ],
        )
        .unwrap();
        let store = store_with(account).await;
        let quotes = Arc::new(
            StaticQuoteSource::new()
                .with_price("AAPL", dec!(110))
                .with_failure("MSFT"),
        );
        let valuator = PortfolioValuator::new(store, quotes, Duration::from_secs(1));

        let valuation = valuator.valuate(AccountId::new(7, 1)).await.unwrap();
        assert_eq!(valuation.holdings.len(), 2);
        assert_eq!(valuation.holdings_value, dec!(220));
        assert_eq!(valuation.missing_quotes, vec!["MSFT".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_quote_times_out_independently() {
        let account = Account::with_state(
            AccountId::new(7, 1),
            dec!(1000),
            dec!(0),
            vec![
                Holding::new("AAPL", dec!(1), dec!(100)).unwrap(),
                Holding::new("SLOW", dec!(1), dec!(100)).unwrap(),
            ],
        )
        .unwrap();
        let store = store_with(account).await;
        let quotes = Arc::new(
            StaticQuoteSource::new()
                .with_price("AAPL", dec!(120))
                .with_price("SLOW", dec!(999))
                .with_delay("SLOW", Duration::from_secs(30)),
        );
        let valuator = PortfolioValuator::new(store, quotes, Duration::from_millis(500));

        let valuation = valuator.valuate(AccountId::new(7, 1)).await.unwrap();
        assert_eq!(valuation.holdings_value, dec!(120));
        assert_eq!(valuation.missing_quotes, vec!["SLOW".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_quotes_time_out_still_succeeds() {
        let store = store_with(reference_account()).await;
        let quotes = Arc::new(
            StaticQuoteSource::new()
                .with_price("AAPL", dec!(172.32))
                .with_delay("AAPL", Duration::from_secs(60)),
        );
        let valuator = PortfolioValuator::new(store, quotes, Duration::from_millis(100));

        let valuation = valuator.valuate(AccountId::new(7, 1)).await.unwrap();
        assert_eq!(valuation.holdings_value, Decimal::ZERO);
        assert_eq!(valuation.total_asset, dec!(40000));
        assert!(valuation.holdings.iter().all(|h| h.current_price.is_none()));
    }
}
