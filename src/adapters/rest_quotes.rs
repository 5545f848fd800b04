use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::ports::{Quote, QuoteError, QuoteSource};

const DETAIL_PATH: &str = "stocks/detail";

/// Quote source backed by the league API's stock detail endpoint
#[derive(Debug, Clone)]
pub struct RestQuoteClient {
    http: Client,
    base_url: String,
    api_token: Option<String>,
}

impl RestQuoteClient {
    pub fn new(
        base_url: impl Into<String>,
        api_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, QuoteError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| QuoteError::Http(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_token: api_token.filter(|t| !t.is_empty()),
        })
    }

    fn detail_url(&self, symbol: &str) -> String {
        format!("{}/{}/{}/", self.base_url, DETAIL_PATH, symbol)
    }
}

#[async_trait]
impl QuoteSource for RestQuoteClient {
    async fn get_quote(&self, symbol: &str) -> Result<Quote, QuoteError> {
        let mut request = self.http.get(self.detail_url(symbol));
        if let Some(token) = &self.api_token {
            request = request.header("Authorization", format!("Token {}", token));
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                QuoteError::Timeout(symbol.to_string())
            } else {
                QuoteError::Http(e.to_string())
            }
        })?;

        match response.status() {
            StatusCode::NOT_FOUND => return Err(QuoteError::Unavailable(symbol.to_string())),
            status if !status.is_success() => {
                return Err(QuoteError::Http(format!("{} for {}", status, symbol)));
            }
            _ => {}
        }

        let body = response
            .text()
            .await
            .map_err(|e| QuoteError::Http(e.to_string()))?;
        parse_detail(symbol, &body)
    }
}

#[derive(Debug, Deserialize)]
struct StockDetail {
    #[serde(default)]
    symbol: Option<String>,
    /// Number or string depending on the backend serializer
    close: Option<Decimal>,
}

fn parse_detail(symbol: &str, body: &str) -> Result<Quote, QuoteError> {
    let detail: StockDetail =
        serde_json::from_str(body).map_err(|e| QuoteError::Parse(e.to_string()))?;

    let price = detail
        .close
        .filter(|p| *p > Decimal::ZERO)
        .ok_or_else(|| QuoteError::Unavailable(symbol.to_string()))?;

    Ok(Quote::new(detail.symbol.unwrap_or_else(|| symbol.to_string()), price))
}
