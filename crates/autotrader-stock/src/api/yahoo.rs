//! Yahoo Finance client
//!
//! Serves both market data and a minimal fundamentals fallback. The Yahoo
//! endpoint exposed by the `yahoo_finance_api` crate carries price history
//! only, so the fundamentals implementation fills in what it can (latest
//! price) and leaves the key figures absent.

use crate::api::{FundamentalSnapshot, FundamentalsSource, MarketDataSource};
use crate::error::{Result, TraderError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use yahoo_finance_api as yahoo;

/// One daily OHLCV bar
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candle {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    pub adjclose: f64,
}

/// Yahoo Finance client. Stateless; the connector is cheap to build per call.
#[derive(Debug, Default, Clone)]
pub struct YahooClient {}

impl YahooClient {
    pub fn new() -> Self {
        Self {}
    }

    fn connector() -> Result<yahoo::YahooConnector> {
        yahoo::YahooConnector::new().map_err(|e| TraderError::Yahoo(e.to_string()))
    }

    fn convert(symbol: &str, quote: &yahoo::Quote) -> Candle {
        Candle {
            symbol: symbol.to_string(),
            timestamp: DateTime::from_timestamp(quote.timestamp as i64, 0)
                .unwrap_or_else(Utc::now),
            open: quote.open,
            high: quote.high,
            low: quote.low,
            close: quote.close,
            volume: quote.volume,
            adjclose: quote.adjclose,
        }
    }

    /// Check whether a symbol resolves at all
    pub async fn validate_symbol(&self, symbol: &str) -> Result<bool> {
        match self.latest_quote(symbol).await {
            Ok(_) => Ok(true),
            Err(TraderError::Yahoo(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl MarketDataSource for YahooClient {
    async fn daily_history(&self, symbol: &str, days: u32) -> Result<Vec<Candle>> {
        let provider = Self::connector()?;

        let end = Utc::now();
        let start = end - chrono::Duration::days(i64::from(days));

        let start_odt = OffsetDateTime::from_unix_timestamp(start.timestamp())
            .map_err(|e| TraderError::Yahoo(format!("invalid start timestamp: {e}")))?;
        let end_odt = OffsetDateTime::from_unix_timestamp(end.timestamp())
            .map_err(|e| TraderError::Yahoo(format!("invalid end timestamp: {e}")))?;

        let response = provider
            .get_quote_history(symbol, start_odt, end_odt)
            .await
            .map_err(|e| TraderError::Yahoo(e.to_string()))?;

        let quotes = response
            .quotes()
            .map_err(|e| TraderError::Yahoo(e.to_string()))?;

        if quotes.is_empty() {
            return Err(TraderError::DataUnavailable {
                symbol: symbol.to_string(),
                reason: format!("no price history for the last {days} days"),
            });
        }

        tracing::debug!(symbol, candles = quotes.len(), "fetched price history");
        Ok(quotes.iter().map(|q| Self::convert(symbol, q)).collect())
    }

    async fn latest_quote(&self, symbol: &str) -> Result<Candle> {
        let provider = Self::connector()?;

        let response = provider
            .get_latest_quotes(symbol, "1d")
            .await
            .map_err(|e| TraderError::Yahoo(e.to_string()))?;

        let quote = response
            .last_quote()
            .map_err(|e| TraderError::Yahoo(e.to_string()))?;

        Ok(Self::convert(symbol, &quote))
    }
}

#[async_trait]
impl FundamentalsSource for YahooClient {
    async fn fundamentals(&self, symbol: &str) -> Result<FundamentalSnapshot> {
        // Price is the only figure this endpoint can provide; the analyzers
        // score the missing metrics as neutral.
        tracing::debug!(symbol, "yahoo fundamentals are price-only");
        let quote = self.latest_quote(symbol).await?;
        let mut snapshot = FundamentalSnapshot::empty(symbol);
        snapshot.price = Some(quote.adjclose);
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_latest_quote() {
        let client = YahooClient::new();
        let candle = client.latest_quote("EQNR.OL").await.unwrap();
        assert_eq!(candle.symbol, "EQNR.OL");
        assert!(candle.close > 0.0);
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_daily_history() {
        let client = YahooClient::new();
        let candles = client.daily_history("EQNR.OL", 90).await.unwrap();
        assert!(!candles.is_empty());
        assert!(candles.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_validate_symbol() {
        let client = YahooClient::new();
        assert!(client.validate_symbol("EQNR.OL").await.unwrap());
        assert!(!client.validate_symbol("NOT_A_SYMBOL_123").await.unwrap());
    }
}
