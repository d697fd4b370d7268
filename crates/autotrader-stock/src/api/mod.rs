//! Data provider clients
//!
//! Each data kind is behind an async trait so the engine composes whatever
//! the configuration selects: Yahoo Finance for market data, Yahoo or
//! Financial Modeling Prep for fundamentals, NewsAPI for news. The traits
//! also give tests a seam for deterministic fixtures.

pub mod fmp;
pub mod newsapi;
pub mod yahoo;

pub use fmp::FmpClient;
pub use newsapi::{NewsApiClient, NewsArticle};
pub use yahoo::{Candle, YahooClient};

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Fundamental key figures for one company. Fields a provider cannot supply
/// stay `None`; the analyzers treat absent metrics as neutral.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FundamentalSnapshot {
    pub symbol: String,
    pub price: Option<f64>,
    pub market_cap: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub eps: Option<f64>,
    pub revenue_growth: Option<f64>,
    pub profit_margin: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub current_ratio: Option<f64>,
    pub return_on_equity: Option<f64>,
    pub price_to_book: Option<f64>,
    pub beta: Option<f64>,
}

impl FundamentalSnapshot {
    pub fn empty(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            ..Self::default()
        }
    }
}

/// Source of price history and quotes
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Daily candles covering the last `days` calendar days
    async fn daily_history(&self, symbol: &str, days: u32) -> Result<Vec<Candle>>;

    /// Most recent quote
    async fn latest_quote(&self, symbol: &str) -> Result<Candle>;
}

/// Source of fundamental key figures
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FundamentalsSource: Send + Sync {
    async fn fundamentals(&self, symbol: &str) -> Result<FundamentalSnapshot>;
}

/// Source of company news
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NewsSource: Send + Sync {
    /// Articles about the symbol from the last `days` calendar days
    async fn company_news(&self, symbol: &str, days: u32) -> Result<Vec<NewsArticle>>;
}
