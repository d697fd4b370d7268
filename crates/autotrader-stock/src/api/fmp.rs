//! Financial Modeling Prep client for fundamental key figures

use crate::api::{FundamentalSnapshot, FundamentalsSource};
use crate::error::{Result, TraderError};
use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde::Deserialize;
use std::num::NonZeroU32;
use std::sync::Arc;

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

const BASE_URL: &str = "https://financialmodelingprep.com/api/v3";

/// Trailing-twelve-month ratios as FMP reports them
#[derive(Debug, Clone, Default, Deserialize)]
struct RatiosTtm {
    #[serde(rename = "peRatioTTM")]
    pe_ratio: Option<f64>,
    #[serde(rename = "netProfitMarginTTM")]
    profit_margin: Option<f64>,
    #[serde(rename = "debtEquityRatioTTM")]
    debt_to_equity: Option<f64>,
    #[serde(rename = "currentRatioTTM")]
    current_ratio: Option<f64>,
    #[serde(rename = "returnOnEquityTTM")]
    return_on_equity: Option<f64>,
    #[serde(rename = "priceToBookRatioTTM")]
    price_to_book: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct Profile {
    price: Option<f64>,
    beta: Option<f64>,
    #[serde(rename = "mktCap")]
    market_cap: Option<f64>,
    #[serde(default)]
    eps: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct IncomeGrowth {
    #[serde(rename = "growthRevenue")]
    revenue_growth: Option<f64>,
}

/// Financial Modeling Prep client with request rate limiting
pub struct FmpClient {
    client: Client,
    api_key: String,
    rate_limiter: SharedRateLimiter,
}

impl FmpClient {
    /// Create a new client.
    ///
    /// `rate_limit` is requests per minute (free tier allows 250/day, keep
    /// this low).
    pub fn new(api_key: impl Into<String>, rate_limit: u32) -> Self {
        let quota =
            Quota::per_minute(NonZeroU32::new(rate_limit).unwrap_or(NonZeroU32::new(10).unwrap()));
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }

    /// GET an FMP endpoint that returns an array, keeping the first element
    async fn get_first<T>(&self, endpoint: &str, symbol: &str) -> Result<Option<T>>
    where
        T: for<'de> Deserialize<'de>,
    {
        self.rate_limiter.until_ready().await;

        let url = format!(
            "{BASE_URL}/{endpoint}/{symbol}?apikey={key}",
            key = self.api_key
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| TraderError::Api(format!("FMP request failed: {e}")))?;

        if response.status().as_u16() == 429 {
            return Err(TraderError::RateLimited {
                provider: "fmp".to_string(),
            });
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TraderError::Api(format!("FMP API error {status}: {body}")));
        }

        let mut items: Vec<T> = response
            .json()
            .await
            .map_err(|e| TraderError::Api(format!("failed to parse FMP response: {e}")))?;

        Ok(if items.is_empty() {
            None
        } else {
            Some(items.swap_remove(0))
        })
    }
}

#[async_trait]
impl FundamentalsSource for FmpClient {
    async fn fundamentals(&self, symbol: &str) -> Result<FundamentalSnapshot> {
        // Ratios are the backbone; profile and growth are nice to have and
        // a failure there degrades to absent fields.
        let ratios: RatiosTtm = self
            .get_first("ratios-ttm", symbol)
            .await?
            .ok_or_else(|| TraderError::DataUnavailable {
                symbol: symbol.to_string(),
                reason: "FMP has no TTM ratios for this symbol".to_string(),
            })?;

        let profile: Profile = match self.get_first("profile", symbol).await {
            Ok(p) => p.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(symbol, error = %e, "FMP profile unavailable");
                Profile::default()
            }
        };

        let growth: IncomeGrowth = match self
            .get_first("income-statement-growth", symbol)
            .await
        {
            Ok(g) => g.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(symbol, error = %e, "FMP revenue growth unavailable");
                IncomeGrowth::default()
            }
        };

        Ok(FundamentalSnapshot {
            symbol: symbol.to_string(),
            price: profile.price,
            market_cap: profile.market_cap,
            pe_ratio: ratios.pe_ratio,
            eps: profile.eps,
            revenue_growth: growth.revenue_growth,
            profit_margin: ratios.profit_margin,
            debt_to_equity: ratios.debt_to_equity,
            current_ratio: ratios.current_ratio,
            return_on_equity: ratios.return_on_equity,
            price_to_book: ratios.price_to_book,
            beta: profile.beta,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = FmpClient::new("test_key", 10);
        assert_eq!(client.api_key, "test_key");
    }

    #[test]
    fn test_ratios_parsing() {
        let body = r#"[{"peRatioTTM": 9.4, "netProfitMarginTTM": 0.18,
                        "debtEquityRatioTTM": 0.42, "currentRatioTTM": 1.3,
                        "returnOnEquityTTM": 0.21, "priceToBookRatioTTM": 1.9}]"#;
        let ratios: Vec<RatiosTtm> = serde_json::from_str(body).unwrap();
        let first = &ratios[0];
        assert_eq!(first.pe_ratio, Some(9.4));
        assert_eq!(first.current_ratio, Some(1.3));
    }

    #[test]
    fn test_profile_parsing_with_missing_fields() {
        let body = r#"[{"price": 312.5, "mktCap": 9.5e11}]"#;
        let profiles: Vec<Profile> = serde_json::from_str(body).unwrap();
        assert_eq!(profiles[0].price, Some(312.5));
        assert_eq!(profiles[0].beta, None);
    }

    #[tokio::test]
    #[ignore] // Requires network access and an API key
    async fn test_fundamentals_live() {
        let key = std::env::var("FMP_API_KEY").unwrap();
        let client = FmpClient::new(key, 10);
        let snapshot = client.fundamentals("AAPL").await.unwrap();
        assert!(snapshot.pe_ratio.is_some());
    }
}
