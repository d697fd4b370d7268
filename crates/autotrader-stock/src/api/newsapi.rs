//! NewsAPI.org client
//!
//! Without an API key the client serves deterministic placeholder articles
//! so the rest of the pipeline stays runnable offline; a warning is logged
//! once at construction.

use crate::api::NewsSource;
use crate::error::{Result, TraderError};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::sync::Arc;

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

const BASE_URL: &str = "https://newsapi.org/v2";

/// Company names for the Oslo Børs tickers the tool ships with; NewsAPI
/// full-text search works far better on names than on ticker codes.
const COMPANY_NAMES: &[(&str, &str)] = &[
    ("EQNR.OL", "Equinor"),
    ("DNB.OL", "DNB"),
    ("TEL.OL", "Telenor"),
    ("AKRBP.OL", "Aker BP"),
    ("MOWI.OL", "Mowi"),
    ("NHY.OL", "Norsk Hydro"),
    ("ORK.OL", "Orkla"),
    ("YAR.OL", "Yara"),
];

/// One news article, already reduced to the fields the analyzers use
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsArticle {
    pub title: String,
    pub description: String,
    pub source: String,
    pub published_at: DateTime<Utc>,
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct ApiArticle {
    source: ApiSource,
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    #[serde(rename = "publishedAt")]
    published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct ApiSource {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<ApiArticle>,
}

/// NewsAPI client with request rate limiting
pub struct NewsApiClient {
    client: Client,
    api_key: Option<String>,
    language: String,
    rate_limiter: SharedRateLimiter,
}

impl NewsApiClient {
    /// Create a new client. `language` is an ISO 639-1 code ("no", "en").
    pub fn new(api_key: Option<String>, language: impl Into<String>, rate_limit: u32) -> Self {
        let api_key = api_key.filter(|k| !k.is_empty());
        if api_key.is_none() {
            tracing::warn!("no NewsAPI key configured, serving placeholder articles");
        }
        let quota =
            Quota::per_minute(NonZeroU32::new(rate_limit).unwrap_or(NonZeroU32::new(30).unwrap()));
        Self {
            client: Client::new(),
            api_key,
            language: language.into(),
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }

    /// Best search phrase for a ticker
    pub fn search_query(symbol: &str) -> &str {
        COMPANY_NAMES
            .iter()
            .find(|(ticker, _)| *ticker == symbol)
            .map_or_else(
                || symbol.split('.').next().unwrap_or(symbol),
                |(_, name)| *name,
            )
    }

    fn placeholder_articles(symbol: &str) -> Vec<NewsArticle> {
        let name = Self::search_query(symbol);
        vec![
            NewsArticle {
                title: format!("Positiv utvikling for {name}"),
                description: format!("{name} viser sterk vekst i siste kvartal."),
                source: "Placeholder News".to_string(),
                published_at: Utc::now() - Duration::days(1),
                url: format!("https://example.com/news/{}", symbol.to_lowercase()),
            },
            NewsArticle {
                title: format!("Analytikere oppgraderer {name}"),
                description: format!(
                    "Flere analytikere har oppgradert sine anbefalinger for {name}."
                ),
                source: "Placeholder Financial".to_string(),
                published_at: Utc::now() - Duration::days(3),
                url: format!("https://example.com/financial/{}", symbol.to_lowercase()),
            },
            NewsArticle {
                title: format!("{name} holder kapitalmarkedsdag"),
                description: format!("{name} presenterte oppdaterte utsikter for investorer."),
                source: "Placeholder Wire".to_string(),
                published_at: Utc::now() - Duration::days(5),
                url: format!("https://example.com/wire/{}", symbol.to_lowercase()),
            },
        ]
    }
}

#[async_trait]
impl NewsSource for NewsApiClient {
    async fn company_news(&self, symbol: &str, days: u32) -> Result<Vec<NewsArticle>> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Ok(Self::placeholder_articles(symbol));
        };

        self.rate_limiter.until_ready().await;

        let to = Utc::now();
        let from = to - Duration::days(i64::from(days));
        let url = format!(
            "{BASE_URL}/everything?q={query}&from={from}&to={to}&language={lang}\
             &sortBy=publishedAt&pageSize=50&apiKey={api_key}",
            query = Self::search_query(symbol),
            from = from.format("%Y-%m-%d"),
            to = to.format("%Y-%m-%d"),
            lang = self.language,
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| TraderError::Api(format!("NewsAPI request failed: {e}")))?;

        if response.status().as_u16() == 429 {
            return Err(TraderError::RateLimited {
                provider: "newsapi".to_string(),
            });
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TraderError::Api(format!(
                "NewsAPI error {status}: {body}"
            )));
        }

        let parsed: ApiResponse = response
            .json()
            .await
            .map_err(|e| TraderError::Api(format!("failed to parse NewsAPI response: {e}")))?;

        if parsed.status != "ok" {
            return Err(TraderError::Api(format!(
                "NewsAPI rejected the request: {}",
                parsed.message.unwrap_or_else(|| "unknown reason".to_string())
            )));
        }

        let articles: Vec<NewsArticle> = parsed
            .articles
            .into_iter()
            .filter_map(|a| {
                Some(NewsArticle {
                    title: a.title?,
                    description: a.description.unwrap_or_default(),
                    source: a.source.name.unwrap_or_else(|| "Ukjent".to_string()),
                    published_at: a.published_at?,
                    url: a.url.unwrap_or_default(),
                })
            })
            .collect();

        tracing::debug!(symbol, count = articles.len(), "fetched news articles");
        Ok(articles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_query_known_ticker() {
        assert_eq!(NewsApiClient::search_query("EQNR.OL"), "Equinor");
        assert_eq!(NewsApiClient::search_query("AKRBP.OL"), "Aker BP");
    }

    #[test]
    fn test_search_query_unknown_ticker_strips_exchange() {
        assert_eq!(NewsApiClient::search_query("SALM.OL"), "SALM");
        assert_eq!(NewsApiClient::search_query("AAPL"), "AAPL");
    }

    #[tokio::test]
    async fn test_missing_key_serves_placeholders() {
        let client = NewsApiClient::new(None, "no", 30);
        let articles = client.company_news("EQNR.OL", 7).await.unwrap();
        assert_eq!(articles.len(), 3);
        assert!(articles[0].title.contains("Equinor"));
    }

    #[test]
    fn test_empty_key_is_treated_as_missing() {
        let client = NewsApiClient::new(Some(String::new()), "no", 30);
        assert!(client.api_key.is_none());
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{
            "status": "ok",
            "totalResults": 1,
            "articles": [{
                "source": {"id": null, "name": "E24"},
                "title": "Equinor leverer sterkt kvartal",
                "description": "Resultatet overgikk forventningene.",
                "url": "https://e24.no/a/1",
                "publishedAt": "2026-08-01T07:30:00Z"
            }]
        }"#;
        let parsed: ApiResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.status, "ok");
        assert_eq!(parsed.articles.len(), 1);
        assert_eq!(parsed.articles[0].source.name.as_deref(), Some("E24"));
    }
}
