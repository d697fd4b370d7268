//! The analysis engine: data collection, analysis, risk, recommendation
//!
//! One engine instance owns the provider clients, the per-kind caches, and
//! the analyzers, all wired from the loaded configuration. A failing symbol
//! is reported and skipped; it never aborts the run.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::{
    AnalysisBundle, FundamentalAnalyzer, NewsAnalyzer, SentimentAnalyzer, TechnicalAnalyzer,
};
use crate::api::{
    FmpClient, FundamentalSnapshot, FundamentalsSource, MarketDataSource, NewsApiClient,
    NewsSource, YahooClient,
};
use crate::cache::DataCaches;
use crate::error::Result;
use crate::recommend::{Action, Recommendation, RecommendationEngine, sort_recommendations};
use crate::risk::{RiskAssessment, RiskManager};
use autotrader_core::{AppConfig, Language, ProviderKind};

/// Requests per minute against Financial Modeling Prep
const FMP_RATE_LIMIT: u32 = 10;
/// Requests per minute against NewsAPI
const NEWSAPI_RATE_LIMIT: u32 = 30;

const DEFAULT_MARKET_DAYS: u32 = 90;
const DEFAULT_NEWS_DAYS: u32 = 7;

/// Everything the pipeline produced for one symbol
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolReport {
    pub symbol: String,
    pub generated_at: DateTime<Utc>,
    pub bundle: AnalysisBundle,
    pub risk: RiskAssessment,
    pub recommendation: Recommendation,
}

/// A symbol that could not be analyzed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolFailure {
    pub symbol: String,
    pub reason: String,
}

/// Aggregates across all analyzed symbols
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortfolioMetrics {
    pub symbols_analyzed: usize,
    pub buy_count: usize,
    pub sell_count: usize,
    pub hold_count: usize,
    /// Mean annualized volatility, percent
    pub avg_volatility: f64,
    /// Mean 95% VaR, percent
    pub avg_var_95: f64,
    /// Worst max drawdown across symbols, percent
    pub worst_drawdown: f64,
    pub avg_sharpe: f64,
    pub avg_risk_score: f64,
}

impl PortfolioMetrics {
    pub fn from_reports(reports: &[SymbolReport]) -> Self {
        if reports.is_empty() {
            return Self::default();
        }
        let n = reports.len() as f64;
        let count = |action: Action| {
            reports
                .iter()
                .filter(|r| r.recommendation.action == action)
                .count()
        };
        Self {
            symbols_analyzed: reports.len(),
            buy_count: count(Action::Buy),
            sell_count: count(Action::Sell),
            hold_count: count(Action::Hold),
            avg_volatility: reports.iter().map(|r| r.risk.metrics.volatility).sum::<f64>() / n,
            avg_var_95: reports.iter().map(|r| r.risk.metrics.var_95).sum::<f64>() / n,
            worst_drawdown: reports
                .iter()
                .map(|r| r.risk.metrics.max_drawdown)
                .fold(0.0, f64::max),
            avg_sharpe: reports.iter().map(|r| r.risk.metrics.sharpe_ratio).sum::<f64>() / n,
            avg_risk_score: reports.iter().map(|r| r.risk.risk_score).sum::<f64>() / n,
        }
    }
}

/// Result of an [`AnalysisEngine::analyze_many`] run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub reports: Vec<SymbolReport>,
    pub failures: Vec<SymbolFailure>,
    pub metrics: PortfolioMetrics,
}

impl RunSummary {
    /// Recommendations in report order: buys by descending score, sells by
    /// ascending score, then holds
    pub fn sorted_recommendations(&self) -> Vec<Recommendation> {
        let mut recommendations: Vec<Recommendation> = self
            .reports
            .iter()
            .map(|r| r.recommendation.clone())
            .collect();
        sort_recommendations(&mut recommendations);
        recommendations
    }
}

/// The wired-up analysis pipeline
pub struct AnalysisEngine {
    config: Arc<AppConfig>,
    market: Arc<dyn MarketDataSource>,
    fundamentals: Arc<dyn FundamentalsSource>,
    news: Arc<dyn NewsSource>,
    caches: DataCaches,
    technical: TechnicalAnalyzer,
    fundamental: FundamentalAnalyzer,
    sentiment: SentimentAnalyzer,
    news_analyzer: NewsAnalyzer,
    risk: RiskManager,
    recommender: RecommendationEngine,
}

impl AnalysisEngine {
    /// Build the engine with the providers the configuration selects
    pub fn from_config(config: Arc<AppConfig>) -> Self {
        let market: Arc<dyn MarketDataSource> = Arc::new(YahooClient::new());

        let fundamentals: Arc<dyn FundamentalsSource> =
            match config.fundamental_data.provider {
                ProviderKind::Fmp => Arc::new(FmpClient::new(
                    config.fundamental_data.api_key().unwrap_or_default(),
                    FMP_RATE_LIMIT,
                )),
                _ => Arc::new(YahooClient::new()),
            };

        let news_language = match config.reporting.language {
            Language::Norwegian => "no",
            Language::English => "en",
        };
        let news: Arc<dyn NewsSource> = Arc::new(NewsApiClient::new(
            config.news_data.api_key().map(ToString::to_string),
            news_language,
            NEWSAPI_RATE_LIMIT,
        ));

        Self::with_sources(config, market, fundamentals, news)
    }

    /// Build the engine with explicit data sources (alternative providers,
    /// deterministic fixtures in tests)
    pub fn with_sources(
        config: Arc<AppConfig>,
        market: Arc<dyn MarketDataSource>,
        fundamentals: Arc<dyn FundamentalsSource>,
        news: Arc<dyn NewsSource>,
    ) -> Self {
        let caches = DataCaches::from_config(&config);
        let language = config.reporting.language;
        Self {
            market,
            fundamentals,
            news,
            caches,
            technical: TechnicalAnalyzer::new(config.analysis.technical.clone()),
            fundamental: FundamentalAnalyzer::new(config.analysis.fundamental.clone(), language),
            sentiment: SentimentAnalyzer::new(config.analysis.sentiment),
            news_analyzer: NewsAnalyzer::new(config.analysis.news),
            risk: RiskManager::new(config.risk_management),
            recommender: RecommendationEngine::new(
                config.analysis.weights,
                config.recommendations,
                language,
            ),
            config,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Run the full pipeline for one symbol
    pub async fn analyze_symbol(&self, symbol: &str) -> Result<SymbolReport> {
        tracing::info!(symbol, "analyzing");

        let market_days = self
            .config
            .market_data
            .days_history
            .unwrap_or(DEFAULT_MARKET_DAYS);
        let news_days = self
            .config
            .news_data
            .days_history
            .unwrap_or(DEFAULT_NEWS_DAYS);

        let candles_fut = self.caches.market.get_or_fetch(symbol.to_string(), || {
            self.market.daily_history(symbol, market_days)
        });
        let fundamentals_fut = self
            .caches
            .fundamentals
            .get_or_fetch(symbol.to_string(), || {
                self.fundamentals.fundamentals(symbol)
            });
        let news_fut = self
            .caches
            .news
            .get_or_fetch(symbol.to_string(), || {
                self.news.company_news(symbol, news_days)
            });

        let (candles, fundamentals, articles) =
            tokio::join!(candles_fut, fundamentals_fut, news_fut);

        // Prices are mandatory; the other inputs degrade gracefully.
        let candles = candles?;
        let fundamentals = fundamentals.unwrap_or_else(|e| {
            tracing::warn!(symbol, error = %e, "fundamentals unavailable");
            FundamentalSnapshot::empty(symbol)
        });
        let articles = articles.unwrap_or_else(|e| {
            tracing::warn!(symbol, error = %e, "news unavailable");
            Vec::new()
        });

        let bundle = AnalysisBundle {
            technical: self.technical.analyze(&candles),
            fundamental: self.fundamental.analyze(&fundamentals),
            sentiment: self.sentiment.analyze(&articles),
            news: self.news_analyzer.analyze(symbol, &articles),
        };

        let risk = self.risk.assess(symbol, &candles, &fundamentals);
        let recommendation = self.recommender.evaluate(symbol, &bundle, &risk);

        tracing::info!(
            symbol,
            action = %recommendation.action,
            score = recommendation.overall_score,
            risk = risk.risk_score,
            "analysis complete"
        );

        Ok(SymbolReport {
            symbol: symbol.to_string(),
            generated_at: Utc::now(),
            bundle,
            risk,
            recommendation,
        })
    }

    /// Analyze every symbol in the list, skipping failures
    pub async fn analyze_many(&self, symbols: &[String]) -> RunSummary {
        let outcomes =
            futures::future::join_all(symbols.iter().map(|s| self.analyze_symbol(s))).await;

        let mut reports = Vec::new();
        let mut failures = Vec::new();
        for (symbol, outcome) in symbols.iter().zip(outcomes) {
            match outcome {
                Ok(report) => reports.push(report),
                Err(e) => {
                    tracing::error!(symbol = %symbol, error = %e, "symbol analysis failed");
                    failures.push(SymbolFailure {
                        symbol: symbol.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        let metrics = PortfolioMetrics::from_reports(&reports);
        tracing::info!(
            analyzed = reports.len(),
            failed = failures.len(),
            buys = metrics.buy_count,
            sells = metrics.sell_count,
            holds = metrics.hold_count,
            "run complete"
        );

        RunSummary {
            reports,
            failures,
            metrics,
        }
    }

    /// Analyze the configured symbol universe
    pub async fn analyze_all(&self) -> RunSummary {
        let symbols = self.config.symbols.clone();
        self.analyze_many(&symbols).await
    }

    /// Drop all cached provider data
    pub async fn clear_caches(&self) {
        self.caches.clear_all().await;
    }
}
