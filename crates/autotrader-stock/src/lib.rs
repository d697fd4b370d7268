//! Stock analysis pipeline for AutoTrader One
//!
//! This crate turns a configured symbol universe into trade recommendations:
//!
//! - Data collection from Yahoo Finance (prices), Financial Modeling Prep
//!   (fundamentals), and NewsAPI (news), each behind a TTL cache
//! - Technical, fundamental, news, and sentiment analyzers, all scoring on
//!   a shared 0-100 scale
//! - Risk assessment (volatility, beta, Sharpe, drawdown, VaR) with
//!   risk-scaled position sizing
//! - A recommendation engine applying the configured weights and thresholds
//! - Markdown/JSON report generation and portfolio monitoring
//!
//! # Example
//!
//! ```rust,no_run
//! use autotrader_core::{DuplicateKeys, load_path};
//! use autotrader_stock::{AnalysisEngine, ReportGenerator};
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let outcome = load_path("config.yaml", DuplicateKeys::Deny)?;
//! let config = Arc::new(outcome.config);
//!
//! let engine = AnalysisEngine::from_config(Arc::clone(&config));
//! let summary = engine.analyze_all().await;
//!
//! let generator = ReportGenerator::new(config.reporting.clone());
//! let path = generator.generate(&summary)?;
//! println!("report written to {}", path.display());
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod api;
pub mod cache;
pub mod engine;
pub mod error;
pub mod monitor;
pub mod recommend;
pub mod report;
pub mod risk;

// Re-export main types for convenience
pub use analysis::{AnalysisBundle, Signal};
pub use api::{Candle, FmpClient, FundamentalSnapshot, NewsApiClient, NewsArticle, YahooClient};
pub use engine::{AnalysisEngine, PortfolioMetrics, RunSummary, SymbolReport};
pub use error::{Result, TraderError};
pub use monitor::{Alert, AlertKind, PortfolioMonitor};
pub use recommend::{Action, Recommendation};
pub use report::ReportGenerator;
pub use risk::{RiskAssessment, RiskManager};
