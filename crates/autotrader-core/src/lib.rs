//! Configuration layer for AutoTrader One
//!
//! This crate owns the YAML configuration document: its schema, loading with
//! an explicit duplicate-key policy, the `api_keys` overlay, and semantic
//! validation. The document that shipped with the project was two drafts
//! concatenated into one file, so the loader refuses duplicated top-level
//! keys by default and only merges them (last occurrence wins, loudly) when
//! explicitly asked to.
//!
//! # Example
//!
//! ```rust,no_run
//! use autotrader_core::{DuplicateKeys, load_path};
//!
//! let outcome = load_path("config.yaml", DuplicateKeys::Deny)?;
//! println!("analyzing {} symbols", outcome.config.symbols.len());
//! # Ok::<(), autotrader_core::ConfigError>(())
//! ```

pub mod config;
pub mod error;

pub use config::{
    AnalysisConfig, AnalysisWeights, AppConfig, DuplicateKeys, FundamentalConfig,
    FundamentalMetric, GuiConfig, Language, LoadOutcome, LoggingConfig, NewsAnalysisConfig,
    ProviderConfig, ProviderKind, RecommendationConfig, ReportFormat, ReportingConfig, RiskConfig,
    SentimentConfig, TechnicalConfig, load_path, load_str,
};
pub use error::{ConfigError, Result};
