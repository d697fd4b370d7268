//! Configuration schema for AutoTrader One
//!
//! The on-disk format is a single YAML mapping with one section per concern:
//! data providers (`market_data`, `fundamental_data`, `news_data`), the symbol
//! universe, analysis weights and periods, recommendation thresholds, risk
//! limits, reporting, logging, a bare `api_keys` overlay, and GUI theming.
//!
//! Loading lives in [`loader`], semantic checks in [`validate`]. The schema
//! types here only describe shape and defaults.

mod loader;
mod validate;

pub use loader::{DuplicateKeys, LoadOutcome, load_path, load_str};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// External data provider referenced by a configuration section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Yahoo Finance (no API key required)
    Yahoo,
    /// Financial Modeling Prep
    Fmp,
    /// NewsAPI.org
    Newsapi,
}

impl ProviderKind {
    /// Name used in the `api_keys` overlay and in log output
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Yahoo => "yahoo",
            Self::Fmp => "fmp",
            Self::Newsapi => "newsapi",
        }
    }

    /// Whether the provider cannot be used without an API key
    pub fn requires_api_key(self) -> bool {
        !matches!(self, Self::Yahoo)
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One provider section (`market_data`, `fundamental_data`, or `news_data`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    /// Which provider serves this section
    pub provider: ProviderKind,

    /// API key; may also arrive via the `api_keys` overlay
    #[serde(default)]
    pub api_key: Option<String>,

    /// Seconds before cached data from this provider is considered stale
    #[serde(default = "default_cache_timeout")]
    pub cache_timeout: u64,

    /// How far back to fetch, in calendar days
    #[serde(default)]
    pub days_history: Option<u32>,
}

impl ProviderConfig {
    fn new(provider: ProviderKind, cache_timeout: u64, days_history: Option<u32>) -> Self {
        Self {
            provider,
            api_key: None,
            cache_timeout,
            days_history,
        }
    }

    /// Cache TTL for this section
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_timeout)
    }

    /// Effective API key, treating the empty string as absent
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.is_empty())
    }
}

fn default_cache_timeout() -> u64 {
    3600
}

/// Relative weights of the analysis dimensions; must sum to 1.0
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AnalysisWeights {
    pub technical: f64,
    pub fundamental: f64,
    pub news: f64,
    pub sentiment: f64,
}

impl AnalysisWeights {
    pub fn sum(&self) -> f64 {
        self.technical + self.fundamental + self.news + self.sentiment
    }
}

impl Default for AnalysisWeights {
    fn default() -> Self {
        Self {
            technical: 0.4,
            fundamental: 0.3,
            news: 0.2,
            sentiment: 0.1,
        }
    }
}

/// Indicator periods for the technical analyzer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TechnicalConfig {
    #[serde(default = "default_rsi_period")]
    pub rsi_period: usize,
    #[serde(default = "default_sma_short")]
    pub sma_short: usize,
    #[serde(default = "default_sma_long")]
    pub sma_long: usize,
    #[serde(default = "default_macd_fast")]
    pub macd_fast: usize,
    #[serde(default = "default_macd_slow")]
    pub macd_slow: usize,
    #[serde(default = "default_macd_signal")]
    pub macd_signal: usize,
    /// Flat indicator list from the older draft schema; informational only
    #[serde(default)]
    pub indicators: Vec<String>,
}

fn default_rsi_period() -> usize {
    14
}
fn default_sma_short() -> usize {
    20
}
fn default_sma_long() -> usize {
    50
}
fn default_macd_fast() -> usize {
    12
}
fn default_macd_slow() -> usize {
    26
}
fn default_macd_signal() -> usize {
    9
}

impl Default for TechnicalConfig {
    fn default() -> Self {
        Self {
            rsi_period: default_rsi_period(),
            sma_short: default_sma_short(),
            sma_long: default_sma_long(),
            macd_fast: default_macd_fast(),
            macd_slow: default_macd_slow(),
            macd_signal: default_macd_signal(),
            indicators: Vec::new(),
        }
    }
}

/// News relevance filtering
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NewsAnalysisConfig {
    #[serde(default = "default_relevance_threshold")]
    pub relevance_threshold: f64,
}

fn default_relevance_threshold() -> f64 {
    0.6
}

impl Default for NewsAnalysisConfig {
    fn default() -> Self {
        Self {
            relevance_threshold: default_relevance_threshold(),
        }
    }
}

/// Sentiment recency weighting
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SentimentConfig {
    #[serde(default = "default_min_articles")]
    pub min_articles: usize,
    #[serde(default = "default_recent_weight")]
    pub recent_weight: f64,
    #[serde(default = "default_older_weight")]
    pub older_weight: f64,
    /// Articles newer than this many days count as "recent"
    #[serde(default = "default_recent_days")]
    pub recent_days: i64,
}

fn default_min_articles() -> usize {
    3
}
fn default_recent_weight() -> f64 {
    0.7
}
fn default_older_weight() -> f64 {
    0.3
}
fn default_recent_days() -> i64 {
    3
}

impl Default for SentimentConfig {
    fn default() -> Self {
        Self {
            min_articles: default_min_articles(),
            recent_weight: default_recent_weight(),
            older_weight: default_older_weight(),
            recent_days: default_recent_days(),
        }
    }
}

/// Fundamental metric selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FundamentalMetric {
    PeRatio,
    Eps,
    RevenueGrowth,
    ProfitMargin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundamentalConfig {
    #[serde(default = "default_fundamental_metrics")]
    pub metrics: Vec<FundamentalMetric>,
}

fn default_fundamental_metrics() -> Vec<FundamentalMetric> {
    vec![
        FundamentalMetric::PeRatio,
        FundamentalMetric::Eps,
        FundamentalMetric::RevenueGrowth,
    ]
}

impl Default for FundamentalConfig {
    fn default() -> Self {
        Self {
            metrics: default_fundamental_metrics(),
        }
    }
}

/// Analysis configuration: weights plus per-analyzer settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub weights: AnalysisWeights,
    #[serde(default)]
    pub technical: TechnicalConfig,
    #[serde(default)]
    pub news: NewsAnalysisConfig,
    #[serde(default)]
    pub sentiment: SentimentConfig,
    #[serde(default)]
    pub fundamental: FundamentalConfig,
}

/// Recommendation thresholds, normalized to the 0-100 score scale.
///
/// The document is accepted in either of the two draft shapes that circulated:
/// a nested `thresholds: {buy, sell, max_risk}` block or flat
/// `buy_threshold`/`sell_threshold`/`max_risk` keys, on either the 0-1 or the
/// 0-100 scale. Scale consistency is checked in validation; normalization to
/// 0-100 happens after validation passes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(from = "RawRecommendations")]
pub struct RecommendationConfig {
    pub buy_threshold: f64,
    pub sell_threshold: f64,
    pub max_risk: f64,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            buy_threshold: 70.0,
            sell_threshold: 30.0,
            max_risk: 70.0,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawThresholds {
    buy: Option<f64>,
    sell: Option<f64>,
    max_risk: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct RawRecommendations {
    #[serde(default)]
    thresholds: RawThresholds,
    #[serde(default)]
    buy_threshold: Option<f64>,
    #[serde(default)]
    sell_threshold: Option<f64>,
    #[serde(default)]
    max_risk: Option<f64>,
    /// Oldest draft: a single symmetric cutoff
    #[serde(default)]
    min_score: Option<f64>,
}

impl From<RawRecommendations> for RecommendationConfig {
    fn from(raw: RawRecommendations) -> Self {
        let defaults = Self::default();
        let buy = raw
            .buy_threshold
            .or(raw.thresholds.buy)
            .or(raw.min_score)
            .unwrap_or(defaults.buy_threshold);
        let sell = raw
            .sell_threshold
            .or(raw.thresholds.sell)
            .or(raw.min_score.map(|s| if s > 1.0 { 100.0 - s } else { 1.0 - s }))
            .unwrap_or(defaults.sell_threshold);
        let max_risk = raw
            .max_risk
            .or(raw.thresholds.max_risk)
            .unwrap_or(if buy > 1.0 { defaults.max_risk } else { defaults.max_risk / 100.0 });
        Self {
            buy_threshold: buy,
            sell_threshold: sell,
            max_risk,
        }
    }
}

impl RecommendationConfig {
    /// True when every threshold is expressed as a 0-1 fraction
    pub fn is_fractional(&self) -> bool {
        self.buy_threshold <= 1.0 && self.sell_threshold <= 1.0 && self.max_risk <= 1.0
    }

    /// True when every threshold is expressed on the 0-100 scale
    pub fn is_percent(&self) -> bool {
        self.buy_threshold > 1.0 && self.max_risk > 1.0
    }

    pub(crate) fn normalize(&mut self) {
        if self.is_fractional() {
            self.buy_threshold *= 100.0;
            self.sell_threshold *= 100.0;
            self.max_risk *= 100.0;
        }
    }
}

/// Portfolio risk limits
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Largest fraction of the portfolio a single position may take
    #[serde(default = "default_max_position_size")]
    pub max_position_size: f64,
    /// Daily loss fraction that triggers a halt
    #[serde(default = "default_max_daily_loss")]
    pub max_daily_loss: f64,
    /// Drawdown fraction from peak that triggers a halt
    #[serde(default = "default_max_drawdown")]
    pub max_drawdown: f64,
    #[serde(default = "default_stop_loss")]
    pub stop_loss: f64,
    #[serde(default = "default_take_profit")]
    pub take_profit: f64,
    #[serde(default = "default_max_leverage")]
    pub max_leverage: f64,
}

fn default_max_position_size() -> f64 {
    0.10
}
fn default_max_daily_loss() -> f64 {
    0.02
}
fn default_max_drawdown() -> f64 {
    0.10
}
fn default_stop_loss() -> f64 {
    0.05
}
fn default_take_profit() -> f64 {
    0.10
}
fn default_max_leverage() -> f64 {
    1.0
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            max_position_size: default_max_position_size(),
            max_daily_loss: default_max_daily_loss(),
            max_drawdown: default_max_drawdown(),
            stop_loss: default_stop_loss(),
            take_profit: default_take_profit(),
            max_leverage: default_max_leverage(),
        }
    }
}

/// Output language for reports and explanations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "nb_NO", alias = "no", alias = "nb")]
    Norwegian,
    #[serde(rename = "en_US", alias = "en")]
    English,
}

impl Default for Language {
    fn default() -> Self {
        Self::Norwegian
    }
}

/// Report output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Markdown,
    Json,
}

impl Default for ReportFormat {
    fn default() -> Self {
        Self::Markdown
    }
}

/// Report generation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportingConfig {
    #[serde(default = "default_output_dir", alias = "report_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub format: ReportFormat,
    #[serde(default)]
    pub language: Language,
    /// Also dump the raw analysis data as JSON next to the report
    #[serde(default = "default_true", alias = "save_data")]
    pub save_raw_data: bool,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("rapporter")
}

fn default_true() -> bool {
    true
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            format: ReportFormat::default(),
            language: Language::default(),
            save_raw_data: true,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Optional log file in addition to console output
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// GUI theming block. Parsed and range-checked so the document round-trips,
/// but no GUI component consumes it in this workspace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuiConfig {
    #[serde(default)]
    pub theme: BTreeMap<String, String>,
    /// Seconds between dashboard refreshes
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: u64,
}

fn default_refresh_interval() -> u64 {
    60
}

impl Default for GuiConfig {
    fn default() -> Self {
        Self {
            theme: BTreeMap::new(),
            refresh_interval: default_refresh_interval(),
        }
    }
}

/// The fully merged application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_market_data")]
    pub market_data: ProviderConfig,
    #[serde(default = "default_fundamental_data")]
    pub fundamental_data: ProviderConfig,
    #[serde(default = "default_news_data")]
    pub news_data: ProviderConfig,
    #[serde(default = "default_symbols")]
    pub symbols: Vec<String>,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub recommendations: RecommendationConfig,
    #[serde(default)]
    pub risk_management: RiskConfig,
    #[serde(default)]
    pub reporting: ReportingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Flat provider-name -> key overlay; overrides per-section `api_key`
    #[serde(default)]
    pub api_keys: BTreeMap<String, String>,
    #[serde(default)]
    pub gui: GuiConfig,
}

fn default_market_data() -> ProviderConfig {
    ProviderConfig::new(ProviderKind::Yahoo, 60, Some(90))
}

fn default_fundamental_data() -> ProviderConfig {
    ProviderConfig::new(ProviderKind::Yahoo, 3600, None)
}

fn default_news_data() -> ProviderConfig {
    ProviderConfig::new(ProviderKind::Newsapi, 300, Some(7))
}

fn default_symbols() -> Vec<String> {
    ["EQNR.OL", "DNB.OL", "MOWI.OL", "TEL.OL", "AKRBP.OL"]
        .iter()
        .map(ToString::to_string)
        .collect()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            market_data: default_market_data(),
            fundamental_data: default_fundamental_data(),
            news_data: default_news_data(),
            symbols: default_symbols(),
            analysis: AnalysisConfig::default(),
            recommendations: RecommendationConfig::default(),
            risk_management: RiskConfig::default(),
            reporting: ReportingConfig::default(),
            logging: LoggingConfig::default(),
            api_keys: BTreeMap::new(),
            gui: GuiConfig::default(),
        }
    }
}

impl AppConfig {
    /// Fold the `api_keys` overlay into the provider sections and drop
    /// duplicate symbols, keeping first occurrences in order.
    pub(crate) fn normalize(&mut self) {
        for section in [
            &mut self.market_data,
            &mut self.fundamental_data,
            &mut self.news_data,
        ] {
            if let Some(key) = self.api_keys.get(section.provider.as_str()) {
                if section.api_key() != Some(key.as_str()) {
                    tracing::debug!(provider = %section.provider, "api_keys overlay applied");
                    section.api_key = Some(key.clone());
                }
            }
        }

        let mut seen = std::collections::BTreeSet::new();
        self.symbols.retain(|s| seen.insert(s.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights_sum_to_one() {
        let weights = AnalysisWeights::default();
        assert!((weights.sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_provider_api_key_empty_string_is_absent() {
        let mut section = default_news_data();
        section.api_key = Some(String::new());
        assert_eq!(section.api_key(), None);
        section.api_key = Some("k".to_string());
        assert_eq!(section.api_key(), Some("k"));
    }

    #[test]
    fn test_recommendations_accept_nested_draft() {
        let cfg: RecommendationConfig =
            serde_yaml::from_str("thresholds:\n  buy: 70.0\n  sell: 30.0\n  max_risk: 70.0\n")
                .unwrap();
        assert!((cfg.buy_threshold - 70.0).abs() < f64::EPSILON);
        assert!((cfg.sell_threshold - 30.0).abs() < f64::EPSILON);
        assert!(cfg.is_percent());
    }

    #[test]
    fn test_recommendations_accept_flat_draft() {
        let cfg: RecommendationConfig =
            serde_yaml::from_str("buy_threshold: 0.7\nsell_threshold: 0.3\nmax_risk: 0.7\n")
                .unwrap();
        assert!(cfg.is_fractional());
        let mut cfg = cfg;
        cfg.normalize();
        assert!((cfg.buy_threshold - 70.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_api_keys_overlay_and_symbol_dedup() {
        let mut cfg = AppConfig::default();
        cfg.symbols = vec![
            "EQNR.OL".to_string(),
            "DNB.OL".to_string(),
            "EQNR.OL".to_string(),
        ];
        cfg.api_keys
            .insert("newsapi".to_string(), "secret".to_string());
        cfg.normalize();
        assert_eq!(cfg.symbols, vec!["EQNR.OL", "DNB.OL"]);
        assert_eq!(cfg.news_data.api_key(), Some("secret"));
        // yahoo has no overlay entry, untouched
        assert_eq!(cfg.market_data.api_key(), None);
    }

    #[test]
    fn test_language_aliases() {
        assert_eq!(
            serde_yaml::from_str::<Language>("nb_NO").unwrap(),
            Language::Norwegian
        );
        assert_eq!(
            serde_yaml::from_str::<Language>("en_US").unwrap(),
            Language::English
        );
        assert_eq!(
            serde_yaml::from_str::<Language>("en").unwrap(),
            Language::English
        );
    }
}
