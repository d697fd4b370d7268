//! Semantic configuration checks
//!
//! Every rule appends to the problem list so a single load reports all
//! violations at once instead of failing on the first.

use super::AppConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Run all checks. An empty return value means the configuration is valid.
pub fn check(config: &AppConfig) -> Vec<String> {
    let mut problems = Vec::new();

    check_symbols(config, &mut problems);
    check_providers(config, &mut problems);
    check_weights(config, &mut problems);
    check_technical(config, &mut problems);
    check_sentiment(config, &mut problems);
    check_thresholds(config, &mut problems);
    check_risk(config, &mut problems);
    check_misc(config, &mut problems);

    problems
}

fn check_symbols(config: &AppConfig, problems: &mut Vec<String>) {
    if config.symbols.is_empty() {
        problems.push("symbols must not be empty".to_string());
    }
    for symbol in &config.symbols {
        if symbol.trim().is_empty() || symbol.contains(char::is_whitespace) {
            problems.push(format!("invalid symbol {symbol:?}"));
        }
    }
}

fn check_providers(config: &AppConfig, problems: &mut Vec<String>) {
    use super::{
        ProviderConfig,
        ProviderKind::{Fmp, Newsapi, Yahoo},
    };

    let sections: [(&str, &ProviderConfig, &[super::ProviderKind]); 3] = [
        ("market_data", &config.market_data, &[Yahoo]),
        ("fundamental_data", &config.fundamental_data, &[Yahoo, Fmp]),
        ("news_data", &config.news_data, &[Newsapi]),
    ];

    for (name, section, supported) in sections {
        if !supported.contains(&section.provider) {
            problems.push(format!(
                "{name}.provider {} is not supported for this section",
                section.provider
            ));
        }
        if section.cache_timeout == 0 {
            problems.push(format!("{name}.cache_timeout must be greater than 0"));
        }
        if section.days_history == Some(0) {
            problems.push(format!("{name}.days_history must be greater than 0"));
        }
        if section.provider.requires_api_key() && section.api_key().is_none() {
            // NewsAPI degrades to placeholder articles, everything else is
            // unusable without a key.
            if section.provider == Newsapi {
                tracing::warn!(
                    section = name,
                    "no API key configured, news collection will use placeholder articles"
                );
            } else {
                problems.push(format!(
                    "{name}.api_key is required for provider {}",
                    section.provider
                ));
            }
        }
    }
}

fn check_weights(config: &AppConfig, problems: &mut Vec<String>) {
    let weights = &config.analysis.weights;
    for (name, value) in [
        ("technical", weights.technical),
        ("fundamental", weights.fundamental),
        ("news", weights.news),
        ("sentiment", weights.sentiment),
    ] {
        if !(0.0..=1.0).contains(&value) {
            problems.push(format!("analysis.weights.{name} must be within [0, 1]"));
        }
    }
    if (weights.sum() - 1.0).abs() > 1e-6 {
        problems.push(format!(
            "analysis.weights must sum to 1.0 (got {:.4})",
            weights.sum()
        ));
    }
}

fn check_technical(config: &AppConfig, problems: &mut Vec<String>) {
    let technical = &config.analysis.technical;
    for (name, period) in [
        ("rsi_period", technical.rsi_period),
        ("sma_short", technical.sma_short),
        ("sma_long", technical.sma_long),
        ("macd_fast", technical.macd_fast),
        ("macd_slow", technical.macd_slow),
        ("macd_signal", technical.macd_signal),
    ] {
        if period < 2 {
            problems.push(format!("analysis.technical.{name} must be at least 2"));
        }
    }
    if technical.sma_short >= technical.sma_long {
        problems.push("analysis.technical.sma_short must be below sma_long".to_string());
    }
    if technical.macd_fast >= technical.macd_slow {
        problems.push("analysis.technical.macd_fast must be below macd_slow".to_string());
    }
    if !(0.0..=1.0).contains(&config.analysis.news.relevance_threshold) {
        problems.push("analysis.news.relevance_threshold must be within [0, 1]".to_string());
    }
}

fn check_sentiment(config: &AppConfig, problems: &mut Vec<String>) {
    let sentiment = &config.analysis.sentiment;
    if sentiment.min_articles == 0 {
        problems.push("analysis.sentiment.min_articles must be at least 1".to_string());
    }
    if sentiment.recent_days < 1 {
        problems.push("analysis.sentiment.recent_days must be at least 1".to_string());
    }
    if (sentiment.recent_weight + sentiment.older_weight - 1.0).abs() > 1e-6 {
        problems.push(
            "analysis.sentiment recent_weight and older_weight must sum to 1.0".to_string(),
        );
    }
    if config.analysis.fundamental.metrics.is_empty() {
        problems.push("analysis.fundamental.metrics must not be empty".to_string());
    }
}

fn check_thresholds(config: &AppConfig, problems: &mut Vec<String>) {
    let rec = &config.recommendations;

    // The two circulated drafts used different unit scales (70.0/30.0 versus
    // 0.7/0.3). Either is accepted, but not a mixture.
    if !rec.is_fractional() && !rec.is_percent() {
        problems.push(format!(
            "recommendations thresholds mix 0-1 and 0-100 scales \
             (buy {}, sell {}, max_risk {})",
            rec.buy_threshold, rec.sell_threshold, rec.max_risk
        ));
        return;
    }

    let upper = if rec.is_fractional() { 1.0 } else { 100.0 };
    for (name, value) in [
        ("buy_threshold", rec.buy_threshold),
        ("sell_threshold", rec.sell_threshold),
        ("max_risk", rec.max_risk),
    ] {
        if !(0.0..=upper).contains(&value) {
            problems.push(format!("recommendations.{name} must be within [0, {upper}]"));
        }
    }
    if rec.buy_threshold <= rec.sell_threshold {
        problems.push("recommendations.buy_threshold must exceed sell_threshold".to_string());
    }
}

fn check_risk(config: &AppConfig, problems: &mut Vec<String>) {
    let risk = &config.risk_management;
    for (name, value) in [
        ("max_position_size", risk.max_position_size),
        ("max_daily_loss", risk.max_daily_loss),
        ("max_drawdown", risk.max_drawdown),
        ("stop_loss", risk.stop_loss),
    ] {
        if !(value > 0.0 && value <= 1.0) {
            problems.push(format!("risk_management.{name} must be within (0, 1]"));
        }
    }
    if risk.take_profit <= 0.0 {
        problems.push("risk_management.take_profit must be positive".to_string());
    }
    if risk.max_leverage < 1.0 {
        problems.push("risk_management.max_leverage must be at least 1.0".to_string());
    }
}

fn check_misc(config: &AppConfig, problems: &mut Vec<String>) {
    if !LOG_LEVELS.contains(&config.logging.level.to_lowercase().as_str()) {
        problems.push(format!(
            "logging.level {:?} is not one of {LOG_LEVELS:?}",
            config.logging.level
        ));
    }
    if config.gui.refresh_interval == 0 {
        problems.push("gui.refresh_interval must be at least 1 second".to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppConfig, ProviderKind};

    #[test]
    fn test_default_config_is_valid() {
        assert!(check(&AppConfig::default()).is_empty());
    }

    #[test]
    fn test_weight_sum_violation() {
        let mut config = AppConfig::default();
        config.analysis.weights.technical = 0.9;
        let problems = check(&config);
        assert!(problems.iter().any(|p| p.contains("sum to 1.0")));
    }

    #[test]
    fn test_fmp_without_key_rejected() {
        let mut config = AppConfig::default();
        config.fundamental_data.provider = ProviderKind::Fmp;
        config.fundamental_data.api_key = None;
        let problems = check(&config);
        assert!(problems.iter().any(|p| p.contains("fundamental_data.api_key")));
    }

    #[test]
    fn test_newsapi_without_key_is_only_a_warning() {
        let mut config = AppConfig::default();
        config.news_data.api_key = None;
        assert!(check(&config).is_empty());
    }

    #[test]
    fn test_provider_section_mismatch() {
        let mut config = AppConfig::default();
        config.market_data.provider = ProviderKind::Newsapi;
        let problems = check(&config);
        assert!(problems.iter().any(|p| p.contains("market_data.provider")));
    }

    #[test]
    fn test_inverted_thresholds_rejected() {
        let mut config = AppConfig::default();
        config.recommendations.buy_threshold = 30.0;
        config.recommendations.sell_threshold = 70.0;
        let problems = check(&config);
        assert!(problems.iter().any(|p| p.contains("must exceed")));
    }

    #[test]
    fn test_sma_ordering_enforced() {
        let mut config = AppConfig::default();
        config.analysis.technical.sma_short = 50;
        config.analysis.technical.sma_long = 20;
        let problems = check(&config);
        assert!(problems.iter().any(|p| p.contains("sma_short")));
    }

    #[test]
    fn test_leverage_below_one_rejected() {
        let mut config = AppConfig::default();
        config.risk_management.max_leverage = 0.5;
        let problems = check(&config);
        assert!(problems.iter().any(|p| p.contains("max_leverage")));
    }
}
