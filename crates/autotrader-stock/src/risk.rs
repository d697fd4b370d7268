//! Risk assessment and position sizing
//!
//! Per-symbol risk is a weighted blend of volatility, beta, Sharpe ratio,
//! maximum drawdown, Value at Risk, and balance-sheet risk, each normalized
//! onto a 0-100 scale where higher means riskier.

use crate::analysis::round1;
use crate::analysis::technical::{daily_returns, mean, std_dev};
use crate::api::{Candle, FundamentalSnapshot};
use autotrader_core::RiskConfig;
use serde::{Deserialize, Serialize};

const TRADING_DAYS: f64 = 252.0;
const RISK_FREE_RATE: f64 = 0.02;

/// Raw risk metrics before normalization
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RiskMetrics {
    /// Annualized volatility, percent
    pub volatility: f64,
    pub beta: f64,
    pub sharpe_ratio: f64,
    /// Worst drawdown over the series, percent
    pub max_drawdown: f64,
    /// 95% one-day Value at Risk, percent
    pub var_95: f64,
}

/// Position sizing derived from the risk score
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PositionSizing {
    /// Recommended maximum position, as a fraction of the portfolio
    pub max_position_size: f64,
    pub leverage: f64,
}

/// Complete risk assessment for one symbol
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub symbol: String,
    /// 0-100, higher is riskier
    pub risk_score: f64,
    /// 0-100 percent
    pub success_probability: f64,
    /// Expected move, percent
    pub potential_return: f64,
    pub metrics: RiskMetrics,
    pub position: PositionSizing,
}

/// Outcome of checking a proposed trade against the configured limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeCheck {
    pub approved: bool,
    pub reason: Option<String>,
}

/// Risk manager configured with the portfolio limits
pub struct RiskManager {
    config: RiskConfig,
}

impl RiskManager {
    pub fn new(config: RiskConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// Assess one symbol from its price history and fundamentals
    pub fn assess(
        &self,
        symbol: &str,
        candles: &[Candle],
        fundamentals: &FundamentalSnapshot,
    ) -> RiskAssessment {
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let returns = daily_returns(&closes);

        if returns.len() < 2 {
            tracing::warn!(symbol, "too little history for risk metrics, using defaults");
            return self.default_assessment(symbol);
        }

        let volatility = std_dev(&returns) * TRADING_DAYS.sqrt();
        let beta = simplified_beta(&returns);
        let sharpe = sharpe_ratio(&returns);
        let drawdown = max_drawdown(&closes);
        let var = var_95(&returns);

        let risk_score = self.risk_score(volatility, beta, sharpe, drawdown, var, fundamentals);
        let success_probability =
            success_probability(risk_score, &closes, fundamentals).clamp(0.0, 1.0);
        let potential_return =
            potential_return(&closes, fundamentals, risk_score).clamp(0.0, 1.0);

        RiskAssessment {
            symbol: symbol.to_string(),
            risk_score,
            success_probability: round1(success_probability * 100.0),
            potential_return: round1(potential_return * 100.0),
            metrics: RiskMetrics {
                volatility: round2(volatility * 100.0),
                beta: round2(beta),
                sharpe_ratio: round2(sharpe),
                max_drawdown: round2(drawdown * 100.0),
                var_95: round2(var * 100.0),
            },
            position: PositionSizing {
                max_position_size: self.position_size(risk_score),
                leverage: self.config.max_leverage,
            },
        }
    }

    /// Check a proposed trade against the configured limits
    pub fn check_trade(
        &self,
        risk_score: f64,
        position_fraction: f64,
        leverage: f64,
    ) -> TradeCheck {
        if risk_score > 80.0 {
            return TradeCheck {
                approved: false,
                reason: Some(format!("risk score {risk_score:.1} exceeds 80")),
            };
        }
        if position_fraction > self.config.max_position_size {
            return TradeCheck {
                approved: false,
                reason: Some(format!(
                    "position {:.1}% exceeds the {:.1}% limit",
                    position_fraction * 100.0,
                    self.config.max_position_size * 100.0
                )),
            };
        }
        if leverage > self.config.max_leverage {
            return TradeCheck {
                approved: false,
                reason: Some(format!(
                    "leverage {leverage:.1}x exceeds the {:.1}x limit",
                    self.config.max_leverage
                )),
            };
        }
        TradeCheck {
            approved: true,
            reason: None,
        }
    }

    fn risk_score(
        &self,
        volatility: f64,
        beta: f64,
        sharpe: f64,
        drawdown: f64,
        var: f64,
        fundamentals: &FundamentalSnapshot,
    ) -> f64 {
        let blended = normalize_volatility(volatility) * 0.25
            + normalize_beta(beta) * 0.15
            + normalize_sharpe(sharpe) * 0.20
            + normalize_drawdown(drawdown) * 0.15
            + normalize_var(var) * 0.10
            + fundamental_risk(fundamentals) * 0.15;
        round1(blended)
    }

    /// Scale the configured maximum position down as risk grows
    fn position_size(&self, risk_score: f64) -> f64 {
        let risk_factor = 1.0 - risk_score / 100.0;
        (self.config.max_position_size * risk_factor).min(self.config.max_position_size)
    }

    fn default_assessment(&self, symbol: &str) -> RiskAssessment {
        RiskAssessment {
            symbol: symbol.to_string(),
            risk_score: 50.0,
            success_probability: 50.0,
            potential_return: 10.0,
            metrics: RiskMetrics {
                volatility: 30.0,
                beta: 1.0,
                sharpe_ratio: 0.0,
                max_drawdown: 20.0,
                var_95: 2.0,
            },
            position: PositionSizing {
                max_position_size: self.config.max_position_size / 2.0,
                leverage: self.config.max_leverage,
            },
        }
    }
}

/// Beta without an index series: mean return over its dispersion, clamped
/// to the plausible 0.5-2.0 band
fn simplified_beta(returns: &[f64]) -> f64 {
    let deviation = std_dev(returns);
    if deviation == 0.0 {
        return 1.0;
    }
    (mean(returns) / deviation).clamp(0.5, 2.0)
}

fn sharpe_ratio(returns: &[f64]) -> f64 {
    let annual_volatility = std_dev(returns) * TRADING_DAYS.sqrt();
    if annual_volatility == 0.0 {
        return 0.0;
    }
    let annual_return = mean(returns) * TRADING_DAYS;
    (annual_return - RISK_FREE_RATE) / annual_volatility
}

/// Worst peak-to-trough loss as a positive fraction
fn max_drawdown(closes: &[f64]) -> f64 {
    let mut peak = f64::MIN;
    let mut worst = 0.0_f64;
    for &close in closes {
        peak = peak.max(close);
        if peak > 0.0 {
            worst = worst.max((peak - close) / peak);
        }
    }
    worst
}

/// Empirical 95% one-day VaR as a positive fraction
fn var_95(returns: &[f64]) -> f64 {
    let mut sorted = returns.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let index = ((sorted.len() as f64) * 0.05).floor() as usize;
    sorted
        .get(index.min(sorted.len().saturating_sub(1)))
        .copied()
        .unwrap_or(0.0)
        .abs()
}

fn normalize_volatility(volatility: f64) -> f64 {
    if volatility <= 0.15 {
        20.0
    } else if volatility <= 0.25 {
        40.0
    } else if volatility <= 0.35 {
        60.0
    } else if volatility <= 0.45 {
        80.0
    } else {
        100.0
    }
}

/// Beta near 1.0 is the calmest; both extremes raise risk
fn normalize_beta(beta: f64) -> f64 {
    if beta < 0.5 {
        70.0
    } else if beta <= 0.8 {
        40.0
    } else if beta <= 1.2 {
        30.0
    } else if beta <= 1.5 {
        60.0
    } else {
        80.0
    }
}

fn normalize_sharpe(sharpe: f64) -> f64 {
    if sharpe <= 0.0 {
        80.0
    } else if sharpe <= 0.5 {
        60.0
    } else if sharpe <= 1.0 {
        40.0
    } else if sharpe <= 1.5 {
        30.0
    } else {
        20.0
    }
}

fn normalize_drawdown(drawdown: f64) -> f64 {
    if drawdown <= 0.10 {
        20.0
    } else if drawdown <= 0.20 {
        40.0
    } else if drawdown <= 0.30 {
        60.0
    } else if drawdown <= 0.40 {
        80.0
    } else {
        100.0
    }
}

fn normalize_var(var: f64) -> f64 {
    if var <= 0.01 {
        20.0
    } else if var <= 0.02 {
        40.0
    } else if var <= 0.03 {
        60.0
    } else if var <= 0.04 {
        80.0
    } else {
        100.0
    }
}

/// Balance-sheet risk from leverage, liquidity, and profitability
fn fundamental_risk(fundamentals: &FundamentalSnapshot) -> f64 {
    let debt_equity = fundamentals.debt_to_equity.unwrap_or(1.0);
    let current_ratio = fundamentals.current_ratio.unwrap_or(1.5);
    let profit_margin = fundamentals.profit_margin.unwrap_or(0.1);

    let debt_score = if debt_equity > 2.0 {
        100.0
    } else {
        (debt_equity / 2.0) * 100.0
    };
    let liquidity_score = if current_ratio < 1.0 {
        100.0
    } else {
        (1.0 / current_ratio) * 100.0
    };
    let profit_score = if profit_margin < 0.0 {
        100.0
    } else {
        (1.0 - profit_margin) * 100.0
    };

    (debt_score + liquidity_score + profit_score) / 3.0
}

/// Trend strength of the series, -1..1
fn trend_strength(closes: &[f64]) -> f64 {
    let sma = |window: usize| -> Option<f64> {
        if closes.len() < window {
            return None;
        }
        Some(mean(&closes[closes.len() - window..]))
    };
    let (Some(sma_20), Some(sma_50)) = (sma(20), sma(50)) else {
        return 0.0;
    };
    let Some(&current) = closes.last() else {
        return 0.0;
    };
    if sma_50 == 0.0 {
        return 0.0;
    }
    let strength = ((current - sma_50) / sma_50 + (sma_20 - sma_50) / sma_50) / 2.0;
    strength.clamp(-1.0, 1.0)
}

fn fundamental_strength(fundamentals: &FundamentalSnapshot) -> f64 {
    let pe = fundamentals.pe_ratio.unwrap_or(15.0);
    let pb = fundamentals.price_to_book.unwrap_or(2.0);
    let margin = fundamentals.profit_margin.unwrap_or(0.1);
    let roe = fundamentals.return_on_equity.unwrap_or(0.15);

    let pe_score = if pe < 15.0 { 1.0 } else { 20.0 / pe };
    let pb_score = if pb < 2.0 { 1.0 } else { 3.0 / pb };
    let margin_score = (margin * 5.0).min(1.0);
    let roe_score = (roe * 3.0).min(1.0);

    (pe_score + pb_score + margin_score + roe_score) / 4.0
}

fn success_probability(
    risk_score: f64,
    closes: &[f64],
    fundamentals: &FundamentalSnapshot,
) -> f64 {
    let base = (100.0 - risk_score) / 100.0;
    base + trend_strength(closes) * 0.3 + fundamental_strength(fundamentals) * 0.2
}

fn potential_return(closes: &[f64], fundamentals: &FundamentalSnapshot, risk_score: f64) -> f64 {
    let returns = daily_returns(closes);
    let momentum = mean(&returns) * TRADING_DAYS;
    let volatility = std_dev(&returns) * TRADING_DAYS.sqrt();
    let vol_adjusted = if volatility > 0.0 {
        momentum / volatility
    } else {
        0.0
    };

    let technical_potential = (momentum.abs() * 0.4
        + trend_strength(closes).abs() * 0.4
        + vol_adjusted.abs() * 0.2)
        .clamp(0.0, 1.0);

    let pe = fundamentals.pe_ratio.unwrap_or(15.0);
    let pb = fundamentals.price_to_book.unwrap_or(2.0);
    let margin = fundamentals.profit_margin.unwrap_or(0.1);
    let roe = fundamentals.return_on_equity.unwrap_or(0.15);
    let pe_potential = if pe < 12.0 { 1.0 } else { 15.0 / pe };
    let pb_potential = if pb < 1.5 { 1.0 } else { 2.0 / pb };
    let margin_potential = (margin * 4.0).min(1.0);
    let roe_potential = (roe * 2.5).min(1.0);
    let fundamental_potential =
        (pe_potential + pb_potential + margin_potential + roe_potential) / 4.0;

    // high risk shrinks the expectation, mildly
    let risk_adjustment = 1.0 - risk_score / 200.0;

    (technical_potential * 0.5 + fundamental_potential * 0.5) * risk_adjustment
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn candles(closes: &[f64]) -> Vec<Candle> {
        let start = Utc::now() - Duration::days(closes.len() as i64);
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Candle {
                symbol: "TEST.OL".to_string(),
                timestamp: start + Duration::days(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1_000_000,
                adjclose: close,
            })
            .collect()
    }

    fn manager() -> RiskManager {
        RiskManager::new(RiskConfig::default())
    }

    #[test]
    fn test_max_drawdown() {
        // peak 120, trough 84: drawdown 30%
        let closes = [100.0, 120.0, 96.0, 84.0, 90.0];
        assert!((max_drawdown(&closes) - 0.3).abs() < 1e-9);
        assert!((max_drawdown(&[1.0, 2.0, 3.0])).abs() < 1e-9);
    }

    #[test]
    fn test_var_95_picks_left_tail() {
        // 6 of 100 observations at -5% or worse puts the 5th percentile there
        let mut returns = vec![0.001_f64; 100];
        for slot in returns.iter_mut().take(6) {
            *slot = -0.05;
        }
        returns[0] = -0.08;
        let var = var_95(&returns);
        assert!((var - 0.05).abs() < 1e-9, "var {var}");
    }

    #[test]
    fn test_simplified_beta_clamped() {
        assert!((simplified_beta(&[0.5, 0.5, 0.5]) - 1.0).abs() < f64::EPSILON);
        let strongly_up = [0.05, 0.049, 0.051, 0.05];
        assert!((simplified_beta(&strongly_up) - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_quiet_stock_scores_low_risk() {
        // gentle steady climb, low volatility
        let closes: Vec<f64> = (0..120).map(|i| 100.0 + i as f64 * 0.05).collect();
        let fundamentals = FundamentalSnapshot {
            symbol: "TEST.OL".to_string(),
            debt_to_equity: Some(0.3),
            current_ratio: Some(2.0),
            profit_margin: Some(0.2),
            ..FundamentalSnapshot::default()
        };
        let assessment = manager().assess("TEST.OL", &candles(&closes), &fundamentals);
        assert!(assessment.risk_score < 50.0, "risk {}", assessment.risk_score);
        assert!(assessment.metrics.volatility < 15.0);
    }

    #[test]
    fn test_volatile_stock_scores_high_risk() {
        let closes: Vec<f64> = (0..120)
            .map(|i| if i % 2 == 0 { 100.0 } else { 109.0 })
            .collect();
        let assessment = manager().assess(
            "TEST.OL",
            &candles(&closes),
            &FundamentalSnapshot::empty("TEST.OL"),
        );
        assert!(assessment.risk_score > 60.0, "risk {}", assessment.risk_score);
        assert!(assessment.metrics.volatility > 50.0);
    }

    #[test]
    fn test_position_shrinks_with_risk() {
        let config = RiskConfig::default();
        let manager = RiskManager::new(config);
        let calm = manager.position_size(20.0);
        let risky = manager.position_size(80.0);
        assert!(calm > risky);
        assert!(calm <= config.max_position_size);
        assert!((risky - config.max_position_size * 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_too_little_history_uses_defaults() {
        let assessment = manager().assess(
            "TEST.OL",
            &candles(&[100.0]),
            &FundamentalSnapshot::empty("TEST.OL"),
        );
        assert!((assessment.risk_score - 50.0).abs() < f64::EPSILON);
        assert!((assessment.metrics.beta - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_check_trade_limits() {
        let manager = manager();
        assert!(manager.check_trade(50.0, 0.05, 1.0).approved);

        let too_risky = manager.check_trade(90.0, 0.05, 1.0);
        assert!(!too_risky.approved);
        assert!(too_risky.reason.unwrap().contains("risk score"));

        let too_big = manager.check_trade(50.0, 0.5, 1.0);
        assert!(!too_big.approved);

        let too_leveraged = manager.check_trade(50.0, 0.05, 3.0);
        assert!(!too_leveraged.approved);
    }

    #[test]
    fn test_fundamental_risk_reacts_to_leverage() {
        let mut weak = FundamentalSnapshot::empty("TEST.OL");
        weak.debt_to_equity = Some(3.0);
        weak.current_ratio = Some(0.8);
        weak.profit_margin = Some(-0.1);
        let mut solid = FundamentalSnapshot::empty("TEST.OL");
        solid.debt_to_equity = Some(0.2);
        solid.current_ratio = Some(2.5);
        solid.profit_margin = Some(0.25);
        assert!(fundamental_risk(&weak) > fundamental_risk(&solid));
        assert!((fundamental_risk(&weak) - 100.0).abs() < f64::EPSILON);
    }
}
