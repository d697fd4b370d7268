//! Technical analysis: RSI, SMA crossover, MACD, and volume signals

use ta::Next;
use ta::indicators::{ExponentialMovingAverage, RelativeStrengthIndex, SimpleMovingAverage};

use crate::analysis::{Signal, round1};
use crate::api::Candle;
use crate::error::{Result, TraderError};
use autotrader_core::TechnicalConfig;
use serde::{Deserialize, Serialize};

/// Window for the average-volume comparison
const VOLUME_WINDOW: usize = 20;

/// Outcome of the technical analysis for one symbol
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TechnicalAssessment {
    /// Composite score, 0-100
    pub score: f64,
    pub signal: Signal,
    pub rsi: f64,
    pub rsi_signal: Signal,
    pub sma_short: f64,
    pub sma_long: f64,
    pub sma_signal: Signal,
    pub macd: f64,
    pub macd_signal_line: f64,
    pub macd_signal: Signal,
    pub volume_ratio: f64,
    pub volume_signal: Signal,
    /// Volatility/trend based risk contribution, 0-100
    pub risk_score: f64,
    /// Number of candles the assessment is based on
    pub data_points: usize,
}

impl TechnicalAssessment {
    /// Neutral assessment used when there is not enough history
    fn neutral(data_points: usize) -> Self {
        Self {
            score: 50.0,
            signal: Signal::Neutral,
            rsi: 50.0,
            rsi_signal: Signal::Neutral,
            sma_short: 0.0,
            sma_long: 0.0,
            sma_signal: Signal::Neutral,
            macd: 0.0,
            macd_signal_line: 0.0,
            macd_signal: Signal::Neutral,
            volume_ratio: 1.0,
            volume_signal: Signal::Neutral,
            risk_score: 50.0,
            data_points,
        }
    }
}

/// Technical analyzer with configurable indicator periods
pub struct TechnicalAnalyzer {
    config: TechnicalConfig,
}

impl TechnicalAnalyzer {
    pub fn new(config: TechnicalConfig) -> Self {
        Self { config }
    }

    /// Analyze a daily candle series, oldest first
    pub fn analyze(&self, candles: &[Candle]) -> TechnicalAssessment {
        match self.compute(candles) {
            Ok(assessment) => assessment,
            Err(e) => {
                tracing::warn!(error = %e, "technical analysis degraded to neutral");
                TechnicalAssessment::neutral(candles.len())
            }
        }
    }

    fn compute(&self, candles: &[Candle]) -> Result<TechnicalAssessment> {
        let needed = self.config.sma_long.max(self.config.macd_slow) + 1;
        if candles.len() < needed {
            return Err(TraderError::Indicator(format!(
                "need at least {needed} candles, got {}",
                candles.len()
            )));
        }

        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let volumes: Vec<f64> = candles.iter().map(|c| c.volume as f64).collect();

        // RSI
        let mut rsi_ind = indicator(RelativeStrengthIndex::new(self.config.rsi_period))?;
        let rsi_series: Vec<f64> = closes.iter().map(|&c| rsi_ind.next(c)).collect();
        let rsi = rsi_series.last().copied().unwrap_or(50.0);
        let rsi_signal = if rsi >= 70.0 {
            Signal::Sell
        } else if rsi <= 30.0 {
            Signal::Buy
        } else {
            Signal::Neutral
        };

        // SMA crossover
        let mut short_ind = indicator(SimpleMovingAverage::new(self.config.sma_short))?;
        let mut long_ind = indicator(SimpleMovingAverage::new(self.config.sma_long))?;
        let short_series: Vec<f64> = closes.iter().map(|&c| short_ind.next(c)).collect();
        let long_series: Vec<f64> = closes.iter().map(|&c| long_ind.next(c)).collect();
        let sma_signal = crossover(&short_series, &long_series);

        // MACD line from the fast/slow EMA difference, signal line on top
        let mut fast_ind = indicator(ExponentialMovingAverage::new(self.config.macd_fast))?;
        let mut slow_ind = indicator(ExponentialMovingAverage::new(self.config.macd_slow))?;
        let macd_series: Vec<f64> = closes
            .iter()
            .map(|&c| fast_ind.next(c) - slow_ind.next(c))
            .collect();
        let mut signal_ind = indicator(ExponentialMovingAverage::new(self.config.macd_signal))?;
        let signal_series: Vec<f64> = macd_series.iter().map(|&m| signal_ind.next(m)).collect();
        let macd_signal = crossover(&macd_series, &signal_series);

        // Volume vs its rolling average
        let mut volume_ind = indicator(SimpleMovingAverage::new(VOLUME_WINDOW))?;
        let volume_avg_series: Vec<f64> = volumes.iter().map(|&v| volume_ind.next(v)).collect();
        let volume_avg = volume_avg_series.last().copied().unwrap_or(0.0);
        let volume_ratio = if volume_avg > 0.0 {
            volumes.last().copied().unwrap_or(0.0) / volume_avg
        } else {
            1.0
        };
        let volume_signal = if volume_ratio > 2.0 {
            Signal::Buy
        } else if volume_ratio < 0.5 {
            Signal::Sell
        } else {
            Signal::Neutral
        };

        let rsi_score = if rsi >= 70.0 {
            20.0 // overbought
        } else if rsi <= 30.0 {
            80.0 // oversold
        } else {
            50.0
        };
        let score = round1(
            rsi_score * 0.3
                + sma_signal.score() * 0.3
                + macd_signal.score() * 0.3
                + volume_signal.score() * 0.1,
        );

        Ok(TechnicalAssessment {
            score,
            signal: Signal::from_score(score),
            rsi: round1(rsi),
            rsi_signal,
            sma_short: short_series.last().copied().unwrap_or(0.0),
            sma_long: long_series.last().copied().unwrap_or(0.0),
            sma_signal,
            macd: macd_series.last().copied().unwrap_or(0.0),
            macd_signal_line: signal_series.last().copied().unwrap_or(0.0),
            macd_signal,
            volume_ratio: round1(volume_ratio),
            volume_signal,
            risk_score: risk_score(&closes),
            data_points: candles.len(),
        })
    }
}

fn indicator<T, E: std::fmt::Display>(built: std::result::Result<T, E>) -> Result<T> {
    built.map_err(|e| TraderError::Indicator(e.to_string()))
}

/// Buy on an upward crossing of `fast` over `slow` in the last step, sell on
/// a downward crossing
fn crossover(fast: &[f64], slow: &[f64]) -> Signal {
    let n = fast.len();
    if n < 2 || slow.len() < 2 {
        return Signal::Neutral;
    }
    let (f_prev, f_now) = (fast[n - 2], fast[n - 1]);
    let (s_prev, s_now) = (slow[n - 2], slow[n - 1]);

    if f_now > s_now && f_prev <= s_prev {
        Signal::Buy
    } else if f_now < s_now && f_prev >= s_prev {
        Signal::Sell
    } else {
        Signal::Neutral
    }
}

/// Risk contribution from annualized volatility and trend strength, 0-100
fn risk_score(closes: &[f64]) -> f64 {
    let returns = daily_returns(closes);
    if returns.is_empty() {
        return 50.0;
    }
    let volatility = std_dev(&returns) * (252.0_f64).sqrt();

    let first = closes.first().copied().unwrap_or(0.0);
    let last = closes.last().copied().unwrap_or(0.0);
    let trend = if first > 0.0 {
        ((last - first) / first).abs()
    } else {
        0.0
    };

    round1((volatility * 100.0 + trend * 50.0).clamp(0.0, 100.0))
}

pub(crate) fn daily_returns(closes: &[f64]) -> Vec<f64> {
    closes
        .windows(2)
        .filter(|w| w[0] > 0.0)
        .map(|w| w[1] / w[0] - 1.0)
        .collect()
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation
pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}
