//! Portfolio monitoring
//!
//! Tracks portfolio value snapshots against the configured risk limits and
//! raises alerts on daily-loss and drawdown breaches, plus stop-loss and
//! take-profit levels for single positions. The async [`PortfolioMonitor::run`]
//! loop samples an equal-weighted basket of the configured symbols.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, watch};

use crate::api::MarketDataSource;
use autotrader_core::RiskConfig;

/// What a monitoring alert is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    DailyLoss,
    Drawdown,
    StopLoss,
    TakeProfit,
}

/// One raised alert
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub kind: AlertKind,
    pub message: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct MonitorState {
    snapshots: Vec<(DateTime<Utc>, f64)>,
    day_open: Option<(NaiveDate, f64)>,
    daily_alerted: bool,
    peak: f64,
    drawdown_alerted: bool,
    alerts: Vec<Alert>,
}

/// Watches portfolio value against the configured limits
pub struct PortfolioMonitor {
    config: RiskConfig,
    state: RwLock<MonitorState>,
}

impl PortfolioMonitor {
    pub fn new(config: RiskConfig) -> Self {
        Self {
            config,
            state: RwLock::new(MonitorState::default()),
        }
    }

    /// Record a portfolio value snapshot, returning any alerts it triggers
    pub async fn record_value(&self, value: f64) -> Vec<Alert> {
        self.record_value_at(value, Utc::now()).await
    }

    /// Same as [`record_value`](Self::record_value) with an explicit clock
    pub async fn record_value_at(&self, value: f64, now: DateTime<Utc>) -> Vec<Alert> {
        let mut state = self.state.write().await;
        let mut raised = Vec::new();

        state.snapshots.push((now, value));

        // Daily loss against the first value seen today
        let today = now.date_naive();
        match state.day_open {
            Some((day, open)) if day == today => {
                let loss = if open > 0.0 { (open - value) / open } else { 0.0 };
                if loss > self.config.max_daily_loss && !state.daily_alerted {
                    state.daily_alerted = true;
                    raised.push(Alert {
                        kind: AlertKind::DailyLoss,
                        message: format!(
                            "daily loss {:.1}% exceeds the {:.1}% limit",
                            loss * 100.0,
                            self.config.max_daily_loss * 100.0
                        ),
                        at: now,
                    });
                }
            }
            _ => {
                state.day_open = Some((today, value));
                state.daily_alerted = false;
            }
        }

        // Drawdown from the running peak
        state.peak = state.peak.max(value);
        let drawdown = if state.peak > 0.0 {
            (state.peak - value) / state.peak
        } else {
            0.0
        };
        if drawdown > self.config.max_drawdown {
            if !state.drawdown_alerted {
                state.drawdown_alerted = true;
                raised.push(Alert {
                    kind: AlertKind::Drawdown,
                    message: format!(
                        "drawdown {:.1}% exceeds the {:.1}% limit",
                        drawdown * 100.0,
                        self.config.max_drawdown * 100.0
                    ),
                    at: now,
                });
            }
        } else {
            state.drawdown_alerted = false;
        }

        for alert in &raised {
            tracing::warn!(kind = ?alert.kind, "{}", alert.message);
        }
        state.alerts.extend(raised.clone());
        raised
    }

    /// Check one open position against stop-loss and take-profit levels
    pub async fn check_position(&self, symbol: &str, entry: f64, current: f64) -> Option<Alert> {
        if entry <= 0.0 {
            return None;
        }
        let change = (current - entry) / entry;

        let alert = if change <= -self.config.stop_loss {
            Some(Alert {
                kind: AlertKind::StopLoss,
                message: format!(
                    "{symbol} is down {:.1}%, past the {:.1}% stop-loss",
                    -change * 100.0,
                    self.config.stop_loss * 100.0
                ),
                at: Utc::now(),
            })
        } else if change >= self.config.take_profit {
            Some(Alert {
                kind: AlertKind::TakeProfit,
                message: format!(
                    "{symbol} is up {:.1}%, past the {:.1}% take-profit",
                    change * 100.0,
                    self.config.take_profit * 100.0
                ),
                at: Utc::now(),
            })
        } else {
            None
        };

        if let Some(alert) = alert {
            tracing::warn!(kind = ?alert.kind, "{}", alert.message);
            self.state.write().await.alerts.push(alert.clone());
            return Some(alert);
        }
        None
    }

    /// All alerts raised so far
    pub async fn alerts(&self) -> Vec<Alert> {
        self.state.read().await.alerts.clone()
    }

    /// Latest recorded portfolio value
    pub async fn last_value(&self) -> Option<f64> {
        self.state.read().await.snapshots.last().map(|(_, v)| *v)
    }

    /// Sample an equal-weighted basket of `symbols` every `interval` until
    /// `shutdown` flips to true.
    pub async fn run(
        &self,
        market: Arc<dyn MarketDataSource>,
        symbols: &[String],
        interval: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match basket_value(market.as_ref(), symbols).await {
                        Some(value) => {
                            let alerts = self.record_value(value).await;
                            tracing::info!(value, alerts = alerts.len(), "portfolio sampled");
                        }
                        None => tracing::warn!("no quotes available for the basket"),
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        tracing::info!("monitoring stopped");
                        return;
                    }
                }
            }
        }
    }
}

/// Sum of the latest adjusted closes, skipping symbols that fail
async fn basket_value(market: &dyn MarketDataSource, symbols: &[String]) -> Option<f64> {
    let mut total = 0.0;
    let mut quoted = 0;
    for symbol in symbols {
        match market.latest_quote(symbol).await {
            Ok(candle) => {
                total += candle.adjclose;
                quoted += 1;
            }
            Err(e) => tracing::warn!(symbol = %symbol, error = %e, "quote failed"),
        }
    }
    (quoted > 0).then_some(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn monitor() -> PortfolioMonitor {
        PortfolioMonitor::new(RiskConfig::default())
    }

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, day, hour, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_daily_loss_alert_fires_once_per_day() {
        let monitor = monitor();
        assert!(monitor.record_value_at(100_000.0, at(3, 9)).await.is_empty());

        // -3% intraday breaches the 2% limit
        let alerts = monitor.record_value_at(97_000.0, at(3, 12)).await;
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::DailyLoss);

        // still under water the same day: no repeat
        let alerts = monitor.record_value_at(96_500.0, at(3, 14)).await;
        assert!(alerts.iter().all(|a| a.kind != AlertKind::DailyLoss));
    }

    #[tokio::test]
    async fn test_daily_loss_resets_next_day() {
        let monitor = monitor();
        monitor.record_value_at(100_000.0, at(3, 9)).await;
        monitor.record_value_at(97_000.0, at(3, 12)).await;

        // next day opens lower; small move stays quiet
        assert!(monitor.record_value_at(97_000.0, at(4, 9)).await.is_empty());
        let alerts = monitor.record_value_at(94_000.0, at(4, 12)).await;
        assert!(alerts.iter().any(|a| a.kind == AlertKind::DailyLoss));
    }

    #[tokio::test]
    async fn test_drawdown_alert() {
        let monitor = monitor();
        monitor.record_value_at(100_000.0, at(3, 9)).await;
        monitor.record_value_at(105_000.0, at(4, 9)).await;

        // 12.4% off the 105k peak breaches the 10% limit
        let alerts = monitor.record_value_at(92_000.0, at(5, 9)).await;
        assert!(alerts.iter().any(|a| a.kind == AlertKind::Drawdown));

        // recovery re-arms the alert
        monitor.record_value_at(104_000.0, at(6, 9)).await;
        let alerts = monitor.record_value_at(92_000.0, at(7, 9)).await;
        assert!(alerts.iter().any(|a| a.kind == AlertKind::Drawdown));
    }

    #[tokio::test]
    async fn test_position_stop_loss_and_take_profit() {
        let monitor = monitor();

        let stop = monitor.check_position("EQNR.OL", 100.0, 94.0).await.unwrap();
        assert_eq!(stop.kind, AlertKind::StopLoss);

        let profit = monitor.check_position("DNB.OL", 100.0, 111.0).await.unwrap();
        assert_eq!(profit.kind, AlertKind::TakeProfit);

        assert!(monitor.check_position("TEL.OL", 100.0, 102.0).await.is_none());
        assert_eq!(monitor.alerts().await.len(), 2);
    }

    #[tokio::test]
    async fn test_run_samples_basket_and_stops() {
        use crate::api::MockMarketDataSource;
        use crate::api::Candle;

        let mut market = MockMarketDataSource::new();
        market.expect_latest_quote().returning(|symbol| {
            Ok(Candle {
                symbol: symbol.to_string(),
                timestamp: Utc::now(),
                open: 100.0,
                high: 100.0,
                low: 100.0,
                close: 100.0,
                volume: 1,
                adjclose: 100.0,
            })
        });

        let monitor = PortfolioMonitor::new(RiskConfig::default());
        let (tx, rx) = watch::channel(false);
        let symbols = vec!["EQNR.OL".to_string(), "DNB.OL".to_string()];

        let market: Arc<dyn MarketDataSource> = Arc::new(market);
        let run = monitor.run(market, &symbols, Duration::from_millis(10), rx);
        tokio::pin!(run);

        // let the first tick land, then stop
        tokio::select! {
            () = &mut run => panic!("run should not stop on its own"),
            () = tokio::time::sleep(Duration::from_millis(50)) => {}
        }
        tx.send(true).unwrap();
        (&mut run).await;

        assert_eq!(monitor.last_value().await, Some(200.0));
    }
}
