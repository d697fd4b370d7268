//! Fundamental analysis: banded scoring of company key figures

use crate::analysis::{Signal, round1};
use crate::api::FundamentalSnapshot;
use autotrader_core::{FundamentalConfig, FundamentalMetric, Language};
use serde::{Deserialize, Serialize};

/// Assessment of one key figure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricScore {
    pub metric: FundamentalMetric,
    pub value: f64,
    pub score: f64,
    pub interpretation: String,
}

/// Outcome of the fundamental analysis for one symbol
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundamentalAssessment {
    /// Mean of the scored metrics, 0-100; 50 when nothing could be scored
    pub score: f64,
    pub signal: Signal,
    pub metrics: Vec<MetricScore>,
}

impl FundamentalAssessment {
    fn neutral() -> Self {
        Self {
            score: 50.0,
            signal: Signal::Neutral,
            metrics: Vec::new(),
        }
    }
}

/// Fundamental analyzer; scores only the metrics selected in configuration
pub struct FundamentalAnalyzer {
    config: FundamentalConfig,
    language: Language,
}

impl FundamentalAnalyzer {
    pub fn new(config: FundamentalConfig, language: Language) -> Self {
        Self { config, language }
    }

    pub fn analyze(&self, snapshot: &FundamentalSnapshot) -> FundamentalAssessment {
        let mut metrics = Vec::new();

        for metric in &self.config.metrics {
            let value = match metric {
                FundamentalMetric::PeRatio => snapshot.pe_ratio,
                FundamentalMetric::Eps => snapshot.eps,
                FundamentalMetric::RevenueGrowth => snapshot.revenue_growth,
                FundamentalMetric::ProfitMargin => snapshot.profit_margin,
            };
            let Some(value) = value else {
                continue;
            };

            let score = match metric {
                FundamentalMetric::PeRatio => pe_score(value),
                FundamentalMetric::Eps => eps_score(value),
                FundamentalMetric::RevenueGrowth => revenue_growth_score(value),
                FundamentalMetric::ProfitMargin => profit_margin_score(value),
            };

            metrics.push(MetricScore {
                metric: *metric,
                value,
                score,
                interpretation: self.interpret(*metric, value),
            });
        }

        if metrics.is_empty() {
            tracing::warn!(
                symbol = %snapshot.symbol,
                "no fundamental metrics available, scoring neutral"
            );
            return FundamentalAssessment::neutral();
        }

        let score = round1(metrics.iter().map(|m| m.score).sum::<f64>() / metrics.len() as f64);
        let signal = if score > 60.0 {
            Signal::Buy
        } else if score < 40.0 {
            Signal::Sell
        } else {
            Signal::Neutral
        };

        FundamentalAssessment {
            score,
            signal,
            metrics,
        }
    }

    fn interpret(&self, metric: FundamentalMetric, value: f64) -> String {
        match self.language {
            Language::Norwegian => interpret_no(metric, value),
            Language::English => interpret_en(metric, value),
        }
    }
}

/// Lower is generally better, but a very low ratio is itself a warning sign
fn pe_score(pe: f64) -> f64 {
    if pe < 5.0 {
        30.0
    } else if pe <= 15.0 {
        80.0
    } else if pe <= 25.0 {
        60.0
    } else if pe <= 35.0 {
        40.0
    } else {
        20.0
    }
}

fn eps_score(eps: f64) -> f64 {
    if eps <= 0.0 {
        20.0
    } else if eps <= 2.0 {
        40.0
    } else if eps <= 5.0 {
        60.0
    } else {
        80.0
    }
}

fn revenue_growth_score(growth: f64) -> f64 {
    if growth < 0.0 {
        (50.0 + growth * 100.0).max(20.0)
    } else if growth < 0.05 {
        50.0
    } else if growth < 0.1 {
        60.0
    } else if growth < 0.2 {
        75.0
    } else {
        90.0
    }
}

fn profit_margin_score(margin: f64) -> f64 {
    if margin < 0.0 {
        20.0
    } else if margin < 0.05 {
        40.0
    } else if margin < 0.1 {
        60.0
    } else if margin < 0.2 {
        80.0
    } else {
        90.0
    }
}

fn interpret_no(metric: FundamentalMetric, value: f64) -> String {
    match metric {
        FundamentalMetric::PeRatio => {
            if value < 5.0 {
                "Svært lavt P/E-forhold kan indikere undervurdering eller problemer".to_string()
            } else if value <= 15.0 {
                "Attraktivt P/E-forhold, potensielt undervurdert".to_string()
            } else if value <= 25.0 {
                "Moderat P/E-forhold, rimelig verdsatt".to_string()
            } else if value <= 35.0 {
                "Høyt P/E-forhold, potensielt overvurdert".to_string()
            } else {
                "Svært høyt P/E-forhold, betydelig overvurdert eller høye vekstforventninger"
                    .to_string()
            }
        }
        FundamentalMetric::Eps => {
            if value <= 0.0 {
                "Negativ inntjening per aksje, selskapet er ikke lønnsomt".to_string()
            } else if value <= 2.0 {
                "Lav inntjening per aksje".to_string()
            } else if value <= 5.0 {
                "God inntjening per aksje".to_string()
            } else {
                "Sterk inntjening per aksje".to_string()
            }
        }
        FundamentalMetric::RevenueGrowth => {
            let pct = value * 100.0;
            if value < 0.0 {
                format!("Negativ inntektsvekst ({pct:.1}%), bekymringsfullt")
            } else if value < 0.05 {
                format!("Flat inntektsvekst ({pct:.1}%)")
            } else if value < 0.1 {
                format!("Moderat inntektsvekst ({pct:.1}%)")
            } else if value < 0.2 {
                format!("Sterk inntektsvekst ({pct:.1}%)")
            } else {
                format!("Eksepsjonell inntektsvekst ({pct:.1}%)")
            }
        }
        FundamentalMetric::ProfitMargin => {
            let pct = value * 100.0;
            if value < 0.0 {
                "Negativ profittmargin, selskapet er ikke lønnsomt".to_string()
            } else if value < 0.05 {
                format!("Lav profittmargin ({pct:.1}%)")
            } else if value < 0.1 {
                format!("Moderat profittmargin ({pct:.1}%)")
            } else if value < 0.2 {
                format!("God profittmargin ({pct:.1}%)")
            } else {
                format!("Utmerket profittmargin ({pct:.1}%)")
            }
        }
    }
}

fn interpret_en(metric: FundamentalMetric, value: f64) -> String {
    match metric {
        FundamentalMetric::PeRatio => {
            if value < 5.0 {
                "Very low P/E ratio may indicate undervaluation or trouble".to_string()
            } else if value <= 15.0 {
                "Attractive P/E ratio, potentially undervalued".to_string()
            } else if value <= 25.0 {
                "Moderate P/E ratio, reasonably valued".to_string()
            } else if value <= 35.0 {
                "High P/E ratio, potentially overvalued".to_string()
            } else {
                "Very high P/E ratio, significantly overvalued or priced for growth".to_string()
            }
        }
        FundamentalMetric::Eps => {
            if value <= 0.0 {
                "Negative earnings per share, the company is not profitable".to_string()
            } else if value <= 2.0 {
                "Low earnings per share".to_string()
            } else if value <= 5.0 {
                "Good earnings per share".to_string()
            } else {
                "Strong earnings per share".to_string()
            }
        }
        FundamentalMetric::RevenueGrowth => {
            let pct = value * 100.0;
            if value < 0.0 {
                format!("Negative revenue growth ({pct:.1}%), concerning")
            } else if value < 0.05 {
                format!("Flat revenue growth ({pct:.1}%)")
            } else if value < 0.1 {
                format!("Moderate revenue growth ({pct:.1}%)")
            } else if value < 0.2 {
                format!("Strong revenue growth ({pct:.1}%)")
            } else {
                format!("Exceptional revenue growth ({pct:.1}%)")
            }
        }
        FundamentalMetric::ProfitMargin => {
            let pct = value * 100.0;
            if value < 0.0 {
                "Negative profit margin, the company is not profitable".to_string()
            } else if value < 0.05 {
                format!("Low profit margin ({pct:.1}%)")
            } else if value < 0.1 {
                format!("Moderate profit margin ({pct:.1}%)")
            } else if value < 0.2 {
                format!("Good profit margin ({pct:.1}%)")
            } else {
                format!("Excellent profit margin ({pct:.1}%)")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(pe: f64, eps: f64, growth: f64) -> FundamentalSnapshot {
        FundamentalSnapshot {
            symbol: "TEST.OL".to_string(),
            pe_ratio: Some(pe),
            eps: Some(eps),
            revenue_growth: Some(growth),
            ..FundamentalSnapshot::default()
        }
    }

    fn analyzer() -> FundamentalAnalyzer {
        FundamentalAnalyzer::new(FundamentalConfig::default(), Language::English)
    }

    #[test]
    fn test_strong_company_scores_buy() {
        // cheap, earning well, growing fast
        let assessment = analyzer().analyze(&snapshot(10.0, 12.0, 0.25));
        assert!((assessment.score - (80.0 + 80.0 + 90.0) / 3.0).abs() < 0.11);
        assert_eq!(assessment.signal, Signal::Buy);
        assert_eq!(assessment.metrics.len(), 3);
    }

    #[test]
    fn test_weak_company_scores_sell() {
        let assessment = analyzer().analyze(&snapshot(60.0, -1.0, -0.3));
        assert_eq!(assessment.signal, Signal::Sell);
        assert!(assessment.score < 40.0);
    }

    #[test]
    fn test_missing_data_is_neutral() {
        let assessment = analyzer().analyze(&FundamentalSnapshot::empty("TEST.OL"));
        assert!((assessment.score - 50.0).abs() < f64::EPSILON);
        assert_eq!(assessment.signal, Signal::Neutral);
        assert!(assessment.metrics.is_empty());
    }

    #[test]
    fn test_suspiciously_low_pe_is_penalized() {
        assert!((pe_score(3.0) - 30.0).abs() < f64::EPSILON);
        assert!(pe_score(3.0) < pe_score(10.0));
    }

    #[test]
    fn test_negative_growth_floor() {
        assert!((revenue_growth_score(-0.8) - 20.0).abs() < f64::EPSILON);
        assert!((revenue_growth_score(-0.1) - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_only_configured_metrics_are_scored() {
        let config = FundamentalConfig {
            metrics: vec![FundamentalMetric::PeRatio],
        };
        let analyzer = FundamentalAnalyzer::new(config, Language::English);
        let assessment = analyzer.analyze(&snapshot(10.0, 12.0, 0.25));
        assert_eq!(assessment.metrics.len(), 1);
        assert_eq!(assessment.metrics[0].metric, FundamentalMetric::PeRatio);
    }

    #[test]
    fn test_norwegian_interpretation() {
        let analyzer = FundamentalAnalyzer::new(FundamentalConfig::default(), Language::Norwegian);
        let assessment = analyzer.analyze(&snapshot(10.0, 12.0, 0.25));
        assert!(assessment.metrics[0].interpretation.contains("P/E-forhold"));
    }
}
