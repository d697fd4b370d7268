//! Analyzers for the four analysis dimensions
//!
//! All analyzers score on a 0-100 scale where 50 is neutral, and degrade to
//! a neutral assessment (with a warning) rather than failing when their
//! input is too thin. The engine combines the per-dimension scores with the
//! configured weights.

pub mod fundamental;
pub mod news;
pub mod sentiment;
pub mod technical;

pub use fundamental::{FundamentalAnalyzer, FundamentalAssessment, MetricScore};
pub use news::{NewsAnalyzer, NewsAssessment, RankedArticle};
pub use sentiment::{SentimentAnalyzer, SentimentAssessment};
pub use technical::{TechnicalAnalyzer, TechnicalAssessment};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction a single indicator or analysis dimension points in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    Buy,
    Sell,
    Neutral,
}

impl Signal {
    /// Contribution of this signal to a 0-100 composite score
    pub fn score(self) -> f64 {
        match self {
            Self::Buy => 80.0,
            Self::Sell => 20.0,
            Self::Neutral => 50.0,
        }
    }

    /// Map a 0-100 score back to a signal using the conventional 70/30 bands
    pub fn from_score(score: f64) -> Self {
        if score >= 70.0 {
            Self::Buy
        } else if score <= 30.0 {
            Self::Sell
        } else {
            Self::Neutral
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
            Self::Neutral => "neutral",
        };
        f.write_str(label)
    }
}

/// Sentiment category of one piece of text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Positive,
    Negative,
    Neutral,
}

impl Polarity {
    /// Classify a -1..1 polarity value with a small neutral dead band
    pub fn classify(polarity: f64) -> Self {
        if polarity > 0.05 {
            Self::Positive
        } else if polarity < -0.05 {
            Self::Negative
        } else {
            Self::Neutral
        }
    }
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::Neutral => "neutral",
        };
        f.write_str(label)
    }
}

/// Results of all four analyzers for one symbol
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisBundle {
    pub technical: TechnicalAssessment,
    pub fundamental: FundamentalAssessment,
    pub sentiment: SentimentAssessment,
    pub news: NewsAssessment,
}

/// Round to one decimal, the precision all scores are reported with
pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_score_roundtrip() {
        assert_eq!(Signal::from_score(Signal::Buy.score()), Signal::Buy);
        assert_eq!(Signal::from_score(Signal::Sell.score()), Signal::Sell);
        assert_eq!(Signal::from_score(Signal::Neutral.score()), Signal::Neutral);
    }

    #[test]
    fn test_polarity_dead_band() {
        assert_eq!(Polarity::classify(0.0), Polarity::Neutral);
        assert_eq!(Polarity::classify(0.04), Polarity::Neutral);
        assert_eq!(Polarity::classify(0.5), Polarity::Positive);
        assert_eq!(Polarity::classify(-0.5), Polarity::Negative);
    }

    #[test]
    fn test_round1() {
        assert!((round1(49.96) - 50.0).abs() < f64::EPSILON);
        assert!((round1(33.333) - 33.3).abs() < f64::EPSILON);
    }
}
