//! Trade recommendations
//!
//! Combines the analyzer scores with the configured weights, applies the
//! buy/sell thresholds and the risk cap, and renders a human-readable
//! explanation in the configured report language.

use crate::analysis::{AnalysisBundle, round1};
use crate::risk::RiskAssessment;
use autotrader_core::{AnalysisWeights, Language, RecommendationConfig};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Final call for one symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Buy,
    Sell,
    Hold,
}

impl Action {
    /// Localized, upper-case label for reports
    pub fn label(self, language: Language) -> &'static str {
        match (self, language) {
            (Self::Buy, Language::Norwegian) => "KJØP",
            (Self::Sell, Language::Norwegian) => "SELG",
            (Self::Hold, Language::Norwegian) => "HOLD",
            (Self::Buy, Language::English) => "BUY",
            (Self::Sell, Language::English) => "SELL",
            (Self::Hold, Language::English) => "HOLD",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
            Self::Hold => "hold",
        };
        f.write_str(label)
    }
}

/// A complete recommendation for one symbol
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub symbol: String,
    pub action: Action,
    /// Weighted blend of the analyzer scores, 0-100
    pub overall_score: f64,
    pub risk_score: f64,
    /// Percent
    pub success_probability: f64,
    /// Percent
    pub potential_return: f64,
    pub explanation: String,
    pub generated_at: DateTime<Utc>,
}

/// Recommendation engine configured with weights, thresholds, and language
pub struct RecommendationEngine {
    weights: AnalysisWeights,
    thresholds: RecommendationConfig,
    language: Language,
}

impl RecommendationEngine {
    pub fn new(
        weights: AnalysisWeights,
        thresholds: RecommendationConfig,
        language: Language,
    ) -> Self {
        Self {
            weights,
            thresholds,
            language,
        }
    }

    /// Build the recommendation for one analyzed symbol
    pub fn evaluate(
        &self,
        symbol: &str,
        bundle: &AnalysisBundle,
        risk: &RiskAssessment,
    ) -> Recommendation {
        let overall_score = self.overall_score(bundle);

        let action = if overall_score >= self.thresholds.buy_threshold
            && risk.risk_score <= self.thresholds.max_risk
        {
            Action::Buy
        } else if overall_score <= self.thresholds.sell_threshold
            || risk.risk_score > self.thresholds.max_risk
        {
            Action::Sell
        } else {
            Action::Hold
        };

        let explanation = self.explain(symbol, bundle, risk, overall_score, action);

        Recommendation {
            symbol: symbol.to_string(),
            action,
            overall_score,
            risk_score: risk.risk_score,
            success_probability: risk.success_probability,
            potential_return: risk.potential_return,
            explanation,
            generated_at: Utc::now(),
        }
    }

    fn overall_score(&self, bundle: &AnalysisBundle) -> f64 {
        let parts = [
            (bundle.technical.score, self.weights.technical),
            (bundle.fundamental.score, self.weights.fundamental),
            (bundle.news.score, self.weights.news),
            (bundle.sentiment.score, self.weights.sentiment),
        ];
        let total_weight: f64 = parts.iter().map(|(_, w)| w).sum();
        if total_weight == 0.0 {
            return 50.0;
        }
        let weighted: f64 = parts.iter().map(|(score, weight)| score * weight).sum();
        round1(weighted / total_weight)
    }

    fn explain(
        &self,
        symbol: &str,
        bundle: &AnalysisBundle,
        risk: &RiskAssessment,
        overall_score: f64,
        action: Action,
    ) -> String {
        match self.language {
            Language::Norwegian => explain_no(symbol, bundle, risk, overall_score, action),
            Language::English => explain_en(symbol, bundle, risk, overall_score, action),
        }
    }
}

/// Stable report ordering: buys by descending score, then sells by ascending
/// score, then holds
pub fn sort_recommendations(recommendations: &mut [Recommendation]) {
    recommendations.sort_by(|a, b| {
        rank(a.action)
            .cmp(&rank(b.action))
            .then_with(|| match a.action {
                Action::Buy => b
                    .overall_score
                    .partial_cmp(&a.overall_score)
                    .unwrap_or(std::cmp::Ordering::Equal),
                _ => a
                    .overall_score
                    .partial_cmp(&b.overall_score)
                    .unwrap_or(std::cmp::Ordering::Equal),
            })
    });
}

fn rank(action: Action) -> u8 {
    match action {
        Action::Buy => 0,
        Action::Sell => 1,
        Action::Hold => 2,
    }
}

fn explain_no(
    symbol: &str,
    bundle: &AnalysisBundle,
    risk: &RiskAssessment,
    overall_score: f64,
    action: Action,
) -> String {
    let mut text = format!("**{}**: {symbol}\n\n", action.label(Language::Norwegian));

    match action {
        Action::Buy => {
            text += &format!(
                "Analysen indikerer en kjøpsmulighet for {symbol} med en samlet score på \
                 {overall_score:.1}/100. Den estimerte sannsynligheten for suksess er \
                 {:.1}% med en potensiell avkastning på {:.1}%. Risikoscoren er {:.1}/100 \
                 (høyere tall indikerer høyere risiko).\n\n",
                risk.success_probability, risk.potential_return, risk.risk_score
            );
        }
        Action::Sell => {
            text += &format!(
                "Analysen indikerer at {symbol} bør selges med en samlet score på \
                 {overall_score:.1}/100. Den estimerte sannsynligheten for suksess er \
                 {:.1}% med en potensiell gevinst på {:.1}% ved å unngå tap. Risikoscoren \
                 er {:.1}/100 (høyere tall indikerer høyere risiko).\n\n",
                risk.success_probability, risk.potential_return, risk.risk_score
            );
        }
        Action::Hold => {
            text += &format!(
                "Analysen indikerer at {symbol} bør holdes med en nøytral score på \
                 {overall_score:.1}/100. Det er ikke tilstrekkelig signal for hverken \
                 kjøp eller salg på nåværende tidspunkt.\n\n"
            );
        }
    }

    let technical = &bundle.technical;
    text += "**Teknisk analyse**:\n";
    text += &format!("- Teknisk signal: {}\n", technical.signal);
    text += &format!("- RSI: {:.1} ({})\n", technical.rsi, technical.rsi_signal);
    text += &format!(
        "- SMA: Kort {:.2} vs Lang {:.2} ({})\n",
        technical.sma_short, technical.sma_long, technical.sma_signal
    );
    text += &format!("- MACD: {}\n", technical.macd_signal);
    text += &format!(
        "- Volum: {:.2}x gjennomsnitt ({})\n\n",
        technical.volume_ratio, technical.volume_signal
    );

    if !bundle.fundamental.metrics.is_empty() {
        text += "**Fundamental analyse**:\n";
        for metric in &bundle.fundamental.metrics {
            text += &format!("- {:.2}: {}\n", metric.value, metric.interpretation);
        }
        text += "\n";
    }

    if !bundle.news.articles.is_empty() {
        text += "**Nyhetsanalyse**:\n";
        for article in bundle.news.articles.iter().take(3) {
            text += &format!(
                "- {}: {} ({})\n",
                article.published_at.format("%Y-%m-%d"),
                article.title,
                article.polarity
            );
        }
        text += "\n";
    }

    let sentiment = &bundle.sentiment;
    text += "**Sentimentanalyse**:\n";
    let tone = if sentiment.score >= 70.0 {
        "Positivt"
    } else if sentiment.score <= 30.0 {
        "Negativt"
    } else {
        "Nøytralt"
    };
    text += &format!("- Markedssentiment: {tone} ({:.1}/100)\n\n", sentiment.score);

    text += "**Konklusjon**:\n";
    match action {
        Action::Buy => {
            text += &format!(
                "Basert på kombinasjonen av teknisk analyse, fundamentale data, nyheter \
                 og sentiment, anbefales det å kjøpe {symbol} ved markedsåpning. Husk at \
                 all handel innebærer risiko, og denne anbefalingen er basert på \
                 historiske data og nåværende markedsforhold."
            );
        }
        Action::Sell => {
            text += &format!(
                "Basert på kombinasjonen av teknisk analyse, fundamentale data, nyheter \
                 og sentiment, anbefales det å selge {symbol} ved markedsåpning. Husk at \
                 all handel innebærer risiko, og denne anbefalingen er basert på \
                 historiske data og nåværende markedsforhold."
            );
        }
        Action::Hold => {
            text += &format!(
                "Basert på kombinasjonen av teknisk analyse, fundamentale data, nyheter \
                 og sentiment, anbefales det å holde {symbol} og overvåke utviklingen. \
                 Det er ikke tilstrekkelig signal for hverken kjøp eller salg på \
                 nåværende tidspunkt."
            );
        }
    }

    text
}

fn explain_en(
    symbol: &str,
    bundle: &AnalysisBundle,
    risk: &RiskAssessment,
    overall_score: f64,
    action: Action,
) -> String {
    let mut text = format!("**{}**: {symbol}\n\n", action.label(Language::English));

    match action {
        Action::Buy => {
            text += &format!(
                "The analysis indicates a buying opportunity for {symbol} with an overall \
                 score of {overall_score:.1}/100. Estimated probability of success is \
                 {:.1}% with a potential return of {:.1}%. The risk score is {:.1}/100 \
                 (higher means riskier).\n\n",
                risk.success_probability, risk.potential_return, risk.risk_score
            );
        }
        Action::Sell => {
            text += &format!(
                "The analysis indicates {symbol} should be sold, with an overall score of \
                 {overall_score:.1}/100. Estimated probability of success is {:.1}% with \
                 a potential gain of {:.1}% from avoided losses. The risk score is \
                 {:.1}/100 (higher means riskier).\n\n",
                risk.success_probability, risk.potential_return, risk.risk_score
            );
        }
        Action::Hold => {
            text += &format!(
                "The analysis indicates {symbol} should be held, with a neutral score of \
                 {overall_score:.1}/100. There is no sufficient signal for either buying \
                 or selling at this time.\n\n"
            );
        }
    }

    let technical = &bundle.technical;
    text += "**Technical analysis**:\n";
    text += &format!("- Technical signal: {}\n", technical.signal);
    text += &format!("- RSI: {:.1} ({})\n", technical.rsi, technical.rsi_signal);
    text += &format!(
        "- SMA: short {:.2} vs long {:.2} ({})\n",
        technical.sma_short, technical.sma_long, technical.sma_signal
    );
    text += &format!("- MACD: {}\n", technical.macd_signal);
    text += &format!(
        "- Volume: {:.2}x average ({})\n\n",
        technical.volume_ratio, technical.volume_signal
    );

    if !bundle.fundamental.metrics.is_empty() {
        text += "**Fundamental analysis**:\n";
        for metric in &bundle.fundamental.metrics {
            text += &format!("- {:.2}: {}\n", metric.value, metric.interpretation);
        }
        text += "\n";
    }

    if !bundle.news.articles.is_empty() {
        text += "**News analysis**:\n";
        for article in bundle.news.articles.iter().take(3) {
            text += &format!(
                "- {}: {} ({})\n",
                article.published_at.format("%Y-%m-%d"),
                article.title,
                article.polarity
            );
        }
        text += "\n";
    }

    let sentiment = &bundle.sentiment;
    text += "**Sentiment analysis**:\n";
    let tone = if sentiment.score >= 70.0 {
        "Positive"
    } else if sentiment.score <= 30.0 {
        "Negative"
    } else {
        "Neutral"
    };
    text += &format!("- Market sentiment: {tone} ({:.1}/100)\n\n", sentiment.score);

    text += "**Conclusion**:\n";
    match action {
        Action::Buy => {
            text += &format!(
                "Based on the combination of technical analysis, fundamentals, news, and \
                 sentiment, buying {symbol} at the market open is recommended. All \
                 trading carries risk; this recommendation rests on historical data and \
                 current market conditions."
            );
        }
        Action::Sell => {
            text += &format!(
                "Based on the combination of technical analysis, fundamentals, news, and \
                 sentiment, selling {symbol} at the market open is recommended. All \
                 trading carries risk; this recommendation rests on historical data and \
                 current market conditions."
            );
        }
        Action::Hold => {
            text += &format!(
                "Based on the combination of technical analysis, fundamentals, news, and \
                 sentiment, holding {symbol} and monitoring further development is \
                 recommended."
            );
        }
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{
        FundamentalAssessment, NewsAssessment, SentimentAssessment, Signal, TechnicalAssessment,
    };
    use crate::api::{Candle, FundamentalSnapshot};
    use crate::risk::RiskManager;
    use autotrader_core::RiskConfig;
    use chrono::Duration;

    fn bundle(technical: f64, fundamental: f64, news: f64, sentiment: f64) -> AnalysisBundle {
        let base = TechnicalAssessment {
            score: technical,
            signal: Signal::from_score(technical),
            rsi: 50.0,
            rsi_signal: Signal::Neutral,
            sma_short: 100.0,
            sma_long: 100.0,
            sma_signal: Signal::Neutral,
            macd: 0.0,
            macd_signal_line: 0.0,
            macd_signal: Signal::Neutral,
            volume_ratio: 1.0,
            volume_signal: Signal::Neutral,
            risk_score: 50.0,
            data_points: 100,
        };
        AnalysisBundle {
            technical: base,
            fundamental: FundamentalAssessment {
                score: fundamental,
                signal: Signal::from_score(fundamental),
                metrics: Vec::new(),
            },
            sentiment: SentimentAssessment {
                score: sentiment,
                signal: Signal::from_score(sentiment),
                recent_sentiment: 0.0,
                older_sentiment: 0.0,
                total_articles: 0,
                recent_articles: 0,
                older_articles: 0,
            },
            news: NewsAssessment {
                score: news,
                signal: Signal::from_score(news),
                articles: Vec::new(),
            },
        }
    }

    fn risk_assessment(risk_score: f64) -> RiskAssessment {
        let closes: Vec<f64> = (0..120).map(|i| 100.0 + i as f64 * 0.05).collect();
        let start = Utc::now() - Duration::days(closes.len() as i64);
        let candles: Vec<Candle> = closes
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
            .collect();
        let mut assessment = RiskManager::new(RiskConfig::default()).assess(
            "TEST.OL",
            &candles,
            &FundamentalSnapshot::empty("TEST.OL"),
        );
        assessment.risk_score = risk_score;
        assessment
    }

    fn engine() -> RecommendationEngine {
        RecommendationEngine::new(
            AnalysisWeights::default(),
            RecommendationConfig::default(),
            Language::English,
        )
    }

    #[test]
    fn test_strong_scores_with_low_risk_is_buy() {
        let rec = engine().evaluate("TEST.OL", &bundle(80.0, 80.0, 80.0, 80.0), &risk_assessment(30.0));
        assert_eq!(rec.action, Action::Buy);
        assert!((rec.overall_score - 80.0).abs() < f64::EPSILON);
        assert!(rec.explanation.contains("BUY"));
    }

    #[test]
    fn test_high_risk_blocks_buy() {
        let rec = engine().evaluate("TEST.OL", &bundle(80.0, 80.0, 80.0, 80.0), &risk_assessment(90.0));
        assert_eq!(rec.action, Action::Sell);
    }

    #[test]
    fn test_weak_scores_are_sell() {
        let rec = engine().evaluate("TEST.OL", &bundle(20.0, 25.0, 30.0, 20.0), &risk_assessment(40.0));
        assert_eq!(rec.action, Action::Sell);
    }

    #[test]
    fn test_middle_scores_hold() {
        let rec = engine().evaluate("TEST.OL", &bundle(55.0, 50.0, 45.0, 50.0), &risk_assessment(40.0));
        assert_eq!(rec.action, Action::Hold);
        assert!(rec.explanation.contains("held"));
    }

    #[test]
    fn test_overall_score_uses_weights() {
        // technical 0.4, fundamental 0.3, news 0.2, sentiment 0.1
        let rec = engine().evaluate("TEST.OL", &bundle(100.0, 0.0, 50.0, 50.0), &risk_assessment(40.0));
        assert!((rec.overall_score - 55.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_norwegian_explanation() {
        let engine = RecommendationEngine::new(
            AnalysisWeights::default(),
            RecommendationConfig::default(),
            Language::Norwegian,
        );
        let rec = engine.evaluate("TEST.OL", &bundle(80.0, 80.0, 80.0, 80.0), &risk_assessment(30.0));
        assert!(rec.explanation.contains("KJØP"));
        assert!(rec.explanation.contains("Teknisk analyse"));
    }

    #[test]
    fn test_sort_order() {
        let mut recommendations = vec![
            Recommendation {
                symbol: "HOLD1".to_string(),
                action: Action::Hold,
                overall_score: 50.0,
                risk_score: 40.0,
                success_probability: 50.0,
                potential_return: 5.0,
                explanation: String::new(),
                generated_at: Utc::now(),
            },
            Recommendation {
                symbol: "SELL1".to_string(),
                action: Action::Sell,
                overall_score: 25.0,
                risk_score: 40.0,
                success_probability: 50.0,
                potential_return: 5.0,
                explanation: String::new(),
                generated_at: Utc::now(),
            },
            Recommendation {
                symbol: "BUY_WEAK".to_string(),
                action: Action::Buy,
                overall_score: 72.0,
                risk_score: 40.0,
                success_probability: 50.0,
                potential_return: 5.0,
                explanation: String::new(),
                generated_at: Utc::now(),
            },
            Recommendation {
                symbol: "BUY_STRONG".to_string(),
                action: Action::Buy,
                overall_score: 88.0,
                risk_score: 40.0,
                success_probability: 50.0,
                potential_return: 5.0,
                explanation: String::new(),
                generated_at: Utc::now(),
            },
            Recommendation {
                symbol: "SELL2".to_string(),
                action: Action::Sell,
                overall_score: 12.0,
                risk_score: 40.0,
                success_probability: 50.0,
                potential_return: 5.0,
                explanation: String::new(),
                generated_at: Utc::now(),
            },
        ];
        sort_recommendations(&mut recommendations);
        let order: Vec<&str> = recommendations.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(
            order,
            vec!["BUY_STRONG", "BUY_WEAK", "SELL2", "SELL1", "HOLD1"]
        );
    }
}
