//! Lexicon-based sentiment analysis of news articles
//!
//! Polarity per article comes from a small financial lexicon (Norwegian and
//! English), weighted so recent articles count more than older ones.

use crate::analysis::{Signal, round1};
use crate::api::NewsArticle;
use autotrader_core::SentimentConfig;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

const POSITIVE_WORDS: &[&str] = &[
    // Norwegian
    "øker",
    "vekst",
    "positiv",
    "oppgang",
    "sterk",
    "bedre",
    "overgår",
    "suksess",
    "rekord",
    "oppgradert",
    "gevinst",
    "lønnsom",
    // English
    "growth",
    "strong",
    "beat",
    "upgrade",
    "record",
    "profit",
    "gain",
    "surge",
    "rally",
    "outperform",
];

const NEGATIVE_WORDS: &[&str] = &[
    // Norwegian
    "faller",
    "nedgang",
    "negativ",
    "tap",
    "svak",
    "dårlig",
    "skuffende",
    "problemer",
    "kutt",
    "nedgradert",
    "advarsel",
    "frykt",
    // English
    "decline",
    "weak",
    "miss",
    "downgrade",
    "loss",
    "warning",
    "drop",
    "plunge",
    "underperform",
    "lawsuit",
];

/// Outcome of the sentiment analysis for one symbol
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentAssessment {
    /// 0-100, 50 neutral
    pub score: f64,
    pub signal: Signal,
    /// Mean polarity (-1..1) of articles inside the recent window
    pub recent_sentiment: f64,
    /// Mean polarity (-1..1) of older articles
    pub older_sentiment: f64,
    pub total_articles: usize,
    pub recent_articles: usize,
    pub older_articles: usize,
}

impl SentimentAssessment {
    fn neutral(total_articles: usize) -> Self {
        Self {
            score: 50.0,
            signal: Signal::Neutral,
            recent_sentiment: 0.0,
            older_sentiment: 0.0,
            total_articles,
            recent_articles: 0,
            older_articles: 0,
        }
    }
}

/// Sentiment analyzer with configurable recency weighting
pub struct SentimentAnalyzer {
    config: SentimentConfig,
}

impl SentimentAnalyzer {
    pub fn new(config: SentimentConfig) -> Self {
        Self { config }
    }

    pub fn analyze(&self, articles: &[NewsArticle]) -> SentimentAssessment {
        self.analyze_at(articles, Utc::now())
    }

    /// Same as [`analyze`](Self::analyze) with an explicit clock
    pub fn analyze_at(&self, articles: &[NewsArticle], now: DateTime<Utc>) -> SentimentAssessment {
        if articles.len() < self.config.min_articles {
            tracing::warn!(
                count = articles.len(),
                minimum = self.config.min_articles,
                "too few articles for sentiment analysis, scoring neutral"
            );
            return SentimentAssessment::neutral(articles.len());
        }

        let cutoff = now - Duration::days(self.config.recent_days);
        let (recent, older): (Vec<&NewsArticle>, Vec<&NewsArticle>) =
            articles.iter().partition(|a| a.published_at >= cutoff);

        let recent_sentiment = mean_polarity(&recent);
        let older_sentiment = mean_polarity(&older);

        let weighted = recent_sentiment * self.config.recent_weight
            + older_sentiment * self.config.older_weight;

        // -1..1 onto 0..100
        let score = round1((weighted + 1.0) * 50.0);

        SentimentAssessment {
            score,
            signal: Signal::from_score(score),
            recent_sentiment: round3(recent_sentiment),
            older_sentiment: round3(older_sentiment),
            total_articles: articles.len(),
            recent_articles: recent.len(),
            older_articles: older.len(),
        }
    }
}

/// Polarity of one text in -1..1, from lexicon hit counts
pub(crate) fn text_polarity(text: &str) -> f64 {
    let lowered = text.to_lowercase();
    let positive = POSITIVE_WORDS
        .iter()
        .filter(|w| lowered.contains(*w))
        .count();
    let negative = NEGATIVE_WORDS
        .iter()
        .filter(|w| lowered.contains(*w))
        .count();

    if positive + negative == 0 {
        0.0
    } else {
        (positive as f64 - negative as f64) / (positive + negative) as f64
    }
}

fn article_polarity(article: &NewsArticle) -> f64 {
    text_polarity(&format!("{} {}", article.title, article.description))
}

fn mean_polarity(articles: &[&NewsArticle]) -> f64 {
    if articles.is_empty() {
        return 0.0;
    }
    let total: f64 = articles.iter().copied().map(article_polarity).sum();
    total / articles.len() as f64
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(title: &str, days_ago: i64) -> NewsArticle {
        NewsArticle {
            title: title.to_string(),
            description: String::new(),
            source: "Test".to_string(),
            published_at: Utc::now() - Duration::days(days_ago),
            url: String::new(),
        }
    }

    fn analyzer() -> SentimentAnalyzer {
        SentimentAnalyzer::new(SentimentConfig::default())
    }

    #[test]
    fn test_text_polarity() {
        assert!(text_polarity("Equinor melder sterk vekst og rekord") > 0.9);
        assert!(text_polarity("Skuffende kvartal med store tap") < -0.9);
        assert!((text_polarity("Selskapet holder kapitalmarkedsdag")).abs() < f64::EPSILON);
        // mixed headline nets out
        assert!((text_polarity("Sterk vekst men økende tap")).abs() < 0.5);
    }

    #[test]
    fn test_too_few_articles_is_neutral() {
        let articles = vec![article("Sterk vekst", 1)];
        let assessment = analyzer().analyze(&articles);
        assert!((assessment.score - 50.0).abs() < f64::EPSILON);
        assert_eq!(assessment.total_articles, 1);
        assert_eq!(assessment.signal, Signal::Neutral);
    }

    #[test]
    fn test_uniformly_positive_news_scores_high() {
        let articles = vec![
            article("Sterk vekst for selskapet", 1),
            article("Rekordresultat og oppgradert anbefaling", 2),
            article("Positiv oppgang fortsetter", 5),
        ];
        let assessment = analyzer().analyze(&articles);
        assert!(assessment.score > 90.0, "score {}", assessment.score);
        assert_eq!(assessment.signal, Signal::Buy);
        assert_eq!(assessment.recent_articles, 2);
        assert_eq!(assessment.older_articles, 1);
    }

    #[test]
    fn test_recent_articles_dominate() {
        // negative recent news against positive old news
        let articles = vec![
            article("Store tap og advarsel", 0),
            article("Skuffende nedgang", 1),
            article("Sterk vekst", 10),
            article("Rekordresultat", 12),
        ];
        let assessment = analyzer().analyze(&articles);
        // recent weight 0.7 pulls the blend negative: 0.7*(-1) + 0.3*1 = -0.4
        assert!((assessment.score - 30.0).abs() < 1.0, "score {}", assessment.score);
        assert_eq!(assessment.signal, Signal::Sell);
    }

    #[test]
    fn test_neutral_headlines_score_neutral() {
        let articles = vec![
            article("Generalforsamling avholdt", 1),
            article("Nytt styremedlem valgt", 2),
            article("Selskapet presenterte planer", 3),
        ];
        let assessment = analyzer().analyze(&articles);
        assert!((assessment.score - 50.0).abs() < f64::EPSILON);
    }
}
