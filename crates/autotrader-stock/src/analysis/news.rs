//! News analysis: relevance filtering and impact scoring

use crate::analysis::{Polarity, Signal, round1, sentiment::text_polarity};
use crate::api::{NewsApiClient, NewsArticle};
use autotrader_core::NewsAnalysisConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How many articles to keep in the assessment
const TOP_ARTICLES: usize = 5;

/// One article that passed the relevance filter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedArticle {
    pub title: String,
    pub source: String,
    pub published_at: DateTime<Utc>,
    /// 0-1, how clearly the article is about the symbol
    pub relevance: f64,
    /// -1..1, expected price impact direction and strength
    pub impact: f64,
    pub polarity: Polarity,
}

/// Outcome of the news analysis for one symbol
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsAssessment {
    /// 0-100, 50 neutral
    pub score: f64,
    pub signal: Signal,
    /// Most relevant articles, newest first
    pub articles: Vec<RankedArticle>,
}

impl NewsAssessment {
    fn neutral() -> Self {
        Self {
            score: 50.0,
            signal: Signal::Neutral,
            articles: Vec::new(),
        }
    }
}

/// News analyzer with a configurable relevance threshold
pub struct NewsAnalyzer {
    config: NewsAnalysisConfig,
}

impl NewsAnalyzer {
    pub fn new(config: NewsAnalysisConfig) -> Self {
        Self { config }
    }

    pub fn analyze(&self, symbol: &str, articles: &[NewsArticle]) -> NewsAssessment {
        if articles.is_empty() {
            tracing::warn!(symbol, "no news articles to analyze, scoring neutral");
            return NewsAssessment::neutral();
        }

        let mut sorted: Vec<&NewsArticle> = articles.iter().collect();
        sorted.sort_by(|a, b| b.published_at.cmp(&a.published_at));

        let ranked: Vec<RankedArticle> = sorted
            .into_iter()
            .filter_map(|article| {
                let relevance = relevance(symbol, article);
                if relevance < self.config.relevance_threshold {
                    return None;
                }
                let polarity_value =
                    text_polarity(&format!("{} {}", article.title, article.description));
                let polarity = Polarity::classify(polarity_value);
                let impact = match polarity {
                    Polarity::Positive => 0.7,
                    Polarity::Negative => -0.7,
                    Polarity::Neutral => 0.0,
                };
                Some(RankedArticle {
                    title: article.title.clone(),
                    source: article.source.clone(),
                    published_at: article.published_at,
                    relevance,
                    impact,
                    polarity,
                })
            })
            .collect();

        if ranked.is_empty() {
            return NewsAssessment::neutral();
        }

        // Newer articles carry more weight, tapering to half
        let weights: Vec<f64> = (0..ranked.len())
            .map(|i| (1.0 - i as f64 * 0.1).max(0.5))
            .collect();
        let total_weight: f64 = weights.iter().sum();
        let weighted_impact: f64 = ranked
            .iter()
            .zip(&weights)
            .map(|(article, weight)| article.impact * weight)
            .sum::<f64>()
            / total_weight;

        let score = round1(50.0 + weighted_impact * 25.0);
        let signal = if score > 60.0 {
            Signal::Buy
        } else if score < 40.0 {
            Signal::Sell
        } else {
            Signal::Neutral
        };

        NewsAssessment {
            score,
            signal,
            articles: ranked.into_iter().take(TOP_ARTICLES).collect(),
        }
    }
}

/// Relevance from how directly the text names the company
fn relevance(symbol: &str, article: &NewsArticle) -> f64 {
    let text = format!("{} {}", article.title, article.description).to_lowercase();
    let company = NewsApiClient::search_query(symbol).to_lowercase();
    let stem = symbol
        .split('.')
        .next()
        .unwrap_or(symbol)
        .to_lowercase();

    if text.contains(&company) {
        0.9
    } else if text.contains(&stem) {
        0.8
    } else {
        0.4
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn article(title: &str, days_ago: i64) -> NewsArticle {
        NewsArticle {
            title: title.to_string(),
            description: String::new(),
            source: "Test".to_string(),
            published_at: Utc::now() - Duration::days(days_ago),
            url: String::new(),
        }
    }

    fn analyzer() -> NewsAnalyzer {
        NewsAnalyzer::new(NewsAnalysisConfig::default())
    }

    #[test]
    fn test_relevance_prefers_company_name() {
        let named = article("Equinor leverer sterkt", 0);
        let stem_only = article("EQNR stiger", 0);
        let unrelated = article("Markedet generelt", 0);
        assert!((relevance("EQNR.OL", &named) - 0.9).abs() < f64::EPSILON);
        assert!((relevance("EQNR.OL", &stem_only) - 0.8).abs() < f64::EPSILON);
        assert!((relevance("EQNR.OL", &unrelated) - 0.4).abs() < f64::EPSILON);
    }

    #[test]
    fn test_no_articles_is_neutral() {
        let assessment = analyzer().analyze("EQNR.OL", &[]);
        assert!((assessment.score - 50.0).abs() < f64::EPSILON);
        assert!(assessment.articles.is_empty());
    }

    #[test]
    fn test_irrelevant_articles_filtered_out() {
        let articles = vec![article("Generelt markedsstoff om vekst", 0)];
        let assessment = analyzer().analyze("EQNR.OL", &articles);
        assert!(assessment.articles.is_empty());
        assert_eq!(assessment.signal, Signal::Neutral);
    }

    #[test]
    fn test_positive_relevant_news_scores_buy() {
        let articles = vec![
            article("Equinor melder sterk vekst", 0),
            article("Equinor med rekordresultat", 1),
        ];
        let assessment = analyzer().analyze("EQNR.OL", &articles);
        // both impacts 0.7 -> score 50 + 0.7*25 = 67.5
        assert!((assessment.score - 67.5).abs() < f64::EPSILON);
        assert_eq!(assessment.signal, Signal::Buy);
        assert_eq!(assessment.articles.len(), 2);
        assert_eq!(assessment.articles[0].polarity, Polarity::Positive);
    }

    #[test]
    fn test_newest_articles_come_first_and_weigh_more() {
        let articles = vec![
            article("Equinor faller etter skuffende tall", 5),
            article("Equinor melder sterk vekst", 0),
        ];
        let assessment = analyzer().analyze("EQNR.OL", &articles);
        assert!(assessment.articles[0].title.contains("vekst"));
        // weights 1.0 and 0.9: (0.7 - 0.63) / 1.9 > 0
        assert!(assessment.score > 50.0);
    }

    #[test]
    fn test_at_most_five_articles_kept() {
        let articles: Vec<NewsArticle> = (0..8)
            .map(|i| article(&format!("Equinor nyhet {i} om vekst"), i))
            .collect();
        let assessment = analyzer().analyze("EQNR.OL", &articles);
        assert_eq!(assessment.articles.len(), 5);
    }
}
