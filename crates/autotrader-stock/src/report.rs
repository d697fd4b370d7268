//! Report generation
//!
//! Writes the run's recommendations to the configured output directory as
//! Markdown or JSON, optionally dumping the raw analysis data alongside.

use std::path::PathBuf;

use chrono::Utc;

use crate::engine::{PortfolioMetrics, RunSummary};
use crate::error::{Result, TraderError};
use crate::recommend::{Action, Recommendation};
use autotrader_core::{Language, ReportFormat, ReportingConfig};

/// Report generator configured with directory, format, and language
pub struct ReportGenerator {
    config: ReportingConfig,
}

struct Labels {
    file_stem: &'static str,
    title: &'static str,
    generated: &'static str,
    summary: &'static str,
    buys: &'static str,
    sells: &'static str,
    holds: &'static str,
    buy_section: &'static str,
    sell_section: &'static str,
    hold_section: &'static str,
    portfolio: &'static str,
    volatility: &'static str,
    var: &'static str,
    drawdown: &'static str,
    sharpe: &'static str,
    risk_score: &'static str,
    overall: &'static str,
    disclaimer_heading: &'static str,
    disclaimer: &'static str,
}

fn labels(language: Language) -> Labels {
    match language {
        Language::Norwegian => Labels {
            file_stem: "handelsanbefalinger",
            title: "# Handelsanbefalinger",
            generated: "Generert",
            summary: "## Sammendrag",
            buys: "Antall kjøpsanbefalinger",
            sells: "Antall salgsanbefalinger",
            holds: "Antall holdeanbefalinger",
            buy_section: "## Kjøpsanbefalinger",
            sell_section: "## Salgsanbefalinger",
            hold_section: "## Holdeanbefalinger",
            portfolio: "## Porteføljemetrikker",
            volatility: "Gjennomsnittlig volatilitet",
            var: "Gjennomsnittlig Value at Risk (95%)",
            drawdown: "Verste drawdown",
            sharpe: "Gjennomsnittlig Sharpe ratio",
            risk_score: "Gjennomsnittlig risikoscore",
            overall: "Total score",
            disclaimer_heading: "## Disclaimer",
            disclaimer: "Dette er en automatisk generert rapport fra AutoTrader One. \
                         Anbefalingene er basert på teknisk analyse, fundamental analyse, \
                         nyhetsanalyse og markedssentiment. Dette er ikke finansiell \
                         rådgivning, og alle investeringsbeslutninger tas på eget ansvar. \
                         Det anbefales å gjøre egen analyse før handel.",
        },
        Language::English => Labels {
            file_stem: "recommendations",
            title: "# Trade Recommendations",
            generated: "Generated",
            summary: "## Summary",
            buys: "Buy recommendations",
            sells: "Sell recommendations",
            holds: "Hold recommendations",
            buy_section: "## Buy Recommendations",
            sell_section: "## Sell Recommendations",
            hold_section: "## Hold Recommendations",
            portfolio: "## Portfolio Metrics",
            volatility: "Average volatility",
            var: "Average Value at Risk (95%)",
            drawdown: "Worst drawdown",
            sharpe: "Average Sharpe ratio",
            risk_score: "Average risk score",
            overall: "Overall score",
            disclaimer_heading: "## Disclaimer",
            disclaimer: "This report was generated automatically by AutoTrader One. The \
                         recommendations are based on technical analysis, fundamentals, \
                         news, and market sentiment. This is not financial advice; all \
                         investment decisions are your own responsibility. Do your own \
                         analysis before trading.",
        },
    }
}

impl ReportGenerator {
    pub fn new(config: ReportingConfig) -> Self {
        Self { config }
    }

    /// Write the report, returning its path
    pub fn generate(&self, summary: &RunSummary) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.config.output_dir)?;

        let labels = labels(self.config.language);
        let date = Utc::now().format("%Y-%m-%d");

        let (filename, contents) = match self.config.format {
            ReportFormat::Markdown => (
                format!("{}_{date}.md", labels.file_stem),
                self.render_markdown(summary, &labels),
            ),
            ReportFormat::Json => (
                format!("{}_{date}.json", labels.file_stem),
                serde_json::to_string_pretty(summary)?,
            ),
        };

        let path = self.config.output_dir.join(filename);
        std::fs::write(&path, contents)?;
        tracing::info!(path = %path.display(), "report written");

        if self.config.save_raw_data {
            self.save_raw_data(summary, &date.to_string())?;
        }

        Ok(path)
    }

    fn render_markdown(&self, summary: &RunSummary, labels: &Labels) -> String {
        let recommendations = summary.sorted_recommendations();
        let metrics = &summary.metrics;

        let mut out = String::new();
        out += &format!("{}\n\n", labels.title);
        out += &format!(
            "{}: {}\n\n",
            labels.generated,
            Utc::now().format("%Y-%m-%d %H:%M:%S")
        );

        out += &format!("{}\n\n", labels.summary);
        out += &format!("- {}: {}\n", labels.buys, metrics.buy_count);
        out += &format!("- {}: {}\n", labels.sells, metrics.sell_count);
        out += &format!("- {}: {}\n\n", labels.holds, metrics.hold_count);

        out += &self.render_metrics(metrics, labels);

        for (action, heading) in [
            (Action::Buy, labels.buy_section),
            (Action::Sell, labels.sell_section),
            (Action::Hold, labels.hold_section),
        ] {
            let group: Vec<&Recommendation> = recommendations
                .iter()
                .filter(|r| r.action == action)
                .collect();
            if group.is_empty() {
                continue;
            }
            out += &format!("\n{heading}\n\n");
            for recommendation in group {
                out += &self.render_recommendation(recommendation, labels);
            }
        }

        out += &format!("\n{}\n\n{}\n", labels.disclaimer_heading, labels.disclaimer);
        out
    }

    fn render_metrics(&self, metrics: &PortfolioMetrics, labels: &Labels) -> String {
        let mut out = String::new();
        out += &format!("{}\n\n", labels.portfolio);
        out += &format!("- {}: {:.2}%\n", labels.volatility, metrics.avg_volatility);
        out += &format!("- {}: {:.2}%\n", labels.var, metrics.avg_var_95);
        out += &format!("- {}: {:.2}%\n", labels.drawdown, metrics.worst_drawdown);
        out += &format!("- {}: {:.2}\n", labels.sharpe, metrics.avg_sharpe);
        out += &format!("- {}: {:.1}/100\n", labels.risk_score, metrics.avg_risk_score);
        out
    }

    fn render_recommendation(&self, recommendation: &Recommendation, labels: &Labels) -> String {
        let mut out = String::new();
        out += &format!("### {}\n\n", recommendation.symbol);
        out += &format!(
            "**{}: {:.1}/100**\n\n",
            labels.overall, recommendation.overall_score
        );
        out += &format!("{}\n\n", recommendation.explanation);
        out
    }

    fn save_raw_data(&self, summary: &RunSummary, date: &str) -> Result<()> {
        let data_dir = self.config.output_dir.join("data");
        std::fs::create_dir_all(&data_dir)?;

        let path = data_dir.join(format!("raw_data_{date}.json"));
        let json = serde_json::to_string_pretty(&summary.reports)
            .map_err(|e| TraderError::Report(format!("could not serialize raw data: {e}")))?;
        std::fs::write(&path, json)?;
        tracing::info!(path = %path.display(), "raw data written");
        Ok(())
    }
}
