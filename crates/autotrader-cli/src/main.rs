//! Command-line interface for AutoTrader One

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use comfy_table::Table;
use tracing::{info, warn};

use autotrader_core::{AppConfig, DuplicateKeys, LoadOutcome, load_path};
use autotrader_stock::{AnalysisEngine, PortfolioMonitor, ReportGenerator, RunSummary, YahooClient};

#[derive(Parser, Debug)]
#[command(name = "autotrader")]
#[command(about = "AutoTrader One - automated stock analysis", long_about = None)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Merge duplicated top-level configuration keys (last occurrence wins)
    /// instead of rejecting the file
    #[arg(long)]
    lenient: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze symbols and write a recommendation report
    Analyze {
        /// Symbols to analyze, overriding the configured list
        #[arg(short, long, num_args = 1..)]
        symbols: Vec<String>,
    },
    /// Load and validate the configuration, printing diagnostics
    CheckConfig,
    /// Watch the configured portfolio and alert on risk-limit breaches
    Monitor,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let policy = if cli.lenient {
        DuplicateKeys::LastWins
    } else {
        DuplicateKeys::Deny
    };

    if matches!(cli.command, Command::CheckConfig) {
        autotrader_utils::init_tracing(if cli.debug { "debug" } else { "info" });
        return check_config(&cli.config, policy);
    }

    // Missing configuration falls back to the built-in defaults; anything
    // else (parse failure, duplicate keys, validation) is fatal.
    let outcome = if cli.config.exists() {
        Some(load_path(&cli.config, policy).with_context(|| {
            format!("could not load configuration from {}", cli.config.display())
        })?)
    } else {
        None
    };
    let config = outcome
        .as_ref()
        .map_or_else(AppConfig::default, |o| o.config.clone());

    let level = if cli.debug {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    match &config.logging.file {
        Some(file) => autotrader_utils::init_tracing_with_file(level, file),
        None => autotrader_utils::init_tracing(level),
    }

    match &outcome {
        Some(outcome) => report_load_diagnostics(outcome),
        None => warn!(
            path = %cli.config.display(),
            "configuration file not found, using defaults"
        ),
    }

    let config = Arc::new(config);
    match cli.command {
        Command::Analyze { symbols } => analyze(config, symbols).await,
        Command::Monitor => monitor(config).await,
        Command::CheckConfig => unreachable!("handled above"),
    }
}

fn report_load_diagnostics(outcome: &LoadOutcome) {
    for key in &outcome.overridden {
        warn!(key = %key, "duplicate configuration key merged, last occurrence kept");
    }
    for key in &outcome.unknown {
        warn!(key = %key, "unknown configuration key ignored");
    }
}

fn check_config(path: &Path, policy: DuplicateKeys) -> anyhow::Result<()> {
    let outcome = load_path(path, policy)
        .with_context(|| format!("configuration at {} is invalid", path.display()))?;

    println!("configuration at {} is valid", path.display());
    println!("  symbols: {}", outcome.config.symbols.join(", "));
    if outcome.overridden.is_empty() {
        println!("  no duplicated top-level keys");
    } else {
        println!(
            "  duplicated keys merged (last occurrence kept): {}",
            outcome.overridden.join(", ")
        );
    }
    if !outcome.unknown.is_empty() {
        println!("  unknown keys ignored: {}", outcome.unknown.join(", "));
    }
    Ok(())
}

async fn analyze(config: Arc<AppConfig>, symbols: Vec<String>) -> anyhow::Result<()> {
    let symbols = if symbols.is_empty() {
        config.symbols.clone()
    } else {
        symbols
    };
    info!(count = symbols.len(), "starting analysis");

    let engine = AnalysisEngine::from_config(Arc::clone(&config));
    let summary = engine.analyze_many(&symbols).await;

    print_summary(&summary);

    if summary.reports.is_empty() {
        anyhow::bail!("no symbols could be analyzed");
    }

    let generator = ReportGenerator::new(config.reporting.clone());
    let path = generator.generate(&summary)?;
    println!("\nreport written to {}", path.display());

    Ok(())
}

fn print_summary(summary: &RunSummary) {
    let mut table = Table::new();
    table.set_header(vec![
        "Symbol",
        "Action",
        "Score",
        "Risk",
        "Success %",
        "Potential %",
    ]);
    for recommendation in summary.sorted_recommendations() {
        table.add_row(vec![
            recommendation.symbol.clone(),
            recommendation.action.to_string(),
            format!("{:.1}", recommendation.overall_score),
            format!("{:.1}", recommendation.risk_score),
            format!("{:.1}", recommendation.success_probability),
            format!("{:.1}", recommendation.potential_return),
        ]);
    }
    println!("{table}");

    for failure in &summary.failures {
        println!("skipped {}: {}", failure.symbol, failure.reason);
    }
}

async fn monitor(config: Arc<AppConfig>) -> anyhow::Result<()> {
    let monitor = PortfolioMonitor::new(config.risk_management);
    let market = Arc::new(YahooClient::new());
    let interval = Duration::from_secs(config.gui.refresh_interval);

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(true);
        }
    });

    info!(
        symbols = config.symbols.len(),
        interval_secs = interval.as_secs(),
        "monitoring portfolio, press ctrl-c to stop"
    );
    monitor
        .run(market, &config.symbols, interval, shutdown_rx)
        .await;

    let alerts = monitor.alerts().await;
    println!("{} alert(s) raised during this session", alerts.len());
    for alert in alerts {
        println!("- [{}] {}", alert.at.format("%H:%M:%S"), alert.message);
    }
    Ok(())
}
