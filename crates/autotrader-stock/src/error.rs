//! Error types for the analysis pipeline

use thiserror::Error;

/// Errors produced while collecting data or running the pipeline
#[derive(Debug, Error)]
pub enum TraderError {
    /// Configuration problem surfaced after loading
    #[error("configuration error: {0}")]
    Config(#[from] autotrader_core::ConfigError),

    /// A provider request failed
    #[error("API error: {0}")]
    Api(String),

    /// Invalid stock symbol
    #[error("invalid symbol: {0}")]
    InvalidSymbol(String),

    /// A provider returned no usable data for the symbol
    #[error("data not available for {symbol}: {reason}")]
    DataUnavailable { symbol: String, reason: String },

    /// Provider rate limit exceeded
    #[error("rate limit exceeded for {provider}")]
    RateLimited { provider: String },

    /// Network or HTTP error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON encoding or decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Yahoo Finance API error
    #[error("Yahoo Finance error: {0}")]
    Yahoo(String),

    /// Technical indicator calculation error
    #[error("indicator error: {0}")]
    Indicator(String),

    /// Report or raw-data file could not be written
    #[error("report error: {0}")]
    Report(String),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, TraderError>;
