//! Logging and tracing utilities

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing with console output only.
///
/// `RUST_LOG` overrides `default_level` when set.
pub fn init_tracing(default_level: &str) {
    tracing_subscriber::registry()
        .with(env_filter(default_level))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Initialize tracing with console output plus an append-mode log file.
///
/// Falls back to console-only (with a warning) when the file cannot be
/// opened, so a bad log path never prevents startup.
pub fn init_tracing_with_file(default_level: &str, log_file: &Path) {
    if let Some(parent) = log_file.parent() {
        if !parent.as_os_str().is_empty() {
            let _ = std::fs::create_dir_all(parent);
        }
    }

    match OpenOptions::new().create(true).append(true).open(log_file) {
        Ok(file) => {
            tracing_subscriber::registry()
                .with(env_filter(default_level))
                .with(tracing_subscriber::fmt::layer())
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .init();
        }
        Err(err) => {
            init_tracing(default_level);
            tracing::warn!(
                path = %log_file.display(),
                error = %err,
                "could not open log file, logging to console only"
            );
        }
    }
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_filter_accepts_plain_level() {
        // A bare level string is a valid filter directive
        let filter = env_filter("debug");
        assert_eq!(filter.to_string(), "debug");
    }
}
