//! Shared utilities for autotrader-rs

pub mod logging;

pub use logging::{init_tracing, init_tracing_with_file};
