// src/utils/logging.rs
//! Logging configuration and utilities
//!
//! Sets up `env_logger` for the miner binary:
//! - Standard logging for mining and verification runs
//! - Verbose logging for benchmarks and DAG generation
//!
//! Library code only ever talks to the `log` facade.

use env_logger::{Builder, Target};
use log::LevelFilter;
use std::env;

/// Initializes the logging subsystem with sensible defaults
///
/// # Configuration
/// - Logs to stdout
/// - Default log level: Info
/// - Respects `RUST_LOG` environment variable if set
pub fn init_logging() {
    let mut builder = common_log_config();
    builder.filter_level(LevelFilter::Info);
    if let Ok(filters) = env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    let _ = builder.try_init();
}

/// Configures verbose logging
///
/// Debug level unless `RUST_LOG` says otherwise, so DAG build timings and
/// per-call cache decisions are visible.
pub fn init_verbose_logging() {
    let mut builder = common_log_config();

    if env::var("RUST_LOG").is_err() {
        builder.filter_level(LevelFilter::Debug);
    } else {
        builder.parse_env("RUST_LOG");
    }

    let _ = builder.try_init();
}

/// Creates a base logger builder with the shared line format
///
/// `[timestamp level module:line] message`, written to stdout.
fn common_log_config() -> Builder {
    let mut builder = Builder::new();

    builder
        .format(|buf, record| {
            use std::io::Write;
            let ts = buf.timestamp_seconds();
            let level = record.level();
            let module = record.module_path().unwrap_or_default();
            let line = record.line().unwrap_or(0);

            writeln!(
                buf,
                "[{} {} {}:{}] {}",
                ts,
                level,
                module,
                line,
                record.args()
            )
        })
        .target(Target::Stdout);

    builder
}
