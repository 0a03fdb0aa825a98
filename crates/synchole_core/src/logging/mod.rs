//! Logging infrastructure for Sync Hole.
//!
//! This module provides:
//! - Per-run loggers with progress callback + optional file output
//! - Compact mode with progress filtering
//! - Tail buffer for error diagnosis
//! - Integration with the `tracing` ecosystem
//!
//! # Example
//!
//! ```no_run
//! use synchole_core::logging::{LogConfig, RunLogger};
//!
//! let logger = RunLogger::new(LogConfig::default())
//!     .with_log_file("/tmp/sync-hole/run.log")?
//!     .with_progress_callback(Box::new(|step, total, msg| {
//!         eprintln!("{step}/{total} {msg}");
//!     }));
//!
//! logger.phase("Probing");
//! logger.step(1, 4, "A001.mov");
//! logger.success("Done");
//! # Ok::<(), std::io::Error>(())
//! ```

mod run_logger;
mod types;

pub use run_logger::RunLogger;
pub use types::{LineCallback, LogConfig, LogLevel, MessagePrefix, ProgressCallback};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize global tracing subscriber for application-wide logging.
///
/// This sets up a subscriber that:
/// - Respects RUST_LOG environment variable
/// - Falls back to the provided default level
/// - Outputs to stderr with timestamps
///
/// Should be called once at application startup.
pub fn init_tracing(default_level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_to_filter_str(default_level)));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(false))
        .with(filter)
        .init();
}

/// Initialize tracing for tests (only logs warnings and above).
#[cfg(test)]
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}

/// Convert LogLevel to filter string.
fn level_to_filter_str(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Trace => "trace",
        LogLevel::Debug => "debug",
        LogLevel::Info => "info",
        LogLevel::Warn => "warn",
        LogLevel::Error => "error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_to_filter_works() {
        assert_eq!(level_to_filter_str(LogLevel::Debug), "debug");
        assert_eq!(level_to_filter_str(LogLevel::Info), "info");
    }
}
