//! Logging setup for the `postgoose` binary.
//!
//! # Environment Variables
//!
//! - `POSTGOOSE_LOG_LEVEL=trace|debug|info|warn|error` - Set the log level (default: warn)
//! - `POSTGOOSE_LOG_FORMAT=pretty|compact|json` - Set output format (default: compact)
//!
//! `--verbose` forces `debug`. Logs go to stderr so they never mix with the
//! progress output on stdout.

use std::env;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Crates whose events are shown.
const TARGETS: [&str; 3] = ["postgoose_migrate", "postgoose_postgres", "postgoose_cli"];

/// Get the configured log level.
pub fn get_log_level(verbose: bool) -> &'static str {
    if verbose {
        return "debug";
    }

    env::var("POSTGOOSE_LOG_LEVEL")
        .map(|level| parse_level(&level))
        .unwrap_or("warn")
}

/// Get the configured log format from `POSTGOOSE_LOG_FORMAT`.
pub fn get_log_format() -> &'static str {
    env::var("POSTGOOSE_LOG_FORMAT")
        .map(|f| match f.to_lowercase().as_str() {
            "pretty" => "pretty",
            "json" => "json",
            _ => "compact",
        })
        .unwrap_or("compact")
}

fn parse_level(level: &str) -> &'static str {
    match level.to_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "info" => "info",
        "error" => "error",
        _ => "warn",
    }
}

/// Build the filter directive for `level`.
pub fn filter_directive(level: &str) -> String {
    TARGETS
        .iter()
        .map(|target| format!("{}={}", target, level))
        .collect::<Vec<_>>()
        .join(",")
}

/// Initialize the tracing subscriber. Call once at startup.
pub fn init(verbose: bool) {
    let level = get_log_level(verbose);
    let filter =
        EnvFilter::try_new(filter_directive(level)).unwrap_or_else(|_| EnvFilter::new("warn"));
    let layer = fmt::layer().with_writer(std::io::stderr);

    let result = match get_log_format() {
        "json" => tracing_subscriber::registry()
            .with(filter)
            .with(layer.json())
            .try_init(),
        "pretty" => tracing_subscriber::registry()
            .with(filter)
            .with(layer.pretty())
            .try_init(),
        _ => tracing_subscriber::registry()
            .with(filter)
            .with(layer.compact())
            .try_init(),
    };

    if result.is_ok() {
        tracing::debug!(level = level, format = get_log_format(), "Logging initialized");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_forces_debug() {
        assert_eq!(get_log_level(true), "debug");
    }

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("TRACE"), "trace");
        assert_eq!(parse_level("info"), "info");
        assert_eq!(parse_level("loud"), "warn");
    }

    #[test]
    fn test_filter_directive() {
        assert_eq!(
            filter_directive("info"),
            "postgoose_migrate=info,postgoose_postgres=info,postgoose_cli=info"
        );
    }
}
