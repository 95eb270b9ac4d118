//! Structured logging setup for packforge.
//!
//! Logs go to stderr so the pack summary on stdout stays machine-readable.
//! Configuration comes from command-line flags, falling back to:
//!
//! - `PACKFORGE_LOG_LEVEL` - log level (trace, debug, info, warn, error)
//! - `PACKFORGE_LOG_JSON` - use JSON output (true/false)
//! - `RUST_LOG` - standard filter directives, applied on top

use std::env;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

const LEVEL_VAR: &str = "PACKFORGE_LOG_LEVEL";
const JSON_VAR: &str = "PACKFORGE_LOG_JSON";

/// Crates whose events are shown at the configured level.
const LOG_TARGETS: &[&str] = &["packforge", "packforge_core"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Minimum level for packforge's own events.
    pub level: Level,
    /// Emit JSON lines instead of human-readable output.
    pub use_json: bool,
    /// Include the module target in each line.
    pub include_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::WARN,
            use_json: false,
            include_target: false,
        }
    }
}

impl LoggingConfig {
    /// Resolve the configuration from flags, then the environment.
    pub fn resolve(level: Option<&str>, json: bool) -> Self {
        let level = level
            .map(ToString::to_string)
            .or_else(|| env::var(LEVEL_VAR).ok())
            .map_or(Level::WARN, |value| parse_level(&value));

        let use_json = json
            || env::var(JSON_VAR)
                .ok()
                .and_then(|v| v.trim().parse::<bool>().ok())
                .unwrap_or(false);

        Self {
            level,
            use_json,
            include_target: level >= Level::DEBUG,
        }
    }
}

/// Parse a level name case-insensitively; unknown names fall back to WARN.
pub fn parse_level(value: &str) -> Level {
    match value.trim().to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => {
            eprintln!(
                "Invalid log level '{value}', defaulting to warn. Valid levels: trace, debug, info, warn, error"
            );
            Level::WARN
        }
    }
}

/// Install the global subscriber. Only the first call has an effect.
pub fn init_logging(config: &LoggingConfig) {
    INIT.call_once(|| {
        let mut filter = EnvFilter::from_default_env();
        for target in LOG_TARGETS {
            if let Ok(directive) = format!("{target}={}", config.level).parse() {
                filter = filter.add_directive(directive);
            }
        }

        if config.use_json {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_writer(std::io::stderr)
                        .with_target(config.include_target),
                )
                .init();
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(config.include_target),
                )
                .init();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("trace"), Level::TRACE);
        assert_eq!(parse_level("Debug"), Level::DEBUG);
        assert_eq!(parse_level(" INFO "), Level::INFO);
        assert_eq!(parse_level("warning"), Level::WARN);
        assert_eq!(parse_level("error"), Level::ERROR);
    }

    #[test]
    fn test_parse_level_invalid() {
        assert_eq!(parse_level("loud"), Level::WARN);
        assert_eq!(parse_level(""), Level::WARN);
    }

    #[test]
    fn test_flags_take_precedence() {
        let config = LoggingConfig::resolve(Some("debug"), true);
        assert_eq!(config.level, Level::DEBUG);
        assert!(config.use_json);
        assert!(config.include_target);
    }

    #[test]
    fn test_default_config() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, Level::WARN);
        assert!(!config.use_json);
    }
}
