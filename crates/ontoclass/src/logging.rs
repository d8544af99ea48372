//! Logging setup.
//!
//! Log output goes to stderr so progress and summaries never mix with data,
//! and `RUST_LOG` overrides the configured level.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the global subscriber with a default level and format.
pub fn init(level: &str, json_format: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .with_ansi(true),
            )
            .init();
    }
}

/// Initialize logging from the `[logging]` section, letting CLI flags win.
pub fn init_from_config(
    config: &ontoclass_core::Config,
    verbose_override: bool,
    json_logs_override: bool,
) {
    let level = effective_level(&config.logging.level, verbose_override);
    let json_format = json_logs_override || config.logging.format == "json";
    init(level, json_format);
}

fn effective_level(configured: &str, verbose: bool) -> &str {
    match configured {
        "trace" => "trace",
        _ if verbose => "debug",
        "error" | "warn" | "info" | "debug" => configured,
        _ => "info",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_raises_to_debug() {
        assert_eq!(effective_level("info", true), "debug");
        assert_eq!(effective_level("warn", true), "debug");
        assert_eq!(effective_level("trace", true), "trace");
    }

    #[test]
    fn test_configured_level_kept() {
        assert_eq!(effective_level("warn", false), "warn");
        assert_eq!(effective_level("bogus", false), "info");
    }
}
