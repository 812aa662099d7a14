//! Tracing setup for the server binary.
//!
//! `RUST_LOG` takes precedence over the level passed on the command line.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Levels accepted by `--log-level`
pub const LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Directives used when `RUST_LOG` is unset
///
/// Request traces from tower-http follow `level`; hyper's connection
/// chatter stays at warn unless tracing everything.
pub fn default_directives(level: &str) -> String {
    let hyper = if level == "trace" { "trace" } else { "warn" };
    format!("{level},tower_http={level},hyper={hyper}")
}

/// Install the global subscriber with a compact fmt layer
pub fn init(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives() {
        assert_eq!(default_directives("info"), "info,tower_http=info,hyper=warn");
        assert_eq!(default_directives("trace"), "trace,tower_http=trace,hyper=trace");
    }

    #[test]
    fn test_every_level_parses() {
        for level in LEVELS {
            assert!(default_directives(level).parse::<EnvFilter>().is_ok(), "{}", level);
        }
    }
}
