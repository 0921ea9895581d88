//! Tracing subscriber setup shared by both binaries

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;

/// Install the global tracing subscriber
///
/// `RUST_LOG` takes precedence over `logging.level`.
pub fn init_tracing(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_directives(&config.level).into());

    if config.format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}

/// Filter directives used when `RUST_LOG` is unset
///
/// Covers the library and both binaries, whose events carry their own
/// crate names as targets.
fn default_directives(level: &str) -> String {
    ["testaccounts", "create_test_users", "remove_test_users"]
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_directives_cover_library_and_binaries() {
        let directives = default_directives("info");
        assert_eq!(
            directives,
            "testaccounts=info,create_test_users=info,remove_test_users=info"
        );
        assert!(EnvFilter::try_new(&directives).is_ok());
    }
}
