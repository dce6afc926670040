//! Structured logging setup.
//!
//! The library only emits `tracing` events. Binaries and tests that want to
//! see them call [`init_logging`] once at startup.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Filter variable checked before `RUST_LOG`.
pub const LOG_ENV_VAR: &str = "APPFLOW_LOG";

const DEFAULT_DIRECTIVE: &str = "info";

/// Install a console subscriber filtered by `APPFLOW_LOG`, then `RUST_LOG`,
/// then `info`.
///
/// Safe to call more than once: if a global subscriber already exists it is
/// kept.
pub fn init_logging() {
    let directive = log_directive(|var| std::env::var(var).ok());

    let subscriber = tracing_subscriber::registry().with(
        fmt::layer()
            .with_target(true)
            .with_level(true)
            .with_filter(EnvFilter::new(&directive)),
    );

    if subscriber.try_init().is_err() {
        tracing::debug!("Global tracing subscriber already initialized, keeping it");
        return;
    }

    tracing::info!(filter = %directive, "Logging initialized");
}

fn log_directive(lookup: impl Fn(&str) -> Option<String>) -> String {
    lookup(LOG_ENV_VAR)
        .or_else(|| lookup("RUST_LOG"))
        .filter(|d| !d.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_DIRECTIVE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appflow_log_wins_over_rust_log() {
        let directive = log_directive(|var| match var {
            LOG_ENV_VAR => Some("appflow=debug".to_string()),
            "RUST_LOG" => Some("warn".to_string()),
            _ => None,
        });
        assert_eq!(directive, "appflow=debug");
    }

    #[test]
    fn falls_back_to_rust_log_then_info() {
        let directive = log_directive(|var| (var == "RUST_LOG").then(|| "warn".to_string()));
        assert_eq!(directive, "warn");

        assert_eq!(log_directive(|_| None), "info");
    }

    #[test]
    fn repeated_init_is_harmless() {
        init_logging();
        init_logging();
    }
}
