//! Logging configuration using tracing
//!
//! Structured logging to stderr, filtered through RUST_LOG. Stdout stays
//! reserved for the exported tasks.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the tracing subscriber
///
/// Filtering follows RUST_LOG and defaults to "warn" so that a plain
/// `chorewarrior pull` prints nothing but tasks.
///
/// # Example RUST_LOG values
/// - `RUST_LOG=info` - Show login and fetch summaries
/// - `RUST_LOG=chorewarrior=debug` - Per-chore decisions
/// - `RUST_LOG=chorewarrior=debug,reqwest=debug` - Include HTTP client internals
///
/// # Errors
/// Returns an error if the subscriber has already been initialized
pub fn init() -> crate::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_line_number(true),
        )
        .try_init()
        .map_err(|e| {
            crate::ChoreSyncError::Other(format!("Failed to initialize tracing: {}", e))
        })?;

    Ok(())
}

/// Initialize logging for tests (no-op if already initialized)
pub fn init_test() {
    let _ = init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_test_helper() {
        init_test();
        init_test();
    }

    #[test]
    fn test_second_init_fails() {
        init_test();
        assert!(init().is_err());
    }
}
