//! Tracing subscriber setup
//!
//! Logs always go to stderr: the replay command writes its balances CSV to
//! stdout. `RUST_LOG` takes precedence over the configured level.

use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber
///
/// Fails if a subscriber was already installed.
pub fn init_logging(level: &str, json: bool) -> Result<(), String> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let result = if json {
        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .try_init()
    } else {
        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .try_init()
    };

    result.map_err(|e| format!("Failed to initialize logging: {}", e))
}
